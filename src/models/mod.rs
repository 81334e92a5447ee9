pub mod api_keys;
pub mod documents;
pub mod user;

pub use api_keys::{ApiKey, ApiKeyInput, Stage};
pub use documents::{DocumentItem, DocumentPage, DocumentsParams, Metadata};
pub use user::UserProfile;
