// portal module - session-gated API surface in front of the invoicing gateway

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod session;
pub mod upstream;

pub use config::PortalConfig;
pub use server::{AppState, PortalServer};
pub use session::SessionManager;
