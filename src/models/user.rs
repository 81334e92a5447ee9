use serde::{Deserialize, Serialize};

/// Profile projection derived from the identity token's claims.
/// Immutable once derived for a given token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    pub email: String,
    /// Dominican Republic business tax id.
    #[serde(default)]
    pub rnc: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl UserProfile {
    /// Get best display name
    pub fn display_name(&self) -> String {
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => format!("{} {}", given, family),
            (Some(given), None) => given.clone(),
            (None, Some(family)) => family.clone(),
            (None, None) => self.email.clone(),
        }
    }
}
