// Identity provider client
// Password and refresh-token grants against the external OAuth2/OIDC
// service, plus the confirmed password reset used by the recovery flow.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::error::{AppError, AppResult};
use crate::models::UserProfile;
use crate::portal::config::IdentityConfig;
use crate::utils;

type HmacSha256 = Hmac<Sha256>;

/// Token triple returned by the provider's grant endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

pub struct IdentityProvider {
    base_url: String,
    client_id: String,
    client_secret: String,
    issuer: String,
    http: Client,
}

impl IdentityProvider {
    pub fn new(config: &IdentityConfig, timeout_secs: u64) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            issuer: config.issuer.clone(),
            http: utils::http::create_client(timeout_secs),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// HMAC-SHA256 over `username + client_id`, keyed by the client secret.
    /// The provider requires it alongside every per-user operation.
    pub fn secret_hash(&self, username: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.client_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(username.as_bytes());
        mac.update(self.client_id.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// Password grant. A rejected exchange maps to an authentication error.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenGrant> {
        let response = self
            .http
            .post(self.endpoint("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<TokenGrant>().await?)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Credential exchange rejected ({}): {}", status, error_text);
            Err(AppError::Authentication("Invalid credentials".to_string()))
        }
    }

    /// Refresh-token grant. The provider may omit a new refresh token;
    /// callers keep the previous one in that case.
    pub async fn refresh(&self, email: &str, refresh_token: &str) -> AppResult<TokenGrant> {
        let response = self
            .http
            .post(self.endpoint("/token"))
            .json(&json!({
                "grantType": "refresh_token",
                "clientId": self.client_id,
                "refreshToken": refresh_token,
                "secretHash": self.secret_hash(email),
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<TokenGrant>().await?)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(AppError::Authentication(format!(
                "Refresh failed: {}",
                error_text
            )))
        }
    }

    /// Set a new password after the reset code has been validated locally.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> AppResult<()> {
        let response = self
            .http
            .post(self.endpoint("/reset-password"))
            .json(&json!({
                "email": email,
                "password": new_password,
                "clientId": self.client_id,
                "secretHash": self.secret_hash(email),
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(AppError::Validation(format!(
                "Password reset rejected: {}",
                error_text
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(rename = "custom:rnc", default)]
    rnc: Option<String>,
    #[serde(rename = "custom:businessName", default)]
    business_name: Option<String>,
    #[serde(rename = "custom:plan", default)]
    plan: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
}

/// Decode the identity token's claims into a profile projection.
///
/// The issuer claim must match the configured provider. Signature trust is
/// delegated to the provider's token format; integrity of the stored triple
/// is enforced by the signed session token that carries it.
pub fn decode_profile(id_token: &str, issuer: &str, fallback_email: &str) -> AppResult<UserProfile> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation.set_issuer(&[issuer]);

    let data = decode::<IdentityClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)?;
    let claims = data.claims;

    Ok(UserProfile {
        given_name: claims.given_name,
        family_name: claims.family_name,
        email: claims.email.unwrap_or_else(|| fallback_email.to_string()),
        rnc: claims.rnc.unwrap_or_default(),
        business_name: claims.business_name,
        plan: claims.plan,
        verified: claims.email_verified.unwrap_or(false),
    })
}
