use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Portal service configuration, read once from process environment
/// variables at startup. No file-based state.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the external invoicing API gateway.
    pub gateway_base_url: String,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub smtp: SmtpConfig,
    /// Verification/reset codes older than this are rejected.
    pub code_ttl_secs: i64,
    /// Timeout applied to every outbound HTTP call.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub issuer: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HS256 key for the signed session token.
    pub secret: String,
    /// Session token max age; bounded by the refresh token lifetime.
    pub max_age_secs: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// true = implicit TLS, false = STARTTLS upgrade
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
}

impl PortalConfig {
    pub fn from_env() -> AppResult<Self> {
        let smtp_user = optional("SMTP_USER");
        let smtp_from = optional("SMTP_FROM")
            .or_else(|| smtp_user.clone())
            .ok_or_else(|| {
                AppError::Config("Missing environment variable SMTP_FROM or SMTP_USER".to_string())
            })?;

        let identity_base_url = required("AUTH_API_URL")?;

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed_or("PORT", 8080)?,
            gateway_base_url: required("AWS_API_GATEWAY_URL")?,
            identity: IdentityConfig {
                issuer: optional("AUTH_ISSUER").unwrap_or_else(|| identity_base_url.clone()),
                base_url: identity_base_url,
                client_id: required("AUTH_CLIENT_ID")?,
                client_secret: required("AUTH_CLIENT_SECRET")?,
            },
            session: SessionConfig {
                secret: required("SESSION_SECRET")?,
                // 30 days, matching the refresh token lifetime
                max_age_secs: parsed_or("SESSION_MAX_AGE_SECS", 30 * 24 * 60 * 60)?,
            },
            smtp: SmtpConfig {
                host: required("SMTP_HOST")?,
                port: parsed_or("SMTP_PORT", 587)?,
                secure: optional("SMTP_SECURE").as_deref() == Some("true"),
                user: smtp_user,
                pass: optional("SMTP_PASS"),
                from: smtp_from,
            },
            code_ttl_secs: parsed_or("CODE_TTL_SECS", 900)?,
            request_timeout_secs: parsed_or("REQUEST_TIMEOUT_SECS", 30)?,
        })
    }
}

fn required(name: &str) -> AppResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable {}", name)))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", name, raw))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_environment_with_defaults() {
        let vars = [
            ("AWS_API_GATEWAY_URL", "https://gateway.example"),
            ("AUTH_API_URL", "https://auth.example"),
            ("AUTH_CLIENT_ID", "client-id"),
            ("AUTH_CLIENT_SECRET", "client-secret"),
            ("SESSION_SECRET", "session-secret"),
            ("SMTP_HOST", "smtp.example"),
            ("SMTP_USER", "portal@example.com"),
        ];
        for (name, value) in vars {
            std::env::set_var(name, value);
        }

        let config = PortalConfig::from_env().unwrap();
        assert_eq!(config.gateway_base_url, "https://gateway.example");
        // issuer defaults to the provider base URL
        assert_eq!(config.identity.issuer, "https://auth.example");
        assert_eq!(config.smtp.port, 587);
        assert!(!config.smtp.secure);
        // sender falls back to the SMTP user
        assert_eq!(config.smtp.from, "portal@example.com");
        assert_eq!(config.code_ttl_secs, 900);
        assert_eq!(config.session.max_age_secs, 30 * 24 * 60 * 60);
    }
}
