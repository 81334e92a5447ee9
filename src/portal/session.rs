// Session/token lifecycle
// A session is carried inside a signed, self-contained token: the
// access/ID/refresh triple, the derived profile, and the access token
// expiry. Reads past the expiry trigger exactly one refresh-token
// exchange; a failed refresh is recorded as a sentinel on the session
// instead of an error so callers can redirect to login.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::UserProfile;
use crate::modules::identity::{decode_profile, IdentityProvider, TokenGrant};

/// Sentinel recorded on the session when the refresh grant is rejected
/// (e.g. a revoked refresh token).
pub const REFRESH_ACCESS_TOKEN_ERROR: &str = "RefreshAccessTokenError";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub access_token_expires_at: i64,
    pub user: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    session: Session,
}

/// Result of reading a session token. `reissued` carries a re-signed
/// token whenever the refresh flow rotated the stored credentials.
pub struct ReadOutcome {
    pub session: Session,
    pub reissued: Option<String>,
}

pub struct SessionManager {
    provider: Arc<IdentityProvider>,
    secret: String,
    max_age_secs: i64,
}

impl SessionManager {
    pub fn new(provider: Arc<IdentityProvider>, secret: String, max_age_secs: i64) -> Self {
        Self {
            provider,
            secret,
            max_age_secs,
        }
    }

    /// Exchange credentials for a token triple and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, Session)> {
        let grant = self.provider.login(email, password).await?;

        let id_token = grant
            .id_token
            .clone()
            .ok_or_else(|| AppError::Authentication("Invalid ID token".to_string()))?;

        let user = decode_profile(&id_token, self.provider.issuer(), email)
            .map_err(|_| AppError::Authentication("Invalid ID token".to_string()))?;

        let session = Session {
            access_token: grant.access_token,
            id_token: Some(id_token),
            refresh_token: grant.refresh_token,
            access_token_expires_at: Utc::now().timestamp() + grant.expires_in,
            user,
            error: None,
        };

        let token = self.sign(&session)?;
        tracing::info!("Session issued for {}", session.user.email);
        Ok((token, session))
    }

    /// Verify and load a session token, refreshing the access token when it
    /// has expired. Performs at most one refresh attempt per read.
    pub async fn read(&self, token: &str) -> AppResult<ReadOutcome> {
        let session = self.verify(token)?;

        if session.error.is_none() && Utc::now().timestamp() < session.access_token_expires_at {
            return Ok(ReadOutcome {
                session,
                reissued: None,
            });
        }

        Ok(self.refresh_session(session).await)
    }

    /// Unconditional refresh grant. The invoice submission route calls this
    /// because upstream attaches newly granted claims only to fresh tokens.
    pub async fn force_refresh(&self, session: &Session) -> AppResult<Session> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or(AppError::Unauthorized)?;

        let grant = self
            .provider
            .refresh(&session.user.email, refresh_token)
            .await?;

        self.apply_grant(session.clone(), grant)
    }

    async fn refresh_session(&self, session: Session) -> ReadOutcome {
        let refresh_token = match session.refresh_token.as_deref() {
            Some(token) => token.to_string(),
            None => return errored(session),
        };

        match self
            .provider
            .refresh(&session.user.email, &refresh_token)
            .await
            .and_then(|grant| self.apply_grant(session.clone(), grant))
        {
            Ok(refreshed) => {
                let reissued = self.sign(&refreshed).ok();
                ReadOutcome {
                    session: refreshed,
                    reissued,
                }
            }
            Err(err) => {
                tracing::warn!("Token refresh failed for {}: {}", session.user.email, err);
                errored(session)
            }
        }
    }

    fn apply_grant(&self, mut session: Session, grant: TokenGrant) -> AppResult<Session> {
        if let Some(id_token) = grant.id_token {
            session.user = decode_profile(&id_token, self.provider.issuer(), &session.user.email)?;
            session.id_token = Some(id_token);
        }
        if let Some(access_token) = grant.access_token {
            session.access_token = Some(access_token);
        }
        // The provider may omit a rotated refresh token; keep the old one.
        if let Some(refresh_token) = grant.refresh_token {
            session.refresh_token = Some(refresh_token);
        }
        session.access_token_expires_at = Utc::now().timestamp() + grant.expires_in;
        session.error = None;
        Ok(session)
    }

    fn sign(&self, session: &Session) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: session.user.email.clone(),
            iat: now,
            exp: now + self.max_age_secs,
            session: session.clone(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    fn verify(&self, token: &str) -> AppResult<Session> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60;

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        Ok(data.claims.session)
    }
}

/// Null the tokens and record the sentinel so the caller is forced back
/// through login.
fn errored(mut session: Session) -> ReadOutcome {
    session.access_token = None;
    session.id_token = None;
    session.refresh_token = None;
    session.error = Some(REFRESH_ACCESS_TOKEN_ERROR.to_string());
    ReadOutcome {
        session,
        reissued: None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::Json;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use serde_json::{json, Value};

    use super::*;
    use crate::portal::config::IdentityConfig;

    const ISSUER: &str = "https://issuer.example";

    fn signed_id_token(email: &str) -> String {
        encode(
            &Header::default(),
            &json!({
                "iss": ISSUER,
                "email": email,
                "custom:rnc": "131246789",
                "custom:plan": "basic",
            }),
            &EncodingKey::from_secret(b"provider-key"),
        )
        .unwrap()
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn provider_stub(refresh_ok: bool, refresh_calls: Arc<AtomicUsize>) -> String {
        let router = Router::new()
            .route(
                "/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret" {
                        let email = body["email"].as_str().unwrap_or_default().to_string();
                        Json(json!({
                            "accessToken": "access-1",
                            "idToken": signed_id_token(&email),
                            "refreshToken": "refresh-1",
                            "expiresIn": 3600,
                        }))
                        .into_response()
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "error": "NotAuthorizedException" })),
                        )
                            .into_response()
                    }
                }),
            )
            .route(
                "/token",
                post(move |Json(_body): Json<Value>| {
                    let refresh_calls = refresh_calls.clone();
                    async move {
                        refresh_calls.fetch_add(1, Ordering::SeqCst);
                        if refresh_ok {
                            Json(json!({
                                "accessToken": "access-2",
                                "idToken": signed_id_token("maria@empresa.do"),
                                "expiresIn": 3600,
                            }))
                            .into_response()
                        } else {
                            (
                                StatusCode::BAD_REQUEST,
                                Json(json!({ "error": "invalid_grant" })),
                            )
                                .into_response()
                        }
                    }
                }),
            );
        spawn(router).await
    }

    fn manager_for(base_url: String) -> SessionManager {
        let provider = Arc::new(IdentityProvider::new(
            &IdentityConfig {
                base_url,
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                issuer: ISSUER.to_string(),
            },
            5,
        ));
        SessionManager::new(provider, "session-secret".to_string(), 30 * 24 * 60 * 60)
    }

    fn session_expiring_at(expires_at: i64) -> Session {
        Session {
            access_token: Some("access-1".to_string()),
            id_token: Some(signed_id_token("maria@empresa.do")),
            refresh_token: Some("refresh-1".to_string()),
            access_token_expires_at: expires_at,
            user: UserProfile {
                email: "maria@empresa.do".to_string(),
                rnc: "131246789".to_string(),
                ..Default::default()
            },
            error: None,
        }
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_session_token() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_for(provider_stub(true, refresh_calls).await);

        let (token, session) = manager.login("maria@empresa.do", "secret").await.unwrap();
        assert_eq!(session.user.rnc, "131246789");
        assert!(session.access_token_expires_at > Utc::now().timestamp());

        let outcome = manager.read(&token).await.unwrap();
        assert_eq!(outcome.session.user.email, "maria@empresa.do");
        assert!(outcome.reissued.is_none());
    }

    #[tokio::test]
    async fn rejected_credentials_map_to_authentication_error() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_for(provider_stub(true, refresh_calls).await);

        let err = manager
            .login("maria@empresa.do", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn unexpired_read_does_not_touch_the_provider() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_for(provider_stub(true, refresh_calls.clone()).await);

        let token = manager
            .sign(&session_expiring_at(Utc::now().timestamp() + 3600))
            .unwrap();
        let outcome = manager.read(&token).await.unwrap();

        assert!(outcome.reissued.is_none());
        assert!(outcome.session.error.is_none());
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_read_refreshes_exactly_once() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_for(provider_stub(true, refresh_calls.clone()).await);

        let token = manager
            .sign(&session_expiring_at(Utc::now().timestamp() - 10))
            .unwrap();
        let outcome = manager.read(&token).await.unwrap();

        assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.session.access_token.as_deref(), Some("access-2"));
        // refresh token was not rotated by the provider, so it is kept
        assert_eq!(outcome.session.refresh_token.as_deref(), Some("refresh-1"));
        assert!(outcome.session.access_token_expires_at > Utc::now().timestamp());

        // the reissued token reads cleanly without another refresh
        let reissued = outcome.reissued.expect("rotated token");
        let second = manager.read(&reissued).await.unwrap();
        assert!(second.reissued.is_none());
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_yields_sentinel_not_error() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_for(provider_stub(false, refresh_calls.clone()).await);

        let token = manager
            .sign(&session_expiring_at(Utc::now().timestamp() - 10))
            .unwrap();
        let outcome = manager.read(&token).await.unwrap();

        assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            outcome.session.error.as_deref(),
            Some(REFRESH_ACCESS_TOKEN_ERROR)
        );
        assert!(outcome.session.access_token.is_none());
        assert!(outcome.session.id_token.is_none());
        assert!(outcome.session.refresh_token.is_none());
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_for(provider_stub(true, refresh_calls).await);

        let token = manager
            .sign(&session_expiring_at(Utc::now().timestamp() + 3600))
            .unwrap();
        let mut tampered = token.clone();
        tampered.push('x');

        assert!(manager.read(&tampered).await.is_err());
        assert!(manager.read("not-a-token").await.is_err());
    }
}
