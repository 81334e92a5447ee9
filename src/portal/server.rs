use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::error::{AppError, AppResult};
use crate::modules::codes::CodeStore;
use crate::modules::email::Mailer;
use crate::modules::identity::IdentityProvider;
use crate::portal::config::PortalConfig;
use crate::portal::handlers;
use crate::portal::middleware;
use crate::portal::session::SessionManager;
use crate::portal::upstream::GatewayClient;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub provider: Arc<IdentityProvider>,
    pub sessions: Arc<SessionManager>,
    pub verification_codes: Arc<CodeStore>,
    pub reset_codes: Arc<CodeStore>,
    pub mailer: Arc<dyn Mailer>,
    pub upstream: Arc<GatewayClient>,
}

impl AppState {
    pub fn new(config: PortalConfig, mailer: Arc<dyn Mailer>) -> Self {
        let provider = Arc::new(IdentityProvider::new(
            &config.identity,
            config.request_timeout_secs,
        ));
        let sessions = Arc::new(SessionManager::new(
            provider.clone(),
            config.session.secret.clone(),
            config.session.max_age_secs,
        ));
        let upstream = Arc::new(GatewayClient::new(
            &config.gateway_base_url,
            config.request_timeout_secs,
        ));

        Self {
            verification_codes: Arc::new(CodeStore::new(config.code_ttl_secs)),
            reset_codes: Arc::new(CodeStore::new(config.code_ttl_secs)),
            provider,
            sessions,
            upstream,
            mailer,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Session-gated proxy routes answer 401 before anything goes upstream
    let protected = Router::new()
        .route(
            "/api/api-keys",
            get(handlers::api_keys::list)
                .post(handlers::api_keys::create)
                .delete(handlers::api_keys::remove),
        )
        .route(
            "/api/certificate",
            post(handlers::certificate::upload).get(handlers::certificate::fetch),
        )
        .route("/api/communication", post(handlers::communication::submit))
        .route("/api/documents", get(handlers::documents::list))
        .route("/api/documents/download", get(handlers::documents::download))
        .route("/api/documents/retry-ecf", post(handlers::documents::retry))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/verify", post(handlers::auth::verify))
        .route(
            "/api/auth/verify/resend",
            post(handlers::auth::resend_verification),
        )
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/forgot-password/verify",
            post(handlers::auth::confirm_forgot_password),
        )
        .route("/api/add-user", post(handlers::users::add_user))
        .route("/healthz", get(health_check_handler))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .with_state(state)
}

/// Axum server instance
pub struct PortalServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl PortalServer {
    /// Start the portal server and return a handle to its accept loop.
    pub async fn start(state: AppState) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let addr = format!("{}:{}", state.config.host, state.config.port);
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(AppError::Io)?;
        let local_addr = listener.local_addr().map_err(AppError::Io)?;

        tracing::info!("Portal API server started at http://{}", local_addr);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Portal API server stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                shutdown_tx: Some(shutdown_tx),
                local_addr,
            },
            handle,
        ))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
