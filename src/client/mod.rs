// Typed portal client with request-state slices
// Mirrors how the dashboard consumes the API: each resource keeps a
// loading/error/data container that the fetch helpers mutate in place.

use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{ApiKey, ApiKeyInput, DocumentPage, DocumentsParams, Stage};
use crate::utils;

/// API key resource state.
#[derive(Debug, Default)]
pub struct ApiKeysSlice {
    pub api_keys: Vec<ApiKey>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Document listing resource state.
#[derive(Debug, Default)]
pub struct DocumentsSlice {
    pub data: DocumentPage,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct PortalClient {
    http: Client,
    base_url: String,
    session_token: Option<String>,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: utils::http::create_client(30),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: None,
        }
    }

    pub fn with_session(mut self, token: &str) -> Self {
        self.session_token = Some(token.to_string());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.session_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Refresh the API key list into the slice.
    pub async fn load_api_keys(&self, slice: &mut ApiKeysSlice) {
        slice.is_loading = true;
        slice.error = None;

        match self.fetch_api_keys().await {
            Ok(api_keys) => slice.api_keys = api_keys,
            Err(err) => slice.error = Some(err.to_string()),
        }

        slice.is_loading = false;
    }

    /// Create a key, then reload the list so the slice reflects it.
    pub async fn add_api_key(&self, input: &ApiKeyInput, slice: &mut ApiKeysSlice) {
        slice.is_loading = true;
        slice.error = None;

        match self
            .send_json(self.request(Method::POST, "/api/api-keys").json(input))
            .await
        {
            Ok(_) => self.load_api_keys(slice).await,
            Err(err) => {
                slice.error = Some(err.to_string());
                slice.is_loading = false;
            }
        }
    }

    /// Delete a key, then reload the list.
    pub async fn delete_api_key(&self, key_id: &str, slice: &mut ApiKeysSlice) {
        slice.is_loading = true;
        slice.error = None;

        let body = json!({ "action": "remove", "keyId": key_id });
        match self
            .send_json(self.request(Method::DELETE, "/api/api-keys").json(&body))
            .await
        {
            Ok(_) => self.load_api_keys(slice).await,
            Err(err) => {
                slice.error = Some(err.to_string());
                slice.is_loading = false;
            }
        }
    }

    /// Load one page of documents for a stage into the slice.
    pub async fn load_documents(
        &self,
        environment: Stage,
        params: &DocumentsParams,
        slice: &mut DocumentsSlice,
    ) {
        slice.is_loading = true;
        slice.error = None;

        let mut query = format!("environment={}", environment);
        let filters = params.to_query();
        if !filters.is_empty() {
            query.push('&');
            query.push_str(&filters);
        }

        let request = self.request(Method::GET, &format!("/api/documents?{}", query));
        let outcome = async {
            let value = self.send_json(request).await?;
            serde_json::from_value::<DocumentPage>(value)
                .map_err(|e| AppError::Validation(format!("Unexpected listing shape: {}", e)))
        }
        .await;

        match outcome {
            Ok(page) => slice.data = page,
            Err(err) => slice.error = Some(err.to_string()),
        }

        slice.is_loading = false;
    }

    async fn fetch_api_keys(&self) -> AppResult<Vec<ApiKey>> {
        let value = self
            .send_json(self.request(Method::GET, "/api/api-keys"))
            .await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Unexpected key list shape: {}", e)))
    }

    async fn send_json(&self, request: RequestBuilder) -> AppResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body: payload,
            });
        }

        Ok(payload)
    }
}
