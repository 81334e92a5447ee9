// Invoicing gateway client
// Single best-effort forward per call: no retries, no circuit breaking.
// Non-2xx responses surface as pass-through errors carrying the upstream
// status and body verbatim.

use reqwest::{header, Client, Method};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::utils;

pub struct GatewayClient {
    base_url: String,
    http: Client,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: utils::http::create_client(timeout_secs),
        }
    }

    /// Build the gateway request address
    fn build_url(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url, path, q),
            _ => format!("{}{}", self.base_url, path),
        }
    }

    /// Forward a request to the gateway, attaching the bearer token and API
    /// key where provided, and relay the parsed JSON result.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        bearer: Option<&str>,
        api_key: Option<&str>,
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let url = self.build_url(path, query);
        let request_id = uuid::Uuid::new_v4().simple().to_string();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", &request_id);

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(key) = api_key {
            request = request.header("x-api-key", key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;

        if !status.is_success() {
            tracing::warn!("[{}] Gateway {} {} answered {}", request_id, method, url, status);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body: payload,
            });
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let client = GatewayClient::new("https://gateway.example/", 5);

        assert_eq!(
            client.build_url("/TesteCF/customer/apikeys", None),
            "https://gateway.example/TesteCF/customer/apikeys"
        );
        assert_eq!(
            client.build_url("/TesteCF/customer/documents", Some("file=a.xml")),
            "https://gateway.example/TesteCF/customer/documents?file=a.xml"
        );
        assert_eq!(
            client.build_url("/TesteCF/customer/certificate", Some("")),
            "https://gateway.example/TesteCF/customer/certificate"
        );
    }
}
