use reqwest::Client;

/// Create a unified configuration HTTP client
/// Every outbound call carries a request timeout so a hung upstream
/// cannot stall the handler indefinitely.
pub fn create_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(concat!("ecf-portal/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}
