// Upstream gateway client

pub mod client;

pub use client::GatewayClient;
