use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Gateway deployment stage an API key (or document operation) targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "TesteCF")]
    Test,
    #[serde(rename = "CerteCF")]
    Cert,
    #[serde(rename = "eCF")]
    Production,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Test => "TesteCF",
            Stage::Cert => "CerteCF",
            Stage::Production => "eCF",
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "TesteCF" => Ok(Stage::Test),
            "CerteCF" => Ok(Stage::Cert),
            "eCF" => Ok(Stage::Production),
            other => Err(AppError::Validation(format!(
                "Invalid environment: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for creating an API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyInput {
    pub description: String,
    pub stage: Stage,
}

/// API key record as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub value: String,
    pub created_date: String,
    pub last_updated_date: String,
    #[serde(default)]
    pub stage_keys: Vec<String>,
}
