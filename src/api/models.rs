//! API data models

use serde::{Deserialize, Serialize};

/// Form posted by the index page
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalysisForm {
    /// Missing field is treated like an empty one
    #[serde(default)]
    pub youtube_url: String,
}

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub models_loaded: bool,
    pub timestamp: String,
}

impl HealthStatus {
    pub fn new(models_loaded: bool) -> Self {
        Self {
            status: if models_loaded { "healthy" } else { "degraded" }.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            models_loaded,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
