//! API request handlers

use tracing::info;

use super::models::HealthStatus;
use crate::analysis::{AnalysisReport, AnalysisService};
use crate::error::AnalysisError;

/// Page produced by one form submission
#[derive(Debug)]
pub enum AnalysisPage {
    Results(Box<AnalysisReport>),
    Form {
        error: String,
        prev_url: Option<String>,
    },
}

/// Handle an analysis form submission
pub async fn run_analysis(service: &AnalysisService, youtube_url: &str) -> AnalysisPage {
    info!("📨 Analysis requested for: {}", youtube_url);

    match service.analyze(youtube_url).await {
        Ok(report) => AnalysisPage::Results(Box::new(report)),
        Err(AnalysisError::EmptyUrl) => AnalysisPage::Form {
            error: AnalysisError::EmptyUrl.to_string(),
            prev_url: None,
        },
        Err(e) => AnalysisPage::Form {
            error: e.to_string(),
            prev_url: Some(youtube_url.to_string()),
        },
    }
}

/// Handle health check requests
pub fn health_check(service: &AnalysisService) -> HealthStatus {
    HealthStatus::new(service.models_loaded())
}
