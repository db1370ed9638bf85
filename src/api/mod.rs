//! API module for the YouTube sentiment analyzer
//!
//! Serves the form page, the analysis endpoint and the generated charts.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::analysis::AnalysisService;
use crate::config::ServerConfig;

pub mod handlers;
pub mod models;
pub mod server;
pub mod templates;

use server::AppState;
use templates::PageRenderer;

/// HTTP server for the web UI
pub struct ApiServer {
    state: AppState,
    server: ServerConfig,
    static_dir: PathBuf,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(service: Arc<AnalysisService>, server: ServerConfig, static_dir: PathBuf) -> Result<Self> {
        let pages = Arc::new(PageRenderer::new()?);
        Ok(Self {
            state: AppState { service, pages },
            server,
            static_dir,
        })
    }

    /// Start the API server and serve until shutdown
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.server.port);
        server::start_http_server(self.state, &self.server, &self.static_dir).await
    }
}
