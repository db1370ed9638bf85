//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use super::handlers::{self, AnalysisPage};
use super::models::AnalysisForm;
use super::templates::PageRenderer;
use crate::analysis::AnalysisService;
use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub pages: Arc<PageRenderer>,
}

/// Build the application router
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    // Generated charts must never be served stale
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .service(ServeDir::new(static_dir));

    Router::new()
        .route("/", get(index_handler))
        .route("/analysis", post(analysis_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, config: &ServerConfig, static_dir: &Path) -> Result<()> {
    let app = build_router(state, static_dir);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 Server listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the form page
async fn index_handler(State(state): State<AppState>) -> Response {
    render_page(state.pages.render_index(None, None))
}

/// Run an analysis and serve the results (or the form with an error)
async fn analysis_handler(State(state): State<AppState>, Form(form): Form<AnalysisForm>) -> Response {
    match handlers::run_analysis(&state.service, &form.youtube_url).await {
        AnalysisPage::Results(report) => render_page(state.pages.render_results(&report)),
        AnalysisPage::Form { error, prev_url } => {
            render_page(state.pages.render_index(Some(&error), prev_url.as_deref()))
        }
    }
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(handlers::health_check(&state.service))
}

fn render_page(rendered: Result<String, minijinja::Error>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
