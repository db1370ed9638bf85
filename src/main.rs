use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use yt_sentiment_analyzer::classifier::load_classifiers;
use yt_sentiment_analyzer::{AnalysisService, AnalysisSettings, ApiServer, Config, YoutubeCommentScraper};

#[derive(Parser, Debug)]
#[command(name = "yt-sentiment", version, about = "YouTube comment sentiment and emotion analysis web app")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory served under /static (charts are written to its images/ subdirectory)
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// Skip the model availability check at startup
    #[arg(long)]
    skip_model_check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "yt_sentiment_analyzer=debug,yt_sentiment=debug,tower_http=debug,warn"
    } else {
        "yt_sentiment_analyzer=info,yt_sentiment=info,tower_http=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(static_dir) = cli.static_dir {
        config.output.static_dir = static_dir;
    }

    config.validate()?;
    info!("🚀 YouTube Sentiment Analyzer starting...");
    info!("{}", config.summary());

    let images_dir = config.images_dir();
    tokio::fs::create_dir_all(&images_dir).await?;
    info!("📂 Chart directory: {}", images_dir.display());

    let scraper = YoutubeCommentScraper::new(&config.scraper)?;

    // A failed model load degrades the service instead of stopping it
    let classifiers = match load_classifiers(&config.models, !cli.skip_model_check).await {
        Ok(classifiers) => Some(classifiers),
        Err(e) => {
            error!("❌ Failed to load models: {}", e);
            warn!("⚠️ Serving in degraded mode: every analysis will report an internal error");
            None
        }
    };

    let service = Arc::new(AnalysisService::new(
        Arc::new(scraper),
        classifiers,
        AnalysisSettings::from_config(&config),
    ));

    let server = ApiServer::new(service, config.server.clone(), config.output.static_dir.clone())?;
    server.start().await
}
