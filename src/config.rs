use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::classifier::ClassifierProvider;
use crate::youtube::CommentSort;

/// Configuration for the YouTube comment sentiment analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Comment scraping settings
    pub scraper: ScraperConfig,

    /// Text classification model settings
    pub models: ModelConfig,

    /// Output and static asset settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Maximum number of comments fetched per request
    pub comment_limit: usize,

    /// Comment ordering requested from YouTube
    pub sort_by: CommentSort,

    /// Interface language hint (overrides the page's `hl`)
    pub language: Option<String>,

    /// Timeout for each HTTP request (seconds)
    pub request_timeout_seconds: u64,

    /// Attempts per continuation request before giving up
    pub max_retries: u32,

    /// Delay between failed continuation attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// User agent sent to YouTube
    pub user_agent: String,

    /// Origin of the watch pages and the internal comment API
    pub base_url: String,

    /// Form target accepting the cookie consent
    pub consent_url: String,
}

/// Endpoint settings for one classification model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierModelConfig {
    /// Model identifier on the Hugging Face Hub
    pub model_id: String,

    /// Explicit endpoint (required for self-hosted inference servers)
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Inference backend serving both models
    pub provider: ClassifierProvider,

    /// Base URL of the hosted inference API
    pub inference_endpoint: String,

    /// Base URL of the model hub, used for the startup availability check
    pub hub_endpoint: String,

    /// Access token for the hosted inference API
    pub api_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Character budget each comment is truncated to before classification
    pub max_input_chars: usize,

    /// Ask the hosted API to block while a cold model loads
    pub wait_for_model: bool,

    /// Sentiment model (positive / negative / neutral)
    pub sentiment: ClassifierModelConfig,

    /// Emotion model, applied to non-neutral comments
    pub emotion: ClassifierModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory served under `/static`
    pub static_dir: PathBuf,

    /// Subdirectory of `static_dir` receiving chart images
    pub images_subdir: String,

    /// Chart image width in pixels
    pub chart_width: u32,

    /// Chart image height in pixels
    pub chart_height: u32,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["yt-sentiment.toml", "config/yt-sentiment.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config.with_env_overrides())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("YT_SENTIMENT_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("YT_SENTIMENT_PORT") {
            self.server.port = port.parse().unwrap_or(self.server.port);
        }

        if let Ok(static_dir) = std::env::var("YT_SENTIMENT_STATIC_DIR") {
            self.output.static_dir = PathBuf::from(static_dir);
        }

        if let Ok(model) = std::env::var("YT_SENTIMENT_SENTIMENT_MODEL") {
            self.models.sentiment.model_id = model;
        }

        if let Ok(model) = std::env::var("YT_SENTIMENT_EMOTION_MODEL") {
            self.models.emotion.model_id = model;
        }

        if let Ok(limit) = std::env::var("YT_SENTIMENT_COMMENT_LIMIT") {
            self.scraper.comment_limit = limit.parse().unwrap_or(self.scraper.comment_limit);
        }

        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.trim().is_empty() {
                self.models.api_token = Some(token);
            }
        }

        self
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("port must be greater than 0"));
        }

        if self.scraper.comment_limit == 0 {
            return Err(anyhow!("comment_limit must be greater than 0"));
        }

        if Url::parse(&self.scraper.base_url).is_err() {
            return Err(anyhow!("invalid scraper base_url: {}", self.scraper.base_url));
        }

        if self.scraper.max_retries == 0 {
            return Err(anyhow!("max_retries must be greater than 0"));
        }

        if self.models.max_input_chars == 0 {
            return Err(anyhow!("max_input_chars must be greater than 0"));
        }

        for model in [&self.models.sentiment, &self.models.emotion] {
            if model.model_id.trim().is_empty() {
                return Err(anyhow!("model_id must not be empty"));
            }
            if self.models.provider == ClassifierProvider::TextEmbeddingsInference
                && model.endpoint.is_none()
            {
                return Err(anyhow!(
                    "endpoint required for self-hosted model {}",
                    model.model_id
                ));
            }
        }

        if self.output.chart_width < 2 || self.output.chart_height == 0 {
            return Err(anyhow!("chart dimensions are too small"));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Directory chart images are written to
    pub fn images_dir(&self) -> PathBuf {
        self.output.static_dir.join(&self.output.images_subdir)
    }

    /// Public URL prefix of chart images
    pub fn images_url_prefix(&self) -> String {
        format!("/static/{}", self.output.images_subdir.trim_matches('/'))
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "YouTube Sentiment Analyzer Configuration:\n\
            - Listen: {}:{}\n\
            - Comment Limit: {}\n\
            - Sort: {:?}\n\
            - Classifier Provider: {:?}\n\
            - Sentiment Model: {}\n\
            - Emotion Model: {}\n\
            - Static Directory: {}",
            self.server.host,
            self.server.port,
            self.scraper.comment_limit,
            self.scraper.sort_by,
            self.models.provider,
            self.models.sentiment.model_id,
            self.models.emotion.model_id,
            self.output.static_dir.display(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            scraper: ScraperConfig::default(),
            models: ModelConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            comment_limit: 200,
            sort_by: CommentSort::Recent,
            language: None,
            request_timeout_seconds: 60,
            max_retries: 5,
            retry_delay_ms: 20_000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            base_url: "https://www.youtube.com".to_string(),
            consent_url: "https://consent.youtube.com/save".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::HuggingFaceInference,
            sentiment: ClassifierModelConfig {
                model_id: "agus1111/sentimen-komentar-youtube-indo".to_string(),
                endpoint: None,
            },
            emotion: ClassifierModelConfig {
                model_id: "MarfinF/marfin_emotion".to_string(),
                endpoint: None,
            },
            inference_endpoint: "https://router.huggingface.co/hf-inference/models".to_string(),
            hub_endpoint: "https://huggingface.co".to_string(),
            api_token: None,
            timeout_seconds: 60,
            max_input_chars: 512,
            wait_for_model: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            images_subdir: "images".to_string(),
            chart_width: 1600,
            chart_height: 700,
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_comment_limit(mut self, limit: usize) -> Self {
        self.config.scraper.comment_limit = limit;
        self
    }

    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.static_dir = dir;
        self
    }

    pub fn with_models(mut self, sentiment: &str, emotion: &str) -> Self {
        self.config.models.sentiment.model_id = sentiment.to_string();
        self.config.models.emotion.model_id = emotion.to_string();
        self
    }

    pub fn with_max_input_chars(mut self, chars: usize) -> Self {
        self.config.models.max_input_chars = chars;
        self
    }

    pub fn with_api_token(mut self, token: String) -> Self {
        self.config.models.api_token = Some(token);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
