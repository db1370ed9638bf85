//! Error types shared across the analyzer

/// Message shown when the submitted URL is blank
pub const EMPTY_URL_MESSAGE: &str = "URL must not be empty";

/// Message shown when the video has no retrievable comments
pub const NO_COMMENTS_MESSAGE: &str = "no comments found";

/// Message shown when YouTube reports the video as missing
pub const VIDEO_NOT_FOUND_MESSAGE: &str =
    "video not found or unavailable; make sure the URL is correct";

/// Message shown for any other scraping failure
pub const FETCH_FAILED_MESSAGE: &str = "an error occurred while fetching comments from YouTube";

/// Message shown when the analysis itself cannot run
pub const INTERNAL_ERROR_MESSAGE: &str = "an internal error occurred while analyzing the comments";

/// User-facing failures of one analysis request.
///
/// The `Display` text of every variant is safe to render in the page.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{}", EMPTY_URL_MESSAGE)]
    EmptyUrl,

    #[error("{}", NO_COMMENTS_MESSAGE)]
    NoComments,

    #[error("{}", VIDEO_NOT_FOUND_MESSAGE)]
    VideoNotFound,

    #[error("{}", FETCH_FAILED_MESSAGE)]
    FetchFailed,

    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    Internal,
}

/// Errors raised while scraping comments from YouTube
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("video not found: {0}")]
    VideoNotFound(String),

    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("failed to set comment sorting")]
    SortingUnavailable,

    #[error("error returned from server: {0}")]
    Server(String),

    #[error("unexpected response: {0}")]
    Parsing(String),
}

/// Errors raised by text classifiers
#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inference API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model not available: {0}")]
    ModelUnavailable(String),

    #[error("empty classification result from {0}")]
    EmptyResult(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while rendering the summary chart
#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render error: {0}")]
    Render(String),
}
