/// YouTube Comment Sentiment Analyzer
///
/// Scrapes the comments of a YouTube video, labels their sentiment and
/// emotion with two hosted text-classification models and serves the
/// summary as a web page with a pie chart.

pub mod analysis;
pub mod api;
pub mod chart;
pub mod classifier;
pub mod config;
pub mod error;
pub mod youtube;

// Re-export main types for easy access
pub use crate::analysis::{AnalysisReport, AnalysisService, AnalysisSettings, CommentRecord, Emotion, Sentiment};
pub use crate::api::ApiServer;
pub use crate::classifier::{Classification, Classifiers, TextClassifier};
pub use crate::config::Config;
pub use crate::error::AnalysisError;
pub use crate::youtube::{CommentSource, YoutubeCommentScraper};
