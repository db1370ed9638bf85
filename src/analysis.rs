//! Comment analysis pipeline
//!
//! One request runs four steps in order: fetch comments, label sentiment,
//! label emotion for polar comments, then aggregate and chart the counts.

use chrono::Utc;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chart::{self, PieSlice};
use crate::classifier::{Classifiers, TextClassifier};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::youtube::CommentSource;

/// Coarse polarity of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Map a raw model label onto a polarity; unrecognised labels are neutral
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Only polar comments go through the emotion model
    pub fn is_polar(&self) -> bool {
        matches!(self, Sentiment::Positive | Sentiment::Negative)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotion attached to a comment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Emotion {
    /// Not classified (neutral sentiment)
    Neutral,
    /// Classification failed
    Unknown,
    /// Label returned by the emotion model
    Label(String),
}

impl Emotion {
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("neutral") {
            Emotion::Neutral
        } else {
            Emotion::Label(label.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Unknown => "unknown",
            Emotion::Label(label) => label,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Emotion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One analysed comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub text: String,
    pub sentiment: Sentiment,
    pub emotion: Emotion,
}

/// Occurrences of one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Label counts of one request, most frequent first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub sentiment_counts: Vec<LabelCount>,
    pub emotion_counts: Vec<LabelCount>,
}

impl AnalysisSummary {
    pub fn from_records(records: &[CommentRecord]) -> Self {
        Self {
            total: records.len(),
            sentiment_counts: value_counts(records.iter().map(|r| r.sentiment.as_str())),
            emotion_counts: value_counts(
                records
                    .iter()
                    .filter(|r| r.emotion != Emotion::Neutral)
                    .map(|r| r.emotion.as_str()),
            ),
        }
    }

    pub fn sentiment_count(&self, label: &str) -> usize {
        count_of(&self.sentiment_counts, label)
    }

    pub fn emotion_count(&self, label: &str) -> usize {
        count_of(&self.emotion_counts, label)
    }
}

fn count_of(counts: &[LabelCount], label: &str) -> usize {
    counts.iter().find(|c| c.label == label).map(|c| c.count).unwrap_or(0)
}

/// Count labels, sorted by count descending; ties keep first appearance
fn value_counts<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for label in labels {
        match index.get(label) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(label, counts.len());
                counts.push(LabelCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Cut `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Label one comment's sentiment; blank text and classifier failures are neutral
pub async fn classify_sentiment(classifier: &dyn TextClassifier, text: &str, max_chars: usize) -> Sentiment {
    if text.trim().is_empty() {
        return Sentiment::Neutral;
    }

    match classifier.classify(truncate_chars(text, max_chars)).await {
        Ok(classification) => Sentiment::from_label(&classification.label),
        Err(e) => {
            warn!("Sentiment classification failed, defaulting to neutral: {}", e);
            Sentiment::Neutral
        }
    }
}

/// Label one comment's emotion; classifier failures are unknown
pub async fn classify_emotion(
    classifier: &dyn TextClassifier,
    text: &str,
    sentiment: Sentiment,
    max_chars: usize,
) -> Emotion {
    if !sentiment.is_polar() {
        return Emotion::Neutral;
    }

    match classifier.classify(truncate_chars(text, max_chars)).await {
        Ok(classification) => Emotion::from_label(&classification.label),
        Err(e) => {
            warn!("Emotion classification failed, defaulting to unknown: {}", e);
            Emotion::Unknown
        }
    }
}

/// Run both classification layers over every comment, in order
pub async fn label_comments(classifiers: &Classifiers, comments: Vec<String>, max_chars: usize) -> Vec<CommentRecord> {
    let mut records = Vec::with_capacity(comments.len());
    for text in comments {
        let sentiment = classify_sentiment(classifiers.sentiment.as_ref(), &text, max_chars).await;
        records.push(CommentRecord {
            text,
            sentiment,
            emotion: Emotion::Neutral,
        });
    }
    info!("✅ Sentiment analysis finished for {} comments", records.len());

    for record in records.iter_mut() {
        record.emotion = classify_emotion(
            classifiers.emotion.as_ref(),
            &record.text,
            record.sentiment,
            max_chars,
        )
        .await;
    }
    info!("✅ Emotion analysis finished");

    records
}

/// Map a scraping failure onto the user-facing error classes
pub fn classify_fetch_error(message: &str) -> AnalysisError {
    let message = message.to_lowercase();
    if message.contains("unavailable") || message.contains("not found") {
        AnalysisError::VideoNotFound
    } else {
        AnalysisError::FetchFailed
    }
}

static CHART_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Chart file name, unique within the process even for analyses finishing in
/// the same second
pub fn chart_file_name() -> String {
    let sequence = CHART_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("analysis_result_{}_{}.png", Utc::now().timestamp_millis(), sequence)
}

/// Per-request settings taken from the configuration
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub comment_limit: usize,
    pub max_input_chars: usize,
    pub images_dir: PathBuf,
    pub images_url_prefix: String,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl AnalysisSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            comment_limit: config.scraper.comment_limit,
            max_input_chars: config.models.max_input_chars,
            images_dir: config.images_dir(),
            images_url_prefix: config.images_url_prefix(),
            chart_width: config.output.chart_width,
            chart_height: config.output.chart_height,
        }
    }
}

/// Everything the results page shows
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub youtube_url: String,
    pub records: Vec<CommentRecord>,
    pub summary: AnalysisSummary,
    pub image_file: String,
    pub image_url: String,
    pub sentiment_slices: Vec<PieSlice>,
    pub emotion_slices: Vec<PieSlice>,
}

/// Request handler core, shared read-only by every request
pub struct AnalysisService {
    source: Arc<dyn CommentSource>,
    classifiers: Option<Classifiers>,
    settings: AnalysisSettings,
}

impl AnalysisService {
    /// `classifiers` is `None` when the models failed to load; every analysis
    /// then ends with an internal error
    pub fn new(source: Arc<dyn CommentSource>, classifiers: Option<Classifiers>, settings: AnalysisSettings) -> Self {
        Self {
            source,
            classifiers,
            settings,
        }
    }

    pub fn models_loaded(&self) -> bool {
        self.classifiers.is_some()
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyse the comments of one video
    pub async fn analyze(&self, youtube_url: &str) -> Result<AnalysisReport, AnalysisError> {
        let url = youtube_url.trim();
        if url.is_empty() {
            return Err(AnalysisError::EmptyUrl);
        }

        let comments = self.fetch_comments(url).await?;

        let Some(classifiers) = &self.classifiers else {
            error!("❌ Classifiers not loaded, cannot analyze {}", url);
            return Err(AnalysisError::Internal);
        };

        info!("🧠 Starting layered analysis of {} comments", comments.len());
        let records = label_comments(classifiers, comments, self.settings.max_input_chars).await;
        let summary = AnalysisSummary::from_records(&records);

        let image_file = chart_file_name();
        let image_path = self.settings.images_dir.join(&image_file);
        let (width, height) = (self.settings.chart_width, self.settings.chart_height);
        let chart_summary = summary.clone();

        let panels = tokio::task::spawn_blocking(move || {
            chart::render_analysis_chart(&chart_summary, &image_path, width, height)
        })
        .await
        .map_err(|e| {
            error!("❌ Chart task failed: {}", e);
            AnalysisError::Internal
        })?
        .map_err(|e| {
            error!("❌ Chart rendering failed: {}", e);
            AnalysisError::Internal
        })?;

        Ok(AnalysisReport {
            youtube_url: url.to_string(),
            image_url: format!("{}/{}", self.settings.images_url_prefix, image_file),
            image_file,
            records,
            summary,
            sentiment_slices: panels.sentiment,
            emotion_slices: panels.emotion,
        })
    }

    async fn fetch_comments(&self, url: &str) -> Result<Vec<String>, AnalysisError> {
        match self.source.fetch_comments(url, self.settings.comment_limit).await {
            Ok(comments) if comments.is_empty() => {
                warn!("⚠️ No comments retrieved for {}", url);
                Err(AnalysisError::NoComments)
            }
            Ok(comments) => {
                info!("📥 {} comments retrieved", comments.len());
                Ok(comments)
            }
            Err(e) => {
                error!("❌ Failed to fetch comments: {}", e);
                Err(classify_fetch_error(&e.to_string()))
            }
        }
    }
}
