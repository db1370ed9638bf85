//! Fake collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use yt_sentiment_analyzer::error::{ClassifierError, ScrapeError};
use yt_sentiment_analyzer::{
    AnalysisService, AnalysisSettings, Classification, Classifiers, CommentSource, TextClassifier,
};

/// What the fake comment source answers
pub enum SourceBehavior {
    Comments(Vec<String>),
    Unavailable,
    NotFound,
    NetworkFailure,
}

pub struct FakeCommentSource {
    behavior: SourceBehavior,
    calls: AtomicUsize,
}

impl FakeCommentSource {
    pub fn new(behavior: SourceBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_comments(comments: &[&str]) -> Arc<Self> {
        Self::new(SourceBehavior::Comments(
            comments.iter().map(|c| c.to_string()).collect(),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentSource for FakeCommentSource {
    async fn fetch_comments(&self, _video_url: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SourceBehavior::Comments(comments) => Ok(comments.iter().take(limit).cloned().collect()),
            SourceBehavior::Unavailable => Err(ScrapeError::VideoUnavailable("Video unavailable".to_string())),
            SourceBehavior::NotFound => Err(ScrapeError::VideoNotFound("https://youtu.be/missing".to_string())),
            SourceBehavior::NetworkFailure => Err(ScrapeError::Parsing("connection reset by peer".to_string())),
        }
    }
}

/// Classifier answering from a fixed text -> label table
pub struct ScriptedClassifier {
    labels: HashMap<String, String>,
    fallback: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            labels: pairs.iter().map(|(t, l)| (t.to_string(), l.to_string())).collect(),
            fallback: None,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(label: &str) -> Arc<Self> {
        Arc::new(Self {
            labels: HashMap::new(),
            fallback: Some(label.to_string()),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            labels: HashMap::new(),
            fallback: None,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextClassifier for ScriptedClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClassifierError::Api {
                status: 500,
                body: "model crashed".to_string(),
            });
        }

        let label = self
            .labels
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ClassifierError::EmptyResult("scripted".to_string()))?;

        Ok(Classification { label, score: 0.9 })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_id(&self) -> &str {
        "test/scripted"
    }
}

pub fn test_settings(static_dir: &Path) -> AnalysisSettings {
    AnalysisSettings {
        comment_limit: 200,
        max_input_chars: 512,
        images_dir: static_dir.join("images"),
        images_url_prefix: "/static/images".to_string(),
        chart_width: 400,
        chart_height: 200,
    }
}

pub fn service(
    source: Arc<FakeCommentSource>,
    sentiment: Arc<ScriptedClassifier>,
    emotion: Arc<ScriptedClassifier>,
    static_dir: &Path,
) -> AnalysisService {
    AnalysisService::new(
        source,
        Some(Classifiers { sentiment, emotion }),
        test_settings(static_dir),
    )
}
