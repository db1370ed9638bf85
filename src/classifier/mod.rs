pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{ClassifierModelConfig, ModelConfig};
use crate::error::ClassifierError;

/// Inference backend types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClassifierProvider {
    /// Hosted Hugging Face inference API, addressed by model id
    HuggingFaceInference,
    /// Self-hosted text-embeddings-inference server, one per model
    TextEmbeddingsInference,
}

/// Top label returned for one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

/// Trait for text classification backends
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;
    async fn is_available(&self) -> bool;
    fn model_id(&self) -> &str;
}

/// The two process-wide classifier handles
#[derive(Clone)]
pub struct Classifiers {
    pub sentiment: Arc<dyn TextClassifier>,
    pub emotion: Arc<dyn TextClassifier>,
}

/// Create a classifier for one model based on configuration
pub fn create_classifier(
    config: &ModelConfig,
    model: &ClassifierModelConfig,
) -> Result<Arc<dyn TextClassifier>, ClassifierError> {
    match config.provider {
        ClassifierProvider::HuggingFaceInference => Ok(Arc::new(
            providers::HuggingFaceInferenceProvider::new(config, model)?,
        )),
        ClassifierProvider::TextEmbeddingsInference => Ok(Arc::new(
            providers::TextEmbeddingsInferenceProvider::new(config, model)?,
        )),
    }
}

/// Create both classifiers once at startup.
///
/// With `check_availability` each model is probed and a missing model fails
/// the whole load.
pub async fn load_classifiers(
    config: &ModelConfig,
    check_availability: bool,
) -> Result<Classifiers, ClassifierError> {
    info!("🤖 Loading sentiment model: {}", config.sentiment.model_id);
    info!("🤖 Loading emotion model: {}", config.emotion.model_id);

    let sentiment = create_classifier(config, &config.sentiment)?;
    let emotion = create_classifier(config, &config.emotion)?;

    if check_availability {
        for classifier in [&sentiment, &emotion] {
            if !classifier.is_available().await {
                error!("❌ Model not available: {}", classifier.model_id());
                return Err(ClassifierError::ModelUnavailable(classifier.model_id().to_string()));
            }
        }
    }

    info!("✅ Sentiment and emotion models ready");
    Ok(Classifiers { sentiment, emotion })
}
