use super::{Classification, TextClassifier};
use crate::config::{ClassifierModelConfig, ModelConfig};
use crate::error::ClassifierError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Inference responses come either per input (`[[...]]`) or flat (`[...]`)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceOutput {
    Batched(Vec<Vec<Classification>>),
    Single(Vec<Classification>),
}

/// Pick the highest-scoring label out of a raw inference response
fn top_classification(output: InferenceOutput, model_id: &str) -> Result<Classification, ClassifierError> {
    let candidates = match output {
        InferenceOutput::Batched(mut batches) => {
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.swap_remove(0)
            }
        }
        InferenceOutput::Single(candidates) => candidates,
    };

    candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| ClassifierError::EmptyResult(model_id.to_string()))
}

fn build_client(timeout_seconds: u64) -> Result<Client, ClassifierError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?)
}

/// Hosted Hugging Face inference API provider
pub struct HuggingFaceInferenceProvider {
    model_id: String,
    inference_url: String,
    metadata_url: String,
    api_token: Option<String>,
    wait_for_model: bool,
    client: Client,
}

#[derive(Debug, Serialize)]
struct HuggingFaceRequest<'a> {
    inputs: &'a str,
    options: HuggingFaceOptions,
}

#[derive(Debug, Serialize)]
struct HuggingFaceOptions {
    wait_for_model: bool,
}

impl HuggingFaceInferenceProvider {
    pub fn new(config: &ModelConfig, model: &ClassifierModelConfig) -> Result<Self, ClassifierError> {
        let inference_url = model.endpoint.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                config.inference_endpoint.trim_end_matches('/'),
                model.model_id
            )
        });
        let metadata_url = format!(
            "{}/api/models/{}",
            config.hub_endpoint.trim_end_matches('/'),
            model.model_id
        );

        Ok(Self {
            model_id: model.model_id.clone(),
            inference_url,
            metadata_url,
            api_token: config.api_token.clone(),
            wait_for_model: config.wait_for_model,
            client: build_client(config.timeout_seconds)?,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl TextClassifier for HuggingFaceInferenceProvider {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let request = HuggingFaceRequest {
            inputs: text,
            options: HuggingFaceOptions {
                wait_for_model: self.wait_for_model,
            },
        };

        debug!("Sending classification request to {}", self.inference_url);

        let response = self
            .authorized(self.client.post(&self.inference_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api { status, body });
        }

        let output: InferenceOutput = response.json().await?;
        top_classification(output, &self.model_id)
    }

    async fn is_available(&self) -> bool {
        match self.authorized(self.client.get(&self.metadata_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Self-hosted text-embeddings-inference provider
pub struct TextEmbeddingsInferenceProvider {
    model_id: String,
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

impl TextEmbeddingsInferenceProvider {
    pub fn new(config: &ModelConfig, model: &ClassifierModelConfig) -> Result<Self, ClassifierError> {
        let endpoint = model.endpoint.as_ref().ok_or_else(|| {
            ClassifierError::Configuration(format!("endpoint not configured for {}", model.model_id))
        })?;

        Ok(Self {
            model_id: model.model_id.clone(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: build_client(config.timeout_seconds)?,
        })
    }
}

#[async_trait]
impl TextClassifier for TextEmbeddingsInferenceProvider {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let url = format!("{}/predict", self.endpoint);
        debug!("Sending classification request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&PredictRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api { status, body });
        }

        let output: InferenceOutput = response.json().await?;
        top_classification(output, &self.model_id)
    }

    async fn is_available(&self) -> bool {
        let health_endpoint = format!("{}/health", self.endpoint);
        match self.client.get(&health_endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
