//! Gemini annotation client.
//!
//! One POST per annotation, no retries. Every failure is logged and
//! collapsed into an empty annotation so the batch keeps moving.

pub mod types;

use async_trait::async_trait;
use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::Config;
pub use types::{GenerateContentRequest, GenerateContentResponse};

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {source} (status {status})")]
    Parse {
        status: u16,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("No conclusion found (status {status})")]
    NoCandidate { status: u16, body: String },
}

/// Produces a short judgment for a concept/argument pair.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Empty string means "no annotation" (missing input or a failed call).
    async fn annotate(&self, template: &str, concept: &str, argument: &str) -> String;
}

/// The prompt sent to the model: template followed by labelled inputs.
pub fn build_prompt(template: &str, concept: &str, argument: &str) -> String {
    format!("{template}\n\tConcept: {concept}\n\tArgument: {argument}\n")
}

#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.gemini_api_key, &config.gemini_endpoint)
    }

    /// Returns `""` when either input is empty (no request is made) or when
    /// the call fails at any stage.
    pub async fn generate_annotation(&self, template: &str, concept: &str, argument: &str) -> String {
        if concept.is_empty() || argument.is_empty() {
            return String::new();
        }

        match self.try_generate(template, concept, argument).await {
            Ok(text) => text,
            Err(GeminiError::Network(e)) => {
                error!(error = %e, "Gemini request failed");
                String::new()
            }
            Err(GeminiError::Parse { status, source, body }) => {
                error!(status, error = %source, %body, "Gemini response was not JSON");
                String::new()
            }
            Err(GeminiError::NoCandidate { status, body }) => {
                warn!(status, %body, "No conclusion found");
                String::new()
            }
        }
    }

    /// Single attempt, surfacing which stage failed.
    pub async fn try_generate(
        &self,
        template: &str,
        concept: &str,
        argument: &str,
    ) -> Result<String, GeminiError> {
        let prompt = build_prompt(template, concept, argument);
        let request = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "Gemini responded");

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|source| GeminiError::Parse {
                status,
                source,
                body: body.clone(),
            })?;

        match parsed.first_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(GeminiError::NoCandidate { status, body }),
        }
    }
}

#[async_trait]
impl Annotator for GeminiClient {
    async fn annotate(&self, template: &str, concept: &str, argument: &str) -> String {
        self.generate_annotation(template, concept, argument).await
    }
}
