//! HTTP client for a local streaming text-generation backend.

use futures::StreamExt;
use listing_shared::{InferenceConfig, ListingError, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::TextGenerator;
use crate::stream::ResponseAccumulator;

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("listing-rewriter/", env!("CARGO_PKG_VERSION"));

/// Request body for the generate endpoint.
#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Streaming client for an Ollama-compatible `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    endpoint: Url,
    model: String,
}

impl InferenceClient {
    /// Build a client from validated configuration.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ListingError::Generation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TextGenerator for InferenceClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ListingError::Generation(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ListingError::Generation(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let mut body = response.bytes_stream();
        let mut accumulator = ResponseAccumulator::new();

        while let Some(chunk) = body.next().await {
            // A broken stream discards whatever was accumulated.
            let bytes = chunk.map_err(|e| {
                ListingError::Generation(format!("failed to read response stream: {e}"))
            })?;
            if accumulator.push(&bytes) {
                break;
            }
        }

        let skipped_lines = accumulator.skipped_lines();
        let text = accumulator.finish();

        if text.is_empty() {
            return Err(ListingError::Generation(
                "backend returned no generated text".into(),
            ));
        }

        debug!(chars = text.len(), skipped_lines, "generation complete");
        Ok(text)
    }
}
