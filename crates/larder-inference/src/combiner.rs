//! Ollama-backed quantity combiner.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use larder_core::{Error, QuantityCombiner, Result};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = larder_core::defaults::OLLAMA_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = larder_core::defaults::GEN_MODEL;

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = larder_core::defaults::GEN_TIMEOUT_SECS;

const SYSTEM_PROMPT: &str = "You are a cooking assistant that combines ingredient quantities \
for a shopping list. Merge quantities with compatible units into a single total, rounding up \
when amounts do not divide evenly. If the units cannot be merged, list them separated by ' + '. \
Reply with the combined quantity only. No explanation, no extra words.";

/// Quantity combiner backed by an Ollama chat endpoint.
///
/// Callers treat this as untrusted: a failed or malformed reply falls back
/// to the plain-concatenation combiner upstream, so errors here degrade
/// output quality but never abort an aggregation.
pub struct OllamaCombiner {
    client: Client,
    base_url: String,
    gen_model: String,
    gen_timeout_secs: u64,
}

impl OllamaCombiner {
    /// Create a new combiner with default settings.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_OLLAMA_URL.to_string(), DEFAULT_GEN_MODEL.to_string())
    }

    /// Create a new combiner with custom configuration.
    pub fn with_config(base_url: String, gen_model: String) -> Self {
        let gen_timeout = std::env::var("LARDER_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(GEN_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(gen_timeout))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            "Initializing Ollama combiner: url={}, model={}",
            base_url, gen_model
        );

        Self {
            client,
            base_url,
            gen_model,
            gen_timeout_secs: gen_timeout,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let gen_model =
            std::env::var("LARDER_GEN_MODEL").unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string());
        Self::with_config(base_url, gen_model)
    }

    fn build_prompt(ingredient_name: &str, quantities: &[String]) -> String {
        let listed = quantities
            .iter()
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Ingredient: {ingredient_name}\nQuantities needed:\n{listed}\n\nCombined quantity:")
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.gen_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result.message.content;
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Combination complete"
        );
        if elapsed > 10000 {
            warn!(duration_ms = elapsed, slow = true, "Slow combiner request");
        }
        Ok(content)
    }
}

impl Default for OllamaCombiner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuantityCombiner for OllamaCombiner {
    #[instrument(skip(self, quantities), fields(subsystem = "inference", component = "combiner", quantity_count = quantities.len()))]
    async fn combine(&self, ingredient_name: &str, quantities: &[String]) -> Result<String> {
        let prompt = Self::build_prompt(ingredient_name, quantities);
        self.generate(&prompt).await
    }
}

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Response payload from the Ollama `/api/chat` endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}
