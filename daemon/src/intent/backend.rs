use super::IntentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Transport to the semantic-extraction service.
#[async_trait]
pub trait IntentBackend: Send + Sync {
    /// Liveness probe. Called at most once per resolver.
    async fn health_check(&self) -> bool;

    /// Send one prompt, return the model's raw text.
    async fn generate(&self, prompt: &str) -> Result<String, IntentError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama-compatible HTTP backend.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    health_timeout: Duration,
}

impl OllamaBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(health_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            health_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl From<reqwest::Error> for IntentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IntentError::Timeout
        } else if e.is_decode() {
            IntentError::MalformedResponse(e.to_string())
        } else {
            IntentError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl IntentBackend for OllamaBackend {
    async fn health_check(&self) -> bool {
        let url = self.url("/api/tags");
        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Semantic service reachable at {}", url);
                true
            }
            Ok(response) => {
                warn!("Semantic service health check returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Semantic service unreachable at {}: {}", url, e);
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, IntentError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IntentError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}
