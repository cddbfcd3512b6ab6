// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama-backed category classifier
//!
//! Consulted only after the keyword table misses. The engine is
//! optional at runtime: any failure here surfaces as an error that the
//! resolution policy degrades to the catch-all.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::categorize::Classifier;
use crate::config::{AppConfig, EngineConfig};
use crate::model::Category;
use crate::{DespensaError, Result};

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from engine settings
    pub fn new(config: &EngineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        // Normalize URL
        let base_url = config
            .url
            .trim_end_matches('/')
            .replace("/api/generate", "")
            .replace("/api/chat", "");

        Self {
            client,
            base_url,
            model: config.model.clone(),
            retries: config.retries,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the engine is reachable
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                DespensaError::ClassifierUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        Ok(())
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if the configured model is available
    pub async fn model_available(&self) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m.starts_with(&self.model) || m == &format!("{}:latest", self.model)))
    }

    /// Generate a text completion
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        debug!("Sending request to Ollama: model={}", self.model);

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(DespensaError::ClassifierUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: GenerateResponse = response.json().await?;
        Ok(result.response)
    }

    /// Generate with retry logic
    pub async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                warn!(
                    "Retrying Ollama request in {:?} (attempt {})",
                    delay,
                    attempt + 1
                );
                tokio::time::sleep(delay).await;
            }

            match self.generate(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DespensaError::ClassifierUnavailable("Unknown error".to_string())))
    }
}

/// Category classifier backed by an Ollama model and a prompt template.
pub struct OllamaClassifier {
    client: OllamaClient,
    prompt_template: String,
}

impl OllamaClassifier {
    pub fn new(engine: &EngineConfig, prompt_template: &str) -> Self {
        Self {
            client: OllamaClient::new(engine),
            prompt_template: prompt_template.to_string(),
        }
    }

    /// Build from the application config; `None` when AI is disabled.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.ai_engine.enabled {
            return None;
        }
        Some(Self::new(&config.ai_engine, &config.prompts.classify))
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    fn render_prompt(&self, name: &str) -> String {
        let categories = Category::ALL
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ");
        self.prompt_template
            .replace("{categories}", &categories)
            .replace("{name}", name)
    }

    /// Pick a category out of a model reply. Models tend to decorate
    /// answers with quotes, periods or a leading sentence, so this takes
    /// the first line and falls back to lenient label matching.
    fn parse_reply(reply: &str) -> Option<Category> {
        let first_line = reply.trim().lines().next()?.trim();
        let cleaned = first_line
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .trim();
        Category::from_label(cleaned).or_else(|| Category::parse_lenient(first_line))
    }
}

#[async_trait]
impl Classifier for OllamaClassifier {
    async fn classify(&self, name: &str) -> Result<Category> {
        let prompt = self.render_prompt(name);
        debug!("Classifying '{}' with model {}", name, self.client.model());
        let reply = self.client.generate_with_retry(&prompt).await?;
        Self::parse_reply(&reply).ok_or_else(|| {
            DespensaError::ClassifierUnavailable(format!(
                "Unrecognized category reply: '{}'",
                reply.trim()
            ))
        })
    }
}
