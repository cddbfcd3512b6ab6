// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Despensa

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// AI engine configuration (Ollama-compatible endpoint)
    #[serde(default)]
    pub ai_engine: EngineConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Shared list settings
    #[serde(default)]
    pub lists: ListConfig,

    /// Web API settings
    #[serde(default)]
    pub web: WebConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Disable to run purely on the keyword table.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    /// Classification prompt. `{name}` and `{categories}` are filled in
    /// per request.
    #[serde(default = "default_classify_prompt")]
    pub classify: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ListConfig {
    /// List opened when no id is given.
    #[serde(default = "default_list_id")]
    pub default_list_id: String,
    /// Write a `backup-<id>` copy of the document before each update.
    #[serde(default = "default_true")]
    pub backup_on_write: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

// Default value functions
fn default_timeout() -> u64 {
    120
}
fn default_retries() -> u32 {
    1
}
fn default_engine_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_model() -> String {
    "llama3.2:3b".to_string()
}
fn default_true() -> bool {
    true
}
fn default_list_id() -> String {
    "hogar".to_string()
}
fn default_web_host() -> String {
    "127.0.0.1".to_string()
}
fn default_web_port() -> u16 {
    8080
}
fn default_db_path() -> String {
    "despensa.db".to_string()
}

fn default_classify_prompt() -> String {
    "Clasifica este producto de una lista de la compra en una de estas categorías: \
     {categories}. Producto: \"{name}\". Responde SOLO con el nombre exacto de la \
     categoría, sin explicaciones."
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_engine: EngineConfig::default(),
            prompts: PromptConfig::default(),
            lists: ListConfig::default(),
            web: WebConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
            enabled: true,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            classify: default_classify_prompt(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_list_id: default_list_id(),
            backup_on_write: true,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content).map_err(|e| {
                crate::DespensaError::Config(format!("Failed to parse config: {}", e))
            })?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
