//! Configuration management for resumebuddy
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.resumebuddy/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::args::Verbosity;
use crate::embedding::EmbeddingBackend;
use crate::errors::{ResumeError, Result};
use crate::extract::sections::{default_layout, SectionLayout};

/// Complete configuration for resumebuddy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub paths: PathsConfig,
    pub telemetry: TelemetryConfig,
    /// Resume section headers and the chunk each one becomes
    pub sections: Vec<SectionLayout>,
}

/// Ollama connection and sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub keep_alive: String,
    pub timeout_secs: u64,
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// HuggingFace model id for the local backend
    pub model: String,
    /// Ollama model name for the ollama backend
    pub ollama_model: String,
}

/// Retrieval and context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks handed to the model per answer
    pub answer_top_k: usize,
    /// Chunks listed by the search command
    pub search_top_k: usize,
    pub preview_chars: usize,
    pub max_context_tokens: usize,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub pdf: String,
    pub chunks: String,
    pub index: String,
    pub metadata: String,
    pub history: String,
}

/// Terminal output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub color_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            paths: PathsConfig::default(),
            telemetry: TelemetryConfig::default(),
            sections: default_layout(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            model: "mistral".to_string(),
            keep_alive: "5m".to_string(),
            timeout_secs: 300,
            num_predict: 150,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Local,
            model: crate::embedding::DEFAULT_LOCAL_MODEL.to_string(),
            ollama_model: "nomic-embed-text".to_string(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            answer_top_k: 2,
            search_top_k: 3,
            preview_chars: 200,
            max_context_tokens: 1500,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pdf: "data/raw/resume.pdf".to_string(),
            chunks: "data/processed/chunks.jsonl".to_string(),
            index: "index/index.json".to_string(),
            metadata: "index/metadata.jsonl".to_string(),
            history: "~/.resumebuddy/history".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ResumeError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| ResumeError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                log::debug!("loading config from {}", config_path.display());
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".resumebuddy").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.answer_top_k == 0 || self.retrieval.search_top_k == 0 {
            return Err(ResumeError::ConfigError(
                "top_k values must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.max_context_tokens == 0 {
            return Err(ResumeError::ConfigError(
                "max_context_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(ResumeError::ConfigError(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ollama.top_p) {
            return Err(ResumeError::ConfigError(
                "top_p must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.ollama.timeout_secs == 0 {
            return Err(ResumeError::ConfigError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.sections.is_empty() {
            return Err(ResumeError::ConfigError(
                "at least one [[sections]] entry is required".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.header.as_str()) {
                return Err(ResumeError::ConfigError(format!(
                    "duplicate section header: {}",
                    section.header
                )));
            }
        }

        if Verbosity::from_name(&self.telemetry.default_verbosity).is_none() {
            return Err(ResumeError::ConfigError(format!(
                "Invalid verbosity level: {}",
                self.telemetry.default_verbosity
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ResumeError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ResumeError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ResumeError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn pdf_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.pdf)
    }

    pub fn chunks_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.chunks)
    }

    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.index)
    }

    pub fn metadata_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.metadata)
    }

    pub fn history_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.history)
    }
}
