//! Doctor command for pipeline diagnostics
//!
//! Checks each stage the chat depends on: the Ollama server and model, the
//! embedding model, the résumé PDF, the chunk file and the index pair.

use colored::*;
use std::path::Path;

use crate::cli::config::Config;
use crate::embedding::EmbeddingBackend;
use crate::extract::read_chunks;
use crate::generation::client::model_listed;
use crate::generation::OllamaClient;
use crate::index::{IndexPaths, IndexStore};

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
}

impl Doctor {
    /// Create a new doctor instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let installed = self.installed_models().await;

        vec![
            self.check_config(),
            self.check_ollama_api(&installed),
            self.check_generation_model(&installed),
            self.check_embedding_model(&installed),
            self.check_pdf(),
            self.check_chunks(),
            self.check_index(),
        ]
    }

    /// Installed model names, or why they could not be listed
    async fn installed_models(&self) -> Result<Vec<String>, String> {
        let client = OllamaClient::from_config(&self.config.ollama).map_err(|e| e.to_string())?;
        if !client.health_check().await.unwrap_or(false) {
            return Err(format!("Ollama not reachable at {}", client.base_url()));
        }
        client.list_models().await.map_err(|e| e.to_string())
    }

    fn check_config(&self) -> HealthCheck {
        match self.config.validate() {
            Ok(()) => HealthCheck::new("Configuration", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Configuration", HealthStatus::Fail(e.to_string())),
        }
    }

    fn check_ollama_api(&self, installed: &Result<Vec<String>, String>) -> HealthCheck {
        match installed {
            Ok(_) => HealthCheck::new("Ollama API", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Ollama API", HealthStatus::Fail(e.clone())),
        }
    }

    fn check_generation_model(&self, installed: &Result<Vec<String>, String>) -> HealthCheck {
        let name = "Generation Model";
        let model = &self.config.ollama.model;
        match installed {
            Ok(models) if model_listed(model, models) => HealthCheck::new(name, HealthStatus::Pass),
            Ok(_) => HealthCheck::new(
                name,
                HealthStatus::Fail(format!("{} not installed (ollama pull {})", model, model)),
            ),
            Err(_) => HealthCheck::new(name, HealthStatus::Warn("Cannot check models".to_string())),
        }
    }

    fn check_embedding_model(&self, installed: &Result<Vec<String>, String>) -> HealthCheck {
        let name = "Embedding Model";
        match self.config.embedding.backend {
            EmbeddingBackend::Local => {
                let model = &self.config.embedding.model;
                let cached = hf_hub::Cache::default()
                    .model(model.clone())
                    .get("config.json")
                    .is_some();
                if cached {
                    HealthCheck::new(name, HealthStatus::Pass)
                } else {
                    let note = format!("{} not cached; downloaded on first use", model);
                    HealthCheck::new(name, HealthStatus::Warn(note))
                }
            }
            EmbeddingBackend::Ollama => {
                let model = &self.config.embedding.ollama_model;
                match installed {
                    Ok(models) if model_listed(model, models) => {
                        HealthCheck::new(name, HealthStatus::Pass)
                    }
                    Ok(_) => HealthCheck::new(
                        name,
                        HealthStatus::Fail(format!("{} not installed", model)),
                    ),
                    Err(_) => HealthCheck::new(
                        name,
                        HealthStatus::Warn("Cannot check models".to_string()),
                    ),
                }
            }
        }
    }

    fn check_pdf(&self) -> HealthCheck {
        check_file("Resume PDF", &self.config.pdf_path())
    }

    fn check_chunks(&self) -> HealthCheck {
        let path = self.config.chunks_path();
        if !path.exists() {
            return HealthCheck::new(
                "Chunk File",
                HealthStatus::Warn(format!("{} missing; run `resumebuddy chunks`", path.display())),
            );
        }
        match read_chunks(&path) {
            Ok(chunks) if chunks.is_empty() => {
                HealthCheck::new("Chunk File", HealthStatus::Warn("No chunks".to_string()))
            }
            Ok(_) => HealthCheck::new("Chunk File", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Chunk File", HealthStatus::Fail(e.to_string())),
        }
    }

    fn check_index(&self) -> HealthCheck {
        let paths = IndexPaths::new(self.config.index_path(), self.config.metadata_path());
        if !paths.exist() {
            return HealthCheck::new(
                "Vector Index",
                HealthStatus::Fail("Index missing; run `resumebuddy index`".to_string()),
            );
        }
        match IndexStore::load(&paths) {
            Ok(store) => {
                log::debug!("index holds {} vectors from {}", store.len(), store.model());
                HealthCheck::new("Vector Index", HealthStatus::Pass)
            }
            Err(e) => HealthCheck::new("Vector Index", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "resumebuddy diagnostics".bold().cyan());
        println!("{:<20} {}", "Check", "Status");
        println!("{}", "=".repeat(50));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow().to_string(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red().to_string(),
            };
            println!("{:<20} {}", check.name, status);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn check_file(name: &str, path: &Path) -> HealthCheck {
    if path.is_file() {
        HealthCheck::new(name, HealthStatus::Pass)
    } else {
        HealthCheck::new(name, HealthStatus::Fail(format!("{} not found", path.display())))
    }
}
