//! Ollama API client
//!
//! Provides answer generation from the local Ollama server:
//! - Endpoint: POST /api/generate
//! - One-shot (`stream: false`) or NDJSON streaming
//! - Failures split into status / transport / model errors

use bytes::Bytes;
use futures_util::stream;
use futures_util::{future, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cli::config::OllamaConfig;
use crate::errors::{GenerationError, ResumeError, Result};
use crate::generation::parser::{GenerateChunk, NdjsonParser};
use crate::generation::FragmentStream;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default generation model
pub const DEFAULT_MODEL: &str = "mistral";

/// Generation request timeout (5 minutes; first load of a model is slow)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Sampling options forwarded to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            num_predict: 150,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    keep_alive: &'a str,
    options: &'a GenerateOptions,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    keep_alive: String,
    options: GenerateOptions,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create Ollama client with custom endpoint and model
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        Self::build(base_url, model, REQUEST_TIMEOUT)
    }

    /// Create Ollama client from the `[ollama]` config section
    pub fn from_config(config: &OllamaConfig) -> Result<Self> {
        let base_url = format!("http://{}:{}", config.host, config.port);
        let mut client = Self::build(
            &base_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )?;
        client.keep_alive = config.keep_alive.clone();
        client.options = GenerateOptions {
            num_predict: config.num_predict,
            temperature: config.temperature,
            top_p: config.top_p,
        };
        Ok(client)
    }

    fn build(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ResumeError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            keep_alive: "5m".to_string(),
            options: GenerateOptions::default(),
        })
    }

    async fn send(
        &self,
        prompt: &str,
        stream: bool,
    ) -> std::result::Result<reqwest::Response, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream,
            keep_alive: &self.keep_alive,
            options: &self.options,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Status { status, body });
        }

        Ok(response)
    }

    /// Generate a complete response; the returned text is trimmed
    pub async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let response = self.send(prompt, false).await?;

        let body: GenerateChunk = response.json().await.map_err(|e| {
            if e.is_decode() {
                GenerationError::Malformed(e.to_string())
            } else {
                GenerationError::Transport(e.to_string())
            }
        })?;

        if let Some(error) = body.error {
            return Err(GenerationError::Model(error));
        }

        Ok(body.response.trim().to_string())
    }

    /// Generate a streaming response as a stream of text fragments
    ///
    /// The stream ends after the `done` line or the first error. A final
    /// line without a trailing newline is still delivered.
    pub async fn generate_stream(
        &self,
        prompt: &str,
    ) -> std::result::Result<FragmentStream, GenerationError> {
        let response = self.send(prompt, true).await?;

        let fragments = response
            .bytes_stream()
            .map(Some)
            .chain(stream::once(future::ready(None)))
            .scan(
                (NdjsonParser::new(), false),
                |(parser, finished), chunk: Option<reqwest::Result<Bytes>>| {
                    if *finished {
                        return future::ready(None);
                    }
                    let lines = match chunk {
                        Some(Ok(bytes)) => parser.add_bytes(&bytes),
                        Some(Err(e)) => Err(GenerationError::Transport(e.to_string())),
                        None => parser.finish().map(|last| last.into_iter().collect()),
                    };
                    future::ready(Some(stream::iter(fragments_until_done(lines, finished))))
                },
            )
            .flatten()
            .boxed();

        Ok(fragments)
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResumeError::OllamaApiError(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(ResumeError::OllamaApiError(
                "Failed to retrieve model list".to_string(),
            ));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ResumeError::OllamaApiError(format!("Failed to parse models: {}", e)))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|m| m.name)
            .collect())
    }

    /// Whether the configured model is among the installed ones
    ///
    /// `mistral` matches `mistral:latest` and any other tag.
    pub fn model_installed(&self, installed: &[String]) -> bool {
        model_listed(&self.model, installed)
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }
}

/// Whether `model` is among `installed`, ignoring the tag suffix
pub fn model_listed(model: &str, installed: &[String]) -> bool {
    installed.iter().any(|name| {
        name == model
            || name
                .strip_prefix(model)
                .map_or(false, |rest| rest.starts_with(':'))
    })
}

/// Turn parsed lines into fragments, setting `finished` at `done` or an error
fn fragments_until_done(
    lines: std::result::Result<Vec<GenerateChunk>, GenerationError>,
    finished: &mut bool,
) -> Vec<std::result::Result<String, GenerationError>> {
    let lines = match lines {
        Ok(lines) => lines,
        Err(e) => {
            *finished = true;
            return vec![Err(e)];
        }
    };

    let mut fragments = Vec::with_capacity(lines.len());
    for line in lines {
        let done = line.done;
        let item = fragment(line);
        let failed = item.is_err();
        fragments.push(item);
        if done || failed {
            *finished = true;
            break;
        }
    }
    fragments
}

fn fragment(chunk: GenerateChunk) -> std::result::Result<String, GenerationError> {
    match chunk.error {
        Some(error) => Err(GenerationError::Model(error)),
        None => Ok(chunk.response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Serve one canned HTTP reply on a local port and return its base URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n{}",
                status, body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Consume headers and a Content-Length body
    async fn read_request(socket: &mut TcpStream) {
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            received.extend_from_slice(&buf[..n]);
            if let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&received[..end]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    async fn collect_stream(base_url: &str) -> Vec<std::result::Result<String, GenerationError>> {
        let client = OllamaClient::with_config(base_url, "mistral").unwrap();
        client.generate_stream("q").await.unwrap().collect().await
    }

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_client_from_config() {
        let config = OllamaConfig {
            host: "10.0.0.2".to_string(),
            port: 8080,
            model: "llama3".to_string(),
            temperature: 0.1,
            ..Default::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://10.0.0.2:8080");
        assert_eq!(client.model(), "llama3");
        assert_eq!(client.options().temperature, 0.1);
        assert_eq!(client.options().num_predict, 150);
    }

    #[test]
    fn test_request_body_shape() {
        let options = GenerateOptions::default();
        let request = OllamaGenerateRequest {
            model: "mistral",
            prompt: "hi",
            stream: false,
            keep_alive: "5m",
            options: &options,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["keep_alive"], "5m");
        assert_eq!(json["options"]["num_predict"], 150);
        let top_p = json["options"]["top_p"].as_f64().unwrap();
        assert!((top_p - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_model_installed_matches_tags() {
        let client = OllamaClient::with_config("http://localhost:11434", "mistral").unwrap();
        assert!(client.model_installed(&["mistral:latest".to_string()]));
        assert!(client.model_installed(&["mistral".to_string()]));
        assert!(!client.model_installed(&["mistral-nemo:latest".to_string()]));
        assert!(!client.model_installed(&[]));
    }

    #[test]
    fn test_fragment_maps_error_lines() {
        let ok = GenerateChunk {
            response: "I".to_string(),
            done: false,
            error: None,
        };
        assert_eq!(fragment(ok).unwrap(), "I");

        let bad = GenerateChunk {
            response: String::new(),
            done: true,
            error: Some("out of memory".to_string()),
        };
        assert!(matches!(fragment(bad), Err(GenerationError::Model(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = OllamaClient::with_config("http://127.0.0.1:9", "mistral").unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_generate_trims_response() {
        let url = serve_once("200 OK", r#"{"response":"  hi  ","done":true}"#).await;
        let client = OllamaClient::with_config(&url, "mistral").unwrap();
        assert_eq!(client.generate("hello").await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_error_status_is_status_error() {
        let url = serve_once("500 Internal Server Error", "model crashed").await;
        let client = OllamaClient::with_config(&url, "mistral").unwrap();
        match client.generate("hello").await.unwrap_err() {
            GenerationError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model crashed");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let url = serve_once("200 OK", "<html>not ollama</html>").await;
        let client = OllamaClient::with_config(&url, "mistral").unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_in_band_error_is_model_error() {
        let url = serve_once("200 OK", r#"{"error":"model not found"}"#).await;
        let client = OllamaClient::with_config(&url, "mistral").unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::Model(_)));
    }

    #[tokio::test]
    async fn test_stream_keeps_last_line_without_newline() {
        let url = serve_once(
            "200 OK",
            "{\"response\":\"I \",\"done\":false}\n{\"response\":\"built it\",\"done\":true}",
        )
        .await;

        let fragments: Vec<String> = collect_stream(&url)
            .await
            .into_iter()
            .map(|f| f.unwrap())
            .collect();
        assert_eq!(fragments.concat(), "I built it");
    }

    #[tokio::test]
    async fn test_stream_stops_at_done() {
        let url = serve_once(
            "200 OK",
            "{\"response\":\"Done.\",\"done\":true}\n{\"response\":\" EXTRA\",\"done\":false}\n",
        )
        .await;

        let fragments = collect_stream(&url).await;
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_ref().unwrap(), "Done.");
    }

    #[tokio::test]
    async fn test_stream_error_line_ends_stream() {
        let url = serve_once(
            "200 OK",
            "{\"response\":\"I \"}\n{\"error\":\"out of memory\"}\n{\"response\":\"more\"}\n",
        )
        .await;

        let fragments = collect_stream(&url).await;
        assert_eq!(fragments.len(), 2);
        assert!(matches!(fragments[1], Err(GenerationError::Model(_))));
    }
}
