//! End-to-end answer pipeline: retrieve, assemble, prompt, generate
//!
//! Generation failures never surface as errors. They are folded into an
//! [`AnswerOutcome`] with a fixed fallback text, so the chat loop always has
//! something to print.
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::config::RetrievalConfig;
use crate::errors::{GenerationError, ResumeError, Result};
use crate::generation::TextGenerator;
use crate::rag::context::{AssembledContext, ContextBuilder, ContextConfig};
use crate::rag::prompt::PromptTemplate;
use crate::rag::retrieval::{RetrievalEngine, RetrievedChunk};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};

pub const EMPTY_ANSWER_TEXT: &str =
    "I could not generate a response based on the provided resume context.";
pub const MODEL_ERROR_TEXT: &str =
    "The local language model encountered an internal error. Please try asking again.";
pub const UNREACHABLE_TEXT: &str =
    "Unable to connect to the local language model. Please ensure Ollama is running.";

/// How an answer came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The model produced text
    Answered,
    /// The model replied with nothing but whitespace
    Empty,
    /// The server replied with an error status or an error body
    ModelError,
    /// The server could not be reached or sent something unreadable
    Unreachable,
}

impl AnswerOutcome {
    /// Fixed text shown instead of a model answer
    pub fn fallback_text(&self) -> Option<&'static str> {
        match self {
            AnswerOutcome::Answered => None,
            AnswerOutcome::Empty => Some(EMPTY_ANSWER_TEXT),
            AnswerOutcome::ModelError => Some(MODEL_ERROR_TEXT),
            AnswerOutcome::Unreachable => Some(UNREACHABLE_TEXT),
        }
    }

    fn from_error(error: &GenerationError) -> Self {
        match error {
            GenerationError::Status { .. } | GenerationError::Model(_) => AnswerOutcome::ModelError,
            GenerationError::Transport(_) | GenerationError::Malformed(_) => {
                AnswerOutcome::Unreachable
            }
        }
    }
}

/// Pipeline result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    /// Model text, or the fallback text for the outcome
    pub text: String,
    pub outcome: AnswerOutcome,
    /// Chunks retrieved for the question, best first
    pub sources: Vec<RetrievedChunk>,
    pub context: AssembledContext,
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        self.outcome == AnswerOutcome::Answered
    }
}

/// RAG pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    pub context: ContextConfig,
}

impl Default for RAGConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            context: ContextConfig::default(),
        }
    }
}

impl From<&RetrievalConfig> for RAGConfig {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.answer_top_k,
            context: ContextConfig {
                max_context_tokens: config.max_context_tokens,
            },
        }
    }
}

/// Prompt ready to send, with what went into it
struct Prepared {
    prompt: String,
    sources: Vec<RetrievedChunk>,
    context: AssembledContext,
}

/// End-to-end RAG pipeline
pub struct RAGPipeline {
    retrieval_engine: RetrievalEngine,
    context_builder: ContextBuilder,
    prompt: PromptTemplate,
    generator: Arc<dyn TextGenerator>,
    telemetry: Option<TelemetryCollector>,
    config: RAGConfig,
}

impl RAGPipeline {
    /// Create new RAG pipeline
    pub fn new(retrieval_engine: RetrievalEngine, generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_config(retrieval_engine, generator, RAGConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        retrieval_engine: RetrievalEngine,
        generator: Arc<dyn TextGenerator>,
        config: RAGConfig,
    ) -> Self {
        Self {
            retrieval_engine,
            context_builder: ContextBuilder::with_config(config.context.clone()),
            prompt: PromptTemplate::default(),
            generator,
            telemetry: None,
            config,
        }
    }

    /// Record question, retrieval and generation events
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Answer a question with a single generate call
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let prepared = self.prepare(question).await?;

        let started = Instant::now();
        let result = self.generator.generate(&prepared.prompt).await;
        Ok(self.finish(question, prepared, result, started))
    }

    /// Answer a question, handing each fragment to `on_fragment` as it arrives
    ///
    /// On a mid-stream failure the fragments already delivered are
    /// discarded from the returned answer, whose text becomes the fallback.
    pub async fn answer_streaming<F>(&self, question: &str, mut on_fragment: F) -> Result<Answer>
    where
        F: FnMut(&str) + Send,
    {
        let prepared = self.prepare(question).await?;

        let started = Instant::now();
        let result = match self.generator.generate_stream(&prepared.prompt).await {
            Ok(mut fragments) => {
                let mut text = String::new();
                let mut failure = None;
                while let Some(fragment) = fragments.next().await {
                    match fragment {
                        Ok(fragment) => {
                            on_fragment(&fragment);
                            text.push_str(&fragment);
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                match failure {
                    Some(e) => Err(e),
                    None => Ok(text.trim().to_string()),
                }
            }
            Err(e) => Err(e),
        };

        Ok(self.finish(question, prepared, result, started))
    }

    async fn prepare(&self, question: &str) -> Result<Prepared> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ResumeError::EmptyQuestion);
        }
        self.record(TelemetryEvent::QuestionReceived {
            question: question.to_string(),
            timestamp: Instant::now(),
        });

        let started = Instant::now();
        let sources = self
            .retrieval_engine
            .retrieve_with_params(question, self.config.top_k)
            .await?;
        self.record(TelemetryEvent::ChunksRetrieved {
            count: sources.len(),
            top_score: sources.first().map(|s| s.score),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });

        let context = self.context_builder.build(&sources);
        let prompt = self.prompt.render(&context.text, question);
        log::debug!(
            "prompt for {:?}: {} chunk(s), ~{} tokens of context",
            question,
            context.chunk_count,
            context.estimated_tokens
        );

        Ok(Prepared {
            prompt,
            sources,
            context,
        })
    }

    fn finish(
        &self,
        question: &str,
        prepared: Prepared,
        result: std::result::Result<String, GenerationError>,
        started: Instant,
    ) -> Answer {
        let (text, outcome) = match result {
            Ok(text) if text.trim().is_empty() => {
                self.record(TelemetryEvent::EmptyAnswer {
                    timestamp: Instant::now(),
                });
                (EMPTY_ANSWER_TEXT.to_string(), AnswerOutcome::Empty)
            }
            Ok(text) => {
                self.record(TelemetryEvent::AnswerGenerated {
                    chars: text.chars().count(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Instant::now(),
                });
                (text.trim().to_string(), AnswerOutcome::Answered)
            }
            Err(e) => {
                let outcome = AnswerOutcome::from_error(&e);
                log::warn!("generation with {} failed: {}", self.generator.model_name(), e);
                self.record(TelemetryEvent::GenerationFailed {
                    reason: e.to_string(),
                    timestamp: Instant::now(),
                });
                let text = outcome.fallback_text().unwrap_or(UNREACHABLE_TEXT);
                (text.to_string(), outcome)
            }
        };

        Answer {
            question: question.trim().to_string(),
            text,
            outcome,
            sources: prepared.sources,
            context: prepared.context,
        }
    }

    fn record(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }

    pub fn retrieval_engine(&self) -> &RetrievalEngine {
        &self.retrieval_engine
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    pub fn config(&self) -> &RAGConfig {
        &self.config
    }
}
