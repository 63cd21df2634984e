//! Interactive chat loop
//!
//! Reads recruiter questions, answers them through the RAG pipeline and
//! keeps the session's chat turns in memory.

pub mod commands;
pub mod display;
pub mod input;
pub mod session;

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::rag::{Answer, RAGPipeline};
use crate::repl::commands::{is_command, CommandHandler, CommandResult};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::InputHandler;
pub use crate::repl::session::SessionManager;
use crate::telemetry::TelemetryCollector;

/// Configuration for the chat loop
#[derive(Debug, Clone)]
pub struct ReplConfig {
    pub history_file: Option<PathBuf>,
    /// Print fragments as they arrive instead of waiting for the full answer
    pub stream: bool,
    pub preview_chars: usize,
    pub verbose: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            history_file: None,
            stream: false,
            preview_chars: 200,
            verbose: false,
        }
    }
}

/// Chat session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    session_manager: SessionManager,
    display_manager: DisplayManager,
    pipeline: RAGPipeline,
    telemetry: TelemetryCollector,
    stream: bool,
}

impl ReplSession {
    /// Create a chat session over a ready pipeline
    ///
    /// The pipeline should record into `telemetry` for `/stats` to count
    /// anything.
    pub fn new(
        pipeline: RAGPipeline,
        telemetry: TelemetryCollector,
        config: ReplConfig,
    ) -> Result<Self> {
        let input_handler = match config.history_file {
            Some(path) => InputHandler::with_history(path)?,
            None => InputHandler::new()?,
        };
        let mut command_handler = CommandHandler::new().with_preview_chars(config.preview_chars);
        command_handler.set_verbose(config.verbose);

        Ok(ReplSession {
            input_handler,
            command_handler,
            session_manager: SessionManager::new(),
            display_manager: DisplayManager::new(),
            pipeline,
            telemetry,
            stream: config.stream,
        })
    }

    /// Show welcome banner
    pub fn show_welcome(&self, version: &str) {
        self.display_manager.show_banner(
            version,
            self.pipeline.generator().model_name(),
            self.pipeline.retrieval_engine().store().len(),
        );
    }

    /// Run until `exit`, `/exit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        while let Some(line) = self.input_handler.read_line()? {
            match self.handle_input(&line).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => self.display_manager.show_error(&format!("{:#}", e)),
            }
        }
        self.save()
    }

    /// Handle one line of input
    ///
    /// Returns true if the session should continue, false to exit
    pub async fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            let result = self.command_handler.execute(
                command,
                &mut self.session_manager,
                &self.display_manager,
                &self.telemetry,
            )?;
            return match result {
                CommandResult::Continue => Ok(true),
                CommandResult::Exit => Ok(false),
                CommandResult::Ask(question) => {
                    println!("{} {}", ">".cyan(), question);
                    self.ask(&question).await?;
                    Ok(true)
                }
            };
        }

        self.ask(input).await?;
        Ok(true)
    }

    /// Answer a question and print it under the answer header
    ///
    /// The question is kept in the chat history even when the pipeline
    /// fails before producing an answer.
    pub async fn ask(&mut self, question: &str) -> Result<()> {
        let answer = if self.stream {
            self.ask_streaming(question).await
        } else {
            self.display_manager.start_spinner("Thinking...");
            let answer = self.pipeline.answer(question).await;
            self.display_manager.finish_current();
            answer.map_err(anyhow::Error::from)
        };

        let answer = match answer {
            Ok(answer) => answer,
            Err(e) => {
                self.session_manager.record_unanswered(question);
                return Err(e);
            }
        };

        if !self.stream {
            self.display_manager.show_answer(&answer.text);
        }
        self.show_retrieval_details(&answer);
        self.session_manager.record_answer(&answer);
        Ok(())
    }

    async fn ask_streaming(&mut self, question: &str) -> Result<Answer> {
        let display = &self.display_manager;
        display.show_answer_header();

        let mut streamed = false;
        let answer = self
            .pipeline
            .answer_streaming(question, |fragment| {
                streamed = true;
                display.stream_token(fragment);
            })
            .await?;

        if !answer.is_answered() {
            if streamed {
                println!();
            }
            println!("{}", answer.text);
        } else if !streamed {
            println!();
        }
        display.show_answer_footer();
        Ok(answer)
    }

    fn show_retrieval_details(&self, answer: &Answer) {
        if !self.command_handler.is_verbose() {
            return;
        }
        for source in &answer.sources {
            self.display_manager.show_debug(
                &format!(
                    "#{} {} [{}] score {:.3}",
                    source.rank, source.chunk.title, source.chunk.kind, source.score
                ),
                true,
            );
        }
        self.display_manager.show_debug(
            &format!(
                "context: {} chunk(s), ~{} tokens{}",
                answer.context.chunk_count,
                answer.context.estimated_tokens,
                if answer.context.truncated { ", truncated" } else { "" }
            ),
            true,
        );
    }

    /// Save line history
    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn is_verbose(&self) -> bool {
        self.command_handler.is_verbose()
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::test_support::KeywordEmbedder;
    use crate::embedding::Embedder;
    use crate::errors::GenerationError;
    use crate::generation::TextGenerator;
    use crate::index::IndexStore;
    use crate::rag::{RetrievalEngine, UNREACHABLE_TEXT};
    use crate::types::{ChatRole, Chunk, ChunkKind};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
            Ok(format!("{} chars of prompt", prompt.len()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct Offline;

    #[async_trait]
    impl TextGenerator for Offline {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
            Err(GenerationError::Transport("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "offline"
        }
    }

    /// Keyword embedder that fails on any text mentioning "offline"
    struct PickyEmbedder(KeywordEmbedder);

    #[async_trait]
    impl Embedder for PickyEmbedder {
        fn model_id(&self) -> &str {
            self.0.model_id()
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::errors::Result<Vec<Vec<f32>>> {
            if texts.iter().any(|text| text.contains("offline")) {
                return Err(crate::errors::ResumeError::EmbeddingError(
                    "embedding backend down".to_string(),
                ));
            }
            self.0.embed_batch(texts).await
        }
    }

    async fn session(generator: Arc<dyn TextGenerator>, stream: bool) -> ReplSession {
        let embedder: Arc<dyn Embedder> =
            Arc::new(PickyEmbedder(KeywordEmbedder::new(&["internship", "rust"])));
        session_with(embedder, generator, stream).await
    }

    async fn session_with(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        stream: bool,
    ) -> ReplSession {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let chunks = vec![
            Chunk::new("exp_001", ChunkKind::Experience, "Internship", "Analytics internship", day),
            Chunk::new("skills_001", ChunkKind::Skills, "Skills", "Rust", day),
        ];
        let store = IndexStore::build(chunks, embedder.as_ref()).await.unwrap();
        let engine = RetrievalEngine::new(Arc::new(store), embedder).unwrap();
        let telemetry = TelemetryCollector::new();
        let pipeline = RAGPipeline::new(engine, generator).with_telemetry(telemetry.clone());
        let config = ReplConfig {
            stream,
            ..Default::default()
        };
        ReplSession::new(pipeline, telemetry, config).unwrap()
    }

    #[tokio::test]
    async fn test_question_appends_two_turns() {
        let mut repl = session(Arc::new(Echo), false).await;

        assert!(repl.handle_input("What about your internship?").await.unwrap());

        let turns = repl.session().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[0].text, "What about your internship?");
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(repl.session().last_sources()[0].chunk.chunk_id, "exp_001");
        assert_eq!(repl.telemetry().get_stats().questions, 1);
    }

    #[tokio::test]
    async fn test_exit_words_end_session() {
        let mut repl = session(Arc::new(Echo), false).await;
        assert!(!repl.handle_input("exit").await.unwrap());
        assert!(!repl.handle_input("EXIT").await.unwrap());
        assert!(!repl.handle_input("/exit").await.unwrap());
        assert!(repl.session().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_is_ignored() {
        let mut repl = session(Arc::new(Echo), false).await;
        assert!(repl.handle_input("   ").await.unwrap());
        assert!(repl.session().is_empty());
    }

    #[tokio::test]
    async fn test_ask_suggested_question() {
        let mut repl = session(Arc::new(Echo), true).await;
        assert!(repl.handle_input("/ask 1").await.unwrap());
        assert_eq!(
            repl.session().turns()[0].text,
            "What did you do during your internship?"
        );
    }

    #[tokio::test]
    async fn test_unreachable_model_fallback_is_recorded() {
        let mut repl = session(Arc::new(Offline), false).await;
        repl.handle_input("rust?").await.unwrap();
        assert_eq!(repl.session().turns()[1].text, UNREACHABLE_TEXT);
        assert_eq!(repl.telemetry().get_stats().generation_failures, 1);
    }

    #[test]
    fn test_repl_config_default() {
        let config = ReplConfig::default();
        assert!(!config.stream);
        assert_eq!(config.preview_chars, 200);
        assert!(config.history_file.is_none());
    }

    #[tokio::test]
    async fn test_question_kept_when_retrieval_fails() {
        let mut repl = session(Arc::new(Echo), false).await;

        assert!(repl.handle_input("Is the offline demo ready?").await.is_err());

        let turns = repl.session().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[0].text, "Is the offline demo ready?");
        assert!(repl.session().last_sources().is_empty());
    }
}
