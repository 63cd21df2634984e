//! Display manager for the terminal UI
//!
//! Manages the retrieval spinner, answer framing and formatted listings.

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::rag::RetrievedChunk;
use crate::types::{ChatRole, ChatTurn};

/// Width of the rule printed after each answer
pub const ANSWER_RULE_WIDTH: usize = 70;

/// Width of the rule printed after each search hit
pub const RESULT_RULE_WIDTH: usize = 60;

/// Rule printed after each answer
pub fn answer_rule() -> String {
    "=".repeat(ANSWER_RULE_WIDTH)
}

/// One search hit as printed by `search` and `/sources`:
/// rank and title, type, score to three decimals, content preview
pub fn format_search_result(result: &RetrievedChunk, preview_chars: usize) -> String {
    format!(
        "{}. {}\n   Type: {}\n   Score: {:.3}\n   Preview: {}...\n{}",
        result.rank,
        result.chunk.title,
        result.chunk.kind,
        result.score,
        result.chunk.preview(preview_chars),
        "-".repeat(RESULT_RULE_WIDTH)
    )
}

/// Display manager for the chat UI
pub struct DisplayManager {
    current_bar: Option<ProgressBar>,
    update_interval: Duration,
}

impl DisplayManager {
    /// Create new display manager
    pub fn new() -> Self {
        DisplayManager {
            current_bar: None,
            update_interval: Duration::from_millis(100),
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, chunks: usize) {
        let width = 64;
        let rule = "=".repeat(width);
        let title = format!("  Resume Chatbot {} - Local, Conversational", version);
        let info = format!("  Model: {} | Indexed sections: {}", model, chunks);

        println!("\n{}", rule.cyan());
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", rule.cyan());
        println!(
            "Type 'exit' to quit ({} for commands, {} for ideas)\n",
            "/help".green(),
            "/suggest".green()
        );
    }

    /// Start a spinner while retrieval and generation run
    pub fn start_spinner(&mut self, message: &str) -> ProgressBar {
        self.finish_current();

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(self.update_interval);

        self.current_bar = Some(pb.clone());
        pb
    }

    /// Finish current spinner
    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    pub fn show_answer_header(&self) {
        println!("\n{}\n", "Answer:".bold());
    }

    pub fn show_answer_footer(&self) {
        println!("\n{}\n", answer_rule());
    }

    /// Print a finished answer between its header and rule
    pub fn show_answer(&self, text: &str) {
        self.show_answer_header();
        println!("{}", text);
        self.show_answer_footer();
    }

    /// Display streaming tokens
    pub fn stream_token(&self, token: &str) {
        print!("{}", token);
        let _ = io::stdout().flush();
    }

    /// Print retrieved chunks in search layout
    pub fn show_sources(&self, sources: &[RetrievedChunk], preview_chars: usize) {
        if sources.is_empty() {
            println!("{}", "No sources yet. Ask a question first.".yellow());
            return;
        }

        self.show_section("Top relevant resume sections:");
        for source in sources {
            println!("{}", format_search_result(source, preview_chars));
        }
        println!();
    }

    /// Print chat turns, oldest first
    pub fn show_history(&self, turns: &[ChatTurn]) {
        if turns.is_empty() {
            println!("{}", "No questions asked yet.".yellow());
            return;
        }

        self.show_section(&format!("Chat History (last {} turns):", turns.len()));
        for turn in turns {
            let label = match turn.role {
                ChatRole::User => "You".green().bold(),
                ChatRole::Assistant => "Candidate".cyan().bold(),
            };
            println!("  {}: {}", label, turn.text);
        }
        println!();
    }

    /// Numbered list of suggested questions
    pub fn show_suggestions(&self, questions: &[&str]) {
        self.show_section("Suggested Questions:");
        for (i, question) in questions.iter().enumerate() {
            self.show_numbered(i + 1, question);
        }
        println!("\nUse {} to ask one.\n", "/ask <n>".cyan());
    }

    /// Display error message
    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    /// Display warning message
    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    /// Display info message
    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    /// Display debug message (only if verbose)
    pub fn show_debug(&self, debug: &str, verbose: bool) {
        if verbose {
            println!("{} {}", "Debug:".dimmed(), debug.dimmed());
        }
    }

    /// Clear screen
    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))
    }

    /// Show section header
    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(RESULT_RULE_WIDTH).cyan());
    }

    /// Show numbered item
    pub fn show_numbered(&self, index: usize, text: &str) {
        println!("  {}. {}", index.to_string().cyan(), text);
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
