//! Command handler for chat built-in commands
//!
//! Slash commands inspect or reset the session. The bare word `exit` (any
//! case) also ends the loop.

use anyhow::Result;
use colored::*;

use crate::repl::display::DisplayManager;
use crate::repl::session::SessionManager;
use crate::telemetry::TelemetryCollector;

/// Questions offered by `/suggest`
pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What did you do during your internship?",
    "Tell me about your research at Penn State",
    "What was your Tesla project about?",
    "What skills are you strongest in?",
    "What roles are you best suited for?",
];

/// Chat command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    History { limit: Option<usize> },
    Suggest,
    /// Ask suggested question `index` (1-based)
    Ask { index: usize },
    Sources,
    Stats,
    Clear,
    /// `None` toggles
    Verbose { enable: Option<bool> },
    Reset,
    Unknown { input: String },
}

/// What the loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    Exit,
    /// Answer this question as if it had been typed
    Ask(String),
}

/// Command handler for parsing and executing chat commands
pub struct CommandHandler {
    verbose: bool,
    preview_chars: usize,
}

impl CommandHandler {
    /// Create new command handler
    pub fn new() -> Self {
        CommandHandler {
            verbose: false,
            preview_chars: 200,
        }
    }

    /// Preview length used by `/sources`
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    /// Parse input string into a command
    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();

        if trimmed.eq_ignore_ascii_case("exit") {
            return Command::Exit;
        }

        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown {
                input: input.to_string(),
            };
        };

        let parts: Vec<&str> = body.split_whitespace().collect();
        if parts.is_empty() {
            return Command::Unknown {
                input: input.to_string(),
            };
        }

        match parts[0].to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "history" => {
                let limit = parts.get(1).and_then(|s| s.parse().ok());
                Command::History { limit }
            }
            "suggest" | "suggestions" => Command::Suggest,
            "ask" => match parts.get(1).and_then(|s| s.parse::<usize>().ok()) {
                Some(index) => Command::Ask { index },
                None => Command::Unknown {
                    input: input.to_string(),
                },
            },
            "sources" | "src" => Command::Sources,
            "stats" => Command::Stats,
            "clear" | "cls" => Command::Clear,
            "verbose" => {
                let enable = parts.get(1).map(|s| {
                    let s = s.to_lowercase();
                    s == "on" || s == "1" || s == "true"
                });
                Command::Verbose { enable }
            }
            "reset" => Command::Reset,
            _ => Command::Unknown {
                input: input.to_string(),
            },
        }
    }

    /// Execute a command
    pub fn execute(
        &mut self,
        command: Command,
        session: &mut SessionManager,
        display: &DisplayManager,
        telemetry: &TelemetryCollector,
    ) -> Result<CommandResult> {
        match command {
            Command::Help => {
                self.show_help();
            }
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                return Ok(CommandResult::Exit);
            }
            Command::History { limit } => {
                display.show_history(session.history(limit.unwrap_or(10)));
            }
            Command::Suggest => {
                display.show_suggestions(&SUGGESTED_QUESTIONS);
            }
            Command::Ask { index } => match suggested_question(index) {
                Some(question) => return Ok(CommandResult::Ask(question.to_string())),
                None => display.show_warning(&format!(
                    "No suggested question {}; pick 1-{}",
                    index,
                    SUGGESTED_QUESTIONS.len()
                )),
            },
            Command::Sources => {
                display.show_sources(session.last_sources(), self.preview_chars);
            }
            Command::Stats => {
                println!("\n{}", telemetry.summary());
                println!("Chat turns:         {}", session.turns().len());
                println!(
                    "Session time:       {}s\n",
                    session.session_duration().as_secs()
                );
            }
            Command::Clear => {
                display.clear_screen()?;
            }
            Command::Verbose { enable } => {
                self.verbose = enable.unwrap_or(!self.verbose);
                let status = if self.verbose { "enabled" } else { "disabled" };
                println!("{}", format!("Verbose mode {}", status).cyan());
            }
            Command::Reset => {
                session.reset();
                println!("{}", "Session reset. Chat history cleared.".yellow());
            }
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
            }
        }
        Ok(CommandResult::Continue)
    }

    /// Display help information
    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/history [n]", "Show last n chat turns (default: 10)"),
            ("/suggest", "List suggested recruiter questions"),
            ("/ask <n>", "Ask suggested question n"),
            ("/sources", "Show resume sections behind the last answer"),
            ("/stats", "Show session statistics"),
            ("/verbose [on|off]", "Toggle retrieval details"),
            ("/reset", "Clear chat history"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, exit", "Leave the chat"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<20} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Type a question directly (no / prefix)");
        println!("  - Press {} or type {} to exit", "Ctrl-D".cyan(), "exit".cyan());
        println!();
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode
    pub fn set_verbose(&mut self, enable: bool) {
        self.verbose = enable;
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Suggested question by 1-based index
pub fn suggested_question(index: usize) -> Option<&'static str> {
    index
        .checked_sub(1)
        .and_then(|i| SUGGESTED_QUESTIONS.get(i))
        .copied()
}

/// Check if input is a command rather than a question
pub fn is_command(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.starts_with('/') || trimmed.eq_ignore_ascii_case("exit")
}
