//! Command-line argument parsing for resumebuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::config::Config;

/// resumebuddy - Answer recruiter questions from your résumé with a local model
#[derive(Parser, Debug)]
#[command(name = "resumebuddy")]
#[command(version)]
#[command(about = "Résumé question answering over a local Ollama model", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ollama host (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Ollama port (overrides config)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Ollama generation model (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stream answers token by token
    #[arg(long, global = true)]
    pub stream: bool,

    /// Subcommand (defaults to chat)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show page count and a first-page text preview of the résumé PDF
    Inspect {
        /// PDF to read (defaults to paths.pdf)
        #[arg(value_name = "PDF")]
        pdf: Option<PathBuf>,

        /// Characters of page one to print
        #[arg(long, default_value_t = 1500)]
        chars: usize,
    },

    /// Extract the résumé PDF into the chunk file
    Chunks {
        /// PDF to read (defaults to paths.pdf)
        #[arg(value_name = "PDF")]
        pdf: Option<PathBuf>,

        /// Output JSONL (defaults to paths.chunks)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Embed the chunk file and write the vector index
    Index {
        /// Re-extract chunks from the PDF first
        #[arg(long)]
        from_pdf: bool,
    },

    /// Show the résumé sections nearest to a question
    Search {
        /// Question; prompts repeatedly when omitted
        #[arg(value_name = "QUESTION")]
        question: Option<String>,

        /// Number of sections to list
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Answer a single question and exit
    Ask {
        /// Recruiter-style question
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Also list the sections the answer drew on
        #[arg(long)]
        sources: bool,
    },

    /// Start the interactive chat
    Chat,

    /// Run pipeline diagnostics and health checks
    Doctor,

    /// Display the effective configuration
    Config {
        /// Write the configuration to the config file path
        #[arg(long)]
        init: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Whether any verbosity flag was given
    pub fn verbosity_explicit(&self) -> bool {
        self.quiet || self.verbose > 0
    }

    /// Command to run; bare `resumebuddy` opens the chat
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }

    /// Apply host/port/model flags on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.ollama.host = host.clone();
        }
        if let Some(port) = self.port {
            config.ollama.port = port;
        }
        if let Some(model) = &self.model {
            config.ollama.model = model.clone();
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Parse the `default_verbosity` config value
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Log filter for env_logger; `RUST_LOG` still wins when set
    pub fn log_level(&self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Error,
            Verbosity::Normal => log::LevelFilter::Warn,
            Verbosity::Verbose => log::LevelFilter::Info,
            Verbosity::VeryVerbose => log::LevelFilter::Debug,
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show retrieval details
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["resumebuddy", "-q"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["resumebuddy"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["resumebuddy", "-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["resumebuddy", "-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(Verbosity::Quiet.log_level(), log::LevelFilter::Error);
        assert_eq!(Verbosity::Normal.log_level(), log::LevelFilter::Warn);
        assert_eq!(Verbosity::Verbose.log_level(), log::LevelFilter::Info);
        assert_eq!(Verbosity::VeryVerbose.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_default_command_is_chat() {
        assert_eq!(parse(&["resumebuddy"]).command(), Commands::Chat);
    }

    #[test]
    fn test_ask_with_global_flags_after_subcommand() {
        let args = parse(&["resumebuddy", "ask", "What skills?", "--stream", "-m", "llama3"]);
        assert!(args.stream);
        assert_eq!(args.model.as_deref(), Some("llama3"));
        assert_eq!(
            args.command(),
            Commands::Ask {
                question: "What skills?".to_string(),
                sources: false
            }
        );
    }

    #[test]
    fn test_search_top_k() {
        let args = parse(&["resumebuddy", "search", "-k", "5", "research"]);
        assert_eq!(
            args.command(),
            Commands::Search {
                question: Some("research".to_string()),
                top_k: Some(5)
            }
        );
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Args::try_parse_from(["resumebuddy", "ask"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let args = parse(&["resumebuddy", "--host", "10.0.0.5", "--port", "8080"]);
        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.ollama.host, "10.0.0.5");
        assert_eq!(config.ollama.port, 8080);
        assert_eq!(config.ollama.model, "mistral");
    }

    #[test]
    fn test_verbosity_names_roundtrip() {
        for v in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::VeryVerbose,
        ] {
            assert_eq!(Verbosity::from_name(v.as_str()), Some(v));
        }
        assert_eq!(Verbosity::from_name("loud"), None);
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Verbose.show_details());
    }
}
