//! resumebuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use resumebuddy::{
    cli::{Args, Commands, Config, Verbosity},
    doctor::Doctor,
    embedding::{self, Embedder},
    extract::{build_chunk_file, read_chunks, read_pdf},
    generation::OllamaClient,
    index::{IndexPaths, IndexStore},
    rag::{RAGConfig, RAGPipeline, RetrievalEngine},
    repl::{
        display::{answer_rule, format_search_result},
        input::InputHandler,
        ReplConfig, ReplSession,
    },
    telemetry::TelemetryCollector,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate()?;

    let verbosity = if args.verbosity_explicit() {
        args.verbosity()
    } else {
        Verbosity::from_name(&config.telemetry.default_verbosity).unwrap_or(Verbosity::Normal)
    };
    init_logging(verbosity);
    if !config.telemetry.color_output {
        colored::control::set_override(false);
    }

    match args.command() {
        Commands::Inspect { pdf, chars } => inspect(&config, pdf, chars),
        Commands::Chunks { pdf, out } => build_chunks(&config, pdf, out),
        Commands::Index { from_pdf } => build_index(&config, from_pdf, verbosity).await,
        Commands::Search { question, top_k } => search(&config, question, top_k, verbosity).await,
        Commands::Ask { question, sources } => {
            ask(&config, &question, sources, args.stream, verbosity).await
        }
        Commands::Chat => run_chat(&config, args.stream, verbosity).await,
        Commands::Doctor => run_doctor(&config).await,
        Commands::Config { init } => show_config(&config, args.config, init),
    }
}

/// env_logger at the level the flags ask for; `RUST_LOG` overrides
fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::new()
        .filter_level(verbosity.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn spinner(message: &str, verbosity: Verbosity) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn inspect(config: &Config, pdf: Option<PathBuf>, chars: usize) -> Result<()> {
    let path = pdf.unwrap_or_else(|| config.pdf_path());
    println!("Opening PDF...");
    let text = read_pdf(&path)?;

    println!("Total pages: {}", text.page_count());
    println!("\n--- PAGE 1 TEXT PREVIEW ---\n");
    println!("{}", text.first_page_preview(chars));
    Ok(())
}

fn build_chunks(config: &Config, pdf: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let pdf = pdf.unwrap_or_else(|| config.pdf_path());
    let out = out.unwrap_or_else(|| config.chunks_path());
    let today = chrono::Local::now().date_naive();

    let chunks = build_chunk_file(&pdf, &out, &config.sections, today)
        .with_context(|| format!("Failed to chunk {}", pdf.display()))?;

    for chunk in &chunks {
        println!(
            "  {} {:<12} [{}] {}",
            "•".cyan(),
            chunk.chunk_id,
            chunk.kind,
            chunk.title
        );
    }
    println!("Saved {} chunks to {}", chunks.len(), out.display());
    Ok(())
}

async fn build_index(config: &Config, from_pdf: bool, verbosity: Verbosity) -> Result<()> {
    if from_pdf {
        build_chunks(config, None, None)?;
    }

    let chunks_path = config.chunks_path();
    let chunks = read_chunks(&chunks_path).with_context(|| {
        format!(
            "Cannot read {}; run `resumebuddy chunks` first",
            chunks_path.display()
        )
    })?;

    let pb = spinner("Loading embedding model...", verbosity);
    let embedder = embedding::from_config(&config.embedding, &config.ollama_url()).await;
    let embedder = match embedder {
        Ok(embedder) => embedder,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).context("Failed to load embedding model");
        }
    };

    pb.set_message(format!("Creating embeddings for {} chunks...", chunks.len()));
    let store = IndexStore::build(chunks, embedder.as_ref()).await;
    pb.finish_and_clear();
    let store = store?;

    let paths = IndexPaths::new(config.index_path(), config.metadata_path());
    store.save(&paths)?;

    println!("{} Index built successfully ({}).", "✓".green(), store.model());
    println!("Vectors indexed: {}", store.len());
    Ok(())
}

/// Load the index and an embedder that matches it
async fn load_engine(config: &Config, verbosity: Verbosity) -> Result<RetrievalEngine> {
    let paths = IndexPaths::new(config.index_path(), config.metadata_path());
    let store = IndexStore::load(&paths)
        .context("Failed to load the index; run `resumebuddy index` first")?;

    let pb = spinner("Loading model and index...", verbosity);
    let embedder = embedding::from_config(&config.embedding, &config.ollama_url()).await;
    pb.finish_and_clear();
    let embedder: Arc<dyn Embedder> =
        Arc::from(embedder.context("Failed to load embedding model")?);

    Ok(RetrievalEngine::new(Arc::new(store), embedder)?)
}

async fn build_pipeline(
    config: &Config,
    verbosity: Verbosity,
    telemetry: Option<TelemetryCollector>,
) -> Result<RAGPipeline> {
    let engine = load_engine(config, verbosity)
        .await?
        .with_top_k(config.retrieval.answer_top_k);
    let client = OllamaClient::from_config(&config.ollama)?;

    let rag_config = RAGConfig::from(&config.retrieval);
    let pipeline = RAGPipeline::with_config(engine, Arc::new(client), rag_config);
    Ok(match telemetry {
        Some(telemetry) => pipeline.with_telemetry(telemetry),
        None => pipeline,
    })
}

async fn search(
    config: &Config,
    question: Option<String>,
    top_k: Option<usize>,
    verbosity: Verbosity,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.search_top_k);
    let engine = load_engine(config, verbosity).await?.with_top_k(top_k);
    let preview = config.retrieval.preview_chars;

    if let Some(question) = question {
        return print_search(&engine, &question, preview).await;
    }

    let mut input = InputHandler::new()?;
    input.set_prompt("\nAsk a recruiter-style question (or type 'exit'): ");
    while let Some(line) = input.read_line()? {
        if line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        print_search(&engine, &line, preview).await?;
    }
    Ok(())
}

async fn print_search(engine: &RetrievalEngine, question: &str, preview: usize) -> Result<()> {
    let results = engine.retrieve(question).await?;

    println!("\nTop relevant resume sections:\n");
    for result in &results {
        println!("{}", format_search_result(result, preview));
    }
    Ok(())
}

async fn ask(
    config: &Config,
    question: &str,
    show_sources: bool,
    stream: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let pipeline = build_pipeline(config, verbosity, None).await?;

    println!("\nAnswer:\n");
    let answer = if stream {
        let answer = pipeline
            .answer_streaming(question, |fragment| {
                print!("{}", fragment);
                let _ = std::io::Write::flush(&mut std::io::stdout());
            })
            .await?;
        if answer.is_answered() {
            println!();
        } else {
            println!("{}", answer.text);
        }
        answer
    } else {
        let pb = spinner("Thinking...", verbosity);
        let answer = pipeline.answer(question).await;
        pb.finish_and_clear();
        let answer = answer?;
        println!("{}", answer.text);
        answer
    };
    println!("\n{}\n", answer_rule());

    if show_sources || verbosity.show_details() {
        println!("Top relevant resume sections:\n");
        for source in &answer.sources {
            println!("{}", format_search_result(source, config.retrieval.preview_chars));
        }
    }
    Ok(())
}

async fn run_chat(config: &Config, stream: bool, verbosity: Verbosity) -> Result<()> {
    let telemetry = TelemetryCollector::new();
    let pipeline = build_pipeline(config, verbosity, Some(telemetry.clone())).await?;

    let repl_config = ReplConfig {
        history_file: Some(config.history_path()),
        stream,
        preview_chars: config.retrieval.preview_chars,
        verbose: verbosity.show_details(),
    };
    let mut session = ReplSession::new(pipeline, telemetry, repl_config)?;

    session.show_welcome(env!("CARGO_PKG_VERSION"));
    session.run().await?;

    if verbosity.show_details() {
        println!("\n{}", session.telemetry().summary());
    }
    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::new(config.clone());
    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    if !Doctor::overall_status(&checks) {
        std::process::exit(1);
    }
    Ok(())
}

fn show_config(config: &Config, path: Option<PathBuf>, init: bool) -> Result<()> {
    let path = path.or_else(Config::default_path);

    if init {
        let path = path.context("Cannot determine a config file location")?;
        config.save(&path)?;
        println!("{} Wrote {}", "✓".green(), path.display());
        return Ok(());
    }

    println!("\n{}", "resumebuddy configuration".bold().cyan());
    match &path {
        Some(path) if path.exists() => println!("{}\n", format!("({})", path.display()).dimmed()),
        _ => println!("{}\n", "(built-in defaults)".dimmed()),
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}
