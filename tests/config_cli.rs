//! Configuration files and command-line flags working together

use clap::Parser;
use tempfile::TempDir;

use resumebuddy::cli::{Args, Commands, Config};
use resumebuddy::extract::chunk_text;
use resumebuddy::rag::{ContextBuilder, RAGConfig, RetrievedChunk};
use resumebuddy::types::{Chunk, ChunkKind};

#[test]
fn test_custom_sections_drive_chunking() {
    let config = Config::from_toml(
        r#"
[[sections]]
header = "SKILLS"
kind = "skills"
chunk_id = "skills_001"
title = "Skills"

[[sections]]
header = "WORK HISTORY"
kind = "experience"
chunk_id = "exp_001"
title = "Work History"
"#,
    )
    .unwrap();

    let day = chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    let chunks = chunk_text(
        "Name\nWORK HISTORY\nBarista\nSKILLS\nLatte art\n",
        &config.sections,
        day,
    );

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].kind, ChunkKind::Skills);
    assert_eq!(chunks[0].content, "Latte art");
    assert_eq!(chunks[1].title, "Work History");
    assert_eq!(chunks[1].content, "Barista");
}

#[test]
fn test_saved_config_loads_back_with_flag_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.retrieval.search_top_k = 4;
    config.paths.pdf = "cv.pdf".to_string();
    config.save(&path).unwrap();

    let path_arg = path.display().to_string();
    let args = Args::try_parse_from([
        "resumebuddy",
        "--config",
        path_arg.as_str(),
        "--model",
        "llama3",
        "search",
    ])
    .unwrap();

    let mut loaded = Config::load(args.config.as_deref()).unwrap();
    args.apply_overrides(&mut loaded);

    assert_eq!(loaded.retrieval.search_top_k, 4);
    assert_eq!(loaded.paths.pdf, "cv.pdf");
    assert_eq!(loaded.ollama.model, "llama3");
    assert_eq!(loaded.ollama_url(), "http://localhost:11434");
    assert_eq!(
        args.command(),
        Commands::Search {
            question: None,
            top_k: None
        }
    );
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[retrieval]\nanswer_top_k = 0\n").unwrap();

    assert!(Config::load(Some(path.as_path())).is_err());
}

#[test]
fn test_largest_context_budget_builds_context() {
    let config =
        Config::from_toml("[retrieval]\nmax_context_tokens = 9223372036854775807\n").unwrap();
    let builder = ContextBuilder::with_config(RAGConfig::from(&config.retrieval).context);

    let day = chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    let sources = vec![RetrievedChunk {
        rank: 1,
        score: 0.9,
        chunk: Chunk::new("skills_001", ChunkKind::Skills, "Skills", "Rust", day),
    }];

    let context = builder.build(&sources);
    assert_eq!(context.text, "Skills:\nRust");
}
