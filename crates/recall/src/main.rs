// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - hybrid memory and retrieval engine.
//!
//! This is the binary entry point: it loads configuration, installs the
//! tracing subscriber and runs one subcommand against the memory engine.

mod knowledge;
mod search;
mod status;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recall_config::RecallConfig;
use recall_core::{FragmentSource, RecallError};
use recall_memory::MemoryManager;

/// Recall - hybrid memory and retrieval engine.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Save text (use `-` to read stdin) into a scope.
    Save {
        text: String,
        #[arg(long, default_value = "default")]
        scope: String,
        /// Conversation role recorded with the raw message.
        #[arg(long, default_value = "user")]
        role: String,
        /// Store the fragments in the shared knowledge scope.
        #[arg(long)]
        knowledge: bool,
    },
    /// Search a scope (knowledge is always included).
    Search(search::SearchArgs),
    /// Ingest a knowledge document from a file (or `-` for stdin).
    Ingest {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "general")]
        category: String,
        /// Replace the content of an existing document.
        #[arg(long, value_name = "DOC_ID")]
        replace: Option<String>,
    },
    /// List knowledge documents.
    Docs {
        #[arg(long)]
        json: bool,
    },
    /// Delete a knowledge document and its fragments.
    ForgetDoc { id: String },
    /// Show the most recent raw messages of a scope.
    History {
        #[arg(long, default_value = "default")]
        scope: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show engine status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Embed fragments that were stored without a vector.
    Backfill {
        #[arg(long, default_value_t = 256)]
        batch: usize,
    },
    /// Apply the embedding cache bounds now.
    Evict,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &RecallConfig) -> Result<(), RecallError> {
    let manager = MemoryManager::from_config(config).await?;
    let result = dispatch(command, &manager).await;
    if let Err(e) = manager.close().await {
        tracing::warn!(error = %e, "failed to close storage");
    }
    result
}

async fn dispatch(command: Commands, manager: &MemoryManager) -> Result<(), RecallError> {
    match command {
        Commands::Save {
            text,
            scope,
            role,
            knowledge,
        } => {
            let text = read_input(&text)?;
            let source = if knowledge {
                FragmentSource::Knowledge
            } else {
                source_for_role(&role)
            };
            let report = manager.save(&scope, &role, &text, source).await?;
            println!(
                "saved {} chunk(s): {} new, {} duplicate, {} embedded",
                report.chunks, report.inserted, report.duplicates, report.embedded
            );
            Ok(())
        }
        Commands::Search(args) => search::run_search(manager, &args).await,
        Commands::Ingest {
            path,
            title,
            category,
            replace,
        } => knowledge::run_ingest(manager, &path, title, &category, replace.as_deref()).await,
        Commands::Docs { json } => knowledge::run_docs(manager, json).await,
        Commands::ForgetDoc { id } => {
            manager.delete_knowledge(&id).await?;
            println!("deleted knowledge document {id}");
            Ok(())
        }
        Commands::History { scope, limit } => {
            for message in manager.recent_messages(&scope, limit).await? {
                println!("[{}] {}: {}", message.created_at, message.role, message.content);
            }
            Ok(())
        }
        Commands::Status { json, plain } => status::run_status(manager, json, plain).await,
        Commands::Backfill { batch } => {
            let updated = manager.backfill_embeddings(batch).await?;
            println!("embedded {updated} fragment(s)");
            Ok(())
        }
        Commands::Evict => {
            let removed = manager.evict_cache().await?;
            println!("evicted {removed} cache entr{}", if removed == 1 { "y" } else { "ies" });
            Ok(())
        }
    }
}

/// Role names other than `assistant` are recorded as user turns.
fn source_for_role(role: &str) -> FragmentSource {
    if role.eq_ignore_ascii_case("assistant") {
        FragmentSource::Assistant
    } else {
        FragmentSource::User
    }
}

/// `-` reads all of stdin, anything else is taken literally.
fn read_input(arg: &str) -> Result<String, RecallError> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| RecallError::Internal(format!("failed to read stdin: {e}")))?;
    Ok(buf)
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over `logging.level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "recall", "search", "rust tips", "--scope", "s1", "--limit", "3", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "rust tips");
                assert_eq!(args.scope, "s1");
                assert_eq!(args.limit, Some(3));
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["recall", "status", "--config", "/tmp/r.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
    }

    #[test]
    fn save_defaults() {
        let cli = Cli::try_parse_from(["recall", "save", "hello"]).unwrap();
        match cli.command {
            Commands::Save {
                scope,
                role,
                knowledge,
                ..
            } => {
                assert_eq!(scope, "default");
                assert_eq!(role, "user");
                assert!(!knowledge);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn roles_map_to_sources() {
        assert_eq!(source_for_role("assistant"), FragmentSource::Assistant);
        assert_eq!(source_for_role("Assistant"), FragmentSource::Assistant);
        assert_eq!(source_for_role("user"), FragmentSource::User);
        assert_eq!(source_for_role("system"), FragmentSource::User);
    }

    #[test]
    fn literal_input_passes_through() {
        assert_eq!(read_input("plain text").unwrap(), "plain text");
    }
}
