// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall search` command implementation.

use clap::Args;
use recall_core::RecallError;
use recall_memory::{MemoryManager, SearchOptions, SearchResult};

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub query: String,
    #[arg(long, default_value = "default")]
    pub scope: String,
    /// Maximum results (defaults to `memory.max_results`).
    #[arg(long)]
    pub limit: Option<usize>,
    /// Drop results below this score (defaults to `memory.min_score`).
    #[arg(long)]
    pub min_score: Option<f32>,
    #[arg(long)]
    pub no_mmr: bool,
    #[arg(long)]
    pub no_decay: bool,
    /// Output as JSON.
    #[arg(long, conflicts_with = "prompt")]
    pub json: bool,
    /// Print the prompt digest instead of a table.
    #[arg(long)]
    pub prompt: bool,
}

impl SearchArgs {
    fn options(&self, defaults: SearchOptions) -> SearchOptions {
        let mut options = defaults;
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        if let Some(min_score) = self.min_score {
            options = options.with_min_score(min_score);
        }
        if self.no_mmr {
            options = options.without_mmr();
        }
        if self.no_decay {
            options = options.without_decay();
        }
        options
    }
}

pub async fn run_search(manager: &MemoryManager, args: &SearchArgs) -> Result<(), RecallError> {
    let options = args.options(manager.search_options());
    let results = manager.search(&args.query, &args.scope, &options).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&results)
            .map_err(|e| RecallError::Internal(format!("failed to serialize results: {e}")))?;
        println!("{json}");
    } else if args.prompt {
        print!("{}", manager.format_for_prompt(&results));
    } else if results.is_empty() {
        println!("no matches");
    } else {
        for line in render_table(&results) {
            println!("{line}");
        }
    }
    Ok(())
}

fn render_table(results: &[SearchResult]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let text = r.text.split_whitespace().collect::<Vec<_>>().join(" ");
            format!(
                "{:>2}. {:.3}  {:<7}  {:<9}  {text}",
                i + 1,
                r.score,
                r.source.to_string(),
                r.origin.to_string()
            )
        })
        .collect()
}
