// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall status` command implementation.
//!
//! Prints the active embedding provider, search mode, store counts and
//! the health of each adapter.
//! `--json` emits the raw status for scripting; colors are disabled with
//! `--plain` or when stdout is not a TTY.

use std::io::IsTerminal;

use recall_core::RecallError;
use recall_memory::{AdapterStatus, MemoryManager, MemoryStatus};

pub async fn run_status(
    manager: &MemoryManager,
    json: bool,
    plain: bool,
) -> Result<(), RecallError> {
    let status = manager.status().await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        for line in render_status(&status, use_color) {
            println!("{line}");
        }
    }
    Ok(())
}

fn render_status(status: &MemoryStatus, use_color: bool) -> Vec<String> {
    use colored::Colorize;

    let provider = match (&status.provider_id, &status.model) {
        (Some(id), Some(model)) => format!("{id} ({model})"),
        (Some(id), None) => id.clone(),
        _ => "none".to_string(),
    };
    let mode = if !use_color {
        status.search_mode.clone()
    } else if status.search_mode == "hybrid" {
        status.search_mode.green().to_string()
    } else {
        status.search_mode.yellow().to_string()
    };

    let mut lines = vec![
        String::new(),
        "  recall status".to_string(),
        format!("  {}", "-".repeat(35)),
        format!("    Mode:       {mode}"),
        format!("    Provider:   {provider}"),
        format!("    Fragments:  {}", status.fragment_count),
        format!("    Cached:     {}", status.cache_count),
        format!("    Knowledge:  {}", status.knowledge_doc_count),
        String::new(),
        "  adapters".to_string(),
        format!("  {}", "-".repeat(35)),
    ];
    lines.push(render_adapter(&status.storage, use_color));
    if let Some(provider) = &status.provider {
        lines.push(render_adapter(provider, use_color));
    }
    lines.push(String::new());
    lines
}

fn render_adapter(adapter: &AdapterStatus, use_color: bool) -> String {
    use colored::Colorize;

    let health = if !use_color {
        adapter.health.clone()
    } else if adapter.health == "healthy" {
        adapter.health.green().to_string()
    } else if adapter.health.starts_with("degraded") {
        adapter.health.yellow().to_string()
    } else {
        adapter.health.red().to_string()
    };
    format!(
        "    {:<10}  {} {}  {health}",
        format!("{}:", adapter.kind),
        adapter.name,
        adapter.version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::AdapterType;

    fn adapter(kind: AdapterType, name: &str, health: &str) -> AdapterStatus {
        AdapterStatus {
            kind,
            name: name.to_string(),
            version: "0.1.0".to_string(),
            health: health.to_string(),
        }
    }

    fn status(provider: Option<&str>) -> MemoryStatus {
        MemoryStatus {
            provider_id: provider.map(str::to_string),
            model: provider.map(|_| "nomic-embed-text".to_string()),
            search_mode: if provider.is_some() { "hybrid" } else { "keyword" }.to_string(),
            fragment_count: 12,
            cache_count: 7,
            knowledge_doc_count: 2,
            storage: adapter(AdapterType::Storage, "sqlite", "healthy"),
            provider: provider
                .map(|name| adapter(AdapterType::Embedding, name, "unhealthy: connection refused")),
        }
    }

    #[test]
    fn plain_output_lists_counts() {
        let lines = render_status(&status(Some("ollama")), false);
        assert!(lines.contains(&"    Mode:       hybrid".to_string()));
        assert!(lines.contains(&"    Provider:   ollama (nomic-embed-text)".to_string()));
        assert!(lines.contains(&"    Fragments:  12".to_string()));
    }

    #[test]
    fn keyword_mode_has_no_provider() {
        let lines = render_status(&status(None), false);
        assert!(lines.contains(&"    Provider:   none".to_string()));
        assert!(!lines.iter().any(|l| l.contains("embedding:")));
    }

    #[test]
    fn adapters_are_listed_with_health() {
        let lines = render_status(&status(Some("ollama")), false);
        assert!(lines.contains(&"    storage:    sqlite 0.1.0  healthy".to_string()));
        assert!(lines.contains(
            &"    embedding:  ollama 0.1.0  unhealthy: connection refused".to_string()
        ));
    }

    #[test]
    fn status_serializes() {
        let json = serde_json::to_string(&status(None)).unwrap();
        assert!(json.contains("\"search_mode\":\"keyword\""));
        assert!(json.contains("\"provider_id\":null"));
        assert!(json.contains("\"kind\":\"storage\""));
    }
}
