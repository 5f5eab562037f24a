// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall ingest` and `recall docs` command implementations.

use std::io::Read;
use std::path::Path;

use recall_core::RecallError;
use recall_memory::MemoryManager;

pub async fn run_ingest(
    manager: &MemoryManager,
    path: &Path,
    title: Option<String>,
    category: &str,
    replace: Option<&str>,
) -> Result<(), RecallError> {
    let content = read_document(path)?;
    let title = title.unwrap_or_else(|| default_title(path));

    let doc = match replace {
        Some(id) => manager.update_knowledge(id, &title, &content, category).await?,
        None => manager.ingest_knowledge(&title, &content, category).await?,
    };
    println!(
        "{} \"{}\" ({}): {} chunk(s)",
        doc.id, doc.title, doc.category, doc.chunk_count
    );
    Ok(())
}

pub async fn run_docs(manager: &MemoryManager, json: bool) -> Result<(), RecallError> {
    let docs = manager.list_knowledge().await?;
    if json {
        let out = serde_json::to_string_pretty(&docs)
            .map_err(|e| RecallError::Internal(format!("failed to serialize documents: {e}")))?;
        println!("{out}");
        return Ok(());
    }
    if docs.is_empty() {
        println!("no knowledge documents");
    }
    for doc in docs {
        println!(
            "{}  {:<10}  {:>3} chunk(s)  {}",
            doc.id, doc.category, doc.chunk_count, doc.title
        );
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<String, RecallError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| RecallError::Internal(format!("failed to read stdin: {e}")))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|e| {
        RecallError::Internal(format!("failed to read {}: {e}", path.display()))
    })
}

/// File stem, or `untitled` for stdin.
fn default_title(path: &Path) -> String {
    path.file_stem()
        .filter(|_| path != Path::new("-"))
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_defaults_to_file_stem() {
        assert_eq!(default_title(Path::new("/docs/onboarding.md")), "onboarding");
        assert_eq!(default_title(Path::new("-")), "untitled");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_document(Path::new("/definitely/not/here.md")).is_err());
    }
}
