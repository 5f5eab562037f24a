// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: weight ranges, chunk
//! geometry, timeouts and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::RecallConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let embedding = &config.embedding;
    if embedding.timeout_secs == 0 {
        fail("embedding.timeout_secs must be at least 1".to_string());
    }
    if let Some(url) = &embedding.local_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        fail(format!("embedding.local_url `{url}` must be an http(s) URL"));
    }
    if let Some(key) = &embedding.api_key
        && key.trim().is_empty()
    {
        fail("embedding.api_key must not be blank when set".to_string());
    }
    if embedding.cache_max_entries == Some(0) {
        fail("embedding.cache_max_entries must be at least 1 when set".to_string());
    }

    let memory = &config.memory;
    if memory.chunk_tokens == 0 {
        fail("memory.chunk_tokens must be at least 1".to_string());
    }
    if memory.chunk_tokens > 0 && memory.chunk_overlap >= memory.chunk_tokens {
        fail(format!(
            "memory.chunk_overlap ({}) must be smaller than memory.chunk_tokens ({})",
            memory.chunk_overlap, memory.chunk_tokens
        ));
    }
    if memory.max_results == 0 {
        fail("memory.max_results must be at least 1".to_string());
    }
    for (name, value) in [
        ("memory.min_score", memory.min_score),
        ("memory.vector_weight", memory.vector_weight),
        ("memory.keyword_weight", memory.keyword_weight),
        ("memory.mmr.lambda", memory.mmr.lambda),
    ] {
        if !(0.0..=1.0).contains(&value) {
            fail(format!("{name} must be between 0.0 and 1.0, got {value}"));
        }
    }
    if memory.decay.half_life_days < 0.0 || !memory.decay.half_life_days.is_finite() {
        fail(format!(
            "memory.decay.half_life_days must be a non-negative number, got {}",
            memory.decay.half_life_days
        ));
    }
    if memory.prompt_char_budget < 64 {
        fail(format!(
            "memory.prompt_char_budget must be at least 64, got {}",
            memory.prompt_char_budget
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RecallConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = RecallConfig::default();
        config.storage.database_path = " ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn out_of_range_weights_fail_validation() {
        let mut config = RecallConfig::default();
        config.memory.vector_weight = 1.5;
        config.memory.mmr.lambda = -0.1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "memory.vector_weight"));
        assert!(has_error(&errors, "memory.mmr.lambda"));
        assert_eq!(errors.len(), 2, "all failures are collected");
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = RecallConfig::default();
        config.memory.chunk_tokens = 64;
        config.memory.chunk_overlap = 64;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "chunk_overlap"));
    }

    #[test]
    fn negative_half_life_fails_validation() {
        let mut config = RecallConfig::default();
        config.memory.decay.half_life_days = -1.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "half_life_days"));
    }

    #[test]
    fn zero_half_life_is_allowed() {
        let mut config = RecallConfig::default();
        config.memory.decay.half_life_days = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn local_url_must_be_http() {
        let mut config = RecallConfig::default();
        config.embedding.local_url = Some("localhost:11434".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "local_url"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = RecallConfig::default();
        config.logging.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "logging.level"));
    }
}
