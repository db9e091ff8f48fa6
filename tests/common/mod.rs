/*!
 * Common test utilities for the multitrans test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use multitrans::app_config::Config;

pub mod stub_providers;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration whose glossary and history live inside `dir`
pub fn test_config(dir: &Path) -> Config {
    Config {
        source_language: "en".to_string(),
        target_language: "de".to_string(),
        glossary_path: dir.join("glossary.json").display().to_string(),
        history_path: Some(dir.join("history.db").display().to_string()),
        ..Config::default()
    }
}

/// A few paragraphs of plain English prose
pub fn sample_text() -> String {
    "The quick brown fox jumps over the lazy dog. It was not amused! \
     Dr. Smith arrived at 3.30 p.m. and asked what happened.\n\n\
     The dog slept on. Nobody knew why? The end came quickly."
        .to_string()
}

/// Initialize env_logger once for tests that want log output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
