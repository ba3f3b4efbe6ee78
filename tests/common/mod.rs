//! Shared test constants and helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

/// The canonical single-entry export: one article with one attachment.
pub const SCENARIO_BIB: &str = r#"[{"id":"smith2024","title":"Example","author":[{"family":"Smith"}],"issued":{"date-parts":[[2024]]},"files":["/tmp/doc.pdf"]}]"#;

/// Writes `content` as `bibliography.json` inside `dir` and returns its path.
pub fn write_bib(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("bibliography.json");
    fs::write(&path, content).unwrap();
    path
}

/// Build a CSL-JSON export from `(citation key, attachment path)` pairs.
///
/// Each item gets a title `Title {key}` and is dated 2020.
pub fn build_bib(items: &[(&str, &str)]) -> String {
    let items: Vec<String> = items
        .iter()
        .map(|(key, file)| {
            format!(
                r#"{{"id": "{}", "type": "article-journal", "title": "Title {}", "issued": {{"date-parts": [[2020]]}}, "file": "{}"}}"#,
                key, key, file
            )
        })
        .collect();
    format!("[{}]", items.join(", "))
}
