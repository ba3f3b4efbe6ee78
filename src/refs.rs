//! CSL-JSON bibliography loading.
//!
//! Reads an export produced by a reference manager (a JSON array of
//! CSL-JSON objects) and turns it into a [`BibliographyIndex`].

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::BibliographyEntry;
use crate::error::LookupError;
use crate::index::BibliographyIndex;

/// Errors that can occur when reading an export file.
#[derive(Error, Debug)]
pub enum RefsError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Bibliography must be a JSON array")]
    NotAnArray,

    #[error("Bibliography item {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// Loads the export at `source_path` and builds both lookup indices.
///
/// # Errors
///
/// * `NotFound` when the file does not exist.
/// * `Parse` when it cannot be read, is not valid JSON, or is not an array
///   of objects.
pub fn load_bibliography(source_path: &Path) -> Result<BibliographyIndex, LookupError> {
    let objects = load_refs(source_path).map_err(|e| match e {
        RefsError::IoError(ref io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            LookupError::NotFound {
                path: source_path.display().to_string(),
            }
        }
        other => LookupError::Parse(format!("'{}': {}", source_path.display(), other)),
    })?;

    let source = absolute(source_path);
    let base_dir = source.parent().unwrap_or_else(|| Path::new("/"));

    let total = objects.len();
    let entries: Vec<BibliographyEntry> = objects
        .into_iter()
        .enumerate()
        .filter_map(|(position, object)| {
            let entry = BibliographyEntry::from_object(object, base_dir);
            if entry.is_none() {
                warn!(position, "skipping bibliography item without a citation key");
            }
            entry
        })
        .collect();

    debug!(
        path = %source.display(),
        items = total,
        entries = entries.len(),
        "loaded bibliography"
    );

    Ok(BibliographyIndex::build(entries))
}

/// Reads a bibliography file into its list of raw items.
pub fn load_refs(path: &Path) -> Result<Vec<Map<String, Value>>, RefsError> {
    let content = fs::read_to_string(path)?;
    parse_refs(&content)
}

/// Parses export content. Blank content is not valid JSON and is rejected.
pub fn parse_refs(content: &str) -> Result<Vec<Map<String, Value>>, RefsError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(RefsError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(RefsError::NotAnObject { index }),
        })
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Helper to create a temporary file with content
    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    // --- Tests for load_bibliography ---

    #[test]
    fn test_load_bibliography_scenario() {
        // Given: the canonical single-entry export
        let content = r#"[{"id":"smith2024","title":"Example","author":[{"family":"Smith"}],"issued":{"date-parts":[[2024]]},"files":["/tmp/doc.pdf"]}]"#;
        let file = create_temp_file(content);

        // When: we load it
        let index = load_bibliography(file.path()).unwrap();

        // Then: the entry is reachable by key and by path
        assert_eq!(index.len(), 1);
        let by_key = index.lookup_by_citation_key("smith2024").unwrap();
        assert_eq!(by_key.title(), Some("Example"));
        let by_path = index.lookup_by_path("/tmp/doc.pdf", Path::new("/")).unwrap();
        assert_eq!(by_path.citation_key, "smith2024");
    }

    #[test]
    fn test_load_bibliography_missing_file() {
        let path = Path::new("/nonexistent/path/refs.json");

        let err = load_bibliography(path).unwrap_err();

        assert!(matches!(err, LookupError::NotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/path/refs.json"));
    }

    #[test]
    fn test_load_bibliography_invalid_json() {
        let file = create_temp_file(r#"[{"id": "item-1", invalid json"#);

        let err = load_bibliography(file.path()).unwrap_err();

        assert!(matches!(err, LookupError::Parse(_)));
    }

    #[test]
    fn test_load_bibliography_object_top_level() {
        let file = create_temp_file(r#"{"id": "item-1"}"#);

        let err = load_bibliography(file.path()).unwrap_err();

        assert!(matches!(err, LookupError::Parse(_)));
        assert!(err.to_string().contains("JSON array"));
    }

    #[test]
    fn test_load_bibliography_skips_keyless_items() {
        let file = create_temp_file(r#"[{"title": "No key"}, {"id": "k"}]"#);

        let index = load_bibliography(file.path()).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.lookup_by_citation_key("k").is_some());
    }

    #[test]
    fn test_load_bibliography_relative_attachment_uses_export_dir() {
        // Given: an export with an attachment path relative to the export itself
        let dir = tempfile::tempdir().unwrap();
        let bib = dir.path().join("bib.json");
        fs::write(&bib, r#"[{"id": "rel", "file": "pdfs/rel.pdf"}]"#).unwrap();

        // When: we load it and query with the absolute location
        let index = load_bibliography(&bib).unwrap();
        let absolute_pdf = dir.path().join("pdfs").join("rel.pdf");

        // Then: the entry is found
        let found = index
            .lookup_by_path(absolute_pdf.to_str().unwrap(), Path::new("/"))
            .unwrap();
        assert_eq!(found.citation_key, "rel");
    }

    // --- Tests for parse_refs ---

    #[test]
    fn test_parse_refs_array() {
        let items = parse_refs(r#"[{"id": "item-1"}, {"id": "item-2"}]"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_refs_empty_array() {
        assert!(parse_refs("[]").unwrap().is_empty());
        assert!(parse_refs(" [ ]\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_refs_blank_content_is_invalid_json() {
        assert!(matches!(parse_refs(""), Err(RefsError::JsonError(_))));
        assert!(matches!(parse_refs("  \n "), Err(RefsError::JsonError(_))));
    }

    #[test]
    fn test_load_bibliography_blank_file() {
        let file = create_temp_file("");

        let err = load_bibliography(file.path()).unwrap_err();

        assert!(matches!(err, LookupError::Parse(_)));
    }

    #[test]
    fn test_parse_refs_not_array() {
        assert!(matches!(parse_refs("42"), Err(RefsError::NotAnArray)));
        assert!(matches!(
            parse_refs(r#"{"items": []}"#),
            Err(RefsError::NotAnArray)
        ));
    }

    #[test]
    fn test_parse_refs_non_object_item() {
        let err = parse_refs(r#"[{"id": "a"}, "b"]"#).unwrap_err();
        match err {
            RefsError::NotAnObject { index } => assert_eq!(index, 1),
            _ => panic!("Expected NotAnObject, got {:?}", err),
        }
    }

    #[test]
    fn test_parse_refs_invalid_json() {
        assert!(matches!(
            parse_refs("not valid json"),
            Err(RefsError::JsonError(_))
        ));
    }
}
