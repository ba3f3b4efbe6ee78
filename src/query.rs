//! Lookup mode selection.

use std::path::Path;

use serde::Serialize;

use crate::entry::BibliographyEntry;
use crate::error::LookupError;
use crate::index::BibliographyIndex;

/// The primary lookup requested for an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "camelCase")]
pub enum LookupQuery {
    ByPath(String),
    ByCitationKey(String),
}

impl LookupQuery {
    /// Builds a query from the two optional inputs.
    ///
    /// Exactly one must be present and non-blank.
    pub fn from_parts(path: Option<&str>, citation_key: Option<&str>) -> Result<Self, LookupError> {
        let path = path.map(str::trim).filter(|p| !p.is_empty());
        let citation_key = citation_key.map(str::trim).filter(|k| !k.is_empty());

        match (path, citation_key) {
            (Some(path), None) => Ok(LookupQuery::ByPath(path.to_string())),
            (None, Some(key)) => Ok(LookupQuery::ByCitationKey(key.to_string())),
            (Some(_), Some(_)) => Err(LookupError::Usage(
                "--path and --citation-key are mutually exclusive".to_string(),
            )),
            (None, None) => Err(LookupError::Usage(
                "either --path or --citation-key is required".to_string(),
            )),
        }
    }

    /// Runs the query. `cwd` anchors relative paths.
    pub fn run<'a>(&self, index: &'a BibliographyIndex, cwd: &Path) -> Option<&'a BibliographyEntry> {
        match self {
            LookupQuery::ByPath(path) => index.lookup_by_path(path, cwd),
            LookupQuery::ByCitationKey(key) => index.lookup_by_citation_key(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_single_mode() {
        assert_eq!(
            LookupQuery::from_parts(Some("/tmp/doc.pdf"), None).unwrap(),
            LookupQuery::ByPath("/tmp/doc.pdf".into())
        );
        assert_eq!(
            LookupQuery::from_parts(None, Some(" smith2024 ")).unwrap(),
            LookupQuery::ByCitationKey("smith2024".into())
        );
    }

    #[test]
    fn test_from_parts_both_is_usage_error() {
        let err = LookupQuery::from_parts(Some("/a.pdf"), Some("k")).unwrap_err();
        assert!(matches!(err, LookupError::Usage(_)));
    }

    #[test]
    fn test_from_parts_neither_is_usage_error() {
        assert!(matches!(
            LookupQuery::from_parts(None, None),
            Err(LookupError::Usage(_))
        ));
        // Blank values count as absent
        assert!(matches!(
            LookupQuery::from_parts(Some("  "), None),
            Err(LookupError::Usage(_))
        ));
    }

    #[test]
    fn test_query_serializes_with_mode_tag() {
        let json = serde_json::to_value(LookupQuery::ByCitationKey("k".into())).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "byCitationKey", "value": "k"}));
    }
}
