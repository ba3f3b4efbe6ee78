//! JSON documents written to stdout.
//!
//! Every invocation prints exactly one document: a [`LookupReport`] when
//! the lookup ran (matched or not), or an [`ErrorReport`] when it failed.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::devonthink::DocumentRecord;
use crate::entry::BibliographyEntry;
use crate::error::LookupError;
use crate::query::LookupQuery;

/// A formatted bibliography entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Reduced(ReducedRecord),
    Full(FullRecord),
}

/// Minimal identifying fields of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReducedRecord {
    pub citation_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short author/year line, e.g. `Smith & Jones 2024`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

/// An entry with its complete field map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRecord {
    pub citation_key: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    pub item: Map<String, Value>,
}

/// Projects `entry` for output. `full` selects the complete field map.
pub fn format_result(entry: &BibliographyEntry, full: bool) -> OutputRecord {
    if full {
        OutputRecord::Full(FullRecord {
            citation_key: entry.citation_key.clone(),
            attachments: entry.file_paths.clone(),
            item: entry.fields.clone(),
        })
    } else {
        OutputRecord::Reduced(ReducedRecord {
            citation_key: entry.citation_key.clone(),
            title: entry.title().map(str::to_string),
            summary: entry.summary(),
            item_type: entry.item_type().map(str::to_string),
            attachments: entry.file_paths.clone(),
        })
    }
}

/// Stdout document for a lookup that ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupReport {
    pub success: bool,
    pub found: bool,
    pub query: LookupQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<OutputRecord>,
    /// Attachment that satisfied a path lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devonthink_records: Option<Vec<DocumentRecord>>,
}

impl LookupReport {
    pub fn found(query: LookupQuery, record: OutputRecord) -> Self {
        Self {
            success: true,
            found: true,
            query,
            record: Some(record),
            matched_path: None,
            devonthink_records: None,
        }
    }

    pub fn not_found(query: LookupQuery) -> Self {
        Self {
            success: true,
            found: false,
            query,
            record: None,
            matched_path: None,
            devonthink_records: None,
        }
    }
}

/// Stdout document for a failed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl From<&LookupError> for ErrorReport {
    fn from(err: &LookupError) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Pretty-prints a report.
pub fn render<T: Serialize>(report: &T) -> String {
    // Reports contain only strings, maps and numbers
    serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        format!(
            r#"{{"success": false, "error": {{"kind": "InternalError", "message": {:?}}}}}"#,
            e.to_string()
        )
    })
}
