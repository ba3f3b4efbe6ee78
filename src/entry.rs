//! Bibliography entries extracted from CSL-JSON items.

use std::path::Path;

use serde_json::{Map, Value};

use crate::paths::{is_local_attachment, resolve_path};

/// Fields consulted, in order, for an item's citation key.
const CITATION_KEY_FIELDS: &[&str] = &["citationKey", "citationkey", "id", "key"];

/// One item from a bibliography export.
#[derive(Debug, Clone, PartialEq)]
pub struct BibliographyEntry {
    /// Citation key (e.g. `smith2024`).
    pub citation_key: String,
    /// Absolute attachment paths, in order of first appearance.
    pub file_paths: Vec<String>,
    /// The raw item.
    pub fields: Map<String, Value>,
}

impl BibliographyEntry {
    /// Builds an entry from a CSL-JSON object.
    ///
    /// Relative attachment paths are resolved against `base_dir`, normally
    /// the directory holding the export. Returns `None` when the object has
    /// no usable citation key.
    pub fn from_object(fields: Map<String, Value>, base_dir: &Path) -> Option<Self> {
        let citation_key = citation_key_of(&fields)?;

        let mut file_paths = Vec::new();
        for (key, value) in &fields {
            collect_attachments(value, key, base_dir, &mut file_paths);
        }

        Some(Self {
            citation_key,
            file_paths,
            fields,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    /// CSL item type (`book`, `article-journal`, ...).
    pub fn item_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    /// Short author line: `Smith`, `Smith & Jones`, or `Smith et al.`.
    pub fn authors_summary(&self) -> Option<String> {
        let names: Vec<String> = self
            .fields
            .get("author")
            .or_else(|| self.fields.get("editor"))
            .and_then(Value::as_array)?
            .iter()
            .filter_map(display_name)
            .collect();

        match names.as_slice() {
            [] => None,
            [one] => Some(one.clone()),
            [first, second] => Some(format!("{} & {}", first, second)),
            [first, ..] => Some(format!("{} et al.", first)),
        }
    }

    /// Publication year from `issued`, either `date-parts` or a `raw` date.
    pub fn year(&self) -> Option<String> {
        let issued = self.fields.get("issued")?;

        if let Some(first) = issued
            .get("date-parts")
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get(0))
        {
            match first {
                Value::Number(n) => return Some(n.to_string()),
                Value::String(s) if !s.trim().is_empty() => return Some(s.trim().to_string()),
                _ => {}
            }
        }

        issued
            .get("raw")
            .or_else(|| issued.get("literal"))
            .and_then(Value::as_str)
            .and_then(|raw| raw.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    }

    /// `"<authors> <year>"`, or whichever half is known.
    pub fn summary(&self) -> Option<String> {
        match (self.authors_summary(), self.year()) {
            (Some(authors), Some(year)) => Some(format!("{} {}", authors, year)),
            (Some(authors), None) => Some(authors),
            (None, Some(year)) => Some(year),
            (None, None) => None,
        }
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

fn citation_key_of(fields: &Map<String, Value>) -> Option<String> {
    CITATION_KEY_FIELDS.iter().find_map(|name| match fields.get(*name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn display_name(person: &Value) -> Option<String> {
    ["family", "literal", "given"]
        .iter()
        .find_map(|part| person.get(*part).and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Walks `value` and records every string that looks like a local file.
fn collect_attachments(value: &Value, key_hint: &str, base_dir: &Path, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if is_local_attachment(s, key_hint) {
                let resolved = resolve_path(s, base_dir);
                if !resolved.is_empty() && !out.contains(&resolved) {
                    out.push(resolved);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_attachments(item, key_hint, base_dir, out);
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                collect_attachments(nested, key, base_dir, out);
            }
        }
        _ => {}
    }
}
