//! In-memory lookup indices over a loaded bibliography.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::entry::BibliographyEntry;
use crate::paths::{normalize_path, path_key};

/// Entries of one bibliography export, indexed by citation key and by
/// normalized attachment path.
///
/// Both indices are last-write-wins: when two entries share a key or a
/// path, the one appearing later in the export is the one returned.
#[derive(Debug, Default)]
pub struct BibliographyIndex {
    entries: Vec<BibliographyEntry>,
    by_citation_key: HashMap<String, usize>,
    by_normalized_path: HashMap<String, usize>,
}

impl BibliographyIndex {
    pub fn build(entries: Vec<BibliographyEntry>) -> Self {
        let mut by_citation_key = HashMap::with_capacity(entries.len());
        let mut by_normalized_path = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            if let Some(previous) = by_citation_key.insert(entry.citation_key.clone(), position) {
                debug!(
                    citation_key = %entry.citation_key,
                    previous,
                    position,
                    "duplicate citation key, keeping the later entry"
                );
            }
            for path in &entry.file_paths {
                let previous = by_normalized_path.insert(path_key(path.clone()), position);
                if let Some(previous) = previous.filter(|&p| p != position) {
                    debug!(
                        path = %path,
                        previous,
                        position,
                        "attachment path shared by two entries, keeping the later one"
                    );
                }
            }
        }

        debug!(
            entries = entries.len(),
            keys = by_citation_key.len(),
            paths = by_normalized_path.len(),
            "built bibliography index"
        );

        Self {
            entries,
            by_citation_key,
            by_normalized_path,
        }
    }

    /// Exact, case-sensitive citation key lookup.
    pub fn lookup_by_citation_key(&self, key: &str) -> Option<&BibliographyEntry> {
        self.by_citation_key
            .get(key)
            .map(|&position| &self.entries[position])
    }

    /// Looks up the entry owning `query_path`.
    ///
    /// The query is normalized the same way export paths are, with relative
    /// paths resolved against `cwd`. Only exact matches count.
    pub fn lookup_by_path(&self, query_path: &str, cwd: &Path) -> Option<&BibliographyEntry> {
        let normalized = normalize_path(query_path, cwd);
        if normalized.is_empty() {
            return None;
        }
        self.by_normalized_path
            .get(&normalized)
            .map(|&position| &self.entries[position])
    }

    /// All entries, in export order, duplicates included.
    pub fn entries(&self) -> &[BibliographyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
