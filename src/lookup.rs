//! One lookup, from query to report.

use std::path::Path;

use tracing::debug;

use crate::devonthink::{find_in_document_store, AutomationBridge};
use crate::error::LookupError;
use crate::index::BibliographyIndex;
use crate::output::{format_result, LookupReport};
use crate::paths::{normalize_path, path_key};
use crate::query::LookupQuery;

/// Output modifiers that apply to either lookup mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Emit every field instead of the reduced projection.
    pub full: bool,
    /// Also ask DEVONthink for records holding the entry's attachments.
    pub find_devonthink: bool,
}

/// Answers `query` against `index`.
///
/// A miss produces a `found: false` report. The bridge is only invoked
/// for a hit with `find_devonthink` set, and its failure fails the whole
/// lookup.
pub fn run_lookup<B>(
    index: &BibliographyIndex,
    query: LookupQuery,
    options: LookupOptions,
    cwd: &Path,
    bridge: &B,
) -> Result<LookupReport, LookupError>
where
    B: AutomationBridge + ?Sized,
{
    let Some(entry) = query.run(index, cwd) else {
        debug!(?query, "no bibliography entry matched");
        return Ok(LookupReport::not_found(query));
    };

    let matched_path = match &query {
        LookupQuery::ByPath(raw) => {
            let wanted = normalize_path(raw, cwd);
            entry
                .file_paths
                .iter()
                .find(|path| path_key((*path).clone()) == wanted)
                .cloned()
        }
        LookupQuery::ByCitationKey(_) => None,
    };

    let devonthink_records = if options.find_devonthink {
        Some(find_in_document_store(entry).execute(bridge)?)
    } else {
        None
    };

    let mut report = LookupReport::found(query, format_result(entry, options.full));
    report.matched_path = matched_path;
    report.devonthink_records = devonthink_records;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devonthink::BridgeOutput;
    use crate::entry::BibliographyEntry;
    use serde_json::{json, Value};
    use std::cell::Cell;

    struct CountingBridge {
        calls: Cell<usize>,
        stdout: &'static str,
    }

    impl AutomationBridge for CountingBridge {
        fn invoke(&self, _script: &str) -> Result<BridgeOutput, LookupError> {
            self.calls.set(self.calls.get() + 1);
            Ok(BridgeOutput {
                success: true,
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    fn bridge(stdout: &'static str) -> CountingBridge {
        CountingBridge {
            calls: Cell::new(0),
            stdout,
        }
    }

    fn index() -> BibliographyIndex {
        let Value::Object(map) = json!({
            "id": "smith2024",
            "title": "Example",
            "author": [{"family": "Smith"}],
            "issued": {"date-parts": [[2024]]},
            "files": ["/tmp/doc.pdf"]
        }) else {
            unreachable!()
        };
        BibliographyIndex::build(vec![
            BibliographyEntry::from_object(map, Path::new("/")).unwrap()
        ])
    }

    #[test]
    fn test_hit_by_key_without_devonthink() {
        let bridge = bridge("");
        let report = run_lookup(
            &index(),
            LookupQuery::ByCitationKey("smith2024".into()),
            LookupOptions::default(),
            Path::new("/"),
            &bridge,
        )
        .unwrap();

        assert!(report.found);
        assert!(report.matched_path.is_none());
        assert!(report.devonthink_records.is_none());
        assert_eq!(bridge.calls.get(), 0);
    }

    #[test]
    fn test_hit_by_path_reports_matched_path() {
        let report = run_lookup(
            &index(),
            LookupQuery::ByPath("/tmp/./doc.pdf".into()),
            LookupOptions::default(),
            Path::new("/"),
            &bridge(""),
        )
        .unwrap();

        assert!(report.found);
        assert_eq!(report.matched_path.as_deref(), Some("/tmp/doc.pdf"));
    }

    #[test]
    fn test_miss_skips_bridge() {
        let bridge = bridge("");
        let report = run_lookup(
            &index(),
            LookupQuery::ByCitationKey("unknown2099".into()),
            LookupOptions {
                full: false,
                find_devonthink: true,
            },
            Path::new("/"),
            &bridge,
        )
        .unwrap();

        assert!(!report.found);
        assert_eq!(bridge.calls.get(), 0);
    }

    #[test]
    fn test_devonthink_records_attached() {
        let bridge = bridge(r#"{"success": true, "records": [{"uuid": "U-1"}]}"#);
        let report = run_lookup(
            &index(),
            LookupQuery::ByCitationKey("smith2024".into()),
            LookupOptions {
                full: true,
                find_devonthink: true,
            },
            Path::new("/"),
            &bridge,
        )
        .unwrap();

        let records = report.devonthink_records.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uuid, "U-1");
        assert_eq!(bridge.calls.get(), 1);
    }

    #[test]
    fn test_devonthink_failure_fails_lookup() {
        let err = run_lookup(
            &index(),
            LookupQuery::ByCitationKey("smith2024".into()),
            LookupOptions {
                full: false,
                find_devonthink: true,
            },
            Path::new("/"),
            &bridge("garbage"),
        )
        .unwrap_err();

        assert_eq!(err.kind(), "ExternalToolError");
    }
}
