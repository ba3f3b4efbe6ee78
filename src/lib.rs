//! bib-lookup: cross-reference a CSL-JSON bibliography export with file
//! paths, citation keys, and DEVONthink records.
//!
//! This library provides functionality to:
//! - Load a CSL-JSON export and index it by citation key and attachment path
//! - Answer exact lookups in either direction
//! - Format matches as stable JSON for scripts and agents
//! - Ask DEVONthink for matching records through a pluggable JXA bridge

pub mod config;
pub mod devonthink;
pub mod entry;
pub mod error;
pub mod index;
pub mod lookup;
pub mod output;
pub mod paths;
pub mod query;
pub mod refs;

pub use config::{resolve_bibliography_path, BridgeSettings, BIBLIOGRAPHY_ENV};
pub use devonthink::{
    find_in_document_store, AutomationBridge, BridgeOutput, DocumentRecord,
    ExternalSearchRequest, OsascriptBridge,
};
pub use entry::BibliographyEntry;
pub use error::LookupError;
pub use index::BibliographyIndex;
pub use lookup::{run_lookup, LookupOptions};
pub use output::{format_result, ErrorReport, LookupReport, OutputRecord};
pub use query::LookupQuery;
pub use refs::load_bibliography;
