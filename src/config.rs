//! Runtime configuration.
//!
//! Values arrive from the command line and the environment; the binary
//! reads the environment and passes it in, so everything here is pure.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::LookupError;
use crate::paths::expand_path;

/// Environment variable naming the default bibliography export.
pub const BIBLIOGRAPHY_ENV: &str = "BIBLIOGRAPHY_JSON";

/// Default program used to run JXA scripts.
pub const DEFAULT_OSASCRIPT: &str = "osascript";

/// Default upper bound on a DEVONthink query.
pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Picks the bibliography export: explicit flag first, then the
/// environment value. `~` and `$VAR` are expanded.
pub fn resolve_bibliography_path(
    explicit: Option<&str>,
    env_value: Option<&str>,
) -> Result<PathBuf, LookupError> {
    [explicit, env_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .map(|candidate| PathBuf::from(expand_path(candidate)))
        .ok_or_else(|| {
            LookupError::Configuration(format!(
                "no bibliography file given: pass --bib-json or set {}",
                BIBLIOGRAPHY_ENV
            ))
        })
}

/// How to reach DEVONthink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_OSASCRIPT),
            timeout: DEFAULT_BRIDGE_TIMEOUT,
        }
    }
}
