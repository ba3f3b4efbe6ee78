//! Attachment path handling.
//!
//! Reference managers store attachment locations in several shapes:
//! plain absolute paths, `file://` URLs, Zotero's colon-delimited form,
//! Windows paths with backslashes, or paths starting with `~`. Everything
//! here turns those into one comparable string so that a path from the
//! export and a path typed on the command line land on the same index key.

use std::borrow::Cow;
use std::env;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Keys whose string values are treated as attachment locations outright.
const PATH_KEY_HINTS: &[&str] = &[
    "path",
    "localpath",
    "file",
    "files",
    "uri",
    "url",
    "relativepath",
];

/// macOS and Windows default to case-insensitive filesystems.
const CASE_INSENSITIVE_FS: bool = cfg!(any(target_os = "macos", windows));

fn remote_scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(https?|zotero|attachment)://").unwrap())
}

fn windows_drive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]:[\\/]").unwrap())
}

fn document_extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\.(pdf|docx?|pptx?|rtf|txt|md|html?|epub|zip|gz|xlsx?|csv|png|jpe?g|gif|tiff|heic)$",
        )
        .unwrap()
    })
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap()
    })
}

/// Expands `$VAR`, `${VAR}` and a leading `~`.
///
/// Unset variables are left as written, and `~` stays literal when no home
/// directory is known.
pub fn expand_path(path: &str) -> String {
    let expanded = env_var_re().replace_all(path, |caps: &regex::Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    if expanded == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().into_owned();
        }
    } else if let Some(rest) = expanded.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }

    expanded.into_owned()
}

/// Strips URL and Zotero decoration from a raw attachment string.
///
/// The result is not yet absolute; see [`normalize_path`].
pub fn clean_attachment_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut path: &str = trimmed;

    if trimmed
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file://"))
    {
        let rest = &trimmed[7..];
        // file://host/path keeps only /path
        path = match rest.find('/') {
            Some(slash) => &rest[slash..],
            None => rest,
        };
    }

    let path = path.strip_prefix(':').unwrap_or(path);
    let path = path.strip_suffix(':').unwrap_or(path);
    let path = expand_path(&path.replace('\\', "/"));

    let decoded = urlencoding::decode(&path).map(Cow::into_owned);
    decoded.unwrap_or(path)
}

/// Returns true when `value` looks like a local file rather than a URL or
/// free text. `key_hint` is the name of the field the value was found under.
pub fn is_local_attachment(value: &str, key_hint: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }

    if remote_scheme_re().is_match(trimmed) {
        return false;
    }

    let hint = key_hint.to_ascii_lowercase();
    if PATH_KEY_HINTS.contains(&hint.as_str()) {
        return true;
    }

    if windows_drive_re().is_match(trimmed) {
        return true;
    }

    let cleaned = clean_attachment_path(trimmed);
    if cleaned.starts_with('/') || cleaned.starts_with('~') || trimmed.starts_with(':') {
        return true;
    }

    document_extension_re().is_match(&cleaned)
}

/// Makes a path absolute and tidy without touching the filesystem.
///
/// Relative paths are resolved against `base`. `.` and `..` components and
/// repeated separators are collapsed lexically, so the file does not need
/// to exist. Case is preserved.
pub fn resolve_path(raw: &str, base: &Path) -> String {
    let cleaned = clean_attachment_path(raw);
    if cleaned.is_empty() {
        return String::new();
    }

    let candidate = PathBuf::from(&cleaned);
    let absolute = if candidate.is_absolute() {
        candidate
    } else {
        base.join(candidate)
    };

    collapse_components(&absolute)
        .to_string_lossy()
        .into_owned()
}

/// Produces the index key for a path: [`resolve_path`] plus case folding
/// on case-insensitive hosts.
pub fn normalize_path(raw: &str, base: &Path) -> String {
    path_key(resolve_path(raw, base))
}

/// Index key for an already resolved path.
pub fn path_key(resolved: String) -> String {
    if CASE_INSENSITIVE_FS {
        resolved.to_lowercase()
    } else {
        resolved
    }
}

fn collapse_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
