//! CLI for bib-lookup - Resolve citation keys and attachment paths against a
//! CSL-JSON bibliography export.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use bib_lookup::{
    load_bibliography, output::render, resolve_bibliography_path, run_lookup, BridgeSettings,
    ErrorReport, LookupError, LookupOptions, LookupQuery, LookupReport, OsascriptBridge,
    BIBLIOGRAPHY_ENV,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Look up bibliography metadata by file path or citation key
#[derive(Parser, Debug)]
#[command(name = "bib-lookup")]
#[command(version)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["path", "citation_key"])
))]
#[command(after_help = "\
Examples:
  bib-lookup --citation-key smith2024
  bib-lookup --path ~/Papers/smith2024.pdf --full
  bib-lookup --citation-key smith2024 --find-devonthink
  bib-lookup --citation-key smith2024 --bib-json ~/other/bibliography.json

The bibliography defaults to $BIBLIOGRAPHY_JSON when --bib-json is not given.
Output is a single JSON document on stdout. A lookup with no match exits 0
with \"found\": false.")]
struct Cli {
    /// File path to look up (absolute, relative, or file:// URL)
    #[arg(long)]
    path: Option<String>,

    /// Citation key to look up (exact, case-sensitive)
    #[arg(long)]
    citation_key: Option<String>,

    /// Bibliography file (CSL-JSON array) [env: BIBLIOGRAPHY_JSON]
    #[arg(long, value_name = "FILE")]
    bib_json: Option<String>,

    /// Include every field of the matched item
    #[arg(long)]
    full: bool,

    /// Also find DEVONthink records holding the item's attachments
    #[arg(long)]
    find_devonthink: bool,

    /// Program used to run JXA scripts
    #[arg(long, value_name = "PROGRAM", default_value = "osascript")]
    osascript: PathBuf,

    /// Seconds to wait for DEVONthink before giving up
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    init_tracing("warn");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => fail(LookupError::Usage(
            e.to_string().trim_start_matches("error: ").trim().to_string(),
        )),
    };

    match run(cli) {
        Ok(report) => emit(&render(&report)),
        Err(e) => fail(e),
    }
}

fn run(cli: Cli) -> Result<LookupReport, LookupError> {
    let query = LookupQuery::from_parts(cli.path.as_deref(), cli.citation_key.as_deref())?;

    let env_value = env::var(BIBLIOGRAPHY_ENV).ok();
    let bib_path = resolve_bibliography_path(cli.bib_json.as_deref(), env_value.as_deref())?;
    debug!(path = %bib_path.display(), "using bibliography");

    let index = load_bibliography(&bib_path)?;

    let cwd = env::current_dir().map_err(|e| {
        LookupError::Configuration(format!("cannot determine working directory: {}", e))
    })?;

    let bridge = OsascriptBridge::new(BridgeSettings {
        program: cli.osascript,
        timeout: Duration::from_secs(cli.timeout),
    });
    let options = LookupOptions {
        full: cli.full,
        find_devonthink: cli.find_devonthink,
    };

    run_lookup(&index, query, options, &cwd, &bridge)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Prints the error report and exits with the error's code.
fn fail(e: LookupError) -> ! {
    error!(kind = e.kind(), "{}", e);
    emit(&render(&ErrorReport::from(&e)));
    process::exit(e.exit_code());
}

fn emit(document: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // A closed stdout leaves nobody to report to
    let _ = writeln!(handle, "{}", document);
}

/// Initialize the tracing subscriber with the given default log level.
///
/// Logs go to stderr; stdout is reserved for the JSON report.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
