//! DEVONthink cross-referencing through JXA.
//!
//! This module never talks to DEVONthink directly. It renders a JXA script
//! describing the search, hands it to an [`AutomationBridge`], and
//! interprets the JSON the script prints.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::BridgeSettings;
use crate::entry::BibliographyEntry;
use crate::error::LookupError;

/// How often a running bridge process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A DEVONthink record as reported by the search script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
}

/// What to ask DEVONthink for a single bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSearchRequest {
    pub paths: Vec<String>,
    pub citation_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Builds the DEVONthink search for `entry`.
///
/// Attachment paths drive the search. When the entry has no attachments the
/// citation key is used as a full-text query, then the title if the key
/// finds nothing.
pub fn find_in_document_store(entry: &BibliographyEntry) -> ExternalSearchRequest {
    ExternalSearchRequest {
        paths: entry.file_paths.clone(),
        citation_key: entry.citation_key.clone(),
        title: entry.title().map(str::to_string),
    }
}

impl ExternalSearchRequest {
    /// Renders the JXA program for this request.
    ///
    /// The program prints `{"success": true, "records": [...]}` or
    /// `{"success": false, "error": "..."}`.
    pub fn script(&self) -> String {
        let request = json!({
            "paths": self.paths,
            "citationKey": self.citation_key,
            "title": self.title,
        });
        SEARCH_SCRIPT.replace("__REQUEST__", &request.to_string())
    }

    /// Runs the request through `bridge`.
    ///
    /// An empty record list is a successful answer. A failed process, an
    /// unparseable answer, or a script-reported failure is an
    /// `ExternalTool` error.
    pub fn execute<B>(&self, bridge: &B) -> Result<Vec<DocumentRecord>, LookupError>
    where
        B: AutomationBridge + ?Sized,
    {
        info!(
            citation_key = %self.citation_key,
            paths = self.paths.len(),
            "searching DEVONthink"
        );
        let output = bridge.invoke(&self.script())?;
        let records = interpret_response(&output)?;
        debug!(records = records.len(), "DEVONthink answered");
        Ok(records)
    }
}

/// Raw result of one bridge invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BridgeOutput {
    /// Whether the process exited successfully.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Something that can run a JXA script.
pub trait AutomationBridge {
    fn invoke(&self, script: &str) -> Result<BridgeOutput, LookupError>;
}

/// Runs scripts with `osascript -l JavaScript -e <script>`.
#[derive(Debug, Clone, Default)]
pub struct OsascriptBridge {
    settings: BridgeSettings,
}

impl OsascriptBridge {
    pub fn new(settings: BridgeSettings) -> Self {
        Self { settings }
    }
}

impl AutomationBridge for OsascriptBridge {
    fn invoke(&self, script: &str) -> Result<BridgeOutput, LookupError> {
        let program = &self.settings.program;
        let mut child = Command::new(program)
            .args(["-l", "JavaScript", "-e", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LookupError::ExternalTool(format!("failed to run {}: {}", program.display(), e))
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let deadline = started + self.settings.timeout;
        let status = loop {
            let polled = child.try_wait().map_err(|e| {
                LookupError::ExternalTool(format!("failed to poll {}: {}", program.display(), e))
            })?;
            match polled {
                Some(status) => break status,
                None if started.elapsed() >= self.settings.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(LookupError::ExternalTool(format!(
                        "{} did not finish within {:?}",
                        program.display(),
                        self.settings.timeout
                    )));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        // A background descendant can hold the pipes open after the child exits
        let collect = |pipe: mpsc::Receiver<String>| {
            pipe.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                .map_err(|_| {
                    LookupError::ExternalTool(format!(
                        "{} kept its output open past {:?}",
                        program.display(),
                        self.settings.timeout
                    ))
                })
        };
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        Ok(BridgeOutput {
            success: status.success(),
            stdout,
            stderr,
        })
    }
}

/// Reads a child pipe to the end on its own thread.
///
/// The text arrives on the returned channel once the pipe closes.
fn drain<R>(pipe: Option<R>) -> mpsc::Receiver<String>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    success: bool,
    #[serde(default)]
    records: Vec<DocumentRecord>,
    #[serde(default)]
    error: Option<String>,
}

/// Turns bridge output into records.
pub fn interpret_response(output: &BridgeOutput) -> Result<Vec<DocumentRecord>, LookupError> {
    if !output.success {
        let detail = output.stderr.trim();
        return Err(LookupError::ExternalTool(if detail.is_empty() {
            "bridge exited with a failure status".to_string()
        } else {
            format!("bridge exited with a failure status: {}", detail)
        }));
    }

    let body = output.stdout.trim();
    if body.is_empty() {
        return Err(LookupError::ExternalTool(
            "bridge produced no output".to_string(),
        ));
    }

    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::ExternalTool(format!("malformed bridge response: {}", e)))?;

    if response.success {
        Ok(response.records)
    } else {
        Err(LookupError::ExternalTool(format!(
            "DEVONthink reported an error: {}",
            response.error.as_deref().unwrap_or("unknown error")
        )))
    }
}

const SEARCH_SCRIPT: &str = r#"(() => {
  const app = Application("DEVONthink");
  app.includeStandardAdditions = true;
  const request = __REQUEST__;
  const records = [];
  const seen = {};

  const collect = (matches) => {
    for (const record of matches || []) {
      try {
        const uuid = record.uuid();
        if (seen[uuid]) continue;
        seen[uuid] = true;
        records.push({
          id: record.id(),
          uuid: uuid,
          name: record.name(),
          path: record.path(),
          location: record.location(),
          recordType: record.recordType(),
        });
      } catch (e) {}
    }
  };

  try {
    for (const path of request.paths) {
      try { collect(app.lookupRecordsWithPath(path)); } catch (e) {}
      const filename = path.split("/").pop();
      if (filename) {
        try { collect(app.lookupRecordsWithFile(filename)); } catch (e) {}
      }
    }
    if (request.paths.length === 0) {
      for (const query of [request.citationKey, request.title]) {
        if (!query || records.length > 0) continue;
        try { collect(app.search(query)); } catch (e) {}
      }
    }
    return JSON.stringify({ success: true, records: records });
  } catch (error) {
    return JSON.stringify({ success: false, error: error.toString() });
  }
})();"#;
