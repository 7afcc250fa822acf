// src/core/runner.rs

//! Executes one `CommandSpec`: spawns the external process directly (no
//! shell), captures both streams, enforces the per-command timeout, and
//! persists captured stdout to the artifact file. All failure modes are
//! absorbed into the returned `CommandOutcome`; nothing here propagates
//! an error upward, because one broken tool must not abort the batch.

use crate::core::classifier::{self, ClassifierRule};
use crate::core::models::{CommandOutcome, CommandSpec, OutcomeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Directory-bruteforce scanners report their true output path on stderr
/// instead of honoring the caller-supplied one.
static RE_OUTPUT_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Output File: (.*\.txt)").unwrap());

/// Per-execution settings shared by a whole batch.
#[derive(Clone)]
pub struct ExecOptions {
    /// Wall-clock budget for one command; on expiry the child is killed.
    pub timeout: Duration,
    /// The stderr-signature table used for non-zero exits.
    pub rules: Arc<Vec<ClassifierRule>>,
    /// Writer lock for shared append-mode artifacts. Held only for the
    /// duration of one append.
    pub append_lock: Option<Arc<Mutex<()>>>,
}

impl ExecOptions {
    pub fn new(timeout: Duration, rules: Arc<Vec<ClassifierRule>>) -> Self {
        Self {
            timeout,
            rules,
            append_lock: None,
        }
    }

    pub fn with_append_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.append_lock = Some(lock);
        self
    }
}

/// Runs the command described by `spec` to completion and classifies the
/// result. The spec's argv must already be fully interpolated; no
/// templating or escaping happens here.
pub async fn execute(spec: &CommandSpec, opts: &ExecOptions) -> CommandOutcome {
    info!(command = %spec.display_name(), "Running command");

    let child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let text = format!("{} Command Not installed", spec.program);
            write_diagnostic(spec, &spec.artifact, &text, opts).await;
            info!(command = %spec.program, "Tool not installed");
            return CommandOutcome {
                kind: OutcomeKind::NotInstalled,
                artifact: spec.artifact.clone(),
                reason: None,
            };
        }
        Err(e) => {
            let reason = format!("Command '{}' failed to start: {}", spec.display_name(), e);
            write_diagnostic(spec, &spec.artifact, &reason, opts).await;
            warn!(command = %spec.display_name(), error = %e, "Spawn failed");
            return CommandOutcome {
                kind: OutcomeKind::Failed,
                artifact: spec.artifact.clone(),
                reason: Some(reason),
            };
        }
    };

    // kill_on_drop reaps the child when the timed-out future is dropped.
    let output = match timeout(opts.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            let reason = format!("Command '{}' failed: {}", spec.display_name(), e);
            write_diagnostic(spec, &spec.artifact, &reason, opts).await;
            warn!(command = %spec.display_name(), error = %e, "Wait failed");
            return CommandOutcome {
                kind: OutcomeKind::Failed,
                artifact: spec.artifact.clone(),
                reason: Some(reason),
            };
        }
        Err(_) => {
            let reason = format!(
                "Command '{}' timed out after {}s",
                spec.display_name(),
                opts.timeout.as_secs()
            );
            write_diagnostic(spec, &spec.artifact, &reason, opts).await;
            warn!(command = %spec.display_name(), timeout_s = opts.timeout.as_secs(), "Command timed out");
            return CommandOutcome {
                kind: OutcomeKind::Failed,
                artifact: spec.artifact.clone(),
                reason: Some(reason),
            };
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr);

    // Re-point artifact bookkeeping when the tool wrote its own file.
    let (artifact, tool_owned) = match RE_OUTPUT_FILE
        .captures(&stderr)
        .and_then(|caps| caps.get(1))
    {
        Some(m) => {
            let path = Path::new(m.as_str().trim()).to_path_buf();
            debug!(command = %spec.program, path = %path.display(), "Tool reported its own output file");
            (path, true)
        }
        None => (spec.artifact.clone(), false),
    };

    if output.status.success() {
        if !tool_owned {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.is_empty() {
                write_artifact(spec, &artifact, &stdout, opts).await;
            }
        }
        let kind = classifier::classify_completed(&artifact);
        info!(command = %spec.display_name(), outcome = %kind, "Command finished");
        CommandOutcome {
            kind,
            artifact,
            reason: None,
        }
    } else {
        let (kind, text) =
            classifier::classify_failure(spec, output.status.code(), &stderr, &opts.rules);
        write_diagnostic(spec, &artifact, &text, opts).await;
        info!(command = %spec.display_name(), outcome = %kind, code = ?output.status.code(), "Command finished");
        let reason = (kind == OutcomeKind::Failed).then_some(text);
        CommandOutcome {
            kind,
            artifact,
            reason,
        }
    }
}

/// Diagnostics replace the artifact content for exclusively owned
/// artifacts. Shared append-mode artifacts only ever receive real tool
/// output; their diagnostics travel in the `CommandOutcome` instead.
async fn write_diagnostic(spec: &CommandSpec, path: &Path, text: &str, opts: &ExecOptions) {
    if spec.append {
        return;
    }
    write_artifact(spec, path, text, opts).await;
}

/// Writes text to the artifact, appending under the shared writer lock
/// for append-mode specs and truncating otherwise. Write errors are
/// logged and swallowed; the classification still stands.
async fn write_artifact(spec: &CommandSpec, path: &Path, text: &str, opts: &ExecOptions) {
    let result = if spec.append {
        let _guard = match &opts.append_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };
        append_to(path, text).await
    } else {
        tokio::fs::write(path, text).await
    };
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "Failed to write artifact");
    }
}

async fn append_to(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}
