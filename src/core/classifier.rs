// src/core/classifier.rs

//! Maps a finished (or failed-to-spawn) command execution onto one of the
//! four `OutcomeKind` categories. The non-zero-exit side is driven by an
//! ordered table of stderr-signature rules so that new tools with their
//! own failure chatter can be added without touching this logic; the rule
//! file format is plain JSON.

use crate::core::models::{CommandSpec, OutcomeKind};
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a matched rule means for the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    /// The tool is absent from PATH.
    NotInstalled,
    /// A known, benign failure mode of a specific tool.
    BenignFailure,
}

/// One entry of the stderr-signature table. Rules are evaluated in order;
/// the first match wins, which is how "not installed" dominates the
/// tool-specific signatures (it sits first in the default table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierRule {
    /// Lower-cased substring searched for in lower-cased stderr.
    pub stderr_contains: String,
    /// Restricts the rule to programs whose name contains this substring.
    #[serde(default)]
    pub program_contains: Option<String>,
    pub action: RuleAction,
    /// Text written to the artifact when the rule matches. The literal
    /// `{program}` is replaced with the spec's program name.
    pub artifact_text: String,
}

impl ClassifierRule {
    fn matches(&self, spec: &CommandSpec, stderr_lower: &str) -> bool {
        if let Some(needle) = &self.program_contains {
            if !spec.program.contains(needle.as_str()) {
                return false;
            }
        }
        stderr_lower.contains(self.stderr_contains.as_str())
    }

    fn rendered_text(&self, spec: &CommandSpec) -> String {
        self.artifact_text.replace("{program}", &spec.program)
    }
}

/// The built-in rule table. Order is load-bearing.
pub fn default_rules() -> Vec<ClassifierRule> {
    vec![
        ClassifierRule {
            stderr_contains: "command not found".to_string(),
            program_contains: None,
            action: RuleAction::NotInstalled,
            artifact_text: "{program} Command Not installed".to_string(),
        },
        ClassifierRule {
            stderr_contains: "the remote website is up, but does not seem to be running wordpress"
                .to_string(),
            program_contains: Some("wpscan".to_string()),
            action: RuleAction::BenignFailure,
            artifact_text: "Site does not seem to be running wordpress".to_string(),
        },
    ]
}

/// Loads a replacement rule table from a JSON file.
pub fn load_rules(path: &Path) -> Result<Vec<ClassifierRule>> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading classifier rules from {}", path.display()))?;
    serde_json::from_str(&data)
        .wrap_err_with(|| format!("parsing classifier rules from {}", path.display()))
}

/// Classifies a non-zero exit. Returns the outcome category and the
/// diagnostic text the runner writes to the artifact.
pub fn classify_failure(
    spec: &CommandSpec,
    exit_code: Option<i32>,
    stderr: &str,
    rules: &[ClassifierRule],
) -> (OutcomeKind, String) {
    let stderr_lower = stderr.to_lowercase();
    for rule in rules {
        if rule.matches(spec, &stderr_lower) {
            let kind = match rule.action {
                RuleAction::NotInstalled => OutcomeKind::NotInstalled,
                RuleAction::BenignFailure => OutcomeKind::Failed,
            };
            return (kind, rule.rendered_text(spec));
        }
    }
    let code = exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    (
        OutcomeKind::Failed,
        format!(
            "Command '{}' failed with return code {}",
            spec.display_name(),
            code
        ),
    )
}

/// Classifies a zero exit by artifact size: a present, non-empty artifact
/// is a success, anything else produced no output.
pub fn classify_completed(artifact: &Path) -> OutcomeKind {
    match std::fs::metadata(artifact) {
        Ok(meta) if meta.len() > 0 => OutcomeKind::Success,
        _ => OutcomeKind::EmptyOutput,
    }
}
