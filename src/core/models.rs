// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The set of normalized subdomains discovered in one extraction pass.
///
/// Entries are lower-cased hostnames with no scheme prefix and no trailing
/// slash, each a suffix-match of the configured root domain. A `BTreeSet`
/// keeps iteration order stable across runs.
pub type SubdomainSet = BTreeSet<String>;

// --- Command Specification ---

/// Declarative description of one external tool invocation.
///
/// The program and its arguments are kept separate and the process is
/// spawned directly (no shell), so a hostile root domain cannot splice
/// additional commands into the line. The caller is still responsible for
/// the semantics of whatever it interpolates into `args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Short identifier used for the default artifact name (e.g. "dig_ns").
    pub name: String,
    /// Executable looked up on PATH.
    pub program: String,
    /// Fully interpolated argument vector.
    pub args: Vec<String>,
    /// Where captured stdout lands. The runner may re-point this when the
    /// tool reports its own output file on stderr.
    pub artifact: PathBuf,
    /// Append to the artifact instead of truncating it. Only append-mode
    /// artifacts may be shared between specs.
    pub append: bool,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        artifact: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            artifact: artifact.into(),
            append: false,
        }
    }

    pub fn append_mode(mut self) -> Self {
        self.append = true;
        self
    }

    /// The full command line as shown in logs and the report.
    pub fn display_name(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

// --- Command Outcome ---

/// The four terminal categories of a command execution. Every executed
/// `CommandSpec` ends in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum OutcomeKind {
    /// Exit code 0 and a non-empty artifact on disk.
    Success,
    /// Exit code 0 but the artifact is missing or empty.
    EmptyOutput,
    /// Non-zero exit, spawn/IO error, or timeout.
    Failed,
    /// The tool is not present on PATH.
    NotInstalled,
}

/// Result of executing one `CommandSpec`. Produced exactly once per
/// execution, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub kind: OutcomeKind,
    /// Final artifact path, after any tool-reported redirect.
    pub artifact: PathBuf,
    /// Diagnostic text for `Failed` outcomes (also written to the artifact).
    pub reason: Option<String>,
}

// --- Classified Results ---

/// The partitioned result set of a pipeline run: the sole hand-off object
/// to the report renderer. The four partitions are pairwise disjoint and
/// their union is the set of executed specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedResults {
    pub successful: Vec<(CommandSpec, PathBuf)>,
    pub empty: Vec<(CommandSpec, PathBuf)>,
    pub failed: Vec<(CommandSpec, PathBuf)>,
    pub not_installed: Vec<(CommandSpec, PathBuf)>,
    /// Human-readable CDN-usage line, filled in by the probe dispatcher.
    pub cdn_summary: Option<String>,
}

impl ClassifiedResults {
    /// Files a finished execution into the matching partition.
    pub fn record(&mut self, spec: CommandSpec, outcome: &CommandOutcome) {
        let entry = (spec, outcome.artifact.clone());
        match outcome.kind {
            OutcomeKind::Success => self.successful.push(entry),
            OutcomeKind::EmptyOutput => self.empty.push(entry),
            OutcomeKind::Failed => self.failed.push(entry),
            OutcomeKind::NotInstalled => self.not_installed.push(entry),
        }
    }

    /// Folds another batch into this one. The CDN summary is
    /// last-writer-wins; only the dispatcher ever sets it.
    pub fn merge(&mut self, other: ClassifiedResults) {
        self.successful.extend(other.successful);
        self.empty.extend(other.empty);
        self.failed.extend(other.failed);
        self.not_installed.extend(other.not_installed);
        if other.cdn_summary.is_some() {
            self.cdn_summary = other.cdn_summary;
        }
    }

    /// Every artifact path recorded in any partition, in insertion order.
    /// Shared append-mode artifacts can appear more than once; cleanup
    /// tolerates the duplicate deletes.
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.successful
            .iter()
            .chain(self.empty.iter())
            .chain(self.failed.iter())
            .chain(self.not_installed.iter())
            .map(|(_, path)| path.as_path())
    }

    pub fn total(&self) -> usize {
        self.successful.len() + self.empty.len() + self.failed.len() + self.not_installed.len()
    }
}

// --- Pipeline Configuration ---

/// Run-scoped configuration assembled from the CLI.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The operator-supplied root domain, already stripped of any scheme.
    pub domain: String,
    /// Directory where artifacts are created (and deleted at teardown).
    pub output_dir: PathBuf,
    /// Maximum number of external processes running at once.
    pub jobs: usize,
    /// Per-command wall-clock budget.
    pub timeout: Duration,
    /// Where the final report document is written.
    pub report_path: PathBuf,
}

impl PipelineConfig {
    /// Default artifact path for a command template: `<name>_out.txt`
    /// under the output directory.
    pub fn artifact_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}_out.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(kind: OutcomeKind) -> CommandOutcome {
        CommandOutcome {
            kind,
            artifact: PathBuf::from("x_out.txt"),
            reason: None,
        }
    }

    fn spec(name: &str) -> CommandSpec {
        CommandSpec::new(name, "echo", vec!["hi".into()], format!("{name}_out.txt"))
    }

    #[test]
    fn record_partitions_are_disjoint_and_total() {
        let mut results = ClassifiedResults::default();
        results.record(spec("a"), &outcome(OutcomeKind::Success));
        results.record(spec("b"), &outcome(OutcomeKind::EmptyOutput));
        results.record(spec("c"), &outcome(OutcomeKind::Failed));
        results.record(spec("d"), &outcome(OutcomeKind::NotInstalled));

        assert_eq!(results.total(), 4);
        assert_eq!(results.successful.len(), 1);
        assert_eq!(results.empty.len(), 1);
        assert_eq!(results.failed.len(), 1);
        assert_eq!(results.not_installed.len(), 1);
    }

    #[test]
    fn merge_combines_partitions_and_keeps_cdn_summary() {
        let mut first = ClassifiedResults::default();
        first.record(spec("a"), &outcome(OutcomeKind::Success));

        let mut second = ClassifiedResults::default();
        second.record(spec("b"), &outcome(OutcomeKind::Failed));
        second.cdn_summary = Some("1 of 3 Subdomains using Cloudflare".to_string());

        first.merge(second);
        assert_eq!(first.total(), 2);
        assert_eq!(
            first.cdn_summary.as_deref(),
            Some("1 of 3 Subdomains using Cloudflare")
        );
    }

    #[test]
    fn display_name_joins_program_and_args() {
        let spec = CommandSpec::new(
            "subfinder",
            "subfinder",
            vec!["-silent".into(), "-d".into(), "example.com".into()],
            "subfinder_out.txt",
        );
        assert_eq!(spec.display_name(), "subfinder -silent -d example.com");
    }
}
