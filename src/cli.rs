// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Automated reconnaissance pipeline: runs a battery of external scanning
/// tools against a root domain, harvests discovered subdomains, probes
/// them, and writes a single report document.
#[derive(Debug, Parser)]
#[command(name = "autorecon-rs", version)]
pub struct Cli {
    /// Root domain to scan (e.g. example.com). A scheme prefix is
    /// stripped if present.
    pub domain: String,

    /// Maximum number of external tools running at once.
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Per-command timeout in seconds; expired commands are killed and
    /// reported as failed.
    #[arg(short, long, default_value = "600")]
    pub timeout: u64,

    /// Directory where tool output artifacts are created (and deleted at
    /// the end of the run).
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Path of the final report document.
    #[arg(short, long, default_value = "recon_report.txt")]
    pub report: PathBuf,

    /// JSON file replacing the built-in stderr-signature classifier rules.
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_positional_and_flags_have_defaults() {
        let cli = Cli::parse_from(["autorecon-rs", "example.com"]);
        assert_eq!(cli.domain, "example.com");
        assert_eq!(cli.jobs, 4);
        assert_eq!(cli.timeout, 600);
        assert_eq!(cli.report, PathBuf::from("recon_report.txt"));
        assert!(cli.rules.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "autorecon-rs",
            "example.com",
            "-j",
            "8",
            "-t",
            "120",
            "-o",
            "/tmp/recon",
        ]);
        assert_eq!(cli.jobs, 8);
        assert_eq!(cli.timeout, 120);
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/recon"));
    }
}
