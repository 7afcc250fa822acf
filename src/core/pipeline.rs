// src/core/pipeline.rs

//! The run orchestrator. Strictly linear, no branching back:
//! primary battery, extraction pass 1, per-subdomain directory probes,
//! extraction pass 2, fingerprint probes, report, artifact cleanup.
//! Individual tool failures are classification data and never abort the
//! run; only the renderer and output-directory setup can fail it.

use crate::core::classifier::ClassifierRule;
use crate::core::models::{ClassifiedResults, PipelineConfig};
use crate::core::runner::ExecOptions;
use crate::core::{catalog, dispatcher, extractor};
use crate::report;
use color_eyre::eyre::{Result, WrapErr};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the whole pipeline against the configured root domain and writes
/// the report. Returns the report path.
pub async fn run(config: &PipelineConfig, rules: Vec<ClassifierRule>) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.output_dir)
        .wrap_err_with(|| format!("creating output directory {}", config.output_dir.display()))?;
    let opts = ExecOptions::new(config.timeout, Arc::new(rules));

    // Primary battery against the root domain.
    let primary = catalog::active_primary(config);
    info!(domain = %config.domain, commands = primary.len(), "Running primary command batch");
    let mut results = dispatcher::run_batch(primary, &opts, config.jobs).await;

    // Extraction pass 1 seeds the per-subdomain directory probes.
    let seeds = extractor::extract(&collect_artifacts(&results), &config.domain)?;
    info!(subdomains = seeds.len(), "Extraction pass 1 complete");
    let secondary = dispatcher::dispatch(&seeds, catalog::SECONDARY_PROBES, config, &opts).await;
    results.merge(secondary);

    // Pass 2 rebuilds the set from every artifact produced so far; the
    // directory probes may reference hosts the first pass never saw.
    let subdomains = extractor::extract(&collect_artifacts(&results), &config.domain)?;
    info!(subdomains = subdomains.len(), "Extraction pass 2 complete");
    let probes =
        dispatcher::dispatch(&subdomains, catalog::FINGERPRINT_PROBES, config, &opts).await;
    results.merge(probes);

    info!(
        total = results.total(),
        successful = results.successful.len(),
        empty = results.empty.len(),
        failed = results.failed.len(),
        not_installed = results.not_installed.len(),
        "All batches complete"
    );

    report::render(
        &results,
        &config.domain,
        subdomains.len(),
        Some(report::DEFAULT_IMAGE_URL),
        &config.report_path,
    )
    .await
    .wrap_err("rendering the report")?;

    cleanup(results.artifacts());
    info!(report = %config.report_path.display(), "Pipeline finished");
    Ok(config.report_path.clone())
}

fn collect_artifacts(results: &ClassifiedResults) -> Vec<PathBuf> {
    results.artifacts().map(Path::to_path_buf).collect()
}

/// Deletes every artifact recorded during the run. Files that are
/// already gone (shared artifacts appear once per contributing spec) are
/// not an error.
pub fn cleanup<'a>(artifacts: impl Iterator<Item = &'a Path>) {
    for path in artifacts {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{CommandOutcome, CommandSpec, OutcomeKind};

    #[test]
    fn cleanup_removes_present_files_and_ignores_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        let present_a = dir.path().join("a_out.txt");
        let present_b = dir.path().join("b_out.txt");
        let missing = dir.path().join("gone_out.txt");
        std::fs::write(&present_a, "x").unwrap();
        std::fs::write(&present_b, "y").unwrap();

        let paths = [present_a.clone(), missing, present_b.clone()];
        cleanup(paths.iter().map(|p| p.as_path()));

        assert!(!present_a.exists());
        assert!(!present_b.exists());
    }

    #[test]
    fn cleanup_tolerates_duplicate_shared_artifact_entries() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("whatweb_subdomains_out.txt");
        std::fs::write(&shared, "pooled").unwrap();

        let mut results = ClassifiedResults::default();
        let outcome = CommandOutcome {
            kind: OutcomeKind::Failed,
            artifact: shared.clone(),
            reason: None,
        };
        for name in ["whatweb_a", "whatweb_b"] {
            let spec = CommandSpec::new(name, "whatweb", vec![], shared.clone());
            results.record(spec, &outcome);
        }

        cleanup(results.artifacts());
        assert!(!shared.exists());
    }
}
