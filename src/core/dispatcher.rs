// src/core/dispatcher.rs

//! Expands a discovered subdomain set into a wave of per-host probes,
//! runs them through the bounded pool, and post-processes aggregated
//! probes: their per-host outputs pool into one shared artifact that is
//! reported as a single logical command entry and feeds the CDN-usage
//! statistic.

use crate::core::catalog::{self, ProbeTemplate};
use crate::core::classifier;
use crate::core::models::{
    ClassifiedResults, CommandSpec, OutcomeKind, PipelineConfig, SubdomainSet,
};
use crate::core::runner::{self, ExecOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Lines of the shared fingerprint artifact that describe a probed host
/// start with a URL scheme token.
static RE_SCHEME_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Runs one batch of specs with at most `jobs` external processes alive
/// at a time. Batch completion is a hard barrier: every task is drained
/// before the results are returned. A panicked task loses its entry and
/// is logged; it cannot take the batch down with it.
pub async fn run_batch(
    specs: Vec<CommandSpec>,
    opts: &ExecOptions,
    jobs: usize,
) -> ClassifiedResults {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();

    for spec in specs {
        let semaphore = semaphore.clone();
        let opts = opts.clone();
        tasks.spawn(async move {
            // The semaphore lives for the whole batch; acquire cannot fail.
            let _permit = semaphore.acquire_owned().await.ok();
            let outcome = runner::execute(&spec, &opts).await;
            (spec, outcome)
        });
    }

    let mut results = ClassifiedResults::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((spec, outcome)) => results.record(spec, &outcome),
            Err(e) => warn!(error = %e, "Probe task panicked"),
        }
    }
    results
}

/// Fans the probe templates out over every discovered subdomain and
/// aggregates the classified results. Failed or missing tools are data;
/// each host is fully isolated from the rest.
pub async fn dispatch(
    subdomains: &SubdomainSet,
    templates: &'static [ProbeTemplate],
    config: &PipelineConfig,
    opts: &ExecOptions,
) -> ClassifiedResults {
    let mut specs = Vec::with_capacity(subdomains.len() * templates.len());
    for tpl in templates {
        for host in subdomains {
            specs.push(catalog::instantiate_probe(tpl, host, config));
        }
    }
    info!(probes = specs.len(), hosts = subdomains.len(), "Dispatching subdomain probes");

    // Shared append-mode artifacts need serialized writes.
    let opts = opts.clone().with_append_lock(Arc::new(Mutex::new(())));
    let mut results = run_batch(specs, &opts, config.jobs).await;

    for tpl in templates.iter().filter(|tpl| tpl.aggregate) {
        collapse_aggregate(&mut results, tpl, subdomains, config);
    }
    results
}

/// Replaces the per-host entries of an aggregated probe with one logical
/// command entry for the shared artifact. Per-host failures keep their
/// own entries so the operator can see which hosts need follow-up.
fn collapse_aggregate(
    results: &mut ClassifiedResults,
    tpl: &ProbeTemplate,
    subdomains: &SubdomainSet,
    config: &PipelineConfig,
) {
    if subdomains.is_empty() {
        return;
    }
    let shared = catalog::probe_artifact(tpl, "", config);
    results.successful.retain(|(_, path)| *path != shared);
    results.empty.retain(|(_, path)| *path != shared);

    let logical = CommandSpec::new(
        format!("{}_subdomains", tpl.name),
        tpl.program,
        vec![format!("({} discovered subdomains)", subdomains.len())],
        shared.clone(),
    )
    .append_mode();
    let kind = classifier::classify_completed(&shared);
    match kind {
        OutcomeKind::Success => results.successful.push((logical, shared.clone())),
        _ => results.empty.push((logical, shared.clone())),
    }

    results.cdn_summary = Some(cdn_statistic(&shared));
}

/// Derives the CDN-usage line from the shared fingerprint artifact:
/// probed hosts are the lines carrying a URL scheme token, CDN-fronted
/// hosts the subset mentioning Cloudflare.
pub fn cdn_statistic(artifact: &Path) -> String {
    let text = std::fs::read_to_string(artifact).unwrap_or_default();
    let mut probed = 0usize;
    let mut fronted = 0usize;
    for line in text.lines() {
        if RE_SCHEME_LINE.is_match(line) {
            probed += 1;
            if line.to_lowercase().contains("cloudflare") {
                fronted += 1;
            }
        }
    }
    format!("{fronted} of {probed} Subdomains using Cloudflare")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::FINGERPRINT_PROBES;
    use crate::core::classifier::default_rules;
    use std::time::Duration;

    static ECHO_AGGREGATE: &[ProbeTemplate] = &[ProbeTemplate {
        name: "whatweb",
        program: "echo",
        args: &["http://{host}", "[200 OK]"],
        aggregate: true,
    }];

    static FALSE_PER_HOST: &[ProbeTemplate] = &[ProbeTemplate {
        name: "dirsearch",
        program: "false",
        args: &["{host}"],
        aggregate: false,
    }];

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            domain: "example.com".to_string(),
            output_dir: dir.to_path_buf(),
            jobs: 2,
            timeout: Duration::from_secs(10),
            report_path: dir.join("recon_report.txt"),
        }
    }

    fn opts() -> ExecOptions {
        ExecOptions::new(Duration::from_secs(10), Arc::new(default_rules()))
    }

    fn hosts(hosts: &[&str]) -> SubdomainSet {
        hosts.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn cdn_statistic_matches_the_expected_wording() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("whatweb_subdomains_out.txt");
        std::fs::write(
            &artifact,
            "http://a.example.com [200 OK] Cloudflare\n\
             https://b.example.com [200 OK] nginx\n\
             some diagnostic noise\n\
             http://c.example.com [301]\n\
             another plain line\n",
        )
        .unwrap();
        assert_eq!(
            cdn_statistic(&artifact),
            "1 of 3 Subdomains using Cloudflare"
        );
    }

    #[test]
    fn cdn_statistic_handles_a_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            cdn_statistic(&dir.path().join("absent.txt")),
            "0 of 0 Subdomains using Cloudflare"
        );
    }

    #[tokio::test]
    async fn aggregate_probe_collapses_into_one_logical_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let set = hosts(&["a.example.com", "b.example.com", "c.example.com"]);

        let results = dispatch(&set, ECHO_AGGREGATE, &cfg, &opts()).await;

        assert_eq!(results.successful.len(), 1);
        let (logical, artifact) = &results.successful[0];
        assert_eq!(logical.name, "whatweb_subdomains");
        let content = std::fs::read_to_string(artifact).unwrap();
        for host in &set {
            assert!(content.contains(host.as_str()));
        }
        assert_eq!(
            results.cdn_summary.as_deref(),
            Some("0 of 3 Subdomains using Cloudflare")
        );
    }

    #[tokio::test]
    async fn per_host_failures_stay_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let set = hosts(&["a.example.com", "b.example.com"]);

        let results = dispatch(&set, FALSE_PER_HOST, &cfg, &opts()).await;

        assert_eq!(results.failed.len(), 2);
        assert_eq!(results.total(), 2);
        assert!(results.cdn_summary.is_none());
    }

    #[tokio::test]
    async fn empty_subdomain_set_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let results = dispatch(&SubdomainSet::new(), FINGERPRINT_PROBES, &cfg, &opts()).await;
        assert_eq!(results.total(), 0);
        assert!(results.cdn_summary.is_none());
    }

    #[tokio::test]
    async fn run_batch_observes_every_spec() {
        let dir = tempfile::tempdir().unwrap();
        let specs: Vec<CommandSpec> = (0..5)
            .map(|i| {
                CommandSpec::new(
                    format!("echo_{i}"),
                    "echo",
                    vec![format!("line {i}")],
                    dir.path().join(format!("echo_{i}_out.txt")),
                )
            })
            .collect();
        let results = run_batch(specs, &opts(), 2).await;
        assert_eq!(results.total(), 5);
        assert_eq!(results.successful.len(), 5);
    }
}
