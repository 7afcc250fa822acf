// src/core/extractor.rs

//! Mines raw tool output for subdomains of the configured root domain.
//! The extractor is deliberately forgiving: tool output is heterogeneous
//! text, so anything that looks like `<something>.<root>` (with an
//! optional scheme prefix and trailing slash) is a candidate, and
//! candidates that do not parse as hostnames are dropped without comment.

use crate::core::models::SubdomainSet;
use color_eyre::eyre::Result;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// DNS-shaped hostname check: non-empty labels of alphanumerics, hyphens
/// and underscores (service labels like `_dmarc` are legitimate output).
fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Builds the per-root-domain match pattern. The root is escaped for
/// literal interpretation, so `example.com` does not also match
/// `exampleXcom`.
fn subdomain_pattern(root_domain: &str) -> Result<Regex> {
    let escaped = regex::escape(&root_domain.to_lowercase());
    Ok(Regex::new(&format!(
        r"(?i)(?:https?://)?([\w.-]*\.{escaped}/?)"
    ))?)
}

/// Scans every artifact for occurrences of subdomains of `root_domain`
/// and returns the normalized, deduplicated set.
///
/// Normalization: lowercase, scheme discarded (never captured), one
/// trailing slash stripped. Missing artifact files are skipped. Each call
/// rebuilds the set from scratch; running it twice over an unchanged
/// artifact list yields the same set.
pub fn extract<P: AsRef<Path>>(artifacts: &[P], root_domain: &str) -> Result<SubdomainSet> {
    let pattern = subdomain_pattern(root_domain)?;
    let mut subdomains = SubdomainSet::new();

    for artifact in artifacts {
        let artifact = artifact.as_ref();
        let data = match std::fs::read(artifact) {
            Ok(data) => data,
            Err(_) => {
                debug!(path = %artifact.display(), "Artifact missing, skipping extraction");
                continue;
            }
        };
        let text = String::from_utf8_lossy(&data);
        for line in text.lines() {
            for caps in pattern.captures_iter(line) {
                let Some(m) = caps.get(1) else { continue };
                let candidate = m.as_str().to_lowercase();
                let candidate = candidate.strip_suffix('/').unwrap_or(&candidate);
                if is_valid_hostname(candidate) {
                    subdomains.insert(candidate.to_string());
                }
            }
        }
    }

    info!(root = %root_domain, count = subdomains.len(), "Subdomain extraction pass complete");
    Ok(subdomains)
}
