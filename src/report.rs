// src/report.rs

//! The report renderer. This is deliberately dumb formatting over the
//! classified result set: a paginated plain-text document with a title
//! page, one page per successful command's artifact, and grouped
//! listings of the commands that produced nothing, failed, or were not
//! installed. Pages are separated by form feeds and every page after the
//! first carries a fixed centered footer.

use crate::core::models::ClassifiedResults;
use chrono::Local;
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fixed footer, centered on every page after the first.
pub const PAGE_FOOTER: &str = "reports@autorecon.example";

/// Decorative title-page image, fetched best-effort at render time.
pub const DEFAULT_IMAGE_URL: &str = "https://i.ibb.co/MZsXm4J/websecl-image.png";

const PAGE_WIDTH: usize = 80;
const PAGE_BREAK: &str = "\u{c}\n";

/// dirsearch interleaves this marker into otherwise useful output; those
/// lines are dropped before rendering.
const EXCEPTION_MARKER: &str = "An exception has occurred";

/// Renders the final document. `image_url` is optional so callers that
/// must stay offline (tests, air-gapped runs) can skip the fetch.
pub async fn render(
    results: &ClassifiedResults,
    domain: &str,
    subdomain_count: usize,
    image_url: Option<&str>,
    path: &Path,
) -> Result<()> {
    let image = match image_url {
        Some(url) => fetch_image(url, path.parent().unwrap_or(Path::new("."))).await,
        None => None,
    };

    let mut pages = Vec::new();
    pages.push(title_page(domain, subdomain_count, results, image.as_deref()));

    for (i, (spec, artifact)) in results.successful.iter().enumerate() {
        pages.push(command_page(i + 1, &spec.display_name(), artifact));
    }
    if let Some(page) = group_page(
        "Commands that produced no output but did not fail:",
        &results.empty,
    ) {
        pages.push(page);
    }
    if let Some(page) = group_page("Attempted commands that failed:", &results.failed) {
        pages.push(page);
    }
    if let Some(page) = group_page(
        "Attempted commands that were not installed:",
        &results.not_installed,
    ) {
        pages.push(page);
    }

    let page_count = pages.len();
    let document = paginate(pages);
    std::fs::write(path, document)
        .wrap_err_with(|| format!("writing report to {}", path.display()))?;
    info!(path = %path.display(), pages = page_count, "Report written");
    Ok(())
}

fn title_page(
    domain: &str,
    subdomain_count: usize,
    results: &ClassifiedResults,
    image: Option<&Path>,
) -> String {
    let mut page = String::new();
    page.push_str(&center(&format!("Penetration Test Report: {domain}")));
    page.push_str(&center(&format!(
        "Date: {}",
        Local::now().format("%Y-%m-%d")
    )));
    page.push('\n');
    if let Some(image) = image {
        page.push_str(&center(&format!("[logo: {}]", image.display())));
        page.push('\n');
    }
    page.push_str(&center("Prepared By: autorecon-rs"));
    page.push('\n');
    page.push_str(&center(&format!(
        "Subdomains identified: {subdomain_count}"
    )));
    if let Some(cdn) = &results.cdn_summary {
        page.push_str(&center(cdn));
    }
    page
}

fn command_page(index: usize, display_name: &str, artifact: &Path) -> String {
    let mut page = format!("Command {index}: {display_name}\n\n");
    match std::fs::read(artifact) {
        Ok(data) => {
            let text = String::from_utf8_lossy(&data);
            for line in text.lines().filter(|l| !l.contains(EXCEPTION_MARKER)) {
                page.push_str(&scrub(line));
                page.push('\n');
            }
        }
        Err(e) => {
            debug!(path = %artifact.display(), error = %e, "Artifact unreadable at render time");
            page.push_str("(output unavailable)\n");
        }
    }
    page
}

fn group_page(heading: &str, entries: &[(crate::core::models::CommandSpec, PathBuf)]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let mut page = format!("{heading}\n\n");
    for (spec, _) in entries {
        page.push_str(&format!("Command: {}\n", spec.display_name()));
    }
    Some(page)
}

fn paginate(pages: Vec<String>) -> String {
    let mut document = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            document.push_str(PAGE_BREAK);
        }
        document.push_str(page);
        if i > 0 {
            document.push('\n');
            document.push_str(&center(PAGE_FOOTER));
        }
    }
    document
}

fn center(line: &str) -> String {
    format!("{:^width$}\n", line, width = PAGE_WIDTH)
}

/// Drops non-printable characters a tool may have left in its output,
/// keeping tabs.
fn scrub(line: &str) -> String {
    line.chars().filter(|c| !c.is_control() || *c == '\t').collect()
}

/// Downloads the decorative image next to the report. Strictly
/// best-effort: any failure just means the report has no logo.
async fn fetch_image(url: &str, dir: &Path) -> Option<PathBuf> {
    let client = reqwest::Client::builder()
        .user_agent("autorecon-rs/0.1")
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .ok()?;
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(url, error = %e, "Decorative image fetch failed");
            return None;
        }
    };
    let bytes = response.bytes().await.ok()?;
    let path = dir.join("report-logo.png");
    std::fs::write(&path, &bytes).ok()?;
    Some(path)
}
