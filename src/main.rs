// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use std::time::Duration;
use url::Url;

mod cli;
mod core;
mod logging;
mod report;

use crate::cli::Cli;
use crate::core::classifier;
use crate::core::models::PipelineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;
    let args = Cli::parse();

    let config = PipelineConfig {
        domain: normalize_domain(&args.domain),
        output_dir: args.output_dir,
        jobs: args.jobs,
        timeout: Duration::from_secs(args.timeout),
        report_path: args.report,
    };

    let rules = match &args.rules {
        Some(path) => classifier::load_rules(path)?,
        None => classifier::default_rules(),
    };

    let report_path = crate::core::pipeline::run(&config, rules).await?;
    println!("Report written to {}", report_path.display());
    Ok(())
}

/// Reduces whatever the operator typed to a bare hostname. Accepts either
/// a domain or a full URL; falls back to the raw input when it does not
/// parse.
fn normalize_domain(input: &str) -> String {
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    Url::parse(&with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| input.to_string())
}
