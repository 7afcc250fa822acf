// src/core/mod.rs

// The `core` module root. Everything with real behavior lives here; the
// report renderer at the crate root only formats what these modules
// produce.

/// Data structures shared across the pipeline: `CommandSpec`,
/// `CommandOutcome`, the partitioned `ClassifiedResults`, and the
/// run-scoped `PipelineConfig`.
pub mod models;

/// The ordered stderr-signature rule table that maps finished commands
/// onto the four outcome categories.
pub mod classifier;

/// Executes a single external command: spawn, capture, timeout, artifact
/// persistence.
pub mod runner;

/// Mines artifact text for subdomains of the root domain.
pub mod extractor;

/// The static battery of tools and probe templates the pipeline drives.
pub mod catalog;

/// Fans per-subdomain probes out over the bounded worker pool and
/// aggregates shared-artifact probes.
pub mod dispatcher;

/// The linear run orchestrator: batches, extraction barriers, report
/// hand-off, artifact cleanup.
pub mod pipeline;
