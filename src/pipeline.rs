//! The whole pipeline in one run: fetch → save index → download → summarize.
//!
//! Layout of the destination after a successful run:
//!
//! ```text
//! <dest>/
//!   index.json
//!   <skillName>-summary.md
//!   references/
//!     <link>.md ...
//! ```

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::download::{check_report, download_references};
use crate::error::Result;
use crate::http::Fetcher;
use crate::index::{fetch_index, validate_source_url};
use crate::models::FetchReport;
use crate::output;
use crate::progress::ProgressMode;
use crate::summary::write_summary;

/// File name of the saved index inside the destination.
pub const INDEX_FILE: &str = "index.json";

#[derive(Serialize)]
struct BuildResult<'a> {
    index: String,
    summary: String,
    #[serde(rename = "referencesDir")]
    references_dir: String,
    report: &'a FetchReport<'a>,
}

/// CLI entry point for `llmstxt build`.
///
/// The summary is written even when every download failed; the run then
/// still ends with a processing error.
pub async fn run_build(
    config: &Config,
    url: &str,
    dest: &Path,
    progress: ProgressMode,
) -> Result<()> {
    validate_source_url(url)?;
    output::ensure_writable_dir(dest).await?;
    let references = dest.join(&config.summary.references_dir);
    output::ensure_writable_dir(&references).await?;

    let fetcher = Fetcher::new(&config.http)?;
    let parsed = fetch_index(&fetcher, url).await?;
    let doc = &parsed.document;

    let index_path = dest.join(INDEX_FILE);
    output::write_json(&index_path, doc).await?;
    info!(path = %index_path.display(), links = doc.links.len(), "saved index");

    let reporter = progress.reporter();
    let report = download_references(
        &fetcher,
        &doc.links,
        &references,
        config.download.batch_size,
        reporter.as_ref(),
    )
    .await?;

    let downloaded: HashSet<String> = report.files.iter().cloned().collect();
    let summary_path = write_summary(
        doc,
        dest,
        Some(&downloaded),
        &config.summary.references_dir,
        &config.summary,
    )
    .await?;

    output::print_json(&BuildResult {
        index: index_path.display().to_string(),
        summary: summary_path.display().to_string(),
        references_dir: references.display().to_string(),
        report: &report,
    })?;
    eprintln!(
        "Built '{}' in {}: {} of {} references downloaded ({} failed, {} skipped)",
        doc.title,
        dest.display(),
        report.success,
        report.total,
        report.failed,
        report.skipped
    );

    check_report(&report)
}
