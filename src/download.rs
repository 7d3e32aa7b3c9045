//! Reference downloader.
//!
//! Materializes every link of an index as a local markdown file. Links are
//! validated up front, then fetched in fixed-size batches: batches run one
//! after another, fetches inside a batch run concurrently on the current
//! task. A failed fetch is recorded as that link's outcome and never stops
//! its siblings or later batches.
//!
//! Each written file starts with a small front-matter header recording where
//! and when the content came from:
//!
//! ```text
//! ---
//! source: https://example.com/start.md
//! title: "start"
//! description: "How to begin"
//! fetched: 2026-10-16T12:00:00+00:00
//! ---
//!
//! <body>
//! ```

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, NetworkError, Result};
use crate::http::Fetcher;
use crate::index;
use crate::models::{FetchOutcome, FetchReport, FetchStatus, Link};
use crate::output;
use crate::progress::{DownloadProgressEvent, DownloadProgressReporter, ProgressMode};
use crate::sanitize::sanitize_filename;

/// Extension of every reference file.
pub const REFERENCE_EXTENSION: &str = "md";

/// A link that passed validation, with the file it will be written to.
struct Planned<'a> {
    link: &'a Link,
    file_name: String,
}

/// Download every link in `links` into `dest`.
///
/// Fails only on preconditions (destination cannot be created or written).
/// Per-link failures are recorded in the returned report; callers decide
/// what a report with zero successes means (see
/// [`FetchReport::is_total_failure`]).
pub async fn download_references<'a>(
    fetcher: &Fetcher,
    links: &'a [Link],
    dest: &Path,
    batch_size: usize,
    progress: &dyn DownloadProgressReporter,
) -> Result<FetchReport<'a>> {
    output::ensure_writable_dir(dest).await?;

    let mut report = FetchReport {
        total: links.len(),
        ..Default::default()
    };
    let planned = plan(links, &mut report);

    let batch_size = batch_size.max(1);
    let batches = planned.len().div_ceil(batch_size);
    let mut done = 0;

    for (i, batch) in planned.chunks(batch_size).enumerate() {
        debug!(batch = i + 1, batches, size = batch.len(), "starting batch");

        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .map(|p| fetch_one(fetcher, p.link, &p.file_name, dest))
            .collect();

        while let Some(outcome) = in_flight.next().await {
            if let FetchStatus::Failure { reason } = &outcome.status {
                warn!(name = %outcome.link.name, url = %outcome.link.url, "fetch failed: {}", reason);
            }
            report.record(outcome);
        }

        done += batch.len();
        progress.report(DownloadProgressEvent::Batch {
            batch: i + 1,
            batches,
            done,
            total: planned.len(),
            success: report.success,
            failed: report.failed,
        });
    }

    progress.report(DownloadProgressEvent::Finished {
        success: report.success,
        failed: report.failed,
        skipped: report.skipped,
    });

    Ok(report)
}

/// Synchronous pre-validation pass. Invalid links are counted as skipped;
/// valid ones get a unique sanitized file name.
fn plan<'a>(links: &'a [Link], report: &mut FetchReport<'a>) -> Vec<Planned<'a>> {
    let mut planned = Vec::with_capacity(links.len());

    for (i, (link, file_name)) in links.iter().zip(reference_file_names(links)).enumerate() {
        match file_name {
            Ok(file_name) => planned.push(Planned { link, file_name }),
            Err(reason) => {
                let label = if link.name.trim().is_empty() {
                    format!("link #{}", i + 1)
                } else {
                    format!("link #{} ({})", i + 1, link.name)
                };
                warn!("skipping {}: {}", label, reason);
                report.record_skip(format!("{}: skipped, {}", label, reason));
            }
        }
    }

    planned
}

/// The file each link is written to, in input order, or the reason the link
/// is not fetchable. Deterministic for a given link list, so other stages can
/// point at reference files without re-running the download.
pub fn reference_file_names(links: &[Link]) -> Vec<Result<String, String>> {
    let mut used = HashSet::new();
    links
        .iter()
        .map(|link| -> Result<String, String> {
            validate_link(link)?;
            Ok(unique_file_name(&link.name, &mut used))
        })
        .collect()
}

fn validate_link(link: &Link) -> Result<(), String> {
    if link.name.trim().is_empty() {
        return Err("missing name".to_string());
    }
    if link.url.trim().is_empty() {
        return Err("missing url".to_string());
    }
    let url = Url::parse(&link.url).map_err(|e| format!("invalid URL '{}': {}", link.url, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported URL scheme '{}'", other)),
    }
}

/// Sanitized `<name>.md`, suffixed with `-2`, `-3`, … when an earlier link
/// already claimed the name. Comparison ignores case so the result is safe
/// on case-insensitive filesystems too.
fn unique_file_name(name: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_filename(name);
    let mut candidate = format!("{}.{}", base, REFERENCE_EXTENSION);
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{}-{}.{}", base, n, REFERENCE_EXTENSION);
        n += 1;
    }
    candidate
}

async fn fetch_one<'a>(
    fetcher: &Fetcher,
    link: &'a Link,
    file_name: &str,
    dest: &Path,
) -> FetchOutcome<'a> {
    let status = match fetcher.get_text(&link.url).await {
        Ok(body) if body.trim().is_empty() => FetchStatus::Failure {
            reason: "Empty response".to_string(),
        },
        Ok(body) => {
            let contents = render_reference(link, &body, Utc::now());
            match tokio::fs::write(dest.join(file_name), contents).await {
                Ok(()) => FetchStatus::Success {
                    file_name: file_name.to_string(),
                },
                Err(e) => FetchStatus::Failure {
                    reason: format!("Write failed: {}", e),
                },
            }
        }
        Err(e) => FetchStatus::Failure {
            reason: failure_reason(&e),
        },
    };
    FetchOutcome { link, status }
}

/// Short reason string recorded for a failed fetch.
pub fn failure_reason(err: &NetworkError) -> String {
    match err {
        NetworkError::Timeout { secs, .. } => format!("Timeout ({}s)", secs),
        NetworkError::HttpStatus { code, .. } => format!("HTTP {}", code),
        NetworkError::Connection { message, .. } => message.clone(),
    }
}

/// Front-matter header followed by a blank line and the raw body.
pub fn render_reference(link: &Link, body: &str, fetched_at: DateTime<Utc>) -> String {
    let description = single_line(&link.description);
    format!(
        "---\nsource: {}\ntitle: {}\ndescription: {}\nfetched: {}\n---\n\n{}",
        link.url,
        quote(&link.name),
        quote(&description),
        fetched_at.to_rfc3339(),
        body
    )
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Double-quoted scalar; JSON string escaping is valid YAML.
pub(crate) fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.replace('"', "'")))
}

/// CLI entry point for `llmstxt download`.
///
/// Prints the [`FetchReport`] JSON to stdout. Returns
/// [`Error::Processing`] after printing when nothing could be downloaded.
pub async fn run_download(
    config: &Config,
    input: &str,
    dest: &Path,
    progress: ProgressMode,
) -> Result<()> {
    output::ensure_writable_dir(dest).await?;

    let fetcher = Fetcher::new(&config.http)?;
    let doc = index::load_index(&fetcher, input).await?;
    let reporter = progress.reporter();

    let report = download_references(
        &fetcher,
        &doc.links,
        dest,
        config.download.batch_size,
        reporter.as_ref(),
    )
    .await?;

    output::print_json(&report)?;
    eprintln!(
        "Downloaded {} of {} references to {} ({} failed, {} skipped)",
        report.success,
        report.total,
        dest.display(),
        report.failed,
        report.skipped
    );

    check_report(&report)
}

/// Escalate a report with zero successes into a processing error.
pub fn check_report(report: &FetchReport<'_>) -> Result<()> {
    if report.is_total_failure() {
        return Err(Error::Processing(format!(
            "No references downloaded ({} failed, {} skipped)",
            report.failed, report.skipped
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::progress::NoProgress;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn link(name: &str, url: &str) -> Link {
        Link {
            name: name.to_string(),
            url: url.to_string(),
            description: format!("About {}", name),
        }
    }

    fn fetcher(timeout_secs: u64) -> Fetcher {
        Fetcher::new(&HttpConfig {
            timeout_secs,
            ..HttpConfig::default()
        })
        .unwrap()
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<DownloadProgressEvent>>);

    impl DownloadProgressReporter for Recorder {
        fn report(&self, event: DownloadProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn partial_failure_keeps_successes_in_either_order() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/good.md")
            .with_status(200)
            .with_body("# Good\n\nBody text.")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/missing.md")
            .with_status(404)
            .create_async()
            .await;

        let good = link("good", &format!("{}/good.md", server.url()));
        let missing = link("missing", &format!("{}/missing.md", server.url()));

        for links in [
            vec![good.clone(), missing.clone()],
            vec![missing.clone(), good.clone()],
        ] {
            let tmp = tempfile::TempDir::new().unwrap();
            let report = download_references(&fetcher(5), &links, tmp.path(), 5, &NoProgress)
                .await
                .unwrap();

            assert_eq!(report.total, 2);
            assert_eq!(report.success, 1);
            assert_eq!(report.failed, 1);
            assert_eq!(report.files, vec!["good.md"]);
            assert!(report.warnings.iter().any(|w| w.contains("HTTP 404")));
            assert!(check_report(&report).is_ok());

            let written = std::fs::read_to_string(tmp.path().join("good.md")).unwrap();
            assert!(written.starts_with("---\nsource: "));
            assert!(written.contains("title: \"good\""));
            assert!(written.ends_with("---\n\n# Good\n\nBody text."));
            assert!(!tmp.path().join("missing.md").exists());
        }
    }

    #[tokio::test]
    async fn all_failures_is_total_failure() {
        let mut server = mockito::Server::new_async().await;
        let _err = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let links: Vec<Link> = (0..7)
            .map(|i| link(&format!("doc{}", i), &format!("{}/doc{}.md", server.url(), i)))
            .collect();
        let tmp = tempfile::TempDir::new().unwrap();
        let report = download_references(&fetcher(5), &links, tmp.path(), 3, &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.success, 0);
        assert_eq!(report.failed, 7);
        assert!(report.is_total_failure());
        let err = check_report(&report).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn empty_body_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _blank = server
            .mock("GET", "/blank.md")
            .with_status(200)
            .with_body("   \n")
            .create_async()
            .await;

        let links = vec![link("blank", &format!("{}/blank.md", server.url()))];
        let tmp = tempfile::TempDir::new().unwrap();
        let report = download_references(&fetcher(5), &links, tmp.path(), 5, &NoProgress)
            .await
            .unwrap();
        assert_eq!(
            report.outcomes[0].status,
            FetchStatus::Failure {
                reason: "Empty response".to_string()
            }
        );
    }

    #[tokio::test]
    async fn timeout_does_not_hold_back_siblings() {
        let slow_base = silent_server().await;
        let mut server = mockito::Server::new_async().await;
        let _fast = server
            .mock("GET", "/fast.md")
            .with_status(200)
            .with_body("fast body")
            .create_async()
            .await;

        let links = vec![
            link("slow", &format!("{}/slow.md", slow_base)),
            link("fast", &format!("{}/fast.md", server.url())),
        ];
        let tmp = tempfile::TempDir::new().unwrap();
        let started = Instant::now();
        let report = download_references(&fetcher(1), &links, tmp.path(), 5, &NoProgress)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(report.success, 1);
        assert_eq!(report.failed, 1);
        // Completion order: the fast fetch settles first.
        assert_eq!(report.outcomes[0].link.name, "fast");
        assert_eq!(
            report.outcomes[1].status,
            FetchStatus::Failure {
                reason: "Timeout (1s)".to_string()
            }
        );
        assert!(tmp.path().join("fast.md").exists());
    }

    #[tokio::test]
    async fn invalid_links_skipped_before_fetch() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/ok.md")
            .with_status(200)
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let links = vec![
            link("ok", &format!("{}/ok.md", server.url())),
            link("", "https://example.com/x.md"),
            link("relative", "/docs/relative.md"),
            link("ftp", "ftp://example.com/file.md"),
            link("nourl", ""),
        ];
        let tmp = tempfile::TempDir::new().unwrap();
        let report = download_references(&fetcher(5), &links, tmp.path(), 5, &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.total, 5);
        assert_eq!(report.skipped, 4);
        assert_eq!(report.success, 1);
        assert_eq!(report.warnings.len(), 4);
        assert!(report.warnings[0].contains("missing name"));
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn progress_reported_per_batch_and_at_end() {
        let mut server = mockito::Server::new_async().await;
        let _any = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body("content")
            .create_async()
            .await;

        let links: Vec<Link> = (0..5)
            .map(|i| link(&format!("p{}", i), &format!("{}/p{}.md", server.url(), i)))
            .collect();
        let tmp = tempfile::TempDir::new().unwrap();
        let recorder = Recorder::default();
        let report = download_references(&fetcher(5), &links, tmp.path(), 2, &recorder)
            .await
            .unwrap();
        assert_eq!(report.success, 5);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[2],
            DownloadProgressEvent::Batch {
                batch: 3,
                batches: 3,
                done: 5,
                total: 5,
                success: 5,
                failed: 0,
            }
        );
        assert_eq!(
            events[3],
            DownloadProgressEvent::Finished {
                success: 5,
                failed: 0,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn unwritable_destination_fails_before_fetching() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let links = vec![link("a", "https://example.invalid/a.md")];
        let err = download_references(&fetcher(5), &links, &blocker, 5, &NoProgress)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn duplicate_names_get_unique_files() {
        let mut used = HashSet::new();
        assert_eq!(unique_file_name("index", &mut used), "index.md");
        assert_eq!(unique_file_name("Index", &mut used), "Index-2.md");
        assert_eq!(unique_file_name("index", &mut used), "index-3.md");
        assert_eq!(unique_file_name("a/b", &mut used), "a-b.md");
    }

    #[test]
    fn file_names_skip_invalid_links_without_consuming_names() {
        let links = vec![
            link("guide", "https://x.test/a/guide.md"),
            link("guide", "not a url"),
            link("guide", "https://x.test/b/guide.md"),
        ];
        let names = reference_file_names(&links);
        assert_eq!(names[0], Ok("guide.md".to_string()));
        assert!(names[1].is_err());
        assert_eq!(names[2], Ok("guide-2.md".to_string()));
    }

    #[test]
    fn header_flattens_description() {
        let mut l = link("start", "https://example.com/start.md");
        l.description = "Line one\nline \"two\"".to_string();
        let ts = DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let out = render_reference(&l, "BODY", ts);
        assert_eq!(
            out,
            "---\nsource: https://example.com/start.md\ntitle: \"start\"\n\
             description: \"Line one line \\\"two\\\"\"\n\
             fetched: 2026-10-16T12:00:00+00:00\n---\n\nBODY"
        );
    }

    #[test]
    fn failure_reasons() {
        let url = "https://x.test".to_string();
        assert_eq!(
            failure_reason(&NetworkError::Timeout {
                url: url.clone(),
                secs: 30
            }),
            "Timeout (30s)"
        );
        assert_eq!(
            failure_reason(&NetworkError::HttpStatus {
                url: url.clone(),
                code: 500,
                text: "Internal Server Error".into()
            }),
            "HTTP 500"
        );
        assert_eq!(
            failure_reason(&NetworkError::Connection {
                url,
                message: "connection refused".into()
            }),
            "connection refused"
        );
    }
}
