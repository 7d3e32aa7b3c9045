//! Download progress reporting.
//!
//! Progress is emitted on **stderr** after every batch and once at the end,
//! so a caller can show liveness during a long run while stdout stays clean
//! JSON. The JSON reporter writes one object per line tagged
//! `"event": "progress"`, which keeps it distinguishable from log lines.

use std::io::Write;

/// A single progress event for a download run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadProgressEvent {
    /// Batch `batch` of `batches` has settled; `done` of `total` links attempted.
    Batch {
        batch: usize,
        batches: usize,
        done: usize,
        total: usize,
        success: usize,
        failed: usize,
    },
    /// All batches have settled.
    Finished {
        success: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Reports download progress. Implementations write to stderr (human or JSON).
pub trait DownloadProgressReporter: Send + Sync {
    fn report(&self, event: DownloadProgressEvent);
}

/// Human-friendly progress on stderr: "download  batch 2/4  10 / 18 links (9 ok, 1 failed)".
pub struct StderrProgress;

impl DownloadProgressReporter for StderrProgress {
    fn report(&self, event: DownloadProgressEvent) {
        let line = match &event {
            DownloadProgressEvent::Batch {
                batch,
                batches,
                done,
                total,
                success,
                failed,
            } => format!(
                "download  batch {}/{}  {} / {} links ({} ok, {} failed)\n",
                batch,
                batches,
                format_number(*done as u64),
                format_number(*total as u64),
                format_number(*success as u64),
                format_number(*failed as u64)
            ),
            DownloadProgressEvent::Finished {
                success,
                failed,
                skipped,
            } => format!(
                "download  done  {} ok, {} failed, {} skipped\n",
                format_number(*success as u64),
                format_number(*failed as u64),
                format_number(*skipped as u64)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl DownloadProgressReporter for JsonProgress {
    fn report(&self, event: DownloadProgressEvent) {
        let obj = event_json(&event);
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn event_json(event: &DownloadProgressEvent) -> serde_json::Value {
    match event {
        DownloadProgressEvent::Batch {
            batch,
            batches,
            done,
            total,
            success,
            failed,
        } => serde_json::json!({
            "event": "progress",
            "phase": "downloading",
            "batch": batch,
            "batches": batches,
            "n": done,
            "total": total,
            "success": success,
            "failed": failed
        }),
        DownloadProgressEvent::Finished {
            success,
            failed,
            skipped,
        } => serde_json::json!({
            "event": "progress",
            "phase": "finished",
            "success": success,
            "failed": failed,
            "skipped": skipped
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl DownloadProgressReporter for NoProgress {
    fn report(&self, _event: DownloadProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, JSON lines otherwise so
    /// scripted callers still see liveness.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Json
        }
    }

    pub fn reporter(&self) -> Box<dyn DownloadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
