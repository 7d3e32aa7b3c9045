//! Result payloads and destination handling.
//!
//! Machine-readable results go to stdout and nowhere else; everything a
//! human should read goes to stderr. Destination checks run before any
//! network work so that a bad destination costs nothing.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};

const PROBE_FILE: &str = ".llmstxt-write-probe";

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = to_json(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json)
        .and_then(|_| stdout.flush())
        .map_err(|e| Error::filesystem("<stdout>", e))
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = to_json(value)?;
    write_file(path, json.as_bytes()).await
}

/// Write `contents` to `path`, creating parent directories.
pub async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::filesystem(parent, e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

/// Create `dir` (and its parents) if needed and verify it accepts writes.
pub async fn ensure_writable_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::filesystem(dir, e))?;

    let probe = dir.join(PROBE_FILE);
    tokio::fs::write(&probe, b"")
        .await
        .map_err(|e| Error::filesystem(dir, e))?;
    if let Err(e) = tokio::fs::remove_file(&probe).await {
        warn!(path = %probe.display(), "failed to remove write check file: {}", e);
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::Processing(format!("failed to serialize result: {}", e)))
}
