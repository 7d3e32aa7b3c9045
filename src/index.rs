//! Index fetching and parsing.
//!
//! An index document is a small `llms.txt`-style text file:
//!
//! ```text
//! # My Docs
//! - [Getting Started](https://example.com/start.md): How to begin
//! - [API Reference](https://example.com/api.md)
//! ```
//!
//! The first `# ` heading is the title; every `- [title](url)` line is a
//! link, optionally followed by `: description`. Everything else is ignored.
//! Parsing is a single pure pass over the text, see [`parse_index`].

use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::Fetcher;
use crate::models::{IndexDocument, Link};
use crate::output;

/// Title used when the index has no `# ` heading.
pub const DEFAULT_TITLE: &str = "Documentation";
/// Derived name used when the title slugifies to nothing.
pub const DEFAULT_DERIVED_NAME: &str = "documentation";
/// Longest description kept from the index, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const EXPECTED_FORMAT: &str = "expected lines like `- [Title](https://example.com/page.md): description`";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s+(.+?)\s*$").unwrap());

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s+\[([^\]]+)\]\(((?:[^()\s]|\([^()\s]*\))+)\)(?:\s*:\s*(.*))?").unwrap()
});

/// A parsed document plus the lines that were dropped on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIndex {
    pub document: IndexDocument,
    pub warnings: Vec<String>,
}

/// Parse raw index text.
///
/// Fails with [`Error::Parse`] when the text is blank or contains no valid
/// links. Links whose URL is not absolute are skipped with a warning.
pub fn parse_index(text: &str, source_url: &str, fetched_at: DateTime<Utc>) -> Result<ParsedIndex> {
    if text.trim().is_empty() {
        return Err(Error::Parse(format!("Empty response from {}", source_url)));
    }

    let mut title: Option<String> = None;
    let mut links = Vec::new();
    let mut warnings = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        if title.is_none() {
            if let Some(caps) = TITLE_RE.captures(line) {
                title = Some(caps[1].to_string());
                continue;
            }
        }

        let Some(caps) = LINK_RE.captures(line) else {
            continue;
        };
        let link_title = caps[1].trim();
        let raw_url = caps[2].trim();

        let url = match Url::parse(raw_url) {
            Ok(url) => url,
            Err(e) => {
                warnings.push(format!(
                    "line {}: skipping link '{}' with invalid URL '{}': {}",
                    lineno + 1,
                    link_title,
                    raw_url,
                    e
                ));
                continue;
            }
        };

        let description = caps
            .get(3)
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(link_title);

        links.push(Link {
            name: link_name(&url, link_title),
            url: url.to_string(),
            description: truncate_chars(description, MAX_DESCRIPTION_CHARS),
        });
    }

    if links.is_empty() {
        return Err(Error::Parse(format!(
            "No links found in {}; {}",
            source_url, EXPECTED_FORMAT
        )));
    }

    let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let derived_name = match slugify(&title) {
        s if s.is_empty() => DEFAULT_DERIVED_NAME.to_string(),
        s => s,
    };

    Ok(ParsedIndex {
        document: IndexDocument {
            title,
            derived_name,
            links,
            source_url: source_url.to_string(),
            fetched_at,
        },
        warnings,
    })
}

/// Lowercase `s` and collapse every run of non-alphanumeric characters into
/// a single `-`, trimming hyphens from both ends.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Name for a link: the last URL path segment without `.md`, falling back
/// to the slugified display title.
pub fn link_name(url: &Url, title: &str) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segs| segs.rfind(|s| !s.is_empty()))
        .map(|s| s.strip_suffix(".md").unwrap_or(s))
        .unwrap_or("");

    if !segment.is_empty() {
        return segment.to_string();
    }
    match slugify(title) {
        s if s.is_empty() => "link".to_string(),
        s => s,
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Check that `input` is an absolute http(s) URL. No I/O.
pub fn validate_source_url(input: &str) -> Result<Url> {
    let url = Url::parse(input)
        .map_err(|e| Error::InvalidArgument(format!("Invalid URL '{}': {}", input, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidArgument(format!(
            "Unsupported URL scheme '{}' in '{}'; expected http or https",
            other, input
        ))),
    }
}

/// Fetch and parse the index at `url`.
pub async fn fetch_index(fetcher: &Fetcher, url: &str) -> Result<ParsedIndex> {
    let url = validate_source_url(url)?;
    let body = fetcher.get_text(url.as_str()).await?;
    let parsed = parse_index(&body, url.as_str(), Utc::now())?;
    for warning in &parsed.warnings {
        warn!("{}", warning);
    }
    Ok(parsed)
}

/// Resolve a pipeline input: an http(s) URL is fetched and parsed, anything
/// else is read as a previously saved index JSON.
pub async fn load_index(fetcher: &Fetcher, input: &str) -> Result<IndexDocument> {
    if input.contains("://") {
        return Ok(fetch_index(fetcher, input).await?.document);
    }
    read_index_json(Path::new(input)).await
}

/// Read an index JSON file, rejecting anything that is not exactly an
/// [`IndexDocument`] with at least one link and a slug `skillName`. The name
/// becomes part of output file names, so it must not carry path syntax.
pub async fn read_index_json(path: &Path) -> Result<IndexDocument> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::invalid_input(path, e))?;
    let doc: IndexDocument = serde_json::from_str(&raw)
        .map_err(|e| Error::invalid_input(path, format!("malformed index JSON: {}", e)))?;
    if doc.links.is_empty() {
        return Err(Error::invalid_input(path, "index contains no links"));
    }
    if doc.derived_name.is_empty() || slugify(&doc.derived_name) != doc.derived_name {
        return Err(Error::invalid_input(
            path,
            format!(
                "invalid skillName '{}': expected a lowercase slug like 'my-docs'",
                doc.derived_name
            ),
        ));
    }
    Ok(doc)
}

/// CLI entry point for `llmstxt fetch`.
///
/// Prints the index JSON to stdout, or writes it to `dest` instead. The
/// directory holding `dest` is checked before the index is requested.
pub async fn run_fetch(config: &Config, url: &str, dest: Option<&Path>) -> Result<()> {
    validate_source_url(url)?;
    if let Some(parent) = dest
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
    {
        output::ensure_writable_dir(parent).await?;
    }

    let fetcher = Fetcher::new(&config.http)?;
    let parsed = fetch_index(&fetcher, url).await?;
    let doc = &parsed.document;

    match dest {
        Some(path) => {
            output::write_json(path, doc).await?;
            info!(path = %path.display(), "saved index");
            eprintln!(
                "Fetched '{}': {} links ({} skipped) -> {}",
                doc.title,
                doc.links.len(),
                parsed.warnings.len(),
                path.display()
            );
        }
        None => {
            output::print_json(doc)?;
            eprintln!(
                "Fetched '{}': {} links ({} skipped)",
                doc.title,
                doc.links.len(),
                parsed.warnings.len()
            );
        }
    }
    Ok(())
}
