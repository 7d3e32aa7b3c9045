//! # llmstxt
//!
//! Fetch `llms.txt`-style index documents, download the documents they link
//! to, and synthesize a categorized summary for AI tools.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐   links   ┌──────────────┐
//!   index URL ───▶│ Index fetcher │─────────▶│  Downloader   │──▶ <dest>/<name>.md
//!                  └──────┬───────┘           │ batched, 5 ∥ │
//!                         │                   └──────────────┘
//!                         │ links
//!                         ▼
//!                  ┌──────────────┐
//!                  │  Summarizer   │──▶ <skillName>-summary.md
//!                  └──────────────┘
//! ```
//!
//! The two consumers depend only on the fetcher's [`models::IndexDocument`],
//! never on each other.
//!
//! ## Quick Start
//!
//! ```bash
//! llmstxt fetch https://example.com/llms.txt index.json
//! llmstxt download index.json ./docs/references
//! llmstxt summarize index.json ./docs --references ./docs/references
//! llmstxt build https://example.com/llms.txt ./docs   # all of the above
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy and exit codes |
//! | [`http`] | Shared HTTP client with per-request timeouts |
//! | [`index`] | Index fetching and parsing |
//! | [`download`] | Batched reference downloads |
//! | [`sanitize`] | Filesystem-safe file names |
//! | [`summary`] | Summary synthesis |
//! | [`pipeline`] | Whole-pipeline `build` command |
//! | [`progress`] | Download progress on stderr |
//! | [`output`] | Stdout payloads and destination checks |

pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod index;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sanitize;
pub mod summary;
