//! Core data models that flow through the fetch → download → summary pipeline.
//!
//! An [`IndexDocument`] is built once per invocation and only read after
//! that. Download results borrow the links they describe, so a
//! [`FetchReport`] never outlives the document it was produced from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parsed result of fetching one index URL.
///
/// Serialized as the persisted index JSON:
/// `{title, skillName, links, sourceUrl, fetchedAt}`. Unknown fields are
/// rejected when reading it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDocument {
    pub title: String,
    #[serde(rename = "skillName")]
    pub derived_name: String,
    pub links: Vec<Link>,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}

/// One entry in an index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Result of one attempted download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchStatus {
    Success {
        #[serde(rename = "file")]
        file_name: String,
    },
    Failure { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome<'a> {
    pub link: &'a Link,
    #[serde(flatten)]
    pub status: FetchStatus,
}

impl FetchOutcome<'_> {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Success { .. })
    }
}

/// Aggregate result of a download run.
///
/// `files`, `warnings` and `outcomes` are in completion order within each
/// batch, not input order.
#[derive(Debug, Default, Serialize)]
pub struct FetchReport<'a> {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub files: Vec<String>,
    pub warnings: Vec<String>,
    pub outcomes: Vec<FetchOutcome<'a>>,
}

impl<'a> FetchReport<'a> {
    pub(crate) fn record_skip(&mut self, warning: String) {
        self.skipped += 1;
        self.warnings.push(warning);
    }

    pub(crate) fn record(&mut self, outcome: FetchOutcome<'a>) {
        match &outcome.status {
            FetchStatus::Success { file_name } => {
                self.success += 1;
                self.files.push(file_name.clone());
            }
            FetchStatus::Failure { reason } => {
                self.failed += 1;
                self.warnings
                    .push(format!("{} ({}): {}", outcome.link.name, outcome.link.url, reason));
            }
        }
        self.outcomes.push(outcome);
    }

    /// Links that were validated and sent to the network.
    pub fn attempted(&self) -> usize {
        self.success + self.failed
    }

    /// True when there was work to do and none of it succeeded.
    pub fn is_total_failure(&self) -> bool {
        self.total > 0 && self.success == 0
    }
}
