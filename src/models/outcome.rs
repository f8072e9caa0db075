//! Per-file outcome records and the batch summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Why a file was named through the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No recognizer matched the extracted text
    NoIdentifier,
    /// A DOI was located but failed normalization
    InvalidIdentifier(String),
    /// The metadata lookup failed
    Resolution(String),
    /// The PDF produced no extractable text
    EmptyText,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoIdentifier => write!(f, "no DOI found"),
            FallbackReason::InvalidIdentifier(msg) => write!(f, "invalid DOI: {}", msg),
            FallbackReason::Resolution(msg) => write!(f, "lookup failed: {}", msg),
            FallbackReason::EmptyText => write!(f, "no extractable text"),
        }
    }
}

/// Result of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Renamed from resolved metadata
    Renamed {
        target: PathBuf,
        #[serde(default)]
        via_title_search: bool,
    },
    /// Already carried the computed name
    Unchanged,
    /// Named with year and venue left as placeholders. `target` equals the
    /// source when the file already carried that name.
    Fallback {
        target: PathBuf,
        reason: FallbackReason,
    },
    /// Could not be processed at all
    Failed { reason: String },
}

/// Outcome record for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Original path
    pub source: PathBuf,

    /// DOI located in the file, kept for manual lookup when resolution failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl FileOutcome {
    pub fn new(source: impl Into<PathBuf>, doi: Option<String>, status: OutcomeStatus) -> Self {
        Self {
            source: source.into(),
            doi,
            status,
        }
    }

    pub fn failed(source: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(
            source,
            None,
            OutcomeStatus::Failed {
                reason: reason.into(),
            },
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// Whether a human should double-check the result
    pub fn needs_review(&self) -> bool {
        matches!(
            self.status,
            OutcomeStatus::Fallback { .. }
                | OutcomeStatus::Renamed {
                    via_title_search: true,
                    ..
                }
        )
    }

    /// Destination path, when the file was (or would be) moved
    pub fn target(&self) -> Option<&PathBuf> {
        match &self.status {
            OutcomeStatus::Renamed { target, .. } | OutcomeStatus::Fallback { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }
}

/// All outcomes of one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,

    /// True when no file was actually moved
    #[serde(default)]
    pub dry_run: bool,
}

impl BatchReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            outcomes: Vec::new(),
            dry_run,
        }
    }

    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn renamed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Renamed { .. }))
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Unchanged))
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Fallback { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// True if at least one file could not be processed, even into fallback
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.is_failed())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
