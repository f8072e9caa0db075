//! Core data models for identifiers, paper metadata and rename outcomes.

mod doi;
mod outcome;
mod paper;

pub use doi::{CanonicalDoi, DoiCandidate, DoiFormat};
pub use outcome::{BatchReport, FallbackReason, FileOutcome, OutcomeStatus};
pub use paper::{PaperMetadata, RenamePlan};
