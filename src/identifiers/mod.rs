//! DOI location and normalization.
//!
//! - [`locate`]: scan PDF text with the recognizers in [`RECOGNIZER_ORDER`]
//!   (ACM, IEEE, arXiv, generic) and return the highest-priority match
//! - [`normalize`] / [`normalize_doi`]: clean a raw match into a
//!   [`CanonicalDoi`](crate::models::CanonicalDoi)
//!
//! ```rust
//! use paper_rename::identifiers::{locate, normalize};
//! use paper_rename::models::DoiFormat;
//!
//! let text = "ACM Reference Format: ... https://doi.org/10.1145/3611643.3616299.";
//! let candidate = locate(text).unwrap();
//! assert_eq!(candidate.format, DoiFormat::Acm);
//! assert_eq!(normalize(&candidate).unwrap().as_str(), "10.1145/3611643.3616299");
//! ```

mod locate;
mod normalize;

pub use locate::{locate, locate_all, rejoin_split_dois, RECOGNIZER_ORDER};
pub use normalize::{normalize, normalize_doi};

use thiserror::Error;

/// Errors raised while turning a located match into a canonical DOI
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Invalid DOI '{raw}': {reason}")]
    InvalidIdentifier { raw: String, reason: String },
}

impl IdentifierError {
    pub(crate) fn invalid(raw: &str, reason: &str) -> Self {
        IdentifierError::InvalidIdentifier {
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}
