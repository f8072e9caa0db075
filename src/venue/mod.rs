//! Venue names and their acronyms.
//!
//! Metadata services report venues by full name, usually decorated with an
//! edition ("45th"), a year, or a "Proceedings of the" prefix. Those
//! decorations are stripped by [`normalize_venue`] so every edition of a
//! conference maps to one [`AcronymStore`] key. [`VenueAcronymResolver`]
//! looks keys up and records misses for later curation.
//!
//! ```rust
//! use paper_rename::venue::{AcronymStore, VenueAcronymResolver};
//!
//! let mut store = AcronymStore::empty();
//! store.set("International Conference on Software Engineering", "ICSE");
//!
//! let mut resolver = VenueAcronymResolver::new(store);
//! assert_eq!(
//!     resolver.resolve_acronym("Proceedings of the 45th International Conference on Software Engineering"),
//!     "ICSE"
//! );
//! ```

mod resolver;
mod store;

pub use resolver::VenueAcronymResolver;
pub use store::{AcronymStore, AcronymStoreError};

use regex::Regex;
use std::sync::OnceLock;

fn decoration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:proceedings\s+of(?:\s+the)?|\d{4}|\d+(?:st|nd|rd|th))(?:\s+|$)")
            .expect("venue decoration pattern is valid")
    })
}

/// Canonical key for a venue name.
///
/// Collapses whitespace, then strips leading "Proceedings of (the)",
/// four-digit years and ordinal editions until none remain. Organization
/// prefixes such as "ACM" or "IEEE" are kept.
pub fn normalize_venue(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut rest = collapsed.as_str();
    while let Some(m) = decoration().find(rest) {
        if m.end() == 0 {
            break;
        }
        rest = &rest[m.end()..];
    }

    if rest.is_empty() {
        collapsed
    } else {
        rest.to_string()
    }
}
