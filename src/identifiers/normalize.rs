//! Cleaning and validation of located DOI strings.

use regex::Regex;
use std::sync::OnceLock;

use super::IdentifierError;
use crate::models::{CanonicalDoi, DoiCandidate};

const TRAILING_PUNCT: [char; 4] = ['.', ',', ';', ':'];
const LEADING_WRAP: [char; 9] = ['"', '\'', '<', '(', '[', '{', '“', '‘', '«'];
const TRAILING_WRAP: [char; 6] = ['"', '\'', '>', '”', '’', '»'];

fn scheme_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?:https?://)?(?:dx\.)?doi\.org/|doi:\s*)")
            .expect("scheme pattern is valid")
    })
}

fn canonical_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^10\.\d{4,9}/[^\s"'<>]+$"#).expect("canonical pattern is valid")
    })
}

/// Strip trailing punctuation and closing brackets that have no opening partner.
fn strip_unbalanced_tail(mut doi: &str) -> &str {
    loop {
        let before = doi.len();
        doi = doi.trim_end_matches(TRAILING_PUNCT);
        doi = doi.trim_end_matches(TRAILING_WRAP);
        for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
            if doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
                doi = &doi[..doi.len() - close.len_utf8()];
            }
        }
        if doi.len() == before {
            return doi;
        }
    }
}

/// Normalize a raw DOI string into canonical form.
///
/// Normalizing an already canonical DOI returns it unchanged.
pub fn normalize_doi(raw: &str) -> Result<CanonicalDoi, IdentifierError> {
    let trimmed = raw.trim().trim_start_matches(LEADING_WRAP).trim();
    let unprefixed = scheme_prefix().replace(trimmed, "");
    let cleaned = strip_unbalanced_tail(unprefixed.trim());

    let Some((prefix, suffix)) = cleaned.split_once('/') else {
        return Err(IdentifierError::invalid(raw, "missing '/' separator"));
    };
    let doi = format!("{}/{}", prefix.to_lowercase(), suffix);

    if !canonical_shape().is_match(&doi) {
        return Err(IdentifierError::invalid(
            raw,
            "does not match 10.NNNN/suffix shape",
        ));
    }

    if doi.contains("..") {
        return Err(IdentifierError::invalid(raw, "path traversal sequence"));
    }

    Ok(CanonicalDoi::from_validated(doi))
}

/// Normalize a located candidate.
pub fn normalize(candidate: &DoiCandidate) -> Result<CanonicalDoi, IdentifierError> {
    normalize_doi(&candidate.raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DoiFormat;

    #[test]
    fn test_normalize_strips_trailing_punctuation() {
        let doi = normalize_doi("10.1038/nature14539.").unwrap();
        assert_eq!(doi.as_str(), "10.1038/nature14539");

        let doi = normalize_doi("10.1145/3611643.3616299),").unwrap();
        assert_eq!(doi.as_str(), "10.1145/3611643.3616299");
    }

    #[test]
    fn test_normalize_keeps_balanced_parentheses() {
        let doi = normalize_doi("(10.1016/0021-9681(87)90171-8)").unwrap();
        assert_eq!(doi.as_str(), "10.1016/0021-9681(87)90171-8");
    }

    #[test]
    fn test_normalize_strips_scheme_prefixes() {
        for raw in [
            "doi:10.1234/abc123",
            "DOI: 10.1234/abc123",
            "https://doi.org/10.1234/abc123",
            "HTTP://DX.DOI.ORG/10.1234/abc123",
            "  \"10.1234/abc123\"  ",
        ] {
            assert_eq!(normalize_doi(raw).unwrap().as_str(), "10.1234/abc123", "{raw}");
        }
    }

    #[test]
    fn test_normalize_preserves_suffix_case() {
        let doi = normalize_doi("10.48550/arXiv.2301.12345").unwrap();
        assert_eq!(doi.as_str(), "10.48550/arXiv.2301.12345");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "https://doi.org/10.1145/3611643.3616299.",
            "10.1016/0021-9681(87)90171-8",
            "doi:10.1109/ICSE48619.2023.00012;",
            "10.48550/arXiv.hep-th/9901001",
        ] {
            let once = normalize_doi(raw).unwrap();
            let twice = normalize_doi(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(normalize_doi("").is_err());
        assert!(normalize_doi("10.1234").is_err());
        assert!(normalize_doi("9.1234/abc").is_err());
        assert!(normalize_doi("10.12/abc").is_err());
        assert!(normalize_doi("10.1234/../etc").is_err());
        assert!(normalize_doi("10.1234/.").is_err());
    }

    #[test]
    fn test_normalize_candidate() {
        let candidate = DoiCandidate::new("10.1109/TSE.2021.3050000.", DoiFormat::Ieee, 12);
        let doi = normalize(&candidate).unwrap();
        assert_eq!(doi.as_str(), "10.1109/TSE.2021.3050000");
    }
}
