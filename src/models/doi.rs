//! DOI candidate and canonical DOI types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::identifiers::{normalize_doi, IdentifierError};

/// Citation format that produced a DOI candidate.
///
/// Variants are declared in recognizer priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoiFormat {
    /// ACM Digital Library DOI link (`doi.org/10.1145/...`)
    Acm,
    /// IEEE "Digital Object Identifier" / "DOI:" footer
    Ieee,
    /// arXiv identifier, mapped to its `10.48550/arXiv.*` DOI
    Arxiv,
    /// Any other `10.NNNN/...` string
    Generic,
}

impl DoiFormat {
    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            DoiFormat::Acm => "ACM",
            DoiFormat::Ieee => "IEEE",
            DoiFormat::Arxiv => "arXiv",
            DoiFormat::Generic => "generic",
        }
    }
}

impl fmt::Display for DoiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A DOI-shaped substring located in PDF text, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoiCandidate {
    /// Matched text (for arXiv, the derived `10.48550/arXiv.*` DOI)
    pub raw: String,

    /// Recognizer that produced the match
    pub format: DoiFormat,

    /// Byte offset of the match in the scanned text
    pub offset: usize,

    /// Reading with the next line's leading digits appended, for a match
    /// that ended in `.` at a line break. Only worth trying when the match
    /// itself does not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl DoiCandidate {
    pub fn new(raw: impl Into<String>, format: DoiFormat, offset: usize) -> Self {
        Self {
            raw: raw.into(),
            format,
            offset,
            continuation: None,
        }
    }

    pub fn with_continuation(mut self, continuation: impl Into<String>) -> Self {
        self.continuation = Some(continuation.into());
        self
    }
}

/// A normalized DOI matching `10\.\d{4,9}/[^\s"'<>]+`.
///
/// Only constructed through [`normalize_doi`], so holding one means the
/// string has already been cleaned and validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalDoi(String);

impl CanonicalDoi {
    pub(crate) fn from_validated(doi: String) -> Self {
        Self(doi)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DOI as a URL path, each `/`-separated segment percent-encoded.
    ///
    /// Suffixes may legally contain `#`, `?` or `%`, which would otherwise
    /// be read as a fragment, a query or an escape.
    pub fn url_path(&self) -> String {
        self.0
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `https://doi.org/...` URL for this DOI
    pub fn url(&self) -> String {
        format!("https://doi.org/{}", self.url_path())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalDoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalDoi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CanonicalDoi {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_doi(s)
    }
}
