//! Prioritized DOI recognizers over unstructured PDF text.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{DoiCandidate, DoiFormat};

/// Recognizers in the order they are tried. The first one that matches
/// anywhere in the text wins; later ones are not consulted.
pub const RECOGNIZER_ORDER: [DoiFormat; 4] = [
    DoiFormat::Acm,
    DoiFormat::Ieee,
    DoiFormat::Arxiv,
    DoiFormat::Generic,
];

/// Registrant-independent DOI body, shared by all recognizers
const DOI_SUFFIX: &str = r#"[^\s"'<>]+"#;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("recognizer pattern is valid")
}

fn acm_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(&format!(
            r"(?i)(?:https?://)?(?:dx\.)?doi\.org/(10\.1145/{})",
            DOI_SUFFIX
        ))
    })
}

fn ieee_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(&format!(
            r"(?i)(?:digital\s+object\s+identifier|\bdoi(?:\.org/|\s*:)?)\s*(10\.1109/{})",
            DOI_SUFFIX
        ))
    })
}

fn arxiv_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(
            r"(?i)(?:\barxiv:\s*|arxiv\.org/(?:abs|pdf)/|10\.48550/arxiv\.)(\d{4}\.\d{4,5}|[a-z][a-z\-]*(?:\.[a-z]{2})?/\d{7})(?:v\d+)?",
        )
    })
}

fn generic_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(&format!(r"\b10\.\d{{4,9}}/{}", DOI_SUFFIX)))
}

impl DoiFormat {
    /// Find the first match of this recognizer in `text`.
    pub fn find(&self, text: &str) -> Option<DoiCandidate> {
        match self {
            DoiFormat::Acm => capture_group(acm_pattern(), text, *self),
            DoiFormat::Ieee => capture_group(ieee_pattern(), text, *self),
            DoiFormat::Arxiv => {
                let caps = arxiv_pattern().captures(text)?;
                let whole = caps.get(0)?;
                let id = caps.get(1)?.as_str();
                Some(DoiCandidate::new(
                    format!("10.48550/arXiv.{}", id),
                    *self,
                    whole.start(),
                ))
            }
            DoiFormat::Generic => generic_pattern()
                .find(text)
                .map(|m| DoiCandidate::new(m.as_str(), *self, m.start())),
        }
    }
}

fn capture_group(re: &Regex, text: &str, format: DoiFormat) -> Option<DoiCandidate> {
    let m = re.captures(text)?.get(1)?;
    Some(DoiCandidate::new(m.as_str(), format, m.start()))
}

/// Rejoin DOIs that the PDF text layer split across a line break.
///
/// Only breaks after `/` or `-` are joined: a DOI cannot end there. A break
/// after `.` is ambiguous, since a DOI may simply end a sentence, and is left
/// to [`locate`] to offer as a continuation.
pub fn rejoin_split_dois(text: &str) -> String {
    static SPLIT: OnceLock<Regex> = OnceLock::new();

    let split = SPLIT.get_or_init(|| {
        compile(r#"(10\.\d{4,9}/(?:[^\s"'<>]*[/-])?)[ \t]*\r?\n[ \t]*([^\s"'<>]+)"#)
    });
    split.replace_all(text, "${1}${2}").into_owned()
}

/// Digits opening the line after a candidate that ended in `.`
fn dot_continuation(text: &str, candidate: &DoiCandidate) -> Option<String> {
    static NEXT: OnceLock<Regex> = OnceLock::new();

    if candidate.format == DoiFormat::Arxiv || !candidate.raw.ends_with('.') {
        return None;
    }
    let rest = text.get(candidate.offset + candidate.raw.len()..)?;
    let next = NEXT.get_or_init(|| compile(r"^[ \t]*\r?\n[ \t]*(\d+)"));
    let digits = next.captures(rest)?.get(1)?.as_str();
    Some(format!("{}{}", candidate.raw, digits))
}

fn find_with_continuation(format: DoiFormat, text: &str) -> Option<DoiCandidate> {
    let candidate = format.find(text)?;
    Some(match dot_continuation(text, &candidate) {
        Some(joined) => candidate.with_continuation(joined),
        None => candidate,
    })
}

/// Locate the best DOI candidate in `text`.
///
/// Returns `None` when no recognizer matches, which is an expected outcome
/// for many PDFs rather than an error.
pub fn locate(text: &str) -> Option<DoiCandidate> {
    let text = rejoin_split_dois(text);
    RECOGNIZER_ORDER.iter().find_map(|format| {
        let candidate = find_with_continuation(*format, &text);
        if let Some(c) = &candidate {
            tracing::debug!(format = %c.format, raw = %c.raw, "DOI recognizer matched");
        }
        candidate
    })
}

/// Every recognizer's first match, in priority order.
pub fn locate_all(text: &str) -> Vec<DoiCandidate> {
    let text = rejoin_split_dois(text);
    RECOGNIZER_ORDER
        .iter()
        .filter_map(|format| find_with_continuation(*format, &text))
        .collect()
}
