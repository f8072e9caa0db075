//! Best-effort titles for files whose metadata could not be resolved.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::models::RenamePlan;

/// How many leading non-empty lines are considered title candidates
const HEADING_WINDOW: usize = 6;

const MIN_TITLE_CHARS: usize = 10;
const MAX_TITLE_CHARS: usize = 250;

/// Substrings marking a line as front-matter rather than a title
const NOISE_MARKERS: [&str; 8] = [
    "@", "http", "www.", "arxiv:", "©", "copyright", "issn", "isbn",
];

/// Section headings that sometimes share a line with body text
const SECTION_HEADINGS: [&str; 4] = ["abstract", "keywords", "introduction", "index terms"];

fn canonical_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[[^\]]*\]\+\[[^\]]*\]--").expect("canonical prefix pattern is valid")
    })
}

/// `DOI` as a word, so "Doing" or "Undoing" still pass
fn doi_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bdoi\b").expect("DOI marker pattern is valid"))
}

fn is_plausible_heading(line: &str) -> bool {
    let chars = line.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&chars) {
        return false;
    }
    if line.split_whitespace().count() < 2 {
        return false;
    }
    // Body sentences end with a period; titles do not
    if line.ends_with('.') {
        return false;
    }

    let lower = line.to_lowercase();
    if NOISE_MARKERS.iter().any(|m| lower.contains(m)) || doi_marker().is_match(line) {
        return false;
    }
    if SECTION_HEADINGS.iter().any(|h| lower.starts_with(h)) {
        return false;
    }

    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    letters * 2 >= chars
}

/// The longest plausible heading among the first few non-empty lines.
pub fn heading_from_text(text: &str) -> Option<String> {
    let mut best: Option<&str> = None;
    for line in text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(HEADING_WINDOW)
        .filter(|l| is_plausible_heading(l))
    {
        if best.map_or(true, |b| line.chars().count() > b.chars().count()) {
            best = Some(line);
        }
    }
    best.map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// The file's own stem, minus a `[Year]+[Venue]--` prefix from an earlier run.
pub fn title_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    canonical_prefix().replace(&stem, "").into_owned()
}

/// Build a title-only plan from extracted text, or from the filename when
/// the text has no usable heading.
pub fn extract_fallback(text: &str, path: &Path) -> RenamePlan {
    let title = heading_from_text(text).unwrap_or_else(|| title_from_filename(path));
    tracing::debug!(path = %path.display(), %title, "Fallback title");
    RenamePlan::fallback(path, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_heading_like_line() {
        let text = "\n  A Study of Flaky Tests  \nJane Doe\njane@uni.edu\nAbstract\nFlaky tests are tests that pass and fail nondeterministically on the same code.\n";
        let plan = extract_fallback(text, Path::new("/papers/scan001.pdf"));
        assert_eq!(plan.title, "A Study of Flaky Tests");
        assert!(plan.is_fallback());
    }

    #[test]
    fn test_longest_candidate_wins() {
        let text = "Short Title Here\nDeep Residual Learning for Image Recognition\nKaiming He Xiangyu Zhang";
        assert_eq!(
            heading_from_text(text).as_deref(),
            Some("Deep Residual Learning for Image Recognition")
        );
    }

    #[test]
    fn test_noise_lines_skipped() {
        let text = "arXiv:2106.09685v2 [cs.CL] 16 Oct 2021\nhttps://github.com/microsoft/LoRA\n© 2021 Copyright held by the owner\n12 34 56 78 90 12";
        assert_eq!(heading_from_text(text), None);
    }

    #[test]
    fn test_doi_lines_skipped_but_words_containing_doi_kept() {
        assert_eq!(
            heading_from_text("Doing More With Less in Code Review\nJane Doe\n").as_deref(),
            Some("Doing More With Less in Code Review")
        );
        assert_eq!(
            heading_from_text("Undoing Merges Safely at Scale").as_deref(),
            Some("Undoing Merges Safely at Scale")
        );
        assert_eq!(heading_from_text("DOI: 10.1109/TSE.2021.3050000 x"), None);
        assert_eq!(heading_from_text("Available via doi.org resolver links"), None);
    }

    #[test]
    fn test_only_leading_lines_considered() {
        let mut text = String::from("x\ny\nz\nw\nv\nu\n");
        text.push_str("A Much Later Line That Looks Like A Title");
        assert_eq!(heading_from_text(&text), None);
    }

    #[test]
    fn test_filename_fallback() {
        let plan = extract_fallback("", Path::new("/papers/my_paper_draft.pdf"));
        assert_eq!(plan.title, "my_paper_draft");
    }

    #[test]
    fn test_filename_fallback_strips_canonical_prefix() {
        assert_eq!(
            title_from_filename(Path::new("[Unknown]+[Unknown]--A_Study_of_Flaky_Tests.pdf")),
            "A_Study_of_Flaky_Tests"
        );
    }
}
