//! Target filename composition and the rename itself.
//!
//! Names have the form `[Year]+[VenueTag]--Title.pdf`. Every free-text
//! component is reduced to ASCII letters, digits, `_` and `-`, so the only
//! other characters in a composed name are the fixed `[`, `]`, `+` and the
//! `.pdf` extension.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::NamingConfig;
use crate::models::RenamePlan;

/// Venue tags longer than this are cut
pub const MAX_VENUE_CHARS: usize = 80;

/// Title characters kept before year and venue start giving way
const MIN_TITLE_CHARS: usize = 8;

const EXTENSION: &str = ".pdf";
const UNTITLED: &str = "Untitled";
const TEMPLATE_CHARS: usize = "[]+[]--".len();

/// Errors that can occur when composing or applying a target name
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("No free name for '{stem}' after {attempts} attempts")]
    CollisionUnresolved { stem: String, attempts: u32 },

    #[error("Filename limit of {max_len} characters cannot fit '{stem}'")]
    LimitTooSmall { stem: String, max_len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reduce free text to the filename-safe alphabet.
///
/// Accented letters lose their marks (`é` → `e`), everything else outside
/// `[A-Za-z0-9_-]` becomes `_`, runs of `_` or `-` collapse to one, and
/// leading or trailing separators are dropped.
pub fn sanitize_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.nfd().filter(|c| !is_combining_mark(*c)) {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if (c == '_' || c == '-') && out.ends_with(c) {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(|c| c == '_' || c == '-').to_string()
}

/// Cut an already-sanitized component to at most `max` characters.
fn truncate_component(component: &str, max: usize) -> String {
    // Sanitized components are ASCII, so bytes are characters
    let cut = &component[..component.len().min(max)];
    cut.trim_end_matches(|c| c == '_' || c == '-').to_string()
}

/// Computes collision-free target paths and performs renames.
///
/// Targets handed out during a run are reserved, and sources that have been
/// moved away count as free, so a dry run reports the same names a real run
/// would produce.
#[derive(Debug)]
pub struct FilenameComposer {
    placeholder: String,
    max_len: usize,
    max_attempts: u32,
    dry_run: bool,
    reserved: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl FilenameComposer {
    pub fn new(config: &NamingConfig, dry_run: bool) -> Self {
        let placeholder = truncate_component(
            &sanitize_component(&config.placeholder),
            MAX_VENUE_CHARS,
        );
        Self {
            placeholder: if placeholder.is_empty() {
                "Unknown".to_string()
            } else {
                placeholder
            },
            max_len: config.max_filename_len,
            max_attempts: config.max_collision_attempts,
            dry_run,
            reserved: HashSet::new(),
            vacated: HashSet::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Room for the widest disambiguator, "-<max_attempts>"
    fn disambiguator_reserve(&self) -> usize {
        format!("-{}", self.max_attempts).len()
    }

    /// `[Year]+[Venue]--Title` without extension or disambiguator.
    ///
    /// When the length limit is tight the venue shrinks first, then the
    /// year, so the title keeps a few characters. Each component keeps at
    /// least one character, so a small enough limit is still exceeded;
    /// [`compose`](Self::compose) rejects that case.
    pub fn stem(&self, plan: &RenamePlan) -> String {
        let room = self
            .max_len
            .saturating_sub(TEMPLATE_CHARS + EXTENSION.len() + self.disambiguator_reserve());
        let tag_room = room.saturating_sub(MIN_TITLE_CHARS);

        let year = plan
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| self.placeholder.clone());
        let year = truncate_component(&year, tag_room.saturating_sub(1).max(1));

        let venue = plan
            .venue_tag
            .as_deref()
            .map(sanitize_component)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.placeholder.clone());
        let venue_room = tag_room.saturating_sub(year.len()).clamp(1, MAX_VENUE_CHARS);
        let venue = truncate_component(&venue, venue_room);

        let budget = room.saturating_sub(year.len() + venue.len()).max(1);
        let title = truncate_component(&sanitize_component(&plan.title), budget);
        let title = if title.is_empty() {
            truncate_component(UNTITLED, budget)
        } else {
            title
        };

        format!("[{}]+[{}]--{}", year, venue, title)
    }

    fn is_taken(&self, candidate: &Path) -> bool {
        if self.reserved.contains(candidate) {
            return true;
        }
        candidate.symlink_metadata().is_ok() && !self.vacated.contains(candidate)
    }

    /// Choose the target path for `plan`.
    ///
    /// Returns the source path itself when the file already carries its
    /// computed name (with or without a disambiguator).
    pub fn compose(&mut self, plan: &RenamePlan) -> Result<PathBuf, ComposeError> {
        let source = plan.source_path.as_path();
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = self.stem(plan);

        if stem.len() + EXTENSION.len() + self.disambiguator_reserve() > self.max_len {
            return Err(ComposeError::LimitTooSmall {
                stem,
                max_len: self.max_len,
            });
        }

        for attempt in 0..=self.max_attempts {
            let name = if attempt == 0 {
                format!("{}{}", stem, EXTENSION)
            } else {
                format!("{}-{}{}", stem, attempt, EXTENSION)
            };
            let candidate = dir.join(name);

            if is_same_file(&candidate, source) {
                return Ok(source.to_path_buf());
            }
            if self.is_taken(&candidate) {
                continue;
            }

            self.reserved.insert(candidate.clone());
            return Ok(candidate);
        }

        Err(ComposeError::CollisionUnresolved {
            stem,
            attempts: self.max_attempts,
        })
    }

    /// Move `source` to `target`. In dry-run mode only records the move.
    pub fn commit(&mut self, source: &Path, target: &Path) -> Result<(), ComposeError> {
        if self.dry_run {
            self.vacated.insert(source.to_path_buf());
            return Ok(());
        }

        // Something may have appeared since compose
        if target.symlink_metadata().is_ok() && !self.vacated.contains(target) {
            return Err(ComposeError::Io(std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            )));
        }

        std::fs::rename(source, target)?;
        self.vacated.insert(source.to_path_buf());
        self.vacated.remove(target);
        tracing::info!(from = %source.display(), to = %target.display(), "Renamed");
        Ok(())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use tempfile::tempdir;

    fn composer(dry_run: bool) -> FilenameComposer {
        FilenameComposer::new(&NamingConfig::default(), dry_run)
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(
            sanitize_component("Visualising Developer Interactions in Code Reviews"),
            "Visualising_Developer_Interactions_in_Code_Reviews"
        );
        assert_eq!(
            sanitize_component("LoRA: Low-Rank Adaptation"),
            "LoRA_Low-Rank_Adaptation"
        );
        assert_eq!(sanitize_component("Café Gödel Ångström"), "Cafe_Godel_Angstrom");
        assert_eq!(sanitize_component("  --a//b--  "), "a_b");
        assert_eq!(sanitize_component("日本語"), "");
    }

    #[test]
    fn test_scenario_resolved_name() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("paper.pdf");
        std::fs::write(&source, b"%PDF").unwrap();

        let plan = RenamePlan::resolved(
            &source,
            Some(2025),
            Some("ICSE".to_string()),
            "Visualising Developer Interactions in Code Reviews",
        );
        let target = composer(false).compose(&plan).unwrap();
        assert_eq!(
            file_name(&target),
            "[2025]+[ICSE]--Visualising_Developer_Interactions_in_Code_Reviews.pdf"
        );
        assert_eq!(target.parent(), source.parent());
    }

    #[test]
    fn test_scenario_fallback_name() {
        let plan = RenamePlan::fallback("/papers/scan.pdf", "A Study of Flaky Tests");
        assert_eq!(
            composer(true).stem(&plan),
            "[Unknown]+[Unknown]--A_Study_of_Flaky_Tests"
        );
    }

    #[test]
    fn test_empty_title_is_untitled() {
        let plan = RenamePlan::fallback("/papers/x.pdf", "???");
        assert_eq!(composer(true).stem(&plan), "[Unknown]+[Unknown]--Untitled");
    }

    #[test]
    fn test_adversarial_titles_stay_in_safe_set() {
        let shape = Regex::new(r"^\[[A-Za-z0-9_-]+\]\+\[[A-Za-z0-9_-]+\]--[A-Za-z0-9_-]+\.pdf$").unwrap();
        let long = "word ".repeat(200);
        let titles = [
            "../../etc/passwd",
            "a/b\\c:d*e?f\"g<h>i|j",
            "tab\there\nnewline\u{0}nul\u{7f}",
            "   ",
            "\u{202e}rtl override",
            long.as_str(),
        ];

        let mut composer = composer(true);
        for title in titles {
            let plan = RenamePlan::resolved(
                "/papers/x.pdf",
                Some(2024),
                Some("ACM/IEEE: Joint \"Conf\"".to_string()),
                title,
            );
            let target = composer.compose(&plan).unwrap();
            let name = file_name(&target);
            assert!(shape.is_match(&name), "unsafe name: {:?}", name);
            assert!(name.len() <= 200, "too long: {}", name.len());
            assert_eq!(target.parent(), Some(Path::new("/papers")));
        }
    }

    #[test]
    fn test_venue_is_capped() {
        let venue = "V".repeat(300);
        let plan = RenamePlan::resolved("/p/x.pdf", Some(2020), Some(venue), "T T");
        let stem = composer(true).stem(&plan);
        assert!(stem.starts_with(&format!("[2020]+[{}]--", "V".repeat(MAX_VENUE_CHARS))));
    }

    #[test]
    fn test_long_placeholder_is_clamped() {
        let shape = Regex::new(r"^\[P+\]\+\[P+\]--[A-Za-z0-9_-]+\.pdf$").unwrap();
        let config = NamingConfig {
            placeholder: "P".repeat(300),
            ..NamingConfig::default()
        };
        let mut composer = FilenameComposer::new(&config, true);

        let plan = RenamePlan::fallback("/papers/x.pdf", "word ".repeat(100));
        let name = file_name(&composer.compose(&plan).unwrap());
        assert!(shape.is_match(&name), "unexpected name: {:?}", name);
        assert!(name.len() <= 200, "too long: {}", name.len());
        assert!(name.contains("--word_word"));
    }

    #[test]
    fn test_tight_limit_shrinks_venue_before_title() {
        let config = NamingConfig {
            max_filename_len: 30,
            ..NamingConfig::default()
        };
        let mut composer = FilenameComposer::new(&config, true);
        let plan = |src: &str| {
            RenamePlan::resolved(
                src,
                Some(2024),
                Some("International Conference on Software Engineering".to_string()),
                "Visualising Developer Interactions in Code Reviews",
            )
        };

        let first = file_name(&composer.compose(&plan("/papers/a.pdf")).unwrap());
        let second = file_name(&composer.compose(&plan("/papers/b.pdf")).unwrap());

        assert_eq!(first, "[2024]+[Int]--Visualis.pdf");
        assert_eq!(second, "[2024]+[Int]--Visualis-1.pdf");
        assert!(second.len() <= 30);
    }

    #[test]
    fn test_limit_below_template_is_rejected() {
        let config = NamingConfig {
            max_filename_len: 10,
            ..NamingConfig::default()
        };
        let mut composer = FilenameComposer::new(&config, true);
        let plan = RenamePlan::resolved("/papers/x.pdf", Some(2024), Some("FSE".to_string()), "Title");

        let err = composer.compose(&plan).unwrap_err();
        assert!(matches!(err, ComposeError::LimitTooSmall { max_len: 10, .. }));
    }

    #[test]
    fn test_adversarial_venue_stays_in_safe_set() {
        let shape = Regex::new(r"^\[2024\]\+\[[A-Za-z0-9_-]+\]--Title\.pdf$").unwrap();
        let venues = ["../../etc", "\u{0}\u{7f}<>|", "  ", "日本語", "a/b\\c:d*e?f"];

        let mut composer = composer(true);
        for (i, venue) in venues.iter().enumerate() {
            let source = format!("/papers/{}.pdf", i);
            let plan = RenamePlan::resolved(&source, Some(2024), Some(venue.to_string()), "Title");
            let name = file_name(&composer.compose(&plan).unwrap());
            assert!(shape.is_match(&name), "unsafe name: {:?}", name);
        }
    }

    #[test]
    fn test_collision_gets_disambiguator() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        std::fs::write(&first, b"1").unwrap();
        std::fs::write(&second, b"2").unwrap();

        let mut composer = composer(false);
        let plan_for = |src: &Path| {
            RenamePlan::resolved(src, Some(2024), Some("FSE".to_string()), "Title")
        };

        let t1 = composer.compose(&plan_for(&first)).unwrap();
        composer.commit(&first, &t1).unwrap();
        let t2 = composer.compose(&plan_for(&second)).unwrap();
        composer.commit(&second, &t2).unwrap();

        assert_eq!(file_name(&t1), "[2024]+[FSE]--Title.pdf");
        assert_eq!(file_name(&t2), "[2024]+[FSE]--Title-1.pdf");
        assert_eq!(std::fs::read(&t1).unwrap(), b"1");
        assert_eq!(std::fs::read(&t2).unwrap(), b"2");
        assert!(!first.exists());
    }

    #[test]
    fn test_dry_run_reserves_without_renaming() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        std::fs::write(&first, b"1").unwrap();
        std::fs::write(&second, b"2").unwrap();

        let mut composer = composer(true);
        let plan = RenamePlan::resolved(&first, Some(2024), Some("FSE".to_string()), "Title");
        let t1 = composer.compose(&plan).unwrap();
        composer.commit(&first, &t1).unwrap();

        let plan = RenamePlan::resolved(&second, Some(2024), Some("FSE".to_string()), "Title");
        let t2 = composer.compose(&plan).unwrap();

        assert_eq!(file_name(&t2), "[2024]+[FSE]--Title-1.pdf");
        assert!(first.exists());
        assert!(!t1.exists());
    }

    #[test]
    fn test_already_named_is_unchanged() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("[2024]+[FSE]--Title.pdf");
        std::fs::write(&source, b"1").unwrap();

        let plan = RenamePlan::resolved(&source, Some(2024), Some("FSE".to_string()), "Title");
        let target = composer(false).compose(&plan).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn test_collision_unresolved() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("[2024]+[FSE]--Title.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("[2024]+[FSE]--Title-1.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("[2024]+[FSE]--Title-2.pdf"), b"").unwrap();
        let source = dir.path().join("new.pdf");
        std::fs::write(&source, b"").unwrap();

        let config = NamingConfig {
            max_collision_attempts: 2,
            ..NamingConfig::default()
        };
        let mut composer = FilenameComposer::new(&config, false);
        let plan = RenamePlan::resolved(&source, Some(2024), Some("FSE".to_string()), "Title");
        let err = composer.compose(&plan).unwrap_err();
        assert!(matches!(err, ComposeError::CollisionUnresolved { attempts: 2, .. }));
    }

    #[test]
    fn test_commit_refuses_existing_target() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        let target = dir.path().join("b.pdf");
        std::fs::write(&source, b"1").unwrap();
        std::fs::write(&target, b"2").unwrap();

        let err = composer(false).commit(&source, &target).unwrap_err();
        assert!(matches!(err, ComposeError::Io(_)));
        assert_eq!(std::fs::read(&target).unwrap(), b"2");
        assert!(source.exists());
    }
}
