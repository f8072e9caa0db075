//! Per-file rename pipeline and batch driver.
//!
//! Each file goes through text extraction, DOI location, normalization,
//! metadata lookup, venue acronym resolution and filename composition.
//! Any failure after extraction drops the file onto the fallback path,
//! which still renames it with year and venue left as placeholders. Only
//! unreadable files and names that cannot be placed end up `Failed`.
//!
//! Files are processed one at a time; the acronym store is the only state
//! shared between them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::identifiers::{locate, normalize, normalize_doi};
use crate::models::{
    BatchReport, CanonicalDoi, DoiCandidate, FallbackReason, FileOutcome, OutcomeStatus,
    PaperMetadata, RenamePlan,
};
use crate::naming::{extract_fallback, heading_from_text, title_from_filename, FilenameComposer};
use crate::sources::{MetadataSource, ResolutionError};
use crate::utils::TextExtractor;
use crate::venue::{AcronymStoreError, VenueAcronymResolver};

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Expand command-line paths into the files to process.
///
/// Directories contribute their `.pdf` files (any extension case), sorted by
/// path; subdirectories are only entered when `recursive` is set. Other
/// paths are passed through as given, so a missing file is reported as a
/// failure instead of disappearing.
pub fn scan_paths(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 });

        let mut found: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        found.sort();

        tracing::debug!(dir = %path.display(), count = found.len(), "Scanned directory");
        files.extend(found);
    }

    files
}

/// Title-search settings for the fallback path
#[derive(Debug)]
struct TitleSearch {
    source: Arc<dyn MetadataSource>,
    threshold: f64,
}

/// Drives files from raw PDF to renamed file.
pub struct Pipeline {
    extractor: Box<dyn TextExtractor>,
    source: Arc<dyn MetadataSource>,
    venues: VenueAcronymResolver,
    composer: FilenameComposer,
    title_search: Option<TitleSearch>,
}

impl Pipeline {
    pub fn new(
        extractor: Box<dyn TextExtractor>,
        source: Arc<dyn MetadataSource>,
        venues: VenueAcronymResolver,
        composer: FilenameComposer,
    ) -> Self {
        Self {
            extractor,
            source,
            venues,
            composer,
            title_search: None,
        }
    }

    /// On the fallback path, look the extracted title up in `source` and
    /// accept the hit when the titles are at least `threshold` similar.
    pub fn with_title_search(mut self, source: Arc<dyn MetadataSource>, threshold: f64) -> Self {
        if source.supports_title_search() {
            self.title_search = Some(TitleSearch { source, threshold });
        } else {
            tracing::warn!(source = source.id(), "Source cannot search by title, ignoring");
        }
        self
    }

    pub fn venues(&self) -> &VenueAcronymResolver {
        &self.venues
    }

    /// Process every file in order and collect the outcomes.
    pub async fn run<F>(&mut self, files: &[PathBuf], mut on_outcome: F) -> BatchReport
    where
        F: FnMut(&FileOutcome),
    {
        let mut report = BatchReport::new(self.composer.is_dry_run());
        for path in files {
            let outcome = self.process_file(path).await;
            on_outcome(&outcome);
            report.push(outcome);
        }
        report
    }

    /// Write back venues recorded during the run. Dry runs leave the map alone.
    pub fn finish(mut self) -> Result<bool, AcronymStoreError> {
        if self.composer.is_dry_run() {
            return Ok(false);
        }
        self.venues.flush()
    }

    /// Process a single file. Never fails: every error becomes an outcome.
    pub async fn process_file(&mut self, path: &Path) -> FileOutcome {
        let text = match self.extractor.extract(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable PDF");
                return FileOutcome::failed(path, e.to_string());
            }
        };

        if text.trim().is_empty() {
            let plan = RenamePlan::fallback(path, title_from_filename(path));
            return self.apply_fallback(plan, None, FallbackReason::EmptyText);
        }

        let Some(candidate) = locate(&text) else {
            return self
                .fallback(&text, path, None, FallbackReason::NoIdentifier)
                .await;
        };

        let doi = match normalize(&candidate) {
            Ok(doi) => doi,
            Err(e) => {
                let reason = FallbackReason::InvalidIdentifier(e.to_string());
                return self
                    .fallback(&text, path, Some(candidate.raw), reason)
                    .await;
            }
        };

        let resolved = match self.source.resolve(&doi).await {
            Err(e @ ResolutionError::NotFound(_)) => {
                match self.resolve_continuation(&candidate).await {
                    Some(found) => Ok(found),
                    None => Err(e),
                }
            }
            other => other.map(|meta| (doi.clone(), meta)),
        };

        match resolved {
            Ok((doi, meta)) => self.apply_resolved(path, doi, meta, false),
            Err(e) => {
                tracing::debug!(%doi, error = %e, "Resolution failed");
                let doi = doi.into_string();
                self.fallback(&text, path, Some(doi), FallbackReason::Resolution(e.to_string()))
                    .await
            }
        }
    }

    /// Retry a DOI that ended in `.` at a line break, joined with the digits
    /// that open the next line.
    async fn resolve_continuation(
        &self,
        candidate: &DoiCandidate,
    ) -> Option<(CanonicalDoi, PaperMetadata)> {
        let doi = normalize_doi(candidate.continuation.as_deref()?).ok()?;

        tracing::debug!(%doi, "Trying DOI joined across line break");
        match self.source.resolve(&doi).await {
            Ok(meta) => Some((doi, meta)),
            Err(e) => {
                tracing::debug!(%doi, error = %e, "Joined DOI did not resolve");
                None
            }
        }
    }

    async fn fallback(
        &mut self,
        text: &str,
        path: &Path,
        doi: Option<String>,
        reason: FallbackReason,
    ) -> FileOutcome {
        if let Some(heading) = heading_from_text(text) {
            if let Some((found, meta)) = self.search_title(&heading).await {
                return self.apply_resolved(path, found, meta, true);
            }
        }
        let plan = extract_fallback(text, path);
        self.apply_fallback(plan, doi, reason)
    }

    async fn search_title(&self, title: &str) -> Option<(CanonicalDoi, PaperMetadata)> {
        let search = self.title_search.as_ref()?;

        let doi = match search.source.search_by_title(title).await {
            Ok(Some(doi)) => doi,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(%title, error = %e, "Title search failed");
                return None;
            }
        };

        let meta = match search.source.resolve(&doi).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(%doi, error = %e, "Title search hit did not resolve");
                return None;
            }
        };

        let similarity =
            strsim::normalized_levenshtein(&title.to_lowercase(), &meta.title.to_lowercase());
        if similarity < search.threshold {
            tracing::debug!(%title, found = %meta.title, similarity, "Title search hit rejected");
            return None;
        }

        tracing::info!(%title, %doi, similarity, "Matched by title search");
        Some((doi, meta))
    }

    fn apply_resolved(
        &mut self,
        path: &Path,
        doi: CanonicalDoi,
        meta: PaperMetadata,
        via_title_search: bool,
    ) -> FileOutcome {
        let venue_tag = meta
            .venue_full_name
            .as_deref()
            .map(|venue| self.venues.resolve_acronym(venue))
            .filter(|tag| !tag.is_empty());

        let plan = RenamePlan::resolved(path, meta.year, venue_tag, meta.title);
        let doi = Some(doi.into_string());

        match self.place(&plan) {
            Ok(Some(target)) => FileOutcome::new(
                path,
                doi,
                OutcomeStatus::Renamed {
                    target,
                    via_title_search,
                },
            ),
            Ok(None) => FileOutcome::new(path, doi, OutcomeStatus::Unchanged),
            Err(reason) => FileOutcome::new(path, doi, OutcomeStatus::Failed { reason }),
        }
    }

    fn apply_fallback(
        &mut self,
        plan: RenamePlan,
        doi: Option<String>,
        reason: FallbackReason,
    ) -> FileOutcome {
        let path = plan.source_path.clone();
        tracing::warn!(path = %path.display(), %reason, "Using fallback name");

        // A fallback name stays flagged on every run, even when already applied
        match self.place(&plan) {
            Ok(target) => {
                let target = target.unwrap_or_else(|| path.clone());
                FileOutcome::new(path, doi, OutcomeStatus::Fallback { target, reason })
            }
            Err(reason) => FileOutcome::new(path, doi, OutcomeStatus::Failed { reason }),
        }
    }

    /// Compose and commit. `Ok(None)` means the file already has its name.
    fn place(&mut self, plan: &RenamePlan) -> Result<Option<PathBuf>, String> {
        let source = plan.source_path.as_path();
        let target = self.composer.compose(plan).map_err(|e| {
            tracing::warn!(path = %source.display(), error = %e, "Could not name file");
            e.to_string()
        })?;

        if target == source {
            return Ok(None);
        }

        self.composer.commit(source, &target).map_err(|e| {
            tracing::warn!(path = %source.display(), error = %e, "Rename failed");
            e.to_string()
        })?;
        Ok(Some(target))
    }
}
