//! Venue full name → acronym resolution.

use super::{normalize_venue, AcronymStore, AcronymStoreError};

/// Maps venue names to acronyms through an [`AcronymStore`].
///
/// A name with no acronym is never guessed at: the normalized full name is
/// used instead and the venue is recorded as unresolved so it can be
/// curated before the next run.
#[derive(Debug)]
pub struct VenueAcronymResolver {
    store: AcronymStore,
}

impl VenueAcronymResolver {
    pub fn new(store: AcronymStore) -> Self {
        Self { store }
    }

    /// Acronym for `full_name`, or its normalized form on a miss.
    pub fn resolve_acronym(&mut self, full_name: &str) -> String {
        let normalized = normalize_venue(full_name);
        if let Some(acronym) = self.store.get(&normalized) {
            tracing::debug!(venue = %normalized, %acronym, "Venue acronym hit");
            return acronym.to_string();
        }

        if self.store.insert_unresolved(&normalized) {
            tracing::warn!(venue = %normalized, "No acronym for venue, recorded as unresolved");
        }
        normalized
    }

    /// Read-only lookup that records nothing
    pub fn lookup(&self, full_name: &str) -> Option<&str> {
        self.store.get(full_name)
    }

    pub fn store(&self) -> &AcronymStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AcronymStore {
        &mut self.store
    }

    /// Persist newly recorded venues
    pub fn flush(&mut self) -> Result<bool, AcronymStoreError> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn icse_store() -> AcronymStore {
        let mut store = AcronymStore::empty();
        store.set("International Conference on Software Engineering", "ICSE");
        store
    }

    #[test]
    fn test_hit_strips_edition() {
        let mut resolver = VenueAcronymResolver::new(icse_store());
        assert_eq!(
            resolver.resolve_acronym("45th International Conference on Software Engineering"),
            "ICSE"
        );
        assert_eq!(resolver.store().unresolved().count(), 0);
    }

    #[test]
    fn test_miss_records_unresolved() {
        let mut resolver = VenueAcronymResolver::new(icse_store());
        let tag = resolver.resolve_acronym("  12th  Workshop on Obscure Things ");
        assert_eq!(tag, "Workshop on Obscure Things");
        assert_eq!(
            resolver.store().unresolved().collect::<Vec<_>>(),
            vec!["Workshop on Obscure Things"]
        );
        assert!(resolver.store().is_dirty());
    }

    #[test]
    fn test_stable_across_editions() {
        let mut resolver = VenueAcronymResolver::new(icse_store());
        let first = resolver.resolve_acronym("3rd Workshop on Obscure Things");
        let second = resolver.resolve_acronym("4th Workshop on Obscure Things");
        let third = resolver.resolve_acronym("Proceedings of the 2024 Workshop on Obscure Things");
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(resolver.store().unresolved().count(), 1);
    }

    #[test]
    fn test_lookup_is_read_only() {
        let resolver = VenueAcronymResolver::new(icse_store());
        assert_eq!(resolver.lookup("Some Other Venue"), None);
        assert_eq!(resolver.store().unresolved().count(), 0);
    }

    #[test]
    fn test_persists_across_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acronym_map.json");

        let mut resolver = VenueAcronymResolver::new(AcronymStore::load(&path).unwrap());
        let tag = resolver.resolve_acronym("7th Workshop on Obscure Things");
        resolver.store_mut().set("Workshop on Testing", "WoT");
        assert!(resolver.flush().unwrap());

        let mut resolver = VenueAcronymResolver::new(AcronymStore::load(&path).unwrap());
        assert_eq!(resolver.resolve_acronym("8th Workshop on Obscure Things"), tag);
        assert_eq!(resolver.resolve_acronym("Workshop on Testing"), "WoT");
        assert!(!resolver.store().is_dirty());
    }
}
