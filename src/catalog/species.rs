//! Species reconciliation: map a recognition candidate to exactly one
//! catalog row, creating it on first sight.

use anyhow::Result;
use tracing::{debug, info};

use super::names;
use crate::db::Database;
use crate::plantid::SpeciesCandidate;

/// Resolve a candidate to a species id. An existing row (exact scientific
/// name match) wins and keeps its data; otherwise a row is created from the
/// candidate. Two callers racing to create the same name are arbitrated by
/// the UNIQUE constraint: the loser re-resolves to the winner's row.
pub fn reconcile_species(db: &Database, candidate: &SpeciesCandidate) -> Result<i64> {
    if let Some(existing) = db.find_species_by_name(&candidate.scientific_name)? {
        debug!(
            "species '{}' already cataloged with id {}",
            existing.scientific_name, existing.id
        );
        return Ok(existing.id);
    }

    let common_name = candidate.common_names.first().map(String::as_str);
    let family = non_empty(&candidate.family);
    let localized = names::localized_name(&candidate.scientific_name, &candidate.common_names);

    match db.create_species(
        &candidate.scientific_name,
        common_name,
        family,
        localized.as_deref(),
    ) {
        Ok(id) => {
            info!("cataloged new species '{}' with id {}", candidate.scientific_name, id);
            Ok(id)
        }
        Err(e) if is_unique_violation(&e) => {
            // Lost the insert race; the winner's row is authoritative
            db.find_species_by_name(&candidate.scientific_name)?
                .map(|s| s.id)
                .ok_or(e)
        }
        Err(e) => Err(e),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn candidate(name: &str) -> SpeciesCandidate {
        SpeciesCandidate {
            scientific_name: name.to_string(),
            common_names: vec!["Dandelion".to_string()],
            probability: 0.95,
            family: "Asteraceae".to_string(),
            genus: "Taraxacum".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_repeated_reconcile_returns_one_row() {
        let db = test_db();
        let c = candidate("Taraxacum officinale");

        let first = reconcile_species(&db, &c).unwrap();
        let second = reconcile_species(&db, &c).unwrap();
        assert_eq!(first, second);
        assert_eq!(db.list_species(0, None).unwrap().len(), 1);
    }

    #[test]
    fn test_new_species_takes_candidate_fields() {
        let db = test_db();
        let id = reconcile_species(&db, &candidate("Taraxacum officinale")).unwrap();

        let species = db.get_species(id).unwrap().unwrap();
        assert_eq!(species.common_name.as_deref(), Some("Dandelion"));
        assert_eq!(species.family.as_deref(), Some("Asteraceae"));
        assert_eq!(species.localized_name.as_deref(), Some("Võilill"));
    }

    #[test]
    fn test_existing_row_is_not_overwritten() {
        let db = test_db();
        let id = db
            .create_species(
                "Taraxacum officinale",
                Some("Curated name"),
                Some("Asteraceae"),
                None,
            )
            .unwrap();

        let resolved = reconcile_species(&db, &candidate("Taraxacum officinale")).unwrap();
        assert_eq!(resolved, id);
        let species = db.get_species(id).unwrap().unwrap();
        assert_eq!(species.common_name.as_deref(), Some("Curated name"));
        assert_eq!(species.localized_name, None);
    }

    #[test]
    fn test_empty_family_is_stored_as_null() {
        let db = test_db();
        let mut c = candidate("Campanula patula");
        c.family = String::new();
        c.common_names.clear();

        let id = reconcile_species(&db, &c).unwrap();
        let species = db.get_species(id).unwrap().unwrap();
        assert_eq!(species.family, None);
        assert_eq!(species.common_name, None);
    }

    #[test]
    fn test_reconcile_is_case_sensitive() {
        let db = test_db();
        let a = reconcile_species(&db, &candidate("Taraxacum officinale")).unwrap();
        let b = reconcile_species(&db, &candidate("taraxacum officinale")).unwrap();
        assert_ne!(a, b);
        assert_eq!(db.list_species(0, None).unwrap().len(), 2);
    }
}
