//! The identification pipeline: recognition, reconciliation and relation
//! management for one photo or a batch.

use anyhow::{anyhow, bail, Result};
use std::path::Path;
use tracing::{error, info, warn};

use super::photos::build_photo_record;
use super::species::reconcile_species;
use crate::config::Config;
use crate::db::{Database, SpeciesRelation};
use crate::plantid::{
    extract_candidates, PlantIdClient, PlantIdError, RecognitionProvider, SpeciesCandidate,
};

/// Candidates at or below this probability get no relation.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.5;

/// Relation category for the top-ranked suggestion.
pub const CATEGORY_PRIMARY: &str = "primary";
/// Relation category for every other qualifying suggestion.
pub const CATEGORY_SECONDARY: &str = "secondary";

/// Runs identifications against the catalog. Generic over the recognition
/// provider so the pipeline works identically with the real client, the
/// placeholder set or a canned test double.
pub struct Identifier<'a, P> {
    db: &'a Database,
    provider: P,
}

/// Result of identifying one image.
#[derive(Debug)]
pub struct Identification {
    /// The cataloged photo. `None` when recognition succeeded but the record
    /// could not be stored; the candidates are still returned.
    pub photo_id: Option<i64>,
    pub candidates: Vec<SpeciesCandidate>,
    pub relations: Vec<SpeciesRelation>,
}

#[derive(Debug)]
pub struct BatchItem {
    pub photo_id: i64,
    pub candidates: Vec<SpeciesCandidate>,
    pub relations: Vec<SpeciesRelation>,
}

#[derive(Debug)]
pub struct BatchError {
    pub photo_id: i64,
    pub error: String,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<BatchItem>,
    pub errors: Vec<BatchError>,
}

impl<'a> Identifier<'a, PlantIdClient> {
    /// Build the production pipeline. The credential resolves from the
    /// config file first, then from the settings store.
    pub fn from_config(db: &'a Database, config: &Config) -> Result<Self> {
        let api_key = match config
            .plantid
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            Some(key) => Some(key.to_string()),
            None => db.plant_id_api_key()?,
        };
        Ok(Self::new(db, PlantIdClient::new(&config.plantid, api_key)))
    }
}

impl<'a, P: RecognitionProvider> Identifier<'a, P> {
    pub fn new(db: &'a Database, provider: P) -> Self {
        Self { db, provider }
    }

    /// Identify a new image and catalog it: recognition, photo record,
    /// relations. Storage trouble after a successful identification is
    /// logged and the candidate list still returned.
    pub fn identify_new_photo(
        &self,
        file_path: &Path,
        user_date: Option<String>,
        user_location: Option<String>,
    ) -> Result<Identification> {
        let response = self.provider.identify(file_path)?;
        let candidates = extract_candidates(&response);
        info!(
            "{} identified {} candidates for {}",
            self.provider.provider_name(),
            candidates.len(),
            file_path.display()
        );

        let draft = build_photo_record(file_path, user_date, user_location);
        let (photo_id, relations) = match self.db.insert_photo(&draft) {
            Ok(photo_id) => {
                info!("created photo record {}", photo_id);
                let relations = self.attach_candidates(photo_id, &candidates).unwrap_or_else(|e| {
                    error!("failed to store relations for photo {}: {:#}", photo_id, e);
                    Vec::new()
                });
                (Some(photo_id), relations)
            }
            Err(e) => {
                error!(
                    "failed to store photo record for {}: {:#}",
                    file_path.display(),
                    e
                );
                (None, Vec::new())
            }
        };

        Ok(Identification {
            photo_id,
            candidates,
            relations,
        })
    }

    /// Re-identify an already cataloged photo. The photo's previous relation
    /// set is removed before the new one is written; relation ids never
    /// survive a re-identification.
    pub fn reidentify_photo(&self, photo_id: i64) -> Result<Identification> {
        let photo = self
            .db
            .get_photo(photo_id)?
            .ok_or_else(|| anyhow!("photo {} not found", photo_id))?;
        let path = Path::new(&photo.file_path);
        if !path.exists() {
            bail!("file not found: {}", photo.file_path);
        }

        let response = self.provider.identify(path)?;
        let candidates = extract_candidates(&response);
        info!(
            "{} identified {} candidates for photo {}",
            self.provider.provider_name(),
            candidates.len(),
            photo_id
        );

        let removed = self.db.delete_relations_for_photo(photo_id)?;
        if removed > 0 {
            info!("removed {} old relations from photo {}", removed, photo_id);
        }
        let relations = self.attach_candidates(photo_id, &candidates)?;

        Ok(Identification {
            photo_id: Some(photo_id),
            candidates,
            relations,
        })
    }

    /// Re-identify a list of photos, sequentially and in input order. One
    /// photo's failure is collected and does not stop the rest; the call as
    /// a whole fails only when every photo failed, or immediately on a
    /// missing credential (retrying the remainder would fail the same way).
    pub fn identify_batch(&self, photo_ids: &[i64]) -> Result<BatchOutcome> {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        info!("starting batch identification of {} photos", photo_ids.len());
        for &photo_id in photo_ids {
            match self.reidentify_photo(photo_id) {
                Ok(identification) => results.push(BatchItem {
                    photo_id,
                    candidates: identification.candidates,
                    relations: identification.relations,
                }),
                Err(e) => {
                    if matches!(
                        e.downcast_ref::<PlantIdError>(),
                        Some(PlantIdError::MissingApiKey)
                    ) {
                        return Err(e);
                    }
                    warn!("identification failed for photo {}: {:#}", photo_id, e);
                    errors.push(BatchError {
                        photo_id,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        if !photo_ids.is_empty() && results.is_empty() {
            bail!("all {} identifications failed", photo_ids.len());
        }
        Ok(BatchOutcome { results, errors })
    }

    /// Create relations for the qualifying candidates. The top suggestion
    /// (index 0) is "primary" and every later one "secondary": rank decides
    /// the label, not the absolute confidence.
    fn attach_candidates(
        &self,
        photo_id: i64,
        candidates: &[SpeciesCandidate],
    ) -> Result<Vec<SpeciesRelation>> {
        let mut relations = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            if candidate.probability <= SIGNIFICANCE_THRESHOLD {
                continue;
            }
            let species_id = reconcile_species(self.db, candidate)?;
            let category = if index == 0 {
                CATEGORY_PRIMARY
            } else {
                CATEGORY_SECONDARY
            };
            let relation_id = self.db.create_relation(photo_id, species_id, Some(category))?;
            info!(
                "related photo {} to species {} as {}",
                photo_id, species_id, category
            );
            relations.push(SpeciesRelation {
                id: relation_id,
                photo_id,
                species_id,
                category: Some(category.to_string()),
            });
        }
        Ok(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_db, PhotoDraft};
    use serde_json::{json, Value};
    use std::fs::File;
    use tempfile::TempDir;

    struct CannedProvider {
        response: Value,
    }

    impl RecognitionProvider for CannedProvider {
        fn identify(&self, _image_path: &Path) -> Result<Value, PlantIdError> {
            Ok(self.response.clone())
        }

        fn provider_name(&self) -> &'static str {
            "canned"
        }
    }

    struct NoKeyProvider;

    impl RecognitionProvider for NoKeyProvider {
        fn identify(&self, _image_path: &Path) -> Result<Value, PlantIdError> {
            Err(PlantIdError::MissingApiKey)
        }

        fn provider_name(&self) -> &'static str {
            "no-key"
        }
    }

    fn ranked_response() -> Value {
        json!({
            "suggestions": [
                {"plant_name": "Taraxacum officinale", "probability": 0.95},
                {"plant_name": "Bellis perennis", "probability": 0.62},
                {"plant_name": "Leucanthemum vulgare", "probability": 0.5},
                {"plant_name": "Trifolium repens", "probability": 0.38}
            ]
        })
    }

    /// Photo row whose file actually exists under `dir`.
    fn photo_on_disk(db: &Database, dir: &TempDir, name: &str) -> i64 {
        let path = dir.path().join(name);
        File::create(&path).unwrap();
        db.insert_photo(&PhotoDraft {
            file_path: path.to_string_lossy().into_owned(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_threshold_and_ranking() {
        let db = test_db();
        let dir = TempDir::new().unwrap();
        let photo_id = photo_on_disk(&db, &dir, "a.jpg");

        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let result = identifier.reidentify_photo(photo_id).unwrap();

        // All four candidates come back, but only probabilities above 0.5
        // produce relations
        assert_eq!(result.candidates.len(), 4);
        assert_eq!(result.relations.len(), 2);
        assert_eq!(result.relations[0].category.as_deref(), Some("primary"));
        assert_eq!(result.relations[1].category.as_deref(), Some("secondary"));

        let stored = db.relations_for_photo(photo_id).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_reidentify_replaces_relations() {
        let db = test_db();
        let dir = TempDir::new().unwrap();
        let photo_id = photo_on_disk(&db, &dir, "a.jpg");

        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let first = identifier.reidentify_photo(photo_id).unwrap();
        let second = identifier.reidentify_photo(photo_id).unwrap();

        // Same (species, category) pairs...
        let pairs = |relations: &[SpeciesRelation]| {
            relations
                .iter()
                .map(|r| (r.species_id, r.category.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(&first.relations), pairs(&second.relations));

        // ...but fresh relation ids, and no leftovers from the first run
        let first_ids: Vec<i64> = first.relations.iter().map(|r| r.id).collect();
        assert!(second.relations.iter().all(|r| !first_ids.contains(&r.id)));
        assert_eq!(db.relations_for_photo(photo_id).unwrap().len(), 2);

        // The species catalog did not grow
        assert_eq!(db.list_species(0, None).unwrap().len(), 2);
    }

    #[test]
    fn test_reidentify_unknown_photo_is_not_found() {
        let db = test_db();
        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let err = identifier.reidentify_photo(9999).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_reidentify_missing_file_is_not_found() {
        let db = test_db();
        let photo_id = db
            .insert_photo(&PhotoDraft {
                file_path: "/nonexistent/a.jpg".to_string(),
                ..Default::default()
            })
            .unwrap();

        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let err = identifier.reidentify_photo(photo_id).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_batch_collects_per_item_errors() {
        let db = test_db();
        let dir = TempDir::new().unwrap();
        let first = photo_on_disk(&db, &dir, "a.jpg");
        let third = photo_on_disk(&db, &dir, "b.jpg");

        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let outcome = identifier.identify_batch(&[first, 9999, third]).unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].photo_id, first);
        assert_eq!(outcome.results[1].photo_id, third);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].photo_id, 9999);
        assert!(outcome.errors[0].error.contains("not found"));
    }

    #[test]
    fn test_batch_fails_when_every_item_fails() {
        let db = test_db();
        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        assert!(identifier.identify_batch(&[9998, 9999]).is_err());
        // An empty batch is not a failure
        assert!(identifier.identify_batch(&[]).is_ok());
    }

    #[test]
    fn test_batch_aborts_on_missing_credential() {
        let db = test_db();
        let dir = TempDir::new().unwrap();
        let photo_id = photo_on_disk(&db, &dir, "a.jpg");

        let identifier = Identifier::new(&db, NoKeyProvider);
        let err = identifier.identify_batch(&[photo_id]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlantIdError>(),
            Some(PlantIdError::MissingApiKey)
        ));
    }

    #[test]
    fn test_new_photo_returns_candidates_even_when_storage_fails() {
        let db = test_db();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        // Occupy the unique path so the insert fails
        db.insert_photo(&PhotoDraft {
            file_path: path.to_string_lossy().into_owned(),
            ..Default::default()
        })
        .unwrap();

        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let result = identifier.identify_new_photo(&path, None, None).unwrap();
        assert_eq!(result.photo_id, None);
        assert_eq!(result.candidates.len(), 4);
        assert!(result.relations.is_empty());
    }

    #[test]
    fn test_new_photo_persists_record_and_relations() {
        let db = test_db();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        File::create(&path).unwrap();

        let identifier = Identifier::new(&db, CannedProvider { response: ranked_response() });
        let result = identifier
            .identify_new_photo(&path, Some("2024-01-01".to_string()), None)
            .unwrap();

        let photo_id = result.photo_id.unwrap();
        let stored = db.get_photo_with_species(photo_id).unwrap().unwrap();
        assert_eq!(stored.photo.date.as_deref(), Some("2024-01-01"));
        assert_eq!(stored.species.len(), 2);
        assert_eq!(stored.species[0].category.as_deref(), Some("primary"));
    }
}
