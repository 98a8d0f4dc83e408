//! Photo to species relations.

use anyhow::{anyhow, Result};

use super::Database;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRelation {
    pub id: i64,
    pub photo_id: i64,
    pub species_id: i64,
    pub category: Option<String>,
}

fn relation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SpeciesRelation> {
    Ok(SpeciesRelation {
        id: row.get(0)?,
        photo_id: row.get(1)?,
        species_id: row.get(2)?,
        category: row.get(3)?,
    })
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Database {
    /// Create a relation. Both endpoints must exist; a dangling reference is
    /// reported as not-found.
    pub fn create_relation(
        &self,
        photo_id: i64,
        species_id: i64,
        category: Option<&str>,
    ) -> Result<i64> {
        let inserted = self.conn.execute(
            "INSERT INTO photo_species (photo_id, species_id, category) VALUES (?, ?, ?)",
            rusqlite::params![photo_id, species_id, category],
        );
        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(ref e) if is_foreign_key_violation(e) => Err(anyhow!(
                "photo {} or species {} not found",
                photo_id,
                species_id
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_relation(&self, relation_id: i64) -> Result<Option<SpeciesRelation>> {
        let result = self.conn.query_row(
            "SELECT id, photo_id, species_id, category FROM photo_species WHERE id = ?",
            [relation_id],
            relation_from_row,
        );
        match result {
            Ok(relation) => Ok(Some(relation)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_relations(&self, offset: i64, limit: Option<i64>) -> Result<Vec<SpeciesRelation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, photo_id, species_id, category FROM photo_species \
             ORDER BY id LIMIT ? OFFSET ?",
        )?;
        let relations = stmt
            .query_map(
                rusqlite::params![limit.unwrap_or(-1), offset],
                relation_from_row,
            )?
            .filter_map(|r| r.ok())
            .collect();
        Ok(relations)
    }

    pub fn relations_for_photo(&self, photo_id: i64) -> Result<Vec<SpeciesRelation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, photo_id, species_id, category FROM photo_species \
             WHERE photo_id = ? ORDER BY id",
        )?;
        let relations = stmt
            .query_map([photo_id], relation_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(relations)
    }

    pub fn relations_for_species(&self, species_id: i64) -> Result<Vec<SpeciesRelation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, photo_id, species_id, category FROM photo_species \
             WHERE species_id = ? ORDER BY id",
        )?;
        let relations = stmt
            .query_map([species_id], relation_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(relations)
    }

    pub fn delete_relation(&self, relation_id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM photo_species WHERE id = ?", [relation_id])?;
        Ok(changed > 0)
    }

    /// Drop every relation the photo has. Re-identification replaces the set
    /// wholesale: this must complete before the new relations are inserted.
    pub fn delete_relations_for_photo(&self, photo_id: i64) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM photo_species WHERE photo_id = ?", [photo_id])?;
        Ok(deleted)
    }
}
