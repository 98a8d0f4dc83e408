//! Species catalog rows. The scientific name is the dedupe key: the UNIQUE
//! constraint on it is what arbitrates concurrent create attempts.

use anyhow::Result;

use super::Database;

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: i64,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub family: Option<String>,
    pub localized_name: Option<String>,
}

fn species_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Species> {
    Ok(Species {
        id: row.get(0)?,
        scientific_name: row.get(1)?,
        common_name: row.get(2)?,
        family: row.get(3)?,
        localized_name: row.get(4)?,
    })
}

const SPECIES_COLUMNS: &str = "id, scientific_name, common_name, family, localized_name";

impl Database {
    pub fn create_species(
        &self,
        scientific_name: &str,
        common_name: Option<&str>,
        family: Option<&str>,
        localized_name: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO species (scientific_name, common_name, family, localized_name) \
             VALUES (?, ?, ?, ?)",
            rusqlite::params![scientific_name, common_name, family, localized_name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_species(&self, species_id: i64) -> Result<Option<Species>> {
        let result = self.conn.query_row(
            &format!("SELECT {SPECIES_COLUMNS} FROM species WHERE id = ?"),
            [species_id],
            species_from_row,
        );
        match result {
            Ok(species) => Ok(Some(species)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Exact, case-sensitive lookup by scientific name.
    pub fn find_species_by_name(&self, scientific_name: &str) -> Result<Option<Species>> {
        let result = self.conn.query_row(
            &format!("SELECT {SPECIES_COLUMNS} FROM species WHERE scientific_name = ?"),
            [scientific_name],
            species_from_row,
        );
        match result {
            Ok(species) => Ok(Some(species)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_species(&self, offset: i64, limit: Option<i64>) -> Result<Vec<Species>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SPECIES_COLUMNS} FROM species ORDER BY scientific_name LIMIT ? OFFSET ?"
        ))?;
        let species = stmt
            .query_map(
                rusqlite::params![limit.unwrap_or(-1), offset],
                species_from_row,
            )?
            .filter_map(|r| r.ok())
            .collect();
        Ok(species)
    }

    /// Apply non-`None` field edits. Returns the updated row, or `None` when
    /// the species does not exist.
    pub fn update_species(
        &self,
        species_id: i64,
        scientific_name: Option<&str>,
        common_name: Option<&str>,
        family: Option<&str>,
        localized_name: Option<&str>,
    ) -> Result<Option<Species>> {
        if self.get_species(species_id)?.is_none() {
            return Ok(None);
        }
        self.conn.execute(
            r#"
            UPDATE species SET
                scientific_name = COALESCE(?, scientific_name),
                common_name = COALESCE(?, common_name),
                family = COALESCE(?, family),
                localized_name = COALESCE(?, localized_name)
            WHERE id = ?
            "#,
            rusqlite::params![scientific_name, common_name, family, localized_name, species_id],
        )?;
        self.get_species(species_id)
    }

    /// Delete a species; its relations go with it. Returns false when the id
    /// is unknown.
    pub fn delete_species(&self, species_id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM species WHERE id = ?", [species_id])?;
        Ok(changed > 0)
    }

    pub fn count_photos_for_species(&self, species_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM photo_species WHERE species_id = ?",
            [species_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
