//! Photo rows and the filtered photo listing.

use anyhow::Result;
use std::path::Path;

use super::Database;

#[derive(Debug, Clone, Default)]
pub struct Photo {
    pub id: i64,
    pub file_path: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub created_at: Option<String>,
}

/// Insertable photo record, before it has an id. Produced by the record
/// builder in `catalog::photos`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoDraft {
    pub file_path: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
}

/// Explicit field edits for an existing photo; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct PhotoUpdate {
    pub date: Option<String>,
    pub location: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
}

/// Filter for photo listings. Text filters are substring matches.
#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    pub species_id: Option<i64>,
    pub species_name: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub offset: i64,
    pub limit: Option<i64>,
}

/// Species entry attached to a photo in listing results.
#[derive(Debug, Clone)]
pub struct SpeciesSummary {
    pub id: i64,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub family: Option<String>,
    pub category: Option<String>,
    pub relation_id: i64,
}

#[derive(Debug, Clone)]
pub struct PhotoWithSpecies {
    pub photo: Photo,
    pub species: Vec<SpeciesSummary>,
}

fn photo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        file_path: row.get(1)?,
        date: row.get(2)?,
        location: row.get(3)?,
        gps_latitude: row.get(4)?,
        gps_longitude: row.get(5)?,
        gps_altitude: row.get(6)?,
        camera_make: row.get(7)?,
        camera_model: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const PHOTO_COLUMNS: &str = "id, file_path, date, location, gps_latitude, gps_longitude, \
     gps_altitude, camera_make, camera_model, created_at";

impl Database {
    pub fn insert_photo(&self, draft: &PhotoDraft) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO photos (file_path, date, location, gps_latitude, gps_longitude,
                                gps_altitude, camera_make, camera_model)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                draft.file_path,
                draft.date,
                draft.location,
                draft.gps_latitude,
                draft.gps_longitude,
                draft.gps_altitude,
                draft.camera_make,
                draft.camera_model,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>> {
        let result = self.conn.query_row(
            &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?"),
            [photo_id],
            photo_from_row,
        );
        match result {
            Ok(photo) => Ok(Some(photo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn photo_exists_by_path(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.conn
            .query_row(
                "SELECT 1 FROM photos WHERE file_path = ?",
                [path_str.as_ref()],
                |_| Ok(()),
            )
            .is_ok()
    }

    /// Photo together with all its species relations, or `None` when the id
    /// is unknown.
    pub fn get_photo_with_species(&self, photo_id: i64) -> Result<Option<PhotoWithSpecies>> {
        let Some(photo) = self.get_photo(photo_id)? else {
            return Ok(None);
        };
        let species = self.species_for_photo(photo_id)?;
        Ok(Some(PhotoWithSpecies { photo, species }))
    }

    fn species_for_photo(&self, photo_id: i64) -> Result<Vec<SpeciesSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.scientific_name, s.common_name, s.family, r.category, r.id
            FROM species s
            JOIN photo_species r ON r.species_id = s.id
            WHERE r.photo_id = ?
            ORDER BY r.id
            "#,
        )?;
        let species = stmt
            .query_map([photo_id], |row| {
                Ok(SpeciesSummary {
                    id: row.get(0)?,
                    scientific_name: row.get(1)?,
                    common_name: row.get(2)?,
                    family: row.get(3)?,
                    category: row.get(4)?,
                    relation_id: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(species)
    }

    /// Filtered photo listing, newest first, each photo carrying its species
    /// list. Joining on relations can yield duplicate photo rows, so the
    /// query selects distinct ids.
    pub fn list_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoWithSpecies>> {
        let mut sql = String::from(
            "SELECT DISTINCT p.id, p.file_path, p.date, p.location, p.gps_latitude, \
             p.gps_longitude, p.gps_altitude, p.camera_make, p.camera_model, p.created_at \
             FROM photos p",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if filter.species_id.is_some() || filter.species_name.is_some() {
            sql.push_str(
                " JOIN photo_species r ON r.photo_id = p.id JOIN species s ON s.id = r.species_id",
            );
        }
        if let Some(species_id) = filter.species_id {
            clauses.push("r.species_id = ?".to_string());
            params.push(Box::new(species_id));
        }
        if let Some(ref name) = filter.species_name {
            clauses.push("(s.scientific_name LIKE ? OR s.common_name LIKE ?)".to_string());
            let pattern = format!("%{}%", name);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }
        if let Some(ref location) = filter.location {
            clauses.push("p.location LIKE ?".to_string());
            params.push(Box::new(format!("%{}%", location)));
        }
        if let Some(ref date) = filter.date {
            clauses.push("p.date LIKE ?".to_string());
            params.push(Box::new(format!("%{}%", date)));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY p.id DESC LIMIT ? OFFSET ?");
        params.push(Box::new(filter.limit.unwrap_or(-1)));
        params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let photos: Vec<Photo> = stmt
            .query_map(&param_refs[..], photo_from_row)?
            .filter_map(|r| r.ok())
            .collect();

        let mut results = Vec::with_capacity(photos.len());
        for photo in photos {
            let species = self.species_for_photo(photo.id)?;
            results.push(PhotoWithSpecies { photo, species });
        }
        Ok(results)
    }

    /// Apply the given field edits. Returns the updated row, or `None` when
    /// the photo does not exist.
    pub fn update_photo(&self, photo_id: i64, update: &PhotoUpdate) -> Result<Option<Photo>> {
        if self.get_photo(photo_id)?.is_none() {
            return Ok(None);
        }
        self.conn.execute(
            r#"
            UPDATE photos SET
                date = COALESCE(?, date),
                location = COALESCE(?, location),
                gps_latitude = COALESCE(?, gps_latitude),
                gps_longitude = COALESCE(?, gps_longitude),
                gps_altitude = COALESCE(?, gps_altitude)
            WHERE id = ?
            "#,
            rusqlite::params![
                update.date,
                update.location,
                update.gps_latitude,
                update.gps_longitude,
                update.gps_altitude,
                photo_id,
            ],
        )?;
        self.get_photo(photo_id)
    }

    /// Delete a photo; its relations go with it. Returns false when the id
    /// is unknown.
    pub fn delete_photo(&self, photo_id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM photos WHERE id = ?", [photo_id])?;
        Ok(changed > 0)
    }

    pub fn count_photos(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }
}
