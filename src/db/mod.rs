mod schema;
pub mod photos;
pub mod relations;
pub mod settings;
pub mod species;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub use photos::{Photo, PhotoDraft, PhotoFilter, PhotoUpdate, PhotoWithSpecies, SpeciesSummary};
pub use relations::SpeciesRelation;
pub use schema::{MIGRATIONS, SCHEMA};
pub use settings::{AppSetting, SETTING_PLANT_ID_API_KEY};
pub use species::Species;

pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open (or create) the catalog database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        for migration in MIGRATIONS {
            let _ = self.conn.execute(migration, []);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db
}
