//! Application settings: key/value/description rows. The recognition
//! service credential lives here under [`SETTING_PLANT_ID_API_KEY`].

use anyhow::Result;
use chrono::Utc;

use super::Database;

pub const SETTING_PLANT_ID_API_KEY: &str = "PLANT_ID_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct AppSetting {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
}

fn setting_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppSetting> {
    Ok(AppSetting {
        key: row.get(0)?,
        value: row.get(1)?,
        description: row.get(2)?,
    })
}

impl Database {
    pub fn list_settings(&self) -> Result<Vec<AppSetting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, description FROM app_settings ORDER BY key")?;
        let settings = stmt
            .query_map([], setting_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(settings)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<AppSetting>> {
        let result = self.conn.query_row(
            "SELECT key, value, description FROM app_settings WHERE key = ?",
            [key],
            setting_from_row,
        );
        match result {
            Ok(setting) => Ok(Some(setting)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a setting, creating it when absent. A created row without an
    /// explicit description gets an auto-generated one.
    pub fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<AppSetting> {
        let now = Utc::now().to_rfc3339();
        match self.get_setting(key)? {
            Some(_) => {
                self.conn.execute(
                    "UPDATE app_settings SET value = ?, \
                     description = COALESCE(?, description), updated_at = ? WHERE key = ?",
                    rusqlite::params![value, description, now, key],
                )?;
            }
            None => {
                let auto = format!("Automatically created setting: {}", key);
                let description = description.unwrap_or(&auto);
                self.conn.execute(
                    "INSERT INTO app_settings (key, value, description, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![key, value, description, now, now],
                )?;
            }
        }
        self.get_setting(key)?
            .ok_or_else(|| anyhow::anyhow!("setting '{}' vanished after upsert", key))
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM app_settings WHERE key = ?", [key])?;
        Ok(changed > 0)
    }

    /// The recognition service credential; a missing row or blank value both
    /// mean the service is unconfigured.
    pub fn plant_id_api_key(&self) -> Result<Option<String>> {
        let key = self
            .get_setting(SETTING_PLANT_ID_API_KEY)?
            .and_then(|s| s.value)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(key)
    }
}
