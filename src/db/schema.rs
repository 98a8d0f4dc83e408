pub const SCHEMA: &str = r#"
-- Photos table: one row per cataloged image file
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT NOT NULL UNIQUE,
    date TEXT,              -- YYYY-MM-DD when inferred from metadata
    location TEXT,          -- free text or "lat, lon" derived from GPS
    gps_latitude REAL,
    gps_longitude REAL,
    gps_altitude REAL,
    camera_make TEXT,
    camera_model TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_photos_date ON photos(date);
CREATE INDEX IF NOT EXISTS idx_photos_location ON photos(location);

-- Species catalog: exactly one row per scientific name
CREATE TABLE IF NOT EXISTS species (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scientific_name TEXT NOT NULL UNIQUE,
    common_name TEXT,
    family TEXT,
    localized_name TEXT
);

CREATE INDEX IF NOT EXISTS idx_species_family ON species(family);

-- Photo to species mapping with primary/secondary ranking
CREATE TABLE IF NOT EXISTS photo_species (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    photo_id INTEGER NOT NULL,
    species_id INTEGER NOT NULL,
    category TEXT,          -- 'primary' for the top suggestion, 'secondary' for the rest
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
    FOREIGN KEY (species_id) REFERENCES species(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_photo_species_photo ON photo_species(photo_id);
CREATE INDEX IF NOT EXISTS idx_photo_species_species ON photo_species(species_id);

-- Application settings as key/value/description rows
CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Statements applied on every startup to bring old databases forward.
/// Each runs best-effort; failures (column already exists) are ignored.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE species ADD COLUMN localized_name TEXT",
    "ALTER TABLE photos ADD COLUMN camera_make TEXT",
    "ALTER TABLE photos ADD COLUMN camera_model TEXT",
];
