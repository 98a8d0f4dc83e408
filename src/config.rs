use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub plantid: PlantIdConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantIdConfig {
    #[serde(default = "default_plantid_endpoint")]
    pub endpoint: String,

    /// Credential for the recognition service. When unset here, the
    /// `PLANT_ID_API_KEY` row in app settings is consulted instead.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Language for common names in the service response.
    #[serde(default = "default_plant_language")]
    pub language: String,

    /// When true, a missing credential or a failing service is replaced by a
    /// locally generated placeholder suggestion set instead of an error.
    #[serde(default)]
    pub fallback: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("herbarium")
        .join("herbarium.db")
}

fn default_plantid_endpoint() -> String {
    "https://api.plant.id/v2/identify".to_string()
}

fn default_plant_language() -> String {
    "et".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "png".to_string(),
        "gif".to_string(),
        "webp".to_string(),
        "tif".to_string(),
        "tiff".to_string(),
    ]
}

impl Default for PlantIdConfig {
    fn default() -> Self {
        Self {
            endpoint: default_plantid_endpoint(),
            api_key: None,
            language: default_plant_language(),
            fallback: false,
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            plantid: PlantIdConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("herbarium")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
