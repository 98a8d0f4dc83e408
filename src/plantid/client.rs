use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;
use serde::Serialize;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::placeholder::placeholder_response;
use super::provider::RecognitionProvider;
use super::PlantIdError;
use crate::config::PlantIdConfig;

/// Longest edge of the uploaded image; larger photos are downscaled and
/// re-encoded before the base64 payload is built.
const MAX_UPLOAD_DIMENSION: u32 = 1024;

/// Client for the Plant.id-style recognition API. All state is explicit
/// configuration; there is no ambient default credential.
pub struct PlantIdClient {
    endpoint: String,
    api_key: Option<String>,
    language: String,
    fallback: bool,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct IdentifyRequest<'a> {
    api_key: &'a str,
    images: Vec<String>,
    modifiers: Vec<&'a str>,
    plant_language: &'a str,
    plant_details: Vec<&'a str>,
}

impl PlantIdClient {
    /// Build a client from configuration. `api_key` is the already-resolved
    /// credential (config value or settings row); `None` means unconfigured.
    pub fn new(config: &PlantIdConfig, api_key: Option<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            language: config.language.clone(),
            fallback: config.fallback,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn call_service(&self, api_key: &str, image_path: &Path) -> Result<Value, PlantIdError> {
        let base64_image = load_and_encode_image(image_path, MAX_UPLOAD_DIMENSION)?;

        let request = IdentifyRequest {
            api_key,
            images: vec![base64_image],
            modifiers: vec!["crops_fast", "similar_images"],
            plant_language: &self.language,
            plant_details: vec![
                "common_names",
                "url",
                "wiki_description",
                "taxonomy",
                "synonyms",
            ],
        };

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();

        info!(
            "requesting identification for {}",
            image_path.file_name().unwrap_or_default().to_string_lossy()
        );
        let response = agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(&request);

        match response {
            Ok(response) => {
                let body: Value = response
                    .into_json()
                    .map_err(|e| PlantIdError::Transport(e.to_string()))?;
                let count = body
                    .get("suggestions")
                    .and_then(|s| s.as_array())
                    .map(|s| s.len())
                    .unwrap_or(0);
                info!("recognition service returned {} suggestions", count);
                Ok(body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(PlantIdError::Service { status, body })
            }
            Err(e) => Err(PlantIdError::Transport(e.to_string())),
        }
    }
}

impl RecognitionProvider for PlantIdClient {
    fn identify(&self, image_path: &Path) -> Result<Value, PlantIdError> {
        let Some(api_key) = self.api_key.clone() else {
            if self.fallback {
                warn!("no API key configured, substituting placeholder suggestions");
                return Ok(placeholder_response());
            }
            return Err(PlantIdError::MissingApiKey);
        };

        match self.call_service(&api_key, image_path) {
            Ok(response) => Ok(response),
            Err(e) if self.fallback => {
                warn!("recognition service failed ({}), substituting placeholder suggestions", e);
                Ok(placeholder_response())
            }
            Err(e) => Err(e),
        }
    }

    fn provider_name(&self) -> &'static str {
        "plant.id"
    }
}

/// Load an image, downscale if either dimension exceeds `max_dimension`,
/// re-encode as JPEG and return the base64 payload.
fn load_and_encode_image(image_path: &Path, max_dimension: u32) -> Result<String, PlantIdError> {
    let bad_image = |reason: String| PlantIdError::BadImage {
        path: image_path.to_path_buf(),
        reason,
    };

    let img = image::open(image_path).map_err(|e| bad_image(e.to_string()))?;

    let (width, height) = img.dimensions();
    let img = if width > max_dimension || height > max_dimension {
        img.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img
    };

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, 85);
    img.write_with_encoder(encoder)
        .map_err(|e| bad_image(e.to_string()))?;

    Ok(BASE64.encode(buf.into_inner()))
}
