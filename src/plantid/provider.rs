use serde_json::Value;
use std::path::Path;

use super::PlantIdError;

/// Source of recognition responses. The production implementation is
/// [`super::PlantIdClient`]; tests substitute canned responses.
pub trait RecognitionProvider {
    /// Identify the plants on an image. The returned value is the raw
    /// service response; [`super::extract_candidates`] distills it.
    fn identify(&self, image_path: &Path) -> Result<Value, PlantIdError>;

    /// Provider name for logs.
    fn provider_name(&self) -> &'static str;
}
