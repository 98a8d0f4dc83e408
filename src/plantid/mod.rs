//! Client for the external plant recognition service.

pub mod client;
pub mod placeholder;
pub mod provider;
pub mod suggestions;

use std::path::PathBuf;
use thiserror::Error;

pub use client::PlantIdClient;
pub use provider::RecognitionProvider;
pub use suggestions::{extract_candidates, SpeciesCandidate};

/// Errors from the recognition service. Shape problems in an otherwise
/// successful response are NOT errors; they degrade to an empty candidate
/// list in [`suggestions::extract_candidates`].
#[derive(Debug, Error)]
pub enum PlantIdError {
    /// Credential missing and fallback mode disabled. Deliberately loud:
    /// a silently empty result would look like "no plants found".
    #[error(
        "no recognition API key configured; set the PLANT_ID_API_KEY setting \
         or [plantid] api_key in the config file"
    )]
    MissingApiKey,

    /// The service answered with a non-success status.
    #[error("recognition service returned status {status}: {body}")]
    Service { status: u16, body: String },

    /// The request never produced a usable response.
    #[error("recognition request failed: {0}")]
    Transport(String),

    /// The local image could not be read or re-encoded for upload.
    #[error("failed to prepare image {path}: {reason}")]
    BadImage { path: PathBuf, reason: String },
}
