//! Builds photo records by merging user-supplied fields with extracted
//! metadata facts.

use std::path::Path;

use crate::db::PhotoDraft;
use crate::metadata::{self, PhotoFacts};

/// Build the record for a photo file. User-supplied date and location always
/// win; extracted facts fill only the gaps. GPS and camera fields have no
/// user-supplied equivalent and are adopted whenever extraction found them.
/// Metadata failure leaves a record built from user input alone.
pub fn build_photo_record(
    file_path: &Path,
    user_date: Option<String>,
    user_location: Option<String>,
) -> PhotoDraft {
    let facts = metadata::read_photo_facts(file_path);
    merge_facts(file_path, user_date, user_location, &facts)
}

/// The pure merge step, split out from the extraction for testability.
pub fn merge_facts(
    file_path: &Path,
    user_date: Option<String>,
    user_location: Option<String>,
    facts: &PhotoFacts,
) -> PhotoDraft {
    let mut draft = PhotoDraft {
        file_path: file_path.to_string_lossy().into_owned(),
        date: user_date,
        location: user_location,
        gps_latitude: facts.gps_latitude,
        gps_longitude: facts.gps_longitude,
        gps_altitude: facts.gps_altitude,
        camera_make: facts.camera_make.clone(),
        camera_model: facts.camera_model.clone(),
    };

    if draft.date.is_none() {
        draft.date = facts.date.clone();
    }
    if draft.location.is_none() {
        draft.location = facts.location.clone();
    }
    // Coordinates without any location string still yield a usable one
    if draft.location.is_none() {
        if let (Some(lat), Some(lon)) = (draft.gps_latitude, draft.gps_longitude) {
            draft.location = Some(format!("{}, {}", lat, lon));
        }
    }

    draft
}
