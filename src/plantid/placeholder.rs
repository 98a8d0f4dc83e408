//! Locally generated stand-in for the recognition service, used in fallback
//! mode when the service is unconfigured or unreachable.

use serde_json::{json, Value};

/// A fixed suggestion set shaped exactly like a service response: a handful
/// of common northern European species above the significance threshold,
/// followed by lower-confidence alternatives below it.
pub fn placeholder_response() -> Value {
    json!({
        "suggestions": [
            {
                "plant_name": "Taraxacum officinale",
                "probability": 0.95,
                "plant_details": {
                    "common_names": ["Võilill", "Dandelion", "Common dandelion"],
                    "taxonomy": {"family": "Asteraceae", "genus": "Taraxacum"},
                    "url": "https://en.wikipedia.org/wiki/Taraxacum_officinale"
                }
            },
            {
                "plant_name": "Bellis perennis",
                "probability": 0.92,
                "plant_details": {
                    "common_names": ["Kirikakar", "Common daisy", "Lawn daisy"],
                    "taxonomy": {"family": "Asteraceae", "genus": "Bellis"},
                    "url": "https://en.wikipedia.org/wiki/Bellis_perennis"
                }
            },
            {
                "plant_name": "Primula veris",
                "probability": 0.91,
                "plant_details": {
                    "common_names": ["Nurmenukk", "Cowslip", "Spring primrose"],
                    "taxonomy": {"family": "Primulaceae", "genus": "Primula"},
                    "url": "https://en.wikipedia.org/wiki/Primula_veris"
                }
            },
            {
                "plant_name": "Leucanthemum vulgare",
                "probability": 0.42,
                "plant_details": {
                    "common_names": ["Härjasilm", "Oxeye daisy", "Marguerite"],
                    "taxonomy": {"family": "Asteraceae", "genus": "Leucanthemum"},
                    "url": "https://en.wikipedia.org/wiki/Leucanthemum_vulgare"
                }
            },
            {
                "plant_name": "Trifolium repens",
                "probability": 0.38,
                "plant_details": {
                    "common_names": ["Valge ristik", "White clover", "Dutch clover"],
                    "taxonomy": {"family": "Fabaceae", "genus": "Trifolium"},
                    "url": "https://en.wikipedia.org/wiki/Trifolium_repens"
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plantid::extract_candidates;

    #[test]
    fn test_placeholder_extracts_like_a_real_response() {
        let candidates = extract_candidates(&placeholder_response());
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].scientific_name, "Taraxacum officinale");
        assert!(candidates[0].probability > 0.5);
        // The tail is below the significance threshold on purpose
        assert!(candidates.last().unwrap().probability < 0.5);
    }
}
