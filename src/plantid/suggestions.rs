//! Distills a raw recognition response into ordered species candidates.

use serde_json::Value;
use tracing::{error, warn};

/// One ranked suggestion from the recognition service, in canonical form.
/// Consumers never look at the raw response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesCandidate {
    pub scientific_name: String,
    pub common_names: Vec<String>,
    /// Service confidence in [0, 1]; 0 when the field was absent.
    pub probability: f64,
    pub family: String,
    pub genus: String,
    pub description: String,
}

/// Convert a response into candidates, preserving the service's ranking
/// order. Never fails: an error envelope, a missing suggestion list or a
/// nameless suggestion all degrade to fewer (or zero) candidates, and
/// malformed nested blocks degrade to empty strings for the affected fields.
pub fn extract_candidates(response: &Value) -> Vec<SpeciesCandidate> {
    if let Some(error) = response.get("error") {
        error!("recognition response carries an error: {}", error);
        return Vec::new();
    }

    let Some(suggestions) = response.get("suggestions").and_then(|s| s.as_array()) else {
        warn!("recognition response has no suggestions list");
        return Vec::new();
    };

    suggestions.iter().filter_map(candidate_from_suggestion).collect()
}

fn candidate_from_suggestion(suggestion: &Value) -> Option<SpeciesCandidate> {
    let scientific_name = suggestion
        .get("plant_name")
        .and_then(|n| n.as_str())
        .unwrap_or("");
    if scientific_name.is_empty() {
        warn!("skipping suggestion without a plant name");
        return None;
    }

    let probability = suggestion
        .get("probability")
        .and_then(|p| p.as_f64())
        .unwrap_or(0.0);

    let details = suggestion.get("plant_details");

    let common_names = details
        .and_then(|d| d.get("common_names"))
        .and_then(|n| n.as_array())
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let taxonomy = details.and_then(|d| d.get("taxonomy"));
    let family = string_field(taxonomy, "family");
    let genus = string_field(taxonomy, "genus");

    let description = details
        .and_then(|d| d.get("wiki_description"))
        .and_then(|w| w.get("value"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some(SpeciesCandidate {
        scientific_name: scientific_name.to_string(),
        common_names,
        probability,
        family,
        genus,
        description,
    })
}

fn string_field(value: Option<&Value>, name: &str) -> String {
    value
        .and_then(|v| v.get(name))
        .and_then(|f| f.as_str())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_is_preserved() {
        let response = json!({
            "suggestions": [
                {"plant_name": "Tulipa gesneriana", "probability": 0.98},
                {"plant_name": "Bellis perennis", "probability": 0.99},
                {"plant_name": "Primula veris", "probability": 0.2}
            ]
        });

        let names: Vec<String> = extract_candidates(&response)
            .into_iter()
            .map(|c| c.scientific_name)
            .collect();
        // Service order, not confidence order
        assert_eq!(
            names,
            vec!["Tulipa gesneriana", "Bellis perennis", "Primula veris"]
        );
    }

    #[test]
    fn test_error_envelope_yields_no_candidates() {
        let response = json!({
            "error": "API request failed with status code 500",
            "suggestions": [{"plant_name": "Bellis perennis", "probability": 0.9}]
        });
        assert!(extract_candidates(&response).is_empty());
    }

    #[test]
    fn test_missing_suggestions_yields_no_candidates() {
        assert!(extract_candidates(&json!({})).is_empty());
        assert!(extract_candidates(&json!({"suggestions": "oops"})).is_empty());
    }

    #[test]
    fn test_nameless_suggestion_is_skipped() {
        let response = json!({
            "suggestions": [
                {"probability": 0.99},
                {"plant_name": "", "probability": 0.98},
                {"plant_name": "Bellis perennis", "probability": 0.9}
            ]
        });

        let candidates = extract_candidates(&response);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].scientific_name, "Bellis perennis");
    }

    #[test]
    fn test_full_details_are_extracted() {
        let response = json!({
            "suggestions": [{
                "plant_name": "Taraxacum officinale",
                "probability": 0.95,
                "plant_details": {
                    "common_names": ["Võilill", "Dandelion"],
                    "taxonomy": {"family": "Asteraceae", "genus": "Taraxacum"},
                    "wiki_description": {"value": "A widespread herb."}
                }
            }]
        });

        let candidate = &extract_candidates(&response)[0];
        assert_eq!(candidate.common_names, vec!["Võilill", "Dandelion"]);
        assert_eq!(candidate.family, "Asteraceae");
        assert_eq!(candidate.genus, "Taraxacum");
        assert_eq!(candidate.description, "A widespread herb.");
    }

    #[test]
    fn test_malformed_details_degrade_to_defaults() {
        let response = json!({
            "suggestions": [{
                "plant_name": "Bellis perennis",
                "plant_details": {
                    "common_names": "not a list",
                    "taxonomy": "not a map",
                    "wiki_description": 42
                }
            }]
        });

        let candidate = &extract_candidates(&response)[0];
        assert_eq!(candidate.probability, 0.0);
        assert!(candidate.common_names.is_empty());
        assert_eq!(candidate.family, "");
        assert_eq!(candidate.genus, "");
        assert_eq!(candidate.description, "");
    }
}
