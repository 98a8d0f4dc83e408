//! Estonian common names for frequently identified species.

/// Scientific name (lowercased) to Estonian common name.
const LOCALIZED_NAMES: &[(&str, &str)] = &[
    ("taraxacum officinale", "Võilill"),
    ("bellis perennis", "Kirikakar"),
    ("tulipa gesneriana", "Tulp"),
    ("primula veris", "Nurmenukk"),
    ("convallaria majalis", "Maikelluke"),
    ("leucanthemum vulgare", "Härjasilm"),
    ("trifolium repens", "Valge ristik"),
    ("campanula patula", "Harilik kellukas"),
];

/// Look up a localized common name. Unmapped species fall back to the first
/// Estonian-looking entry (one carrying õ/ä/ö/ü) among the service-provided
/// common names.
pub fn localized_name(scientific_name: &str, common_names: &[String]) -> Option<String> {
    if scientific_name.is_empty() {
        return None;
    }

    let lowered = scientific_name.to_lowercase();
    if let Some((_, name)) = LOCALIZED_NAMES.iter().find(|(key, _)| *key == lowered) {
        return Some((*name).to_string());
    }

    common_names
        .iter()
        .find(|name| {
            name.to_lowercase()
                .chars()
                .any(|c| matches!(c, 'õ' | 'ä' | 'ö' | 'ü'))
        })
        .cloned()
}
