//! Normalizes a raw tag bag into the facts the catalog stores.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::TagBag;

/// Facts extracted from one image. Every field is optional; extraction is
/// best-effort and one unparsable tag never blocks the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoFacts {
    /// Capture day as `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Free text or a `"lat, lon"` string derived from coordinates.
    pub location: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
}

impl PhotoFacts {
    pub fn is_empty(&self) -> bool {
        *self == PhotoFacts::default()
    }
}

/// Timestamp tags in priority order: original capture first, then creation,
/// then file modification.
const DATE_TAGS: &[(&str, &str)] = &[
    ("ExifIFD", "DateTimeOriginal"),
    ("ExifIFD", "CreateDate"),
    ("IFD0", "ModifyDate"),
    ("File", "FileModifyDate"),
];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4}):(\d{2}):(\d{2})").expect("valid date regex"))
}

fn dms_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches strings like: 57 deg 46' 28.17" N
    RE.get_or_init(|| Regex::new(r#"(\d+)\s*deg\s*(\d+)'\s*(\d+\.?\d*)""#).expect("valid DMS regex"))
}

fn altitude_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches strings like: 83 m  /  12.5 m
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)\s*m").expect("valid altitude regex"))
}

pub fn extract_facts(tags: &TagBag) -> PhotoFacts {
    let mut facts = PhotoFacts::default();
    if tags.is_empty() {
        return facts;
    }

    facts.date = extract_date(tags);

    let (latitude, longitude, altitude) = extract_gps(tags);
    facts.gps_latitude = latitude;
    facts.gps_longitude = longitude;
    facts.gps_altitude = altitude;

    facts.location = extract_location(tags, latitude, longitude);

    facts.camera_make = tag(tags, "IFD0", "Make").map(str::to_string);
    facts.camera_model = tag(tags, "IFD0", "Model").map(str::to_string);

    debug!("extracted facts: {:?}", facts);
    facts
}

fn tag<'a>(tags: &'a TagBag, section: &str, name: &str) -> Option<&'a str> {
    tags.get(section)?.get(name).map(String::as_str)
}

/// First timestamp tag with a leading `YYYY:MM:DD`, reformatted to
/// `YYYY-MM-DD`.
fn extract_date(tags: &TagBag) -> Option<String> {
    for (section, name) in DATE_TAGS {
        if let Some(value) = tag(tags, section, name) {
            if let Some(caps) = date_re().captures(value) {
                return Some(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]));
            }
        }
    }
    None
}

/// Decimal-degree latitude, longitude and altitude in metres.
fn extract_gps(tags: &TagBag) -> (Option<f64>, Option<f64>, Option<f64>) {
    let latitude = match (tag(tags, "GPS", "GPSLatitude"), tag(tags, "GPS", "GPSLatitudeRef")) {
        (Some(value), Some(reference)) => {
            parse_dms(value).map(|v| if flips_sign(reference, "S", "South") { -v } else { v })
        }
        _ => None,
    };

    let longitude = match (
        tag(tags, "GPS", "GPSLongitude"),
        tag(tags, "GPS", "GPSLongitudeRef"),
    ) {
        (Some(value), Some(reference)) => {
            parse_dms(value).map(|v| if flips_sign(reference, "W", "West") { -v } else { v })
        }
        _ => None,
    };

    let altitude = tag(tags, "GPS", "GPSAltitude").and_then(parse_altitude).map(|v| {
        let below_sea_level = tag(tags, "GPS", "GPSAltitudeRef")
            .map(|r| r.to_ascii_lowercase().contains("below"))
            .unwrap_or(false);
        if below_sea_level {
            -v
        } else {
            v
        }
    });

    (latitude, longitude, altitude)
}

/// `D deg M' S"` to signed decimal degrees.
fn parse_dms(value: &str) -> Option<f64> {
    let caps = dms_re().captures(value)?;
    let degrees: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

fn parse_altitude(value: &str) -> Option<f64> {
    let caps = altitude_re().captures(value)?;
    caps[1].parse().ok()
}

/// True when the hemisphere reference means a negative coordinate. Accepts
/// single letters and full names, any case.
fn flips_sign(reference: &str, short: &str, long: &str) -> bool {
    let reference = reference.trim();
    reference.eq_ignore_ascii_case(short) || reference.eq_ignore_ascii_case(long)
}

/// Pre-composed position verbatim when present, otherwise synthesized from
/// parsed coordinates.
fn extract_location(
    tags: &TagBag,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Option<String> {
    if let Some(position) = tag(tags, "Composite", "GPSPosition") {
        return Some(position.to_string());
    }
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(format!("{}, {}", lat, lon)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(sections: &[(&str, &[(&str, &str)])]) -> TagBag {
        sections
            .iter()
            .map(|(section, tags)| {
                (
                    section.to_string(),
                    tags.iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_gps_dms_to_decimal() {
        let tags = bag(&[(
            "GPS",
            &[
                ("GPSLatitude", "57 deg 46' 28.17\" N"),
                ("GPSLatitudeRef", "N"),
                ("GPSLongitude", "26 deg 2' 12.45\" E"),
                ("GPSLongitudeRef", "E"),
                ("GPSAltitude", "83 m"),
            ],
        )]);

        let facts = extract_facts(&tags);
        assert!((facts.gps_latitude.unwrap() - 57.774492).abs() < 1e-6);
        assert!((facts.gps_longitude.unwrap() - 26.036792).abs() < 1e-6);
        assert_eq!(facts.gps_altitude, Some(83.0));
    }

    #[test]
    fn test_south_west_flip_sign() {
        let tags = bag(&[(
            "GPS",
            &[
                ("GPSLatitude", "57 deg 46' 28.17\" S"),
                ("GPSLatitudeRef", "S"),
                ("GPSLongitude", "26 deg 2' 12.45\" W"),
                ("GPSLongitudeRef", "W"),
            ],
        )]);

        let facts = extract_facts(&tags);
        assert!((facts.gps_latitude.unwrap() + 57.774492).abs() < 1e-6);
        assert!((facts.gps_longitude.unwrap() + 26.036792).abs() < 1e-6);
    }

    #[test]
    fn test_full_name_references_any_case() {
        let tags = bag(&[(
            "GPS",
            &[
                ("GPSLatitude", "10 deg 30' 0\" S"),
                ("GPSLatitudeRef", "south"),
                ("GPSLongitude", "20 deg 0' 0\" W"),
                ("GPSLongitudeRef", "West"),
            ],
        )]);

        let facts = extract_facts(&tags);
        assert!(facts.gps_latitude.unwrap() < 0.0);
        assert!(facts.gps_longitude.unwrap() < 0.0);
    }

    #[test]
    fn test_altitude_below_sea_level() {
        let tags = bag(&[(
            "GPS",
            &[("GPSAltitude", "12.5 m"), ("GPSAltitudeRef", "Below Sea Level")],
        )]);
        assert_eq!(extract_facts(&tags).gps_altitude, Some(-12.5));
    }

    #[test]
    fn test_composite_position_wins_over_derived() {
        let tags = bag(&[
            ("Composite", &[("GPSPosition", "57.7745 N, 26.0368 E")]),
            (
                "GPS",
                &[
                    ("GPSLatitude", "57 deg 46' 28.17\" N"),
                    ("GPSLatitudeRef", "N"),
                    ("GPSLongitude", "26 deg 2' 12.45\" E"),
                    ("GPSLongitudeRef", "E"),
                ],
            ),
        ]);
        assert_eq!(
            extract_facts(&tags).location.as_deref(),
            Some("57.7745 N, 26.0368 E")
        );
    }

    #[test]
    fn test_derived_location_from_coordinates() {
        let tags = bag(&[(
            "GPS",
            &[
                ("GPSLatitude", "57 deg 46' 28.17\" N"),
                ("GPSLatitudeRef", "N"),
                ("GPSLongitude", "26 deg 2' 12.45\" E"),
                ("GPSLongitudeRef", "E"),
            ],
        )]);

        let facts = extract_facts(&tags);
        let location = facts.location.unwrap();
        assert!(location.starts_with("57.774"));
        assert!(location.contains(", 26.036"));
    }

    #[test]
    fn test_date_priority_and_reformat() {
        let tags = bag(&[
            (
                "ExifIFD",
                &[
                    ("DateTimeOriginal", "2023:05:05 10:31:12"),
                    ("CreateDate", "2023:06:06 09:00:00"),
                ],
            ),
            ("IFD0", &[("ModifyDate", "2024:01:01 00:00:00")]),
        ]);
        assert_eq!(extract_facts(&tags).date.as_deref(), Some("2023-05-05"));

        let tags = bag(&[("File", &[("FileModifyDate", "2024:02:29 12:00:00+02:00")])]);
        assert_eq!(extract_facts(&tags).date.as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_unparsable_date_is_absent() {
        let tags = bag(&[("ExifIFD", &[("DateTimeOriginal", "yesterday")])]);
        assert_eq!(extract_facts(&tags).date, None);
    }

    #[test]
    fn test_bad_gps_does_not_block_camera_facts() {
        let tags = bag(&[
            (
                "GPS",
                &[("GPSLatitude", "garbage"), ("GPSLatitudeRef", "N")],
            ),
            ("IFD0", &[("Make", "Canon"), ("Model", "EOS R5")]),
        ]);

        let facts = extract_facts(&tags);
        assert_eq!(facts.gps_latitude, None);
        assert_eq!(facts.camera_make.as_deref(), Some("Canon"));
        assert_eq!(facts.camera_model.as_deref(), Some("EOS R5"));
    }

    #[test]
    fn test_empty_bag_yields_empty_facts() {
        let facts = extract_facts(&TagBag::new());
        assert!(facts.is_empty());
    }
}
