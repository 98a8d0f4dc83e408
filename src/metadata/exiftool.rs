//! Thin wrapper around the `exiftool` command-line utility.

use serde_json::Value;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, error, warn};

use super::TagBag;

/// Whether exiftool is usable on this host. Probed once per process; when it
/// is missing every extraction short-circuits to an empty bag instead of
/// spawning a doomed subprocess per file.
pub fn exiftool_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| match Command::new("exiftool").arg("-ver").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            debug!("exiftool available, version {}", version);
            true
        }
        Ok(_) => {
            error!("exiftool -ver exited with failure; metadata extraction disabled");
            false
        }
        Err(e) => {
            error!(
                "exiftool not found in PATH ({}); metadata extraction disabled",
                e
            );
            false
        }
    })
}

/// Run exiftool on a file and return its tags grouped by section. Any
/// failure (tool missing, file missing, bad output) yields an empty bag.
pub fn read_tag_bag(path: &Path) -> TagBag {
    if !exiftool_available() {
        return TagBag::new();
    }
    if !path.exists() {
        warn!("file does not exist: {}", path.display());
        return TagBag::new();
    }

    let output = match Command::new("exiftool")
        .args(["-json", "-a", "-u", "-g1"])
        .arg(path)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            error!("failed to run exiftool on {}: {}", path.display(), e);
            return TagBag::new();
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "exiftool exited with {} for {}: {}",
            output.status,
            path.display(),
            stderr.trim()
        );
        return TagBag::new();
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_tag_bag(&stdout)
}

/// Parse exiftool's JSON output (an array with one object per file) into a
/// section-grouped bag. Scalar non-string values are stringified so the
/// normalizer sees uniform text.
fn parse_tag_bag(json: &str) -> TagBag {
    let parsed: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            error!("failed to parse exiftool output: {}", e);
            return TagBag::new();
        }
    };

    let Some(entry) = parsed.as_array().and_then(|a| a.first()) else {
        warn!("exiftool returned no entries");
        return TagBag::new();
    };
    let Some(sections) = entry.as_object() else {
        return TagBag::new();
    };

    let mut bag = TagBag::new();
    for (section, tags) in sections {
        let Some(tags) = tags.as_object() else {
            // Top-level scalars like SourceFile carry no section
            continue;
        };
        let section_tags = bag.entry(section.clone()).or_default();
        for (name, value) in tags {
            if let Some(text) = stringify(value) {
                section_tags.insert(name.clone(), text);
            }
        }
    }
    bag
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groups_by_section() {
        let json = r#"[{
            "SourceFile": "/photos/a.jpg",
            "ExifIFD": {"DateTimeOriginal": "2023:05:05 10:31:12", "ISO": 200},
            "GPS": {"GPSLatitude": "57 deg 46' 28.17\" N"},
            "IFD0": {"Make": "Canon"}
        }]"#;

        let bag = parse_tag_bag(json);
        assert_eq!(
            bag["ExifIFD"]["DateTimeOriginal"],
            "2023:05:05 10:31:12"
        );
        // Numbers are stringified
        assert_eq!(bag["ExifIFD"]["ISO"], "200");
        assert_eq!(bag["GPS"]["GPSLatitude"], "57 deg 46' 28.17\" N");
        assert_eq!(bag["IFD0"]["Make"], "Canon");
        // Top-level scalars are not sections
        assert!(!bag.contains_key("SourceFile"));
    }

    #[test]
    fn test_parse_garbage_yields_empty_bag() {
        assert!(parse_tag_bag("not json").is_empty());
        assert!(parse_tag_bag("[]").is_empty());
        assert!(parse_tag_bag("{}").is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty_bag() {
        let bag = read_tag_bag(Path::new("/nonexistent/photo.jpg"));
        assert!(bag.is_empty());
    }
}
