//! Raw image metadata extraction and normalization.
//!
//! The raw side shells out to `exiftool` and produces a section-grouped tag
//! bag; the normalizer distills that bag into the handful of facts the
//! catalog stores. Both halves are best-effort: a missing tool, an unreadable
//! file or a mangled tag never surface as errors, only as absent facts.

pub mod exiftool;
pub mod normalize;

use std::collections::BTreeMap;
use std::path::Path;

pub use normalize::PhotoFacts;

/// Tag values grouped by exiftool section (`ExifIFD`, `IFD0`, `GPS`,
/// `Composite`, `File`, ...), all values stringified.
pub type TagBag = BTreeMap<String, BTreeMap<String, String>>;

/// Extract normalized facts for one image file.
pub fn read_photo_facts(path: &Path) -> PhotoFacts {
    let tags = exiftool::read_tag_bag(path);
    normalize::extract_facts(&tags)
}
