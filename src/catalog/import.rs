//! Bulk registration of image files from a directory tree.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::photos::build_photo_record;
use crate::db::Database;

#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Walk `directory` and register every image file that is not yet in the
/// catalog. Files already present (by path) are skipped; a single file that
/// fails to register is logged and does not stop the walk.
pub fn import_directory(
    db: &Database,
    directory: &Path,
    image_extensions: &[String],
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for entry in WalkDir::new(directory).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_image_extension(path, image_extensions) {
            continue;
        }

        if db.photo_exists_by_path(path) {
            summary.skipped += 1;
            continue;
        }

        let draft = build_photo_record(path, None, None);
        match db.insert_photo(&draft) {
            Ok(photo_id) => {
                info!("imported {} as photo {}", path.display(), photo_id);
                summary.imported += 1;
            }
            Err(e) => {
                warn!("failed to import {}: {:#}", path.display(), e);
            }
        }
    }

    info!(
        "import of {} finished: {} new, {} already cataloged",
        directory.display(),
        summary.imported,
        summary.skipped
    );
    Ok(summary)
}

fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            extensions.iter().any(|ext| ext.eq_ignore_ascii_case(&e))
        })
        .unwrap_or(false)
}
