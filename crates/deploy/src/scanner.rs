//! File scanning for upload.
//!
//! Recursively walks the built site directory and produces file
//! entries with URL paths normalized to forward slashes and a leading
//! `/`.

use std::path::Path;

use crate::error::DeployError;
use crate::types::SiteFile;

/// Scans a site directory recursively and returns entries for upload.
///
/// Relative paths use `/` as separator (even on Windows); the URL path
/// is the relative path with a leading `/`. Two files whose paths
/// normalize identically resolve by replace semantics downstream
/// (last write wins), not by erroring here.
pub fn scan_site(root: &Path) -> Result<(Vec<SiteFile>, i64), DeployError> {
    let mut files = Vec::new();
    let mut total_size: i64 = 0;

    walk_dir(root, root, &mut files, &mut total_size)?;

    Ok((files, total_size))
}

fn walk_dir(
    root: &Path,
    current: &Path,
    files: &mut Vec<SiteFile>,
    total_size: &mut i64,
) -> Result<(), DeployError> {
    let entries = std::fs::read_dir(current)?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk_dir(root, &path, files, total_size)?;
        } else if metadata.is_file() {
            let rel_path = path.strip_prefix(root).map_err(std::io::Error::other)?;

            // Normalize to forward slashes.
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");
            let size = metadata.len() as i64;

            files.push(SiteFile {
                url_path: format!("/{rel_str}"),
                relative_path: rel_str,
                size,
            });
            *total_size += size;
        }
    }

    Ok(())
}
