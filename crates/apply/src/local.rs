//! Caller-supplied local patches

use portpatch_errors::{Error, PatchError};
use portpatch_types::{has_patch_suffix, PatchSet, ResolvedPatch};
use std::path::Path;

/// Source id given to patches read from a local directory
pub const LOCAL_SOURCE: &str = "local";

/// Collect the patch files directly inside `dir`, ordered by file name
///
/// A directory that does not exist yields an empty set.
///
/// # Errors
///
/// Returns an error if `dir` exists but cannot be read.
pub async fn local_patch_set<S: AsRef<str>>(dir: &Path, suffixes: &[S]) -> Result<PatchSet, Error> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(PatchSet::new());
    }

    let dir_error = |e: std::io::Error| PatchError::PatchDirectory {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(dir_error)?;
    let mut patches = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        if !has_patch_suffix(&file_name, suffixes) {
            continue;
        }
        let path = entry.path();
        // Follows symlinks, so a linked patch counts as a file
        if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            continue;
        }

        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        patches.push(ResolvedPatch {
            source: LOCAL_SOURCE.to_string(),
            file_name,
            path,
            url: None,
            digest: Some(blake3::hash(&contents).to_hex().to_string()),
        });
    }

    patches.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(PatchSet::from(patches))
}
