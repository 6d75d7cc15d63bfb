//! Source tree handle

use portpatch_errors::{Error, PatchError};
use std::path::{Path, PathBuf};

/// Working copy that patches are applied to
///
/// Mutating operations take `&mut SourceTree`, so a tree has one writer at a
/// time.
#[derive(Debug)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Open an existing directory as a source tree
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let not_found = || PatchError::TreeNotFound {
            path: root.display().to_string(),
        };

        let meta = tokio::fs::metadata(root).await.map_err(|_| not_found())?;
        if !meta.is_dir() {
            return Err(not_found().into());
        }
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| Error::io_with_path(&e, root))?;

        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
