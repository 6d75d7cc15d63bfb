//! Patch sources, candidates and ordered patch sets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How a source's patch list is discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Scrape `href` tokens out of an HTML directory listing
    DirectoryListing,
    /// Read entries from a structured contents API
    ContentsApi,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryListing => write!(f, "directory-listing"),
            Self::ContentsApi => write!(f, "contents-api"),
        }
    }
}

/// A named remote location that may hold patch files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSource {
    /// Source identifier, e.g. a package directory name
    pub id: String,
    /// Branch, tag or commit to read from
    pub reference: String,
}

impl PatchSource {
    #[must_use]
    pub fn new(id: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference: reference.into(),
        }
    }
}

/// One patch file discovered in a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchCandidate {
    /// Identifier of the source the file was found in
    pub source: String,
    pub file_name: String,
    /// Where the file can be downloaded from
    pub url: String,
    /// Strategy that discovered the file first
    pub strategy: StrategyKind,
}

impl PatchCandidate {
    /// Deduplication key: the same file in the same source is one candidate
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.source, &self.file_name)
    }

    /// Path relative to the patch directory: one subdirectory per source
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.source).join(&self.file_name)
    }
}

/// A patch file available on local disk, ready to be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPatch {
    pub source: String,
    pub file_name: String,
    pub path: PathBuf,
    /// Remote origin, `None` for caller-supplied local patches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// BLAKE3 digest of the file contents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ResolvedPatch {
    /// `source/file_name`, used in logs and reports
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.source, self.file_name)
    }
}

/// Ordered, deduplicated sequence of patches
///
/// Order is application order. Producers are responsible for sorting by
/// (source priority, file name) before handing a set to the applier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchSet {
    patches: Vec<ResolvedPatch>,
}

impl PatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, patch: ResolvedPatch) {
        self.patches.push(patch);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedPatch> {
        self.patches.iter()
    }

    /// Labels in application order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.patches.iter().map(ResolvedPatch::label).collect()
    }
}

impl From<Vec<ResolvedPatch>> for PatchSet {
    fn from(patches: Vec<ResolvedPatch>) -> Self {
        Self { patches }
    }
}

impl IntoIterator for PatchSet {
    type Item = ResolvedPatch;
    type IntoIter = std::vec::IntoIter<ResolvedPatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a ResolvedPatch;
    type IntoIter = std::slice::Iter<'a, ResolvedPatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}

/// Whether `name` is a single path component that cannot leave its directory
#[must_use]
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Whether `name` is a plain file name ending in one of the recognized patch suffixes
#[must_use]
pub fn has_patch_suffix<S: AsRef<str>>(name: &str, suffixes: &[S]) -> bool {
    is_plain_name(name)
        && suffixes.iter().any(|suffix| {
            let suffix = suffix.as_ref();
            !suffix.is_empty() && name.len() > suffix.len() && name.ends_with(suffix)
        })
}
