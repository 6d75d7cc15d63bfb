//! Multi-source patch resolution

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use portpatch_config::{constants::DEFAULT_PATCH_SUFFIX, Config};
use portpatch_errors::{Error, PatchError};
use portpatch_events::{EventEmitter, EventSender, FailureContext, PatchEvent};
use portpatch_net::{download_file, NetClient};
use portpatch_types::{
    has_patch_suffix, is_plain_name, PatchCandidate, PatchSet, PatchSource, ResolutionReport,
    ResolvedPatch,
};
use tracing::{debug, warn};

use crate::{ContentsApi, DirectoryListing, DiscoveryStrategy};

/// Turns an ordered list of sources into a downloaded, ordered patch set
///
/// Downloads are stored as `<patch_dir>/<source>/<file>`.
pub struct PatchResolver {
    client: NetClient,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
    patch_dir: PathBuf,
    clean_patch_dir: bool,
    suffixes: Vec<String>,
    tx: EventSender,
}

impl PatchResolver {
    /// Create a resolver with no strategies registered
    #[must_use]
    pub fn new(client: NetClient, patch_dir: impl Into<PathBuf>, tx: EventSender) -> Self {
        Self {
            client,
            strategies: Vec::new(),
            patch_dir: patch_dir.into(),
            clean_patch_dir: true,
            suffixes: vec![DEFAULT_PATCH_SUFFIX.to_string()],
            tx,
        }
    }

    /// Resolver with the directory listing and contents API strategies, in that order
    ///
    /// # Errors
    ///
    /// Returns an error if a strategy cannot be constructed.
    pub fn from_config(client: NetClient, config: &Config, tx: EventSender) -> Result<Self, Error> {
        let listing = DirectoryListing::from_config(client.clone(), &config.sources)?;
        let contents = ContentsApi::from_config(client.clone(), &config.sources);
        Ok(Self::new(client, &config.patch.patch_dir, tx)
            .with_strategy(listing)
            .with_strategy(contents)
            .with_clean_patch_dir(config.patch.clean_patch_dir)
            .with_suffixes(config.sources.suffixes.clone()))
    }

    /// Register a strategy; strategies run in registration order
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl DiscoveryStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    #[must_use]
    pub fn with_clean_patch_dir(mut self, clean: bool) -> Self {
        self.clean_patch_dir = clean;
        self
    }

    /// Suffixes of the files cleaned out of source directories
    #[must_use]
    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    #[must_use]
    pub fn patch_dir(&self) -> &Path {
        &self.patch_dir
    }

    /// Discover and download patches for `sources` at `reference`
    ///
    /// Sources are visited in the given order, which is their priority.
    /// Within a source, candidates are ordered by file name.
    ///
    /// # Errors
    ///
    /// Returns an error only if the patch directory cannot be prepared.
    /// Unreachable sources and failed downloads are recorded in the report.
    pub async fn resolve(
        &self,
        sources: &[String],
        reference: &str,
    ) -> Result<ResolutionReport, Error> {
        self.tx.emit_patch(PatchEvent::ResolveStarted {
            sources: sources.to_vec(),
            reference: reference.to_string(),
        });

        let mut report = ResolutionReport {
            reference: reference.to_string(),
            ..ResolutionReport::default()
        };

        for id in sources {
            let source = PatchSource::new(id.as_str(), reference);
            if !is_plain_name(&source.id) {
                warn!(source = %source.id, "source identifier is not a plain name, skipping source");
                self.tx.emit_warning(format!(
                    "source '{}' is not a plain name and was skipped",
                    source.id
                ));
                self.tx.emit_patch(PatchEvent::SourceUnreachable {
                    source: source.id.clone(),
                });
                report.unreachable.push(source.id);
                continue;
            }

            self.prepare_source_dir(&source.id).await?;

            let Some(candidates) = self.discover(&source).await else {
                warn!(source = %source.id, "every strategy failed, skipping source");
                self.tx.emit_patch(PatchEvent::SourceUnreachable {
                    source: source.id.clone(),
                });
                report.unreachable.push(source.id);
                continue;
            };

            for candidate in candidates.into_values() {
                self.fetch(candidate, &mut report.patch_set, &mut report.failed)
                    .await;
            }
        }

        self.tx.emit_patch(PatchEvent::ResolveCompleted {
            resolved: report.patch_set.len(),
            failed: report.failed.len(),
            unreachable: report.unreachable.len(),
        });

        Ok(report)
    }

    /// Merge every strategy's listing, keyed by file name
    ///
    /// `None` when no strategy could read the source. The first strategy to
    /// report a file keeps it.
    async fn discover(&self, source: &PatchSource) -> Option<BTreeMap<String, PatchCandidate>> {
        let mut merged = BTreeMap::new();
        let mut reachable = false;

        for strategy in &self.strategies {
            match strategy.list_patches(source).await {
                Ok(candidates) => {
                    reachable = true;
                    self.tx.emit_patch(PatchEvent::SourceListed {
                        source: source.id.clone(),
                        strategy: strategy.kind(),
                        candidates: candidates.len(),
                    });
                    for candidate in candidates {
                        merged
                            .entry(candidate.file_name.clone())
                            .or_insert(candidate);
                    }
                }
                Err(e) => {
                    debug!(source = %source.id, strategy = %strategy.kind(), error = %e, "strategy failed");
                    self.tx.emit_patch(PatchEvent::StrategyFailed {
                        source: source.id.clone(),
                        strategy: strategy.kind(),
                        failure: FailureContext::from_error(&e),
                    });
                }
            }
        }

        reachable.then_some(merged)
    }

    async fn fetch(
        &self,
        candidate: PatchCandidate,
        patch_set: &mut PatchSet,
        failed: &mut Vec<PatchCandidate>,
    ) {
        if !is_plain_name(&candidate.file_name) {
            let failure = PatchError::CandidateFetchFailed {
                source_id: candidate.source.clone(),
                file: candidate.file_name.clone(),
                message: "file name is not a plain name".to_string(),
            };
            warn!("{failure}");
            self.tx.emit_patch(PatchEvent::CandidateFetchFailed {
                source: candidate.source.clone(),
                file_name: candidate.file_name.clone(),
                failure: FailureContext::from_error(&failure),
            });
            failed.push(candidate);
            return;
        }

        let dest = self.patch_dir.join(candidate.relative_path());

        match download_file(&self.client, &candidate.url, &dest, &self.tx).await {
            Ok(download) => {
                self.tx.emit_patch(PatchEvent::CandidateDownloaded {
                    source: candidate.source.clone(),
                    file_name: candidate.file_name.clone(),
                    path: dest.clone(),
                });
                patch_set.push(ResolvedPatch {
                    source: candidate.source,
                    file_name: candidate.file_name,
                    path: dest,
                    url: Some(candidate.url),
                    digest: Some(download.digest),
                });
            }
            Err(e) => {
                let failure = PatchError::CandidateFetchFailed {
                    source_id: candidate.source.clone(),
                    file: candidate.file_name.clone(),
                    message: e.to_string(),
                };
                warn!("{failure}");
                self.tx.emit_patch(PatchEvent::CandidateFetchFailed {
                    source: candidate.source.clone(),
                    file_name: candidate.file_name.clone(),
                    failure: FailureContext::from_error(&e),
                });
                failed.push(candidate);
            }
        }
    }

    /// Create `<patch_dir>/<source>` and drop patches an earlier run left in it
    ///
    /// Only patch-suffixed files and partial downloads are removed; anything
    /// else in the directory is left alone.
    async fn prepare_source_dir(&self, source: &str) -> Result<(), Error> {
        let dir = self.patch_dir.join(source);
        let dir_error = |e: std::io::Error| PatchError::PatchDirectory {
            path: dir.display().to_string(),
            message: e.to_string(),
        };

        tokio::fs::create_dir_all(&dir).await.map_err(dir_error)?;

        if !self.clean_patch_dir {
            return Ok(());
        }

        let mut entries = tokio::fs::read_dir(&dir).await.map_err(dir_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            let file_type = entry.file_type().await.map_err(dir_error)?;
            if !(file_type.is_file() || file_type.is_symlink()) {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if has_patch_suffix(&name, &self.suffixes) || name.ends_with(".part") {
                debug!(path = %entry.path().display(), "removing stale patch");
                tokio::fs::remove_file(entry.path())
                    .await
                    .map_err(dir_error)?;
            }
        }

        Ok(())
    }
}
