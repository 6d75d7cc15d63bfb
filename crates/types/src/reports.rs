//! Report type definitions for resolution and apply passes

use crate::patch::{PatchCandidate, PatchSet, ResolvedPatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome for a single patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    Applied,
    SkippedDoesNotApply,
    DownloadFailed,
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::SkippedDoesNotApply => write!(f, "skipped (does not apply)"),
            Self::DownloadFailed => write!(f, "download failed"),
        }
    }
}

/// Which apply pass produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyPass {
    /// Patches resolved from remote sources
    Remote,
    /// Patches supplied in a local directory
    Local,
}

impl fmt::Display for ApplyPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Per-patch line in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub source: String,
    pub file_name: String,
    pub outcome: PatchOutcome,
}

impl PatchRecord {
    #[must_use]
    pub fn for_patch(patch: &ResolvedPatch, outcome: PatchOutcome) -> Self {
        Self {
            source: patch.source.clone(),
            file_name: patch.file_name.clone(),
            outcome,
        }
    }

    #[must_use]
    pub fn download_failed(candidate: &PatchCandidate) -> Self {
        Self {
            source: candidate.source.clone(),
            file_name: candidate.file_name.clone(),
            outcome: PatchOutcome::DownloadFailed,
        }
    }
}

/// Result of one apply pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub pass: ApplyPass,
    /// Outcomes in application order
    pub records: Vec<PatchRecord>,
    pub applied: usize,
    pub skipped: usize,
}

impl ApplyReport {
    #[must_use]
    pub fn new(pass: ApplyPass) -> Self {
        Self {
            pass,
            records: Vec::new(),
            applied: 0,
            skipped: 0,
        }
    }

    /// Record an outcome and keep the counters in step
    pub fn record(&mut self, patch: &ResolvedPatch, outcome: PatchOutcome) {
        match outcome {
            PatchOutcome::Applied => self.applied += 1,
            PatchOutcome::SkippedDoesNotApply => self.skipped += 1,
            PatchOutcome::DownloadFailed => {}
        }
        self.records.push(PatchRecord::for_patch(patch, outcome));
    }

    /// Outcome sequence, handy for comparing runs
    #[must_use]
    pub fn outcomes(&self) -> Vec<PatchOutcome> {
        self.records.iter().map(|r| r.outcome).collect()
    }
}

/// Result of resolving remote sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub reference: String,
    /// Downloaded patches in application order
    pub patch_set: PatchSet,
    /// Candidates that were discovered but could not be downloaded
    pub failed: Vec<PatchCandidate>,
    /// Sources for which every discovery strategy failed
    pub unreachable: Vec<String>,
}

impl ResolutionReport {
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.patch_set.len() + self.failed.len()
    }
}

/// Combined report for a full pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub reference: String,
    pub unreachable: Vec<String>,
    pub download_failures: Vec<PatchRecord>,
    pub remote: ApplyReport,
    pub local: ApplyReport,
    pub applied: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn new(
        resolution: &ResolutionReport,
        remote: ApplyReport,
        local: ApplyReport,
        duration_ms: u64,
    ) -> Self {
        Self {
            reference: resolution.reference.clone(),
            unreachable: resolution.unreachable.clone(),
            download_failures: resolution
                .failed
                .iter()
                .map(PatchRecord::download_failed)
                .collect(),
            applied: remote.applied + local.applied,
            skipped: remote.skipped + local.skipped,
            remote,
            local,
            duration_ms,
        }
    }
}
