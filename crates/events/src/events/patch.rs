use portpatch_types::{ApplyPass, StrategyKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;
use crate::EventLevel;

/// Patch discovery and application events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PatchEvent {
    /// Resolution across all sources started
    ResolveStarted {
        sources: Vec<String>,
        reference: String,
    },

    /// A strategy listed a source
    SourceListed {
        source: String,
        strategy: StrategyKind,
        candidates: usize,
    },

    /// A strategy could not list a source
    StrategyFailed {
        source: String,
        strategy: StrategyKind,
        failure: FailureContext,
    },

    /// Every strategy failed for this source; it contributes nothing
    SourceUnreachable { source: String },

    /// A discovered patch was stored locally
    CandidateDownloaded {
        source: String,
        file_name: String,
        path: PathBuf,
    },

    /// A discovered patch could not be downloaded and is dropped
    CandidateFetchFailed {
        source: String,
        file_name: String,
        failure: FailureContext,
    },

    /// Resolution finished
    ResolveCompleted {
        resolved: usize,
        failed: usize,
        unreachable: usize,
    },

    /// An apply pass started
    ApplyStarted { pass: ApplyPass, total: usize },

    /// A patch passed its dry run and was committed
    Applied {
        pass: ApplyPass,
        source: String,
        file_name: String,
    },

    /// A patch failed its dry run; the tree is unchanged
    Skipped {
        pass: ApplyPass,
        source: String,
        file_name: String,
        reason: String,
    },

    /// An apply pass finished
    ApplyCompleted {
        pass: ApplyPass,
        applied: usize,
        skipped: usize,
    },
}

impl PatchEvent {
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::SourceListed { .. } | Self::CandidateDownloaded { .. } => EventLevel::Debug,
            Self::StrategyFailed { .. }
            | Self::SourceUnreachable { .. }
            | Self::CandidateFetchFailed { .. }
            | Self::Skipped { .. } => EventLevel::Warn,
            Self::ResolveStarted { .. }
            | Self::ResolveCompleted { .. }
            | Self::ApplyStarted { .. }
            | Self::Applied { .. }
            | Self::ApplyCompleted { .. } => EventLevel::Info,
        }
    }
}
