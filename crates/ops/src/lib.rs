#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for portpatch
//!
//! This crate sits between the CLI and the resolver/applier crates. The full
//! pipeline is resolve, apply the remote set, then apply the local set.

mod context;
mod pipeline;

pub use context::{OpsContextBuilder, OpsCtx};
pub use pipeline::{apply_local, resolve_only, run};

use portpatch_errors::{Error, OpsError};
use portpatch_types::{ApplyReport, ResolutionReport, RunReport};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Full pipeline run
    Run(RunReport),
    /// Remote resolution without applying
    Resolve(ResolutionReport),
    /// Local patches applied on their own
    Apply(ApplyReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Applied and skipped totals, when the operation applied anything
    #[must_use]
    pub fn counts(&self) -> Option<(usize, usize)> {
        match self {
            Self::Run(report) => Some((report.applied, report.skipped)),
            Self::Apply(report) => Some((report.applied, report.skipped)),
            Self::Resolve(_) => None,
        }
    }
}
