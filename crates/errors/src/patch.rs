//! Patch resolution and application error types
//!
//! `SourceUnreachable`, `CandidateFetchFailed` and `DoesNotApply` are
//! reported through events and reports and never returned as `Err` from the
//! pipeline. The remaining variants abort the run.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PatchError {
    #[error("patch source unreachable: {source_id}")]
    SourceUnreachable { source_id: String },

    #[error("failed to fetch {file} from {source_id}: {message}")]
    CandidateFetchFailed {
        source_id: String,
        file: String,
        message: String,
    },

    #[error("patch does not apply: {patch}")]
    DoesNotApply { patch: String },

    #[error("patch tool not available: {program}")]
    ToolUnavailable { program: String },

    #[error("patch {patch} passed its dry run but failed to apply: {message}")]
    CommitFailed { patch: String, message: String },

    #[error("patch directory {path}: {message}")]
    PatchDirectory { path: String, message: String },

    #[error("source tree not found: {path}")]
    TreeNotFound { path: String },
}

impl UserFacingError for PatchError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolUnavailable { .. } => {
                Some("Install GNU patch or point [patch] program at a compatible binary.")
            }
            Self::CommitFailed { .. } => {
                Some("The source tree is in an unknown state; restore it before rerunning.")
            }
            Self::PatchDirectory { .. } => Some("Ensure the patch directory is writable."),
            Self::TreeNotFound { .. } => Some("Pass an existing directory with --tree."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnreachable { .. } | Self::CandidateFetchFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::SourceUnreachable { .. } => "patch.source_unreachable",
            Self::CandidateFetchFailed { .. } => "patch.candidate_fetch_failed",
            Self::DoesNotApply { .. } => "patch.does_not_apply",
            Self::ToolUnavailable { .. } => "patch.tool_unavailable",
            Self::CommitFailed { .. } => "patch.commit_failed",
            Self::PatchDirectory { .. } => "patch.patch_directory",
            Self::TreeNotFound { .. } => "patch.tree_not_found",
        };
        Some(code)
    }
}
