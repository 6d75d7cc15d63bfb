use serde::{Deserialize, Serialize};

use super::FailureContext;
use crate::EventLevel;

/// HTTP transfer events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// A GET request is about to be sent
    Started { url: String },

    /// The body was received in full
    Completed { url: String, bytes: u64 },

    /// The request failed or returned an error status
    Failed {
        url: String,
        failure: FailureContext,
    },
}

impl DownloadEvent {
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::Started { .. } | Self::Completed { .. } => EventLevel::Debug,
            Self::Failed { .. } => EventLevel::Warn,
        }
    }
}
