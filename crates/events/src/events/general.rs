use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::EventLevel;

/// General utility events for warnings, errors, and operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Generic warning message
    Warning { message: String },

    /// Debug logging with structured context
    DebugLog {
        message: String,
        context: HashMap<String, String>,
    },

    /// Generic operation started notification
    OperationStarted { operation: String },

    /// Generic operation completion with success status
    OperationCompleted { operation: String, success: bool },

    /// Generic operation failure with error details
    OperationFailed { operation: String, error: String },
}

impl GeneralEvent {
    /// Create a warning event
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    /// Create a debug log event
    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::Warning { .. } => EventLevel::Warn,
            Self::OperationFailed { .. } => EventLevel::Error,
            Self::DebugLog { .. } => EventLevel::Debug,
            Self::OperationStarted { .. } | Self::OperationCompleted { .. } => EventLevel::Info,
        }
    }
}
