#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in portpatch
//!
//! Library crates never print. Progress and non-fatal failures (an
//! unreachable source, a patch that does not apply) are emitted as events and
//! the CLI decides how to log or render them.

pub mod events;
pub use events::{AppEvent, DownloadEvent, FailureContext, GeneralEvent, PatchEvent};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::Level;

/// Type alias for event sender using the `AppEvent` system
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver using the `AppEvent` system
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel with the `AppEvent` system
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Lightweight severity levels used by the event system.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<EventLevel> for Level {
    fn from(level: EventLevel) -> Self {
        match level {
            EventLevel::Debug => Level::DEBUG,
            EventLevel::Info => Level::INFO,
            EventLevel::Warn => Level::WARN,
            EventLevel::Error => Level::ERROR,
        }
    }
}

/// The unified trait for emitting events throughout portpatch
///
/// Implemented for a raw `EventSender` and for any struct that carries one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, error: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            error: error.into(),
        }));
    }

    /// Emit a patch domain event
    fn emit_patch(&self, event: PatchEvent) {
        self.emit(AppEvent::Patch(event));
    }

    /// Emit a download domain event
    fn emit_download(&self, event: DownloadEvent) {
        self.emit(AppEvent::Download(event));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_through_sender() {
        let (tx, mut rx) = channel();
        tx.emit_warning("careful");
        tx.emit_patch(PatchEvent::SourceUnreachable {
            source: "nodejs".into(),
        });

        match rx.recv().await {
            Some(AppEvent::General(GeneralEvent::Warning { message, .. })) => {
                assert_eq!(message, "careful");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        let event = rx.recv().await.unwrap();
        assert_eq!(event.level(), EventLevel::Warn);
    }

    #[test]
    fn test_emit_without_receiver_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_debug("nobody listening");

        let none: Option<EventSender> = None;
        none.emit_debug("no sender at all");
    }
}
