//! Structured logging of events
//!
//! Every event is mirrored into tracing under the `portpatch::events` target,
//! serialized as one JSON field, at the severity the event carries.

use portpatch_events::{AppEvent, EventLevel};
use tracing::{debug, error, info, warn};

pub const EVENT_TARGET: &str = "portpatch::events";

/// Log an `AppEvent` through tracing
pub fn log_event_with_tracing(event: &AppEvent) {
    let payload = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => format!("{{\"unserializable\":\"{e}\"}}"),
    };

    match event.level() {
        EventLevel::Debug => debug!(target: EVENT_TARGET, event = %payload),
        EventLevel::Info => info!(target: EVENT_TARGET, event = %payload),
        EventLevel::Warn => warn!(target: EVENT_TARGET, event = %payload),
        EventLevel::Error => error!(target: EVENT_TARGET, event = %payload),
    }
}
