//! Event handling and progress display

use console::{style, Term};
use portpatch_events::{AppEvent, DownloadEvent, GeneralEvent, PatchEvent};

use crate::logging::log_event_with_tracing;

/// Turns events into progress lines on stderr
pub struct EventHandler {
    colors_enabled: bool,
    debug_enabled: bool,
    /// Progress lines are suppressed in JSON mode
    quiet: bool,
    term: Term,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            colors_enabled,
            debug_enabled,
            quiet,
            term: Term::stderr(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&self, event: AppEvent) {
        log_event_with_tracing(&event);
        if self.quiet {
            return;
        }

        match event {
            AppEvent::Patch(patch) => self.handle_patch_event(patch),
            AppEvent::Download(DownloadEvent::Failed { url, failure }) => {
                if self.debug_enabled {
                    self.show_warning(&format!("download failed: {url}: {failure}"));
                }
            }
            AppEvent::Download(_) => {}
            AppEvent::General(general) => self.handle_general_event(general),
        }
    }

    fn handle_patch_event(&self, event: PatchEvent) {
        match event {
            PatchEvent::ResolveStarted { sources, reference } => {
                self.show_status(&format!(
                    "Resolving patches from {} at {reference}",
                    sources.join(", ")
                ));
            }
            PatchEvent::SourceListed {
                source,
                strategy,
                candidates,
            } => {
                if self.debug_enabled {
                    self.show_status(&format!("  {source}: {strategy} listed {candidates}"));
                }
            }
            PatchEvent::StrategyFailed {
                source,
                strategy,
                failure,
            } => {
                if self.debug_enabled {
                    self.show_warning(&format!("{source}: {strategy} failed: {failure}"));
                }
            }
            PatchEvent::SourceUnreachable { source } => {
                self.show_warning(&format!("source {source} unreachable, skipping"));
            }
            PatchEvent::CandidateDownloaded {
                source, file_name, ..
            } => {
                self.show_status(&format!("  fetched {source}/{file_name}"));
            }
            PatchEvent::CandidateFetchFailed {
                source,
                file_name,
                failure,
            } => {
                self.show_warning(&format!("could not fetch {source}/{file_name}: {failure}"));
            }
            PatchEvent::ResolveCompleted {
                resolved,
                failed,
                unreachable,
            } => {
                self.show_status(&format!(
                    "Resolved {resolved} patches ({failed} failed, {unreachable} sources unreachable)"
                ));
            }
            PatchEvent::ApplyStarted { pass, total } => {
                if total > 0 {
                    self.show_status(&format!("Applying {total} {pass} patches"));
                }
            }
            PatchEvent::Applied {
                source, file_name, ..
            } => {
                let mark = self.paint_ok("applied");
                self.show_status(&format!("  {mark} {source}/{file_name}"));
            }
            PatchEvent::Skipped {
                source,
                file_name,
                reason,
                ..
            } => {
                let mark = self.paint_warn("skipped");
                self.show_status(&format!("  {mark} {source}/{file_name} ({reason})"));
            }
            PatchEvent::ApplyCompleted { .. } => {}
        }
    }

    fn handle_general_event(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message } => self.show_warning(&message),
            GeneralEvent::DebugLog { message, .. } => {
                if self.debug_enabled {
                    self.show_status(&message);
                }
            }
            GeneralEvent::OperationFailed { operation, error } => {
                if self.debug_enabled {
                    self.show_error(&format!("{operation} failed: {error}"));
                }
            }
            GeneralEvent::OperationStarted { .. } | GeneralEvent::OperationCompleted { .. } => {}
        }
    }

    fn paint_ok(&self, text: &str) -> String {
        if self.colors_enabled {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_warn(&self, text: &str) -> String {
        if self.colors_enabled {
            style(text).yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn show_warning(&self, message: &str) {
        let label = self.paint_warn("warning:");
        let _ = self.term.write_line(&format!("{label} {message}"));
    }

    fn show_error(&self, message: &str) {
        let label = if self.colors_enabled {
            style("error:").red().bold().to_string()
        } else {
            "error:".to_string()
        };
        let _ = self.term.write_line(&format!("{label} {message}"));
    }
}
