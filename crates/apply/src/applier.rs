//! Validate-then-commit application of a patch set

use std::sync::Arc;

use portpatch_errors::Error;
use portpatch_events::{EventEmitter, EventSender, PatchEvent};
use portpatch_types::{ApplyPass, ApplyReport, PatchOutcome, PatchSet};
use tracing::{debug, info};

use crate::{PatchTool, SourceTree};

/// Applies patch sets in order, skipping the ones that do not apply
pub struct PatchApplier {
    tool: Arc<dyn PatchTool>,
    tx: EventSender,
}

impl PatchApplier {
    #[must_use]
    pub fn new(tool: Arc<dyn PatchTool>, tx: EventSender) -> Self {
        Self { tool, tx }
    }

    #[must_use]
    pub fn tool(&self) -> &Arc<dyn PatchTool> {
        &self.tool
    }

    /// Apply `patches` to `tree` in set order
    ///
    /// Each patch is dry-run first. A failed dry run is recorded as
    /// [`PatchOutcome::SkippedDoesNotApply`] and the tree is left as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch tool cannot run, or if a patch that
    /// passed its dry run then fails to apply.
    pub async fn apply(
        &self,
        tree: &mut SourceTree,
        patches: &PatchSet,
        pass: ApplyPass,
    ) -> Result<ApplyReport, Error> {
        self.tx.emit_patch(PatchEvent::ApplyStarted {
            pass,
            total: patches.len(),
        });

        let mut report = ApplyReport::new(pass);

        for patch in patches {
            if self.tool.check(tree, &patch.path).await? {
                self.tool.apply(tree, &patch.path).await?;
                info!(patch = %patch.label(), %pass, "applied");
                self.tx.emit_patch(PatchEvent::Applied {
                    pass,
                    source: patch.source.clone(),
                    file_name: patch.file_name.clone(),
                });
                report.record(patch, PatchOutcome::Applied);
            } else {
                debug!(patch = %patch.label(), %pass, "skipped, does not apply");
                self.tx.emit_patch(PatchEvent::Skipped {
                    pass,
                    source: patch.source.clone(),
                    file_name: patch.file_name.clone(),
                    reason: "does not apply to the current tree".to_string(),
                });
                report.record(patch, PatchOutcome::SkippedDoesNotApply);
            }
        }

        self.tx.emit_patch(PatchEvent::ApplyCompleted {
            pass,
            applied: report.applied,
            skipped: report.skipped,
        });

        Ok(report)
    }
}
