//! Patch tool seam and the GNU `patch` implementation

use async_trait::async_trait;
use portpatch_config::PatchConfig;
use portpatch_errors::{Error, PatchError};
use portpatch_platform::{HostProcessOperations, PlatformContext, ProcessOperations};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::SourceTree;

/// Checks and applies a single patch file against a tree
#[async_trait]
pub trait PatchTool: Send + Sync {
    /// Make sure the tool can run at all
    ///
    /// # Errors
    ///
    /// Returns `PatchError::ToolUnavailable` when it cannot.
    async fn ensure_available(&self) -> Result<(), Error>;

    /// Dry run: would `patch` apply cleanly to the tree as it is now?
    ///
    /// Must not modify the tree. `Ok(false)` means the patch does not apply;
    /// `Err` means the tool itself failed.
    async fn check(&self, tree: &SourceTree, patch: &Path) -> Result<bool, Error>;

    /// Apply `patch` for real
    ///
    /// Called only after a successful [`check`](Self::check).
    async fn apply(&self, tree: &mut SourceTree, patch: &Path) -> Result<(), Error>;
}

/// GNU `patch`, run non-interactively inside the tree
pub struct GnuPatch {
    program: String,
    strip: u32,
    process: Arc<dyn ProcessOperations>,
    ctx: PlatformContext,
}

impl GnuPatch {
    #[must_use]
    pub fn new(program: impl Into<String>, strip: u32) -> Self {
        Self {
            program: program.into(),
            strip,
            process: Arc::new(HostProcessOperations::new()),
            ctx: PlatformContext::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &PatchConfig) -> Self {
        Self::new(&config.program, config.strip)
    }

    #[must_use]
    pub fn with_process(mut self, process: Arc<dyn ProcessOperations>) -> Self {
        self.process = process;
        self
    }

    #[must_use]
    pub fn with_context(mut self, ctx: PlatformContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Arguments for one invocation, in the order `patch` receives them
    #[must_use]
    pub fn arguments(&self, patch: &Path, dry_run: bool) -> Vec<String> {
        let mut args = vec![format!("-p{}", self.strip), "-N".to_string()];
        if dry_run {
            args.push("--dry-run".to_string());
        }
        args.push("-i".to_string());
        args.push(patch.display().to_string());
        args
    }

    async fn run(
        &self,
        tree: &SourceTree,
        patch: &Path,
        dry_run: bool,
    ) -> Result<portpatch_platform::CommandOutput, Error> {
        // cwd is the tree root; relative paths would resolve against it
        let patch = absolute(patch)?;

        let mut cmd = self.process.create_command(&self.program);
        cmd.args(self.arguments(&patch, dry_run))
            .current_dir(tree.root());

        self.process
            .execute_command(&self.ctx, cmd)
            .await
            .map_err(|e| {
                debug!(program = %self.program, error = %e, "patch tool failed to start");
                PatchError::ToolUnavailable {
                    program: self.program.clone(),
                }
                .into()
            })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, Error> {
    std::path::absolute(path).map_err(|e| Error::io_with_path(&e, path))
}

#[async_trait]
impl PatchTool for GnuPatch {
    async fn ensure_available(&self) -> Result<(), Error> {
        let path = self
            .process
            .which(&self.program)
            .await
            .map_err(|_| PatchError::ToolUnavailable {
                program: self.program.clone(),
            })?;
        debug!(path = %path.display(), "found patch tool");
        Ok(())
    }

    async fn check(&self, tree: &SourceTree, patch: &Path) -> Result<bool, Error> {
        let output = self.run(tree, patch, true).await?;
        if !output.success() {
            debug!(
                patch = %patch.display(),
                output = %output.diagnostics(),
                "dry run rejected patch"
            );
        }
        Ok(output.success())
    }

    async fn apply(&self, tree: &mut SourceTree, patch: &Path) -> Result<(), Error> {
        let output = self.run(tree, patch, false).await?;
        if output.success() {
            Ok(())
        } else {
            Err(PatchError::CommitFailed {
                patch: patch.display().to_string(),
                message: output.diagnostics(),
            }
            .into())
        }
    }
}
