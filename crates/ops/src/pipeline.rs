//! Resolve and apply operations

use std::path::Path;
use std::time::Instant;

use portpatch_apply::{local_patch_set, SourceTree};
use portpatch_errors::{Error, OpsError};
use portpatch_events::EventEmitter;
use portpatch_types::{ApplyPass, ApplyReport, ResolutionReport, RunReport};
use tracing::info;

use crate::OpsCtx;

/// Full pipeline: resolve remote patches, apply them, then apply local ones
///
/// Patches that fail to download or do not apply are counted and skipped;
/// the run still completes.
///
/// # Errors
///
/// Returns an error if the tree does not exist, the patch tool is missing,
/// the patch directory cannot be prepared, or a committed patch fails after
/// its dry run passed.
pub async fn run(ctx: &OpsCtx, tree: &Path) -> Result<RunReport, Error> {
    let start = Instant::now();
    ctx.tx.emit_operation_started("run");

    let result: Result<RunReport, Error> = async {
        let mut tree = SourceTree::open(tree).await?;
        ctx.applier.tool().ensure_available().await?;

        let resolution = resolve_only(ctx).await?;
        let remote = ctx
            .applier
            .apply(&mut tree, &resolution.patch_set, ApplyPass::Remote)
            .await?;
        let local = apply_local_to(ctx, &mut tree).await?;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(RunReport::new(&resolution, remote, local, duration_ms))
    }
    .await;

    finish(ctx, "run", &result);
    if let Ok(report) = &result {
        info!(
            applied = report.applied,
            skipped = report.skipped,
            "patch run finished"
        );
    }
    result
}

/// Resolve and download remote patches without touching a tree
///
/// # Errors
///
/// Returns an error if no source is configured or the patch directory cannot
/// be prepared.
pub async fn resolve_only(ctx: &OpsCtx) -> Result<ResolutionReport, Error> {
    let sources = &ctx.config.sources;
    if sources.names.is_empty() {
        return Err(OpsError::NoSources.into());
    }
    ctx.resolver.resolve(&sources.names, &sources.reference).await
}

/// Apply only the local patch directory to `tree`
///
/// # Errors
///
/// Returns an error if the tree does not exist, the patch tool is missing,
/// or a committed patch fails after its dry run passed.
pub async fn apply_local(ctx: &OpsCtx, tree: &Path) -> Result<ApplyReport, Error> {
    ctx.tx.emit_operation_started("apply");

    let result: Result<ApplyReport, Error> = async {
        let mut tree = SourceTree::open(tree).await?;
        ctx.applier.tool().ensure_available().await?;
        apply_local_to(ctx, &mut tree).await
    }
    .await;

    finish(ctx, "apply", &result);
    result
}

async fn apply_local_to(ctx: &OpsCtx, tree: &mut SourceTree) -> Result<ApplyReport, Error> {
    let patches =
        local_patch_set(&ctx.config.patch.local_dir, &ctx.config.sources.suffixes).await?;
    ctx.applier.apply(tree, &patches, ApplyPass::Local).await
}

fn finish<T>(ctx: &OpsCtx, operation: &str, result: &Result<T, Error>) {
    match result {
        Ok(_) => ctx.tx.emit_operation_completed(operation, true),
        Err(e) => ctx.tx.emit_operation_failed(operation, e.to_string()),
    }
}
