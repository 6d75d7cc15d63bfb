//! Discovery strategy seam

use async_trait::async_trait;
use portpatch_errors::Error;
use portpatch_types::{PatchCandidate, PatchSource, StrategyKind};

/// Lists the patch files a source offers
///
/// An `Err` means the strategy could not reach or read the source. An empty
/// list means the source was read and holds no patches.
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn list_patches(&self, source: &PatchSource) -> Result<Vec<PatchCandidate>, Error>;
}
