#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Patch application for portpatch
//!
//! Every patch is dry-run against the current tree first and committed only
//! when the dry run succeeds. A patch that does not apply is recorded as
//! skipped and leaves the tree untouched.

mod applier;
mod local;
mod tool;
mod tree;

pub use applier::PatchApplier;
pub use local::{local_patch_set, LOCAL_SOURCE};
pub use tool::{GnuPatch, PatchTool};
pub use tree::SourceTree;
