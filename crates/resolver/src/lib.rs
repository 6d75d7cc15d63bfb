#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Patch discovery for portpatch
//!
//! Sources are listed with every registered [`DiscoveryStrategy`], the
//! results are merged and deduplicated per source, and each surviving
//! candidate is downloaded into the patch directory. Sources that cannot be
//! listed and files that cannot be downloaded are recorded and skipped.

mod contents;
mod listing;
mod resolver;
mod strategy;

pub use contents::ContentsApi;
pub use listing::DirectoryListing;
pub use resolver::PatchResolver;
pub use strategy::DiscoveryStrategy;
