#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform abstraction for external programs.
//!
//! Everything portpatch runs as a subprocess goes through
//! [`ProcessOperations`], so callers can swap the host implementation for a
//! scripted one in tests.

pub mod context;
pub mod process;

pub use context::PlatformContext;
pub use process::{CommandOutput, HostProcessOperations, PlatformCommand, ProcessOperations};
