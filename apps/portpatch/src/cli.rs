//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use portpatch_types::ColorChoice;
use std::path::PathBuf;

/// portpatch - resolve and apply source patches
#[derive(Parser)]
#[command(name = "portpatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve patches from remote sources and apply them to a source tree")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write debug logs as JSON to the configured log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Where remote patches come from
#[derive(Args)]
pub struct RemoteArgs {
    /// Branch, tag or commit to read patches from
    #[arg(long, value_name = "REF")]
    pub reference: Option<String>,

    /// Patch source, highest priority first (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    pub sources: Vec<String>,

    /// Directory downloaded patches are stored in
    #[arg(long, value_name = "DIR")]
    pub patch_dir: Option<PathBuf>,

    /// Keep files already in the patch directory
    #[arg(long)]
    pub keep_patch_dir: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve remote patches, apply them, then apply local patches
    Run {
        /// Source tree to patch
        #[arg(long, value_name = "DIR")]
        tree: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Directory of local patches applied after the remote ones
        #[arg(long, value_name = "DIR")]
        local_patches: Option<PathBuf>,
    },

    /// Discover and download remote patches without applying them
    Resolve {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Apply only the local patch directory
    Apply {
        /// Source tree to patch
        #[arg(long, value_name = "DIR")]
        tree: PathBuf,

        /// Directory of local patches
        #[arg(long, value_name = "DIR")]
        local_patches: Option<PathBuf>,
    },
}
