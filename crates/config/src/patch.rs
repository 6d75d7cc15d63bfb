//! Patch tool and patch directory configuration

use crate::constants::{
    DEFAULT_LOCAL_PATCH_DIR, DEFAULT_PATCH_DIR, DEFAULT_PATCH_PROGRAM, DEFAULT_STRIP_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Program invoked for dry runs and commits
    #[serde(default = "default_program")]
    pub program: String,
    /// Leading path components stripped from diff headers (`-p`)
    #[serde(default = "default_strip")]
    pub strip: u32,
    /// Downloaded remote patches land here
    #[serde(default = "default_patch_dir")]
    pub patch_dir: PathBuf,
    /// Caller-supplied patches applied after the remote set
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
    /// Remove previously downloaded patches before resolving
    #[serde(default = "default_clean")]
    pub clean_patch_dir: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            strip: default_strip(),
            patch_dir: default_patch_dir(),
            local_dir: default_local_dir(),
            clean_patch_dir: default_clean(),
        }
    }
}

fn default_program() -> String {
    DEFAULT_PATCH_PROGRAM.to_string()
}

fn default_strip() -> u32 {
    DEFAULT_STRIP_LEVEL
}

fn default_patch_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PATCH_DIR)
}

fn default_local_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_PATCH_DIR)
}

fn default_clean() -> bool {
    true
}
