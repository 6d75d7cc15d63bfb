//! Default values and environment variable names

pub const DEFAULT_SOURCES: &[&str] = &["nodejs-lts", "nodejs"];
pub const DEFAULT_REFERENCE: &str = "master";

pub const DEFAULT_LISTING_URL: &str =
    "https://github.com/termux/termux-packages/tree/{reference}/packages/{source}";
pub const DEFAULT_API_URL: &str =
    "https://api.github.com/repos/termux/termux-packages/contents/packages/{source}?ref={reference}";
pub const DEFAULT_RAW_URL: &str =
    "https://raw.githubusercontent.com/termux/termux-packages/{reference}/packages/{source}/{file}";

pub const DEFAULT_PATCH_SUFFIX: &str = ".patch";
pub const DEFAULT_PATCH_PROGRAM: &str = "patch";
pub const DEFAULT_STRIP_LEVEL: u32 = 1;
pub const DEFAULT_PATCH_DIR: &str = "patches/remote";
pub const DEFAULT_LOCAL_PATCH_DIR: &str = "patches/local";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub const ENV_REFERENCE: &str = "PORTPATCH_REFERENCE";
pub const ENV_SOURCES: &str = "PORTPATCH_SOURCES";
pub const ENV_PATCH_DIR: &str = "PORTPATCH_PATCH_DIR";
pub const ENV_LOCAL_PATCH_DIR: &str = "PORTPATCH_LOCAL_PATCH_DIR";
pub const ENV_GITHUB_TOKEN: &str = "PORTPATCH_GITHUB_TOKEN";
pub const ENV_COLOR: &str = "PORTPATCH_COLOR";
pub const ENV_TIMEOUT: &str = "PORTPATCH_TIMEOUT";
