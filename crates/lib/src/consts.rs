//! Fixed names shared across pipeline stages.

/// Directory under the source dir that holds the git checkout.
pub const CHECKOUT_DIR: &str = "boost";

/// Tag namespace used by upstream release tags (`boost-1.86.0`).
pub const RELEASE_TAG_PREFIX: &str = "boost-";

/// Build configuration file that receives the iOS toolset blocks, relative to the checkout.
pub const USER_CONFIG_JAM: &str = "tools/build/src/user-config.jam";

/// Headers shipped in the simulator SDK but missing from the device SDK.
pub const MISSING_SDK_HEADERS: &[&str] = &["crt_externs.h", "bzlib.h"];

/// Per-library archives are named `libboost_<name>.a`.
pub const LIB_PREFIX: &str = "libboost_";

/// Consolidated per-architecture archive.
pub const UBER_ARCHIVE: &str = "libboost.a";

pub const FRAMEWORK_NAME: &str = "boost";
pub const FRAMEWORK_VERSION: &str = "A";
pub const BUNDLE_IDENTIFIER: &str = "org.boost";
pub const BUNDLE_REGION: &str = "English";
