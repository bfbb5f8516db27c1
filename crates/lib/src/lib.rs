//! boostframe-lib: builds Boost for iOS and packages it as `boost.framework`.
//!
//! Every compile, archive and fat-binary step is delegated to external tools
//! (`git`, `bootstrap.sh`/`b2`, `lipo`, `ar`) through [`tool::ToolRunner`];
//! this crate sequences them and owns the path conventions between stages:
//!
//! - [`source`]: synchronize the checkout and register the iOS toolsets
//! - [`headers`]: patch SDK headers the device SDK lacks
//! - [`driver`]: bootstrap b2 and build the device and simulator slices
//! - [`merge`]: fuse per-library archives across platforms
//! - [`uber`]: relink every library into one archive per architecture
//! - [`framework`]: assemble and verify the bundle
//! - [`pipeline`]: run everything in order

pub mod config;
pub mod consts;
pub mod driver;
pub mod framework;
pub mod headers;
pub mod merge;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod source;
pub mod tool;
pub mod types;
pub mod uber;
pub mod util;
