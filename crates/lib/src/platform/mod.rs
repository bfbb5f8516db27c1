pub mod arch;

use std::fmt;

use serde::Serialize;

pub use arch::Arch;

/// Apple platform a slice is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Device,
  Simulator,
}

impl Platform {
  pub const ALL: [Platform; 2] = [Platform::Device, Platform::Simulator];

  /// Short name used in toolset versions and `macosx-version` build properties.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Device => "iphone",
      Self::Simulator => "iphonesim",
    }
  }

  /// Name of the Xcode platform directory and SDK (`iPhoneOS.platform`, `iPhoneOS6.1.sdk`).
  pub fn sdk_name(&self) -> &'static str {
    match self {
      Self::Device => "iPhoneOS",
      Self::Simulator => "iPhoneSimulator",
    }
  }

  /// Value of the `architecture=` build property understood by b2.
  pub fn build_architecture(&self) -> &'static str {
    match self {
      Self::Device => "arm",
      Self::Simulator => "x86",
    }
  }

  /// Build directory b2 writes intermediate and staged output to, relative to the checkout.
  pub fn build_dir_name(&self) -> &'static str {
    match self {
      Self::Device => "iphone-build",
      Self::Simulator => "iphonesim-build",
    }
  }

  /// Toolset version registered in `user-config.jam` for this platform, e.g. `6.1~iphone`.
  pub fn toolset_version(&self, sdk_version: &str) -> String {
    format!("{}~{}", sdk_version, self.as_str())
  }

  /// Architectures compiled in a single pass for this platform.
  pub fn archs(&self) -> Vec<Arch> {
    Arch::ALL.into_iter().filter(|arch| arch.platform() == *self).collect()
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Target identifier combining architecture and platform (e.g., "armv7-iphone")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TargetTriple {
  pub arch: Arch,
  pub platform: Platform,
}

impl TargetTriple {
  pub fn new(arch: Arch) -> Self {
    Self {
      arch,
      platform: arch.platform(),
    }
  }

  /// Every supported target, in fusing order.
  pub fn all() -> Vec<Self> {
    Arch::ALL.into_iter().map(Self::new).collect()
  }

  /// Returns the target string (e.g., "armv7-iphone")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.platform)
  }
}

impl fmt::Display for TargetTriple {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
