use std::fmt;

use serde::Serialize;

use super::Platform;

/// Instruction-set architectures the framework carries object code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
  Armv6,
  Armv7,
  Armv7s,
  I386,
}

impl Arch {
  /// Every architecture, in the order slices are fused into universal archives.
  pub const ALL: [Arch; 4] = [Arch::Armv6, Arch::Armv7, Arch::Armv7s, Arch::I386];

  /// Returns the name `lipo` and the compiler use for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Armv6 => "armv6",
      Self::Armv7 => "armv7",
      Self::Armv7s => "armv7s",
      Self::I386 => "i386",
    }
  }

  /// The platform whose SDK builds this architecture.
  pub fn platform(&self) -> Platform {
    match self {
      Self::Armv6 | Self::Armv7 | Self::Armv7s => Platform::Device,
      Self::I386 => Platform::Simulator,
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
