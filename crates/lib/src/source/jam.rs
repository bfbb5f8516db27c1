//! iOS toolset declarations for b2's `user-config.jam`.

use crate::config::Config;
use crate::platform::Platform;

/// Compiler flags shared by both toolsets.
const VISIBILITY_FLAGS: &str = "-fvisibility=hidden -fvisibility-inlines-hidden";

/// Render the `using darwin : <sdk>~<platform>` blocks for device and simulator.
///
/// Each block names the platform's compiler with one `-arch` per slice, the
/// configured extra flags, and the platform root b2 passes to the compiler as
/// `-isysroot`.
pub fn toolset_directives(config: &Config) -> String {
  let paths = config.paths();
  let mut out = String::new();

  for platform in Platform::ALL {
    let archs: Vec<String> = platform.archs().iter().map(|a| format!("-arch {}", a)).collect();
    let mut compiler_line = format!(
      "{} {} {}",
      paths.tool(platform, &config.compiler).display(),
      archs.join(" "),
      VISIBILITY_FLAGS
    );
    if !config.extra_cppflags.is_empty() {
      compiler_line.push(' ');
      compiler_line.push_str(&config.extra_cppflags);
    }

    out.push_str(&format!("using darwin : {}\n", platform.toolset_version(&config.sdk_version)));
    out.push_str(&format!("   : {}\n", compiler_line));
    out.push_str(&format!(
      "   : <striper> <root>{}\n",
      paths.platform_developer_dir(platform).display()
    ));
    out.push_str(&format!(
      "   : <architecture>{} <target-os>iphone\n",
      platform.build_architecture()
    ));
    out.push_str("   ;\n");
  }

  out
}
