use crate::consts::{BUNDLE_IDENTIFIER, BUNDLE_REGION, FRAMEWORK_NAME};

/// Render the bundle's `Info.plist` for the given source version.
pub fn info_plist(version: &str) -> String {
  format!(
    r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleDevelopmentRegion</key>
    <string>{region}</string>
    <key>CFBundleExecutable</key>
    <string>{name}</string>
    <key>CFBundleIdentifier</key>
    <string>{identifier}</string>
    <key>CFBundleInfoDictionaryVersion</key>
    <string>6.0</string>
    <key>CFBundlePackageType</key>
    <string>FMWK</string>
    <key>CFBundleSignature</key>
    <string>????</string>
    <key>CFBundleVersion</key>
    <string>{version}</string>
</dict>
</plist>
"#,
    region = BUNDLE_REGION,
    name = FRAMEWORK_NAME,
    identifier = BUNDLE_IDENTIFIER,
    version = escape(version),
  )
}

fn escape(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}
