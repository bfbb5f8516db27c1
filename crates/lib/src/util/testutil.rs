//! Test helpers.
//!
//! [`FakeToolchain`] stands in for `git`, `bootstrap.sh`, `b2`, `lipo` and `ar`,
//! reproducing their filesystem effects with a toy archive format: an archive is
//! a text file with one `<arch> <object>` line per member, and an extracted
//! object file contains its own line.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Config;
use crate::platform::{Arch, Platform};
use crate::tool::{Invocation, ToolError, ToolOutput, ToolRunner};
use crate::util::fs::copy_tree;

/// Content of `user-config.jam` in a fresh checkout.
pub const ORIGINAL_USER_CONFIG: &str = "# Boost.Build user configuration\n";

#[derive(Default)]
struct State {
  invocations: Vec<Invocation>,
  checked_out: Option<String>,
  libraries: Vec<String>,
}

/// Simulated build toolchain recording every invocation.
#[derive(Default)]
pub struct FakeToolchain {
  remote_tags: Vec<String>,
  local_tags: Vec<String>,
  failures: Vec<(String, String, i32)>,
  skipped: Vec<(String, Platform)>,
  state: Mutex<State>,
}

impl FakeToolchain {
  pub fn new() -> Self {
    Self::default()
  }

  /// Tags advertised by `git ls-remote`.
  pub fn with_remote_tags(mut self, tags: &[&str]) -> Self {
    self.remote_tags = tags.iter().map(|t| t.to_string()).collect();
    self
  }

  /// Tags listed by `git tag` in an existing checkout.
  pub fn with_local_tags(mut self, tags: &[&str]) -> Self {
    self.local_tags = tags.iter().map(|t| t.to_string()).collect();
    self
  }

  /// Make `program` exit with `code` when any argument contains `fragment`.
  pub fn fail_on(mut self, program: &str, fragment: &str, code: i32) -> Self {
    self.failures.push((program.to_string(), fragment.to_string(), code));
    self
  }

  /// Make b2 silently skip one library on one platform.
  pub fn without_archive(mut self, library: &str, platform: Platform) -> Self {
    self.skipped.push((library.to_string(), platform));
    self
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.state.lock().unwrap().invocations.clone()
  }

  /// First invocation of `program` with an argument containing `fragment`.
  pub fn find(&self, program: &str, fragment: &str) -> Option<Invocation> {
    self
      .invocations()
      .into_iter()
      .find(|inv| inv.program_name() == program && inv.args_lossy().iter().any(|a| a.contains(fragment)))
  }

  fn dispatch(&self, inv: &Invocation) -> Result<String, String> {
    let args = inv.args_lossy();
    let cwd = inv.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
    match inv.program_name().as_str() {
      "git" => self.git(&cwd, &args),
      "bootstrap.sh" => {
        let mut state = self.state.lock().unwrap();
        state.libraries = args
          .iter()
          .find_map(|a| a.strip_prefix("--with-libraries="))
          .map(|libs| libs.split(',').map(String::from).collect())
          .unwrap_or_default();
        Ok(String::new())
      }
      "b2" => self.b2(&cwd, &args),
      "lipo" => lipo(&cwd, &args),
      "ar" => ar(&cwd, &args),
      other => Err(format!("{}: command not found", other)),
    }
  }

  fn git(&self, cwd: &Path, args: &[String]) -> Result<String, String> {
    let mut state = self.state.lock().unwrap();
    match args.first().map(String::as_str) {
      Some("ls-remote") => Ok(
        self
          .remote_tags
          .iter()
          .map(|t| format!("0000000000000000000000000000000000000000\trefs/tags/{}", t))
          .collect::<Vec<_>>()
          .join("\n"),
      ),
      Some("clone") => {
        let branch = args.iter().position(|a| a == "--branch").map(|i| args[i + 1].clone());
        let dest = cwd.join(args.last().ok_or("missing destination")?);
        let jam_dir = dest.join("tools/build/src");
        fs::create_dir_all(dest.join(".git")).map_err(|e| e.to_string())?;
        fs::create_dir_all(&jam_dir).map_err(|e| e.to_string())?;
        fs::write(jam_dir.join("user-config.jam"), ORIGINAL_USER_CONFIG).map_err(|e| e.to_string())?;
        state.checked_out = branch;
        Ok(String::new())
      }
      Some("tag") => Ok(self.local_tags.join("\n")),
      Some("checkout") => {
        state.checked_out = args.last().cloned();
        Ok(String::new())
      }
      Some("describe") => state
        .checked_out
        .clone()
        .ok_or_else(|| "fatal: No names found, cannot describe anything.".to_string()),
      Some("status") => {
        let file = cwd.join(args.last().ok_or("missing path")?);
        match fs::read_to_string(&file) {
          Ok(content) if content != ORIGINAL_USER_CONFIG => Ok(format!(" M {}", args[args.len() - 1])),
          _ => Ok(String::new()),
        }
      }
      _ => Ok(String::new()),
    }
  }

  fn b2(&self, cwd: &Path, args: &[String]) -> Result<String, String> {
    if args.iter().any(|a| a == "headers") {
      let boost = cwd.join("boost");
      fs::create_dir_all(&boost).map_err(|e| e.to_string())?;
      fs::write(boost.join("config.hpp"), "// config\n").map_err(|e| e.to_string())?;
      fs::write(boost.join("version.hpp"), "// version\n").map_err(|e| e.to_string())?;
      return Ok(String::new());
    }
    if !args.iter().any(|a| a == "stage") {
      return Err("nothing to do".to_string());
    }

    let value = |key: &str| args.iter().find_map(|a| a.strip_prefix(key)).map(String::from);
    let architecture = value("architecture=").ok_or("missing architecture")?;
    let platform = Platform::ALL
      .into_iter()
      .find(|p| p.build_architecture() == architecture)
      .ok_or("unknown architecture")?;
    let sdk = value("macosx-version=")
      .and_then(|v| v.split_once('-').map(|(_, sdk)| sdk.to_string()))
      .ok_or("missing macosx-version")?;
    let stage_dir = cwd.join(value("--stagedir=").ok_or("missing --stagedir")?);

    let libraries = self.state.lock().unwrap().libraries.clone();
    for library in &libraries {
      if self.skipped.contains(&(library.clone(), platform)) {
        continue;
      }
      let content: String = platform
        .archs()
        .iter()
        .flat_map(|arch| ["a", "b"].map(|suffix| format!("{} {}_{}.o\n", arch, library, suffix)))
        .collect();

      let staged = stage_dir.join("lib").join(format!("libboost_{}.a", library));
      write_file(&staged, &content)?;

      let native = cwd
        .join("bin.v2/libs")
        .join(library)
        .join("build")
        .join(format!("darwin-{}", platform.toolset_version(&sdk)))
        .join("release")
        .join(format!("architecture-{}", architecture))
        .join("link-static")
        .join(format!("macosx-version-{}-{}", platform.as_str(), sdk))
        .join("target-os-iphone/threading-multi")
        .join(format!("libboost_{}-darwin.a", library));
      write_file(&native, &content)?;
    }

    if args.iter().any(|a| a == "install") {
      let prefix = PathBuf::from(value("--prefix=").ok_or("missing --prefix")?);
      copy_tree(&cwd.join("boost"), &prefix.join("include/boost")).map_err(|e| e.to_string())?;
    }
    Ok(String::new())
  }
}

impl ToolRunner for FakeToolchain {
  async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
    self.state.lock().unwrap().invocations.push(invocation.clone());

    let program = invocation.program_name();
    let args = invocation.args_lossy();
    for (name, fragment, code) in &self.failures {
      if *name == program && args.iter().any(|a| a.contains(fragment.as_str())) {
        return Err(ToolError::Failed {
          program,
          code: Some(*code),
          stderr: "simulated failure".to_string(),
        });
      }
    }

    match self.dispatch(invocation) {
      Ok(stdout) => Ok(ToolOutput { stdout }),
      Err(stderr) => Err(ToolError::Failed {
        program,
        code: Some(if stderr.starts_with("fatal") { 128 } else { 1 }),
        stderr,
      }),
    }
  }
}

fn write_file(path: &Path, content: &str) -> Result<(), String> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|e| e.to_string())?;
  }
  fs::write(path, content).map_err(|e| e.to_string())
}

fn lipo(cwd: &Path, args: &[String]) -> Result<String, String> {
  let mut inputs = Vec::new();
  let mut thin = None;
  let mut output = None;
  let mut iter = args.iter();
  while let Some(arg) = iter.next() {
    match arg.as_str() {
      "-create" => {}
      "-thin" => thin = iter.next().cloned(),
      "-output" => output = iter.next().map(|o| cwd.join(o)),
      input => inputs.push(cwd.join(input)),
    }
  }
  let output = output.ok_or("lipo: no output file specified")?;

  let mut members: Vec<(String, String)> = Vec::new();
  for input in &inputs {
    let content = fs::read_to_string(input).map_err(|_| format!("lipo: can't open input file: {}", input.display()))?;
    let entries = parse_archive(&content);
    let incoming: BTreeSet<&String> = entries.iter().map(|(arch, _)| arch).collect();
    if members.iter().any(|(arch, _)| incoming.contains(arch)) {
      return Err(format!("lipo: {} has duplicate architectures", input.display()));
    }
    members.extend(entries);
  }

  if let Some(arch) = thin {
    members.retain(|(a, _)| *a == arch);
    if members.is_empty() {
      return Err(format!("lipo: input file does not contain architecture {}", arch));
    }
  }

  write_file(&output, &render_archive(&members))?;
  Ok(String::new())
}

fn ar(cwd: &Path, args: &[String]) -> Result<String, String> {
  match args.first().map(String::as_str) {
    Some("-x") => {
      let archive = cwd.join(args.get(1).ok_or("ar: no archive specified")?);
      let content = fs::read_to_string(&archive).map_err(|_| format!("ar: {}: No such file", archive.display()))?;
      for (arch, obj) in parse_archive(&content) {
        fs::write(cwd.join(&obj), format!("{} {}\n", arch, obj)).map_err(|e| e.to_string())?;
      }
      Ok(String::new())
    }
    Some("crus") => {
      let out = cwd.join(args.get(1).ok_or("ar: no archive specified")?);
      let mut content = fs::read_to_string(&out).unwrap_or_default();
      for obj in &args[2..] {
        content.push_str(&fs::read_to_string(cwd.join(obj)).map_err(|_| format!("ar: {}: No such file", obj))?);
      }
      write_file(&out, &content)?;
      Ok(String::new())
    }
    _ => Err("ar: unsupported operation".to_string()),
  }
}

fn parse_archive(content: &str) -> Vec<(String, String)> {
  content
    .lines()
    .filter_map(|line| line.split_once(' '))
    .map(|(arch, obj)| (arch.to_string(), obj.to_string()))
    .collect()
}

fn render_archive(members: &[(String, String)]) -> String {
  members.iter().map(|(arch, obj)| format!("{} {}\n", arch, obj)).collect()
}

/// Members of a toy archive as `(arch, object)` pairs, in file order.
pub fn read_archive(path: &Path) -> Vec<(String, String)> {
  parse_archive(&fs::read_to_string(path).unwrap())
}

/// Architectures present in a toy archive.
pub fn archive_archs(path: &Path) -> BTreeSet<String> {
  read_archive(path).into_iter().map(|(arch, _)| arch).collect()
}

pub fn all_archs() -> BTreeSet<String> {
  Arch::ALL.iter().map(|arch| arch.as_str().to_string()).collect()
}

/// Default configuration rooted at `base` with a fake Xcode whose simulator
/// SDK carries the headers the device SDK lacks.
pub fn test_config(base: &Path, libs: &[&str]) -> Config {
  let mut config = Config::defaults(base);
  config.libraries = libs.iter().map(|l| l.parse().unwrap()).collect();
  config.sdk_version = "6.1".to_string();
  config.xcode_root = base.join("Xcode");

  let include = config.paths().sdk_include_dir(Platform::Simulator);
  fs::create_dir_all(&include).unwrap();
  fs::write(include.join("crt_externs.h"), "// crt_externs\n").unwrap();
  fs::write(include.join("bzlib.h"), "// bzlib\n").unwrap();
  config
}

/// Create an empty checkout directory for stages that run after synchronization.
pub fn prepare_checkout(config: &Config) {
  fs::create_dir_all(config.checkout_dir()).unwrap();
}
