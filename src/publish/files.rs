//! File operations on an add-on's target directory

use crate::addon::manifest::ConfigFile;
use crate::core::error::{MirrorError, MirrorResult, ResultExt};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// README of a published add-on, copied or rendered
pub const README_FILE: &str = "README.md";

/// Files and directories mirrored verbatim from the upstream add-on directory
pub const STATIC_FILES: [&str; 7] = [
  "logo.png",
  "icon.png",
  README_FILE,
  "DOCS.md",
  "apparmor.txt",
  "translations",
  "transfer.yaml",
];

/// What happened to one static file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticOutcome {
  Copied,
  Replaced,
  Removed,
  Skipped,
}

/// Create `<target>/` and `<target>/translations/`
pub fn ensure_dirs(target: &Path) -> MirrorResult<()> {
  let translations = target.join("translations");
  fs::create_dir_all(&translations).with_context(|| format!("Failed to create {}", translations.display()))
}

/// Mirror one static entry from `source_dir` into `target_dir`
///
/// - upstream file: copied over the local one
/// - upstream directory: the local directory is replaced wholesale
/// - upstream missing, local file present: the local file is removed
/// - otherwise nothing happens
pub fn sync_static(source_dir: &Path, target_dir: &Path, name: &str) -> MirrorResult<StaticOutcome> {
  let remote = source_dir.join(name);
  let local = target_dir.join(name);

  if remote.is_file() {
    fs::copy(&remote, &local).with_context(|| format!("Failed to copy {}", remote.display()))?;
    Ok(StaticOutcome::Copied)
  } else if remote.is_dir() {
    if local.is_dir() {
      fs::remove_dir_all(&local).with_context(|| format!("Failed to remove {}", local.display()))?;
    }
    copy_dir_recursive(&remote, &local)?;
    Ok(StaticOutcome::Replaced)
  } else if local.is_file() {
    fs::remove_file(&local).with_context(|| format!("Failed to remove {}", local.display()))?;
    Ok(StaticOutcome::Removed)
  } else {
    Ok(StaticOutcome::Skipped)
  }
}

/// Write the config under `file`, removing every other spelling first
pub fn write_config(target_dir: &Path, file: ConfigFile, text: &str) -> MirrorResult<()> {
  for candidate in ConfigFile::ALL {
    let path = target_dir.join(candidate.file_name());
    if path.is_file() {
      fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
  }
  let path = target_dir.join(file.file_name());
  fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Recursively copy a directory, excluding .git
fn copy_dir_recursive(source: &Path, target: &Path) -> MirrorResult<()> {
  if !source.exists() {
    return Err(MirrorError::message(format!(
      "Source path does not exist: {}",
      source.display()
    )));
  }

  fs::create_dir_all(target)?;

  for entry in fs::read_dir(source)? {
    let entry = entry?;
    let file_name = entry.file_name();
    if file_name == ".git" {
      continue;
    }

    let source_path = entry.path();
    let target_path = target.join(&file_name);
    if entry.file_type()?.is_dir() {
      copy_dir_recursive(&source_path, &target_path)?;
    } else {
      fs::copy(&source_path, &target_path)?;
    }
  }

  Ok(())
}
