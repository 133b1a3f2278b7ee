//! Republishing an add-on into the distribution repository
//!
//! Everything is prepared in memory first ([`prepare_config`], the rendered
//! README and the changelog synthesis); [`publish`] is the only step that
//! touches the target.

pub mod files;
pub mod readme;

use crate::addon::manifest::{ConfigFile, LoadedManifest};
use crate::changelog::{CHANGELOG_FILE, Synthesis};
use crate::core::error::{MirrorResult, ResolutionError, ResultExt};
use files::{README_FILE, STATIC_FILES, StaticOutcome};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Rewritten add-on config ready to be written
#[derive(Debug, Clone)]
pub struct PreparedConfig {
  pub file: ConfigFile,
  pub text: String,
}

/// What a publish run changed
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
  pub config_file: &'static str,
  pub static_files: Vec<(String, StaticOutcome)>,
  /// README.md was rendered from the add-on's template
  pub readme_rendered: bool,
  pub changelog_written: bool,
}

/// Read the upstream config from a checkout and stamp version and image on it
pub fn prepare_config(source_dir: &Path, version: &str, image: &str) -> MirrorResult<PreparedConfig> {
  let Some(mut loaded) = LoadedManifest::load_dir(source_dir)? else {
    return Err(
      ResolutionError::ConfigNotFound {
        commit: "checked-out clone".to_string(),
        tried: ConfigFile::ALL
          .iter()
          .map(|file| source_dir.join(file.file_name()).display().to_string())
          .collect(),
      }
      .into(),
    );
  };

  loaded.document.set_str("version", version)?;
  loaded.document.set_str("image", image)?;

  Ok(PreparedConfig {
    file: loaded.file,
    text: loaded.document.render()?,
  })
}

/// Read the target's CHANGELOG.md, if any
pub fn read_changelog(target_dir: &Path) -> MirrorResult<Option<String>> {
  let path = target_dir.join(CHANGELOG_FILE);
  if !path.is_file() {
    return Ok(None);
  }
  fs::read_to_string(&path)
    .map(Some)
    .with_context(|| format!("Failed to read {}", path.display()))
}

/// Write the prepared update into `target_dir`
///
/// A rendered `readme` replaces the README.md copied with the static files.
pub fn publish(
  source_dir: &Path,
  target_dir: &Path,
  config: &PreparedConfig,
  readme: Option<&str>,
  changelog: &Synthesis,
) -> MirrorResult<PublishReport> {
  files::ensure_dirs(target_dir)?;
  files::write_config(target_dir, config.file, &config.text)?;

  let mut static_files = Vec::with_capacity(STATIC_FILES.len());
  for name in STATIC_FILES {
    let outcome = files::sync_static(source_dir, target_dir, name)?;
    debug!(file = name, ?outcome, "synced static file");
    static_files.push((name.to_string(), outcome));
  }

  if let Some(text) = readme {
    let path = target_dir.join(README_FILE);
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
  }

  let changelog_written = match changelog {
    Synthesis::Write(document) => {
      let path = target_dir.join(CHANGELOG_FILE);
      fs::write(&path, &document.text).with_context(|| format!("Failed to write {}", path.display()))?;
      true
    }
    Synthesis::Skip => false,
  };

  Ok(PublishReport {
    config_file: config.file.file_name(),
    static_files,
    readme_rendered: readme.is_some(),
    changelog_written,
  })
}
