//! Add-on configuration files (`config.json`, `config.yaml`, `config.yml`)
//!
//! The three spellings are an ordered list of candidate descriptors. Lookups
//! try them in priority order and stop at the first that exists.

use crate::core::error::{MirrorResult, ResolutionError, ResultExt};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// Architectures assumed when a manifest does not list any
const DEFAULT_ARCHS: [&str; 5] = ["aarch64", "amd64", "armhf", "armv7", "i386"];

/// One spelling of the add-on config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
  Json,
  Yaml,
  Yml,
}

impl ConfigFile {
  /// Canonical priority order
  pub const ALL: [ConfigFile; 3] = [ConfigFile::Json, ConfigFile::Yaml, ConfigFile::Yml];

  pub fn file_name(self) -> &'static str {
    match self {
      ConfigFile::Json => "config.json",
      ConfigFile::Yaml => "config.yaml",
      ConfigFile::Yml => "config.yml",
    }
  }

  /// Candidates in lookup order, with a previously known spelling first
  pub fn candidates(preferred: Option<ConfigFile>) -> Vec<ConfigFile> {
    let mut order = Vec::with_capacity(Self::ALL.len());
    order.extend(preferred);
    order.extend(Self::ALL.into_iter().filter(|c| Some(*c) != preferred));
    order
  }

  /// First spelling present in a directory
  pub fn find_in(dir: &Path) -> Option<ConfigFile> {
    Self::ALL.into_iter().find(|c| dir.join(c.file_name()).is_file())
  }
}

/// Parsed config document, kept whole so republishing preserves every key
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestDocument {
  Json(serde_json::Value),
  Yaml(serde_yaml::Value),
}

impl ManifestDocument {
  pub fn parse(file: ConfigFile, content: &[u8]) -> Result<Self, String> {
    match file {
      ConfigFile::Json => serde_json::from_slice(content)
        .map(ManifestDocument::Json)
        .map_err(|e| e.to_string()),
      ConfigFile::Yaml | ConfigFile::Yml => serde_yaml::from_slice(content)
        .map(ManifestDocument::Yaml)
        .map_err(|e| e.to_string()),
    }
  }

  /// Typed view of the fields the mirror reads
  pub fn manifest(&self) -> Result<AddonManifest, String> {
    match self {
      ManifestDocument::Json(value) => serde_json::from_value(value.clone()).map_err(|e| e.to_string()),
      ManifestDocument::Yaml(value) => serde_yaml::from_value(value.clone()).map_err(|e| e.to_string()),
    }
  }

  /// Set a top-level string field, keeping its position when it already exists
  pub fn set_str(&mut self, key: &str, value: &str) -> MirrorResult<()> {
    match self {
      ManifestDocument::Json(serde_json::Value::Object(map)) => {
        map.insert(key.to_string(), serde_json::Value::String(value.to_string()));
      }
      ManifestDocument::Yaml(serde_yaml::Value::Mapping(map)) => {
        map.insert(
          serde_yaml::Value::String(key.to_string()),
          serde_yaml::Value::String(value.to_string()),
        );
      }
      _ => return Err("Add-on config is not a key/value document".into()),
    }
    Ok(())
  }

  /// Serialize back in the document's own format
  pub fn render(&self) -> MirrorResult<String> {
    match self {
      ManifestDocument::Json(value) => {
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');
        Ok(text)
      }
      ManifestDocument::Yaml(value) => Ok(serde_yaml::to_string(value)?),
    }
  }
}

/// Fields of an add-on config the mirror reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddonManifest {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub slug: String,
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default = "default_archs")]
  pub arch: Vec<String>,
  #[serde(default, deserialize_with = "version_text")]
  pub version: Option<String>,
}

fn default_archs() -> Vec<String> {
  DEFAULT_ARCHS.iter().map(|a| a.to_string()).collect()
}

/// Versions may be written as bare numbers (`version: 2`); read their text
fn version_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
  }

  Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
    Scalar::Text(text) => text,
    Scalar::Int(n) => n.to_string(),
    Scalar::Float(n) => n.to_string(),
  }))
}

/// A config file located and parsed
#[derive(Debug, Clone)]
pub struct LoadedManifest {
  pub file: ConfigFile,
  pub document: ManifestDocument,
  pub manifest: AddonManifest,
}

impl LoadedManifest {
  /// Parse raw content; `origin` names the file in error messages
  pub fn parse(file: ConfigFile, content: &[u8], origin: &str) -> MirrorResult<Self> {
    let invalid = |reason: String| ResolutionError::InvalidManifest {
      path: origin.to_string(),
      reason,
    };
    let document = ManifestDocument::parse(file, content).map_err(invalid)?;
    let manifest = document.manifest().map_err(invalid)?;
    Ok(Self {
      file,
      document,
      manifest,
    })
  }

  /// Read the first existing config spelling in a directory
  ///
  /// Returns `None` when the directory has no config at all.
  pub fn load_dir(dir: &Path) -> MirrorResult<Option<Self>> {
    let Some(file) = ConfigFile::find_in(dir) else {
      return Ok(None);
    };
    let path = dir.join(file.file_name());
    let content = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::parse(file, &content, &path.display().to_string()).map(Some)
  }
}
