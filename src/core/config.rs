use crate::addon::channel::Channel;
use crate::core::error::{ConfigError, MirrorError, MirrorResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Configuration for addon-mirror
/// Searched in order: mirror.toml, .mirror.toml, .config/mirror.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
  /// Default release channel when none is given on the command line
  #[serde(default)]
  pub channel: Option<Channel>,
  #[serde(default)]
  pub github: GitHubConfig,
  #[serde(default)]
  pub changelog: ChangelogConfig,
  #[serde(default)]
  pub addons: Vec<AddonConfig>,
}

/// Hosting API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
  /// API base URL (default: https://api.github.com)
  #[serde(default = "default_api_url")]
  pub api_url: String,
}

fn default_api_url() -> String {
  "https://api.github.com".to_string()
}

impl Default for GitHubConfig {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
    }
  }
}

/// Which composer renders release entries into CHANGELOG.md
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ComposerKind {
  /// In-process markdown composer
  #[default]
  Builtin,
  /// External `changelog-updater` CLI
  ChangelogUpdater,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChangelogConfig {
  #[serde(default)]
  pub composer: ComposerKind,
}

/// One mirrored add-on
///
/// # Example
///
/// ```toml
/// [[addons]]
/// name = "example"
/// target = "example"
/// upstream = "owner/addon-example"
/// addon_dir = "example"
/// image = "ghcr.io/owner/{arch}-addon-example"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonConfig {
  /// Selector used on the command line
  pub name: String,

  /// Directory of the add-on inside the distribution repository
  pub target: PathBuf,

  /// Upstream repository as `owner/name`
  pub upstream: String,

  /// Directory of the add-on inside the upstream repository
  pub addon_dir: String,

  /// Container image written into the published config
  pub image: String,
}

impl AddonConfig {
  /// Validate a single add-on entry
  pub fn validate(&self) -> MirrorResult<()> {
    if self.name.trim().is_empty() {
      return Err(MirrorError::Config(ConfigError::InvalidField {
        field: "addons.name".to_string(),
        reason: "must not be empty".to_string(),
      }));
    }

    if self.target.as_os_str().is_empty() {
      return Err(MirrorError::Config(ConfigError::InvalidField {
        field: format!("target for add-on '{}'", self.name),
        reason: "must not be empty".to_string(),
      }));
    }

    let mut parts = self.upstream.split('/');
    let valid_upstream = matches!(
      (parts.next(), parts.next(), parts.next()),
      (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
    );
    if !valid_upstream {
      return Err(MirrorError::with_help(
        format!("Invalid upstream '{}' for add-on '{}'", self.upstream, self.name),
        "Use the `owner/name` form, e.g. upstream = \"hassio-addons/addon-example\"",
      ));
    }

    Ok(())
  }
}

impl MirrorConfig {
  /// Find config file in search order: mirror.toml, .mirror.toml, .config/mirror.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("mirror.toml"),
      path.join(".mirror.toml"),
      path.join(".config").join("mirror.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config (searches multiple locations)
  pub fn load(path: &Path) -> MirrorResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      MirrorError::Config(ConfigError::NotFound {
        repo_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    Ok(config)
  }

  /// Parse and validate config text
  pub fn parse(content: &str) -> MirrorResult<Self> {
    let config: MirrorConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Validate every add-on and reject duplicate names and targets
  ///
  /// Add-ons are published in parallel, so two entries must never share a
  /// target directory.
  pub fn validate(&self) -> MirrorResult<()> {
    let mut names = HashSet::new();
    let mut targets: HashMap<PathBuf, &str> = HashMap::new();
    for addon in &self.addons {
      addon.validate()?;
      if !names.insert(addon.name.as_str()) {
        return Err(MirrorError::Config(ConfigError::InvalidField {
          field: "addons.name".to_string(),
          reason: format!("duplicate add-on '{}'", addon.name),
        }));
      }
      if let Some(other) = targets.insert(normalize_target(&addon.target), &addon.name) {
        return Err(MirrorError::Config(ConfigError::InvalidField {
          field: format!("target for add-on '{}'", addon.name),
          reason: format!("'{}' is already the target of add-on '{}'", addon.target.display(), other),
        }));
      }
    }
    Ok(())
  }

  /// Find an add-on by name
  pub fn find_addon(&self, name: &str) -> MirrorResult<&AddonConfig> {
    self.addons.iter().find(|a| a.name == name).ok_or_else(|| {
      MirrorError::Config(ConfigError::AddonNotFound {
        name: name.to_string(),
      })
    })
  }
}

/// `./example/` and `example` name the same directory
fn normalize_target(target: &Path) -> PathBuf {
  target.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}
