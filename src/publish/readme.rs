//! README.md rendering from an add-on's `.README.j2` template
//!
//! Add-ons that ship a template get their README regenerated on every
//! republish, after the static copy of `README.md`.

use crate::addon::channel::Channel;
use crate::addon::detector::AddonState;
use crate::addon::manifest::AddonManifest;
use crate::addon::version::is_semver;
use crate::core::config::AddonConfig;
use crate::core::error::{ComposeError, MirrorResult, ResultExt};
use crate::host::UpstreamRepo;
use minijinja::Environment;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Template file name inside the upstream add-on directory
pub const README_TEMPLATE: &str = ".README.j2";

/// Placeholder in the configured image replaced by each architecture
const ARCH_PLACEHOLDER: &str = "{arch}";

/// Variables available to a README template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateData {
  pub name: String,
  pub channel: String,
  pub description: String,
  pub url: Option<String>,
  /// Web URL of the upstream repository
  pub repo: String,
  /// `owner/name` of the upstream repository
  pub repo_slug: String,
  pub archs: Vec<String>,
  pub slug: String,
  /// Add-on directory inside the distribution repository
  pub target: String,
  pub image: String,
  /// Image per architecture, `{arch}` substituted
  pub images: BTreeMap<String, String>,
  /// Published version as shown to readers, see [`display_version`]
  pub version: String,
  pub commit: String,
  pub date: String,
}

impl TemplateData {
  /// Collect template variables for the version being published
  ///
  /// `state` must already be advanced: its latest ref is what gets published.
  pub fn new(
    addon: &AddonConfig,
    manifest: &AddonManifest,
    state: &AddonState,
    channel: Channel,
    upstream: &dyn UpstreamRepo,
    date: String,
  ) -> Self {
    let latest = state.latest();
    let images = manifest
      .arch
      .iter()
      .map(|arch| (arch.clone(), addon.image.replace(ARCH_PLACEHOLDER, arch)))
      .collect();

    Self {
      name: manifest.name.clone(),
      channel: channel.to_string(),
      description: manifest.description.clone(),
      url: manifest.url.clone(),
      repo: upstream.html_url(),
      repo_slug: upstream.full_name().to_string(),
      archs: manifest.arch.clone(),
      slug: manifest.slug.clone(),
      target: addon.target.display().to_string(),
      image: addon.image.clone(),
      images,
      version: display_version(&latest.version_label),
      commit: latest.commit_id.clone(),
      date,
    }
  }
}

/// Version as printed in a README
///
/// Semantic versions and dotted versions get a `v` prefix; anything else (a
/// short commit hash) is shown as is.
pub fn display_version(version: &str) -> String {
  if is_semver(version) || version.contains('.') {
    format!("v{}", version)
  } else {
    version.to_string()
  }
}

/// Renders a README template with [`TemplateData`]
pub trait ReadmeRenderer: Send + Sync {
  fn render(&self, template: &str, data: &TemplateData) -> Result<String, ComposeError>;
}

/// Jinja renderer with block trimming and `break`/`continue` in loops
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaRenderer;

impl ReadmeRenderer for JinjaRenderer {
  fn render(&self, template: &str, data: &TemplateData) -> Result<String, ComposeError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.render_str(template, data).map_err(|e| ComposeError::Template {
      template: README_TEMPLATE.to_string(),
      reason: e.to_string(),
    })
  }
}

/// Render `<source_dir>/.README.j2`, or `None` when the add-on has no template
pub fn prepare_readme(
  source_dir: &Path,
  renderer: &dyn ReadmeRenderer,
  data: &TemplateData,
) -> MirrorResult<Option<String>> {
  let path = source_dir.join(README_TEMPLATE);
  if !path.is_file() {
    return Ok(None);
  }
  let template = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(Some(renderer.render(&template, data)?))
}
