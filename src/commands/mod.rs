//! CLI commands for addon-mirror
//!
//! - **status**: resolve every configured add-on and report current vs latest
//! - **update**: plan or apply republishing of selected add-ons
//!
//! All commands accept `&MirrorContext` so mirror.toml is loaded once.

pub mod status;
pub mod update;

pub use status::run_status;
pub use update::run_update;

use crate::addon::manifest::LoadedManifest;
use crate::addon::resolver::{ResolvedAddon, resolve};
use crate::core::config::AddonConfig;
use crate::core::context::MirrorContext;
use crate::core::error::{MirrorError, MirrorResult};
use crate::host::{GitHubRepo, UpstreamRepo};

/// Pick the add-ons a command works on
pub(crate) fn select_addons<'a>(
  ctx: &'a MirrorContext,
  name: Option<&str>,
  all: bool,
) -> MirrorResult<Vec<&'a AddonConfig>> {
  if all {
    return Ok(ctx.config.addons.iter().collect());
  }
  match name {
    Some(name) => Ok(vec![ctx.config.find_addon(name)?]),
    None => Err(MirrorError::with_help(
      "Must specify an add-on name or use --all",
      "Try: addon-mirror update --all OR addon-mirror update <name>",
    )),
  }
}

/// Client for an add-on's upstream repository
pub(crate) fn connect(ctx: &MirrorContext, addon: &AddonConfig) -> MirrorResult<GitHubRepo> {
  Ok(GitHubRepo::new(&ctx.config.github.api_url, &addon.upstream)?)
}

/// Read what is published and resolve it against `upstream`
pub fn resolve_addon(
  ctx: &MirrorContext,
  addon: &AddonConfig,
  upstream: &dyn UpstreamRepo,
) -> MirrorResult<ResolvedAddon> {
  let target_dir = ctx.target_dir(&addon.target);
  let published = LoadedManifest::load_dir(&target_dir)?;
  resolve(upstream, &addon.addon_dir, ctx.channel, published.as_ref(), true)
}
