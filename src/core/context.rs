//! Repository context - build once, pass everywhere
//!
//! MirrorContext loads the distribution repository root and its mirror.toml a
//! single time in main.rs, then commands receive it by reference.

use crate::addon::channel::Channel;
use crate::core::config::MirrorConfig;
use crate::core::error::MirrorResult;
use crate::core::vcs::SystemGit;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared state for one run against the distribution repository.
#[derive(Clone)]
pub struct MirrorContext {
  /// Working tree root of the distribution repository (absolute path)
  pub root: PathBuf,

  /// Parsed mirror.toml
  /// Wrapped in Arc so add-on tasks on other threads can share it
  pub config: Arc<MirrorConfig>,

  /// Channel for this run (CLI flag, then config, then stable)
  pub channel: Channel,
}

impl MirrorContext {
  /// Build the context from a directory inside the distribution repository.
  pub fn build(path: &Path, channel_override: Option<Channel>) -> MirrorResult<Self> {
    let git = SystemGit::open(path)?;
    let root = git.work_tree.clone();
    let config = MirrorConfig::load(&root)?;
    let channel = channel_override.or(config.channel).unwrap_or_default();

    Ok(Self {
      root,
      config: Arc::new(config),
      channel,
    })
  }

  /// Absolute directory of an add-on inside the distribution repository
  pub fn target_dir(&self, target: &Path) -> PathBuf {
    self.root.join(target)
  }
}
