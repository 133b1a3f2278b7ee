//! Release channels and the policy table behind them

use crate::addon::version::is_prerelease_label;
use crate::host::Release;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Release channel of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  /// Published, non-pre-release releases only
  #[default]
  Stable,
  /// Pre-releases are eligible too
  Beta,
  /// Tracks the default branch head
  Edge,
}

/// What a channel accepts as "latest"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
  /// Pre-releases may be chosen as the latest release
  pub prerelease_eligible: bool,
  /// The default-branch head replaces the release when they differ
  pub commit_override: bool,
}

impl Channel {
  pub const ALL: [Channel; 3] = [Channel::Stable, Channel::Beta, Channel::Edge];

  /// Lookup in the channel policy table
  pub const fn policy(self) -> ChannelPolicy {
    match self {
      Channel::Stable => ChannelPolicy {
        prerelease_eligible: false,
        commit_override: false,
      },
      Channel::Beta => ChannelPolicy {
        prerelease_eligible: true,
        commit_override: false,
      },
      Channel::Edge => ChannelPolicy {
        prerelease_eligible: false,
        commit_override: true,
      },
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Channel::Stable => "stable",
      Channel::Beta => "beta",
      Channel::Edge => "edge",
    }
  }
}

impl ChannelPolicy {
  /// Whether a release may be picked as the release-based latest
  ///
  /// Drafts never qualify. Unpublished releases (no timestamp) never qualify.
  /// Pre-releases qualify only when the channel allows them.
  pub fn admits(&self, release: &Release) -> bool {
    if release.draft || release.published_at.is_none() {
      return false;
    }
    let prerelease = release.prerelease || is_prerelease_label(release.label());
    !prerelease || self.prerelease_eligible
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Channel {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Channel::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| format!("unknown channel '{}' (expected stable, beta or edge)", s))
  }
}
