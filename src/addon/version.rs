//! Resolved version references and version-string classification

use crate::host::{HostCommit, Release};
use serde::Serialize;

/// Strip exactly one leading `v` (`v1.2.3` -> `1.2.3`, `vv1` -> `v1`)
pub fn strip_v_prefix(version: &str) -> &str {
  version.strip_prefix('v').unwrap_or(version)
}

/// Whether a version label denotes a pre-release
///
/// Two tiers, checked in order:
/// 1. the label parses as semver: pre-release iff it has a pre-release segment
/// 2. the label does not parse: pre-release iff it contains a `-`
///
/// Tier 2 only runs for strings semver rejects, so odd real-world tags like
/// `2.0-rc` still classify instead of failing.
pub fn is_prerelease_label(label: &str) -> bool {
  match semver::Version::parse(label) {
    Ok(version) => !version.pre.is_empty(),
    Err(_) => label.contains('-'),
  }
}

/// Whether a persisted version string is a strict semantic version
pub fn is_semver(version: &str) -> bool {
  semver::Version::parse(version).is_ok()
}

/// One resolved point in an add-on's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRef {
  /// Semantic version, or short commit hash when no version applies
  pub version_label: String,
  /// Full hash of the resolved commit
  pub commit_id: String,
  /// Release this ref was built from, if any
  #[serde(skip)]
  pub release: Option<Release>,
  /// `release` is present and was the basis for this ref
  pub is_release: bool,
}

impl VersionRef {
  /// Ref for a persisted version string resolved to a commit
  pub fn from_version(version: &str, commit: &HostCommit) -> Self {
    Self {
      version_label: version.to_string(),
      commit_id: commit.sha.clone(),
      release: None,
      is_release: false,
    }
  }

  /// Ref chosen from a release; the label is the tag without its `v`
  pub fn from_release(release: Release, commit: &HostCommit) -> Self {
    Self {
      version_label: release.label().to_string(),
      commit_id: commit.sha.clone(),
      release: Some(release),
      is_release: true,
    }
  }

  /// Bare-commit ref labelled with the short hash
  pub fn from_commit(commit: &HostCommit) -> Self {
    Self {
      version_label: commit.short_sha().to_string(),
      commit_id: commit.sha.clone(),
      release: None,
      is_release: false,
    }
  }

  /// Seven-character abbreviated commit hash
  pub fn short_commit(&self) -> &str {
    self.commit_id.get(..7).unwrap_or(&self.commit_id)
  }
}
