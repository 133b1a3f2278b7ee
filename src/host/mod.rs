//! Hosting platform collaborator
//!
//! The engine reads upstream releases, refs, commits and files through the
//! [`UpstreamRepo`] trait. Calls are blocking. Retry and authentication are the
//! implementation's concern, not the engine's.

pub mod github;
#[cfg(test)]
pub(crate) mod testing;

use crate::addon::version::strip_v_prefix;
use crate::core::error::HostError;
use chrono::{DateTime, FixedOffset};

pub use github::GitHubRepo;

pub type HostResult<T> = Result<T, HostError>;

/// A published (or draft) release of an upstream repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
  pub tag_name: String,
  /// Release notes (empty when the release has none)
  pub body: String,
  /// Publish time in the offset reported by the host
  pub published_at: Option<DateTime<FixedOffset>>,
  pub prerelease: bool,
  pub draft: bool,
}

impl Release {
  /// Tag name with a single leading `v` removed
  pub fn label(&self) -> &str {
    strip_v_prefix(&self.tag_name)
  }

  /// Publish date as `YYYY-MM-DD`, in the release's own offset
  pub fn published_date(&self) -> Option<String> {
    self.published_at.map(|at| at.format("%Y-%m-%d").to_string())
  }
}

/// Kind of object a ref points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
  Commit,
  /// Annotated tag object, must be peeled
  Tag,
  Other,
}

/// Target of a ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitObject {
  pub sha: String,
  pub kind: ObjectKind,
}

/// A commit as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommit {
  pub sha: String,
  pub message: String,
}

impl HostCommit {
  /// First line of the commit message
  pub fn subject(&self) -> &str {
    self.message.lines().next().unwrap_or_default()
  }

  /// Seven-character abbreviated hash
  pub fn short_sha(&self) -> &str {
    self.sha.get(..7).unwrap_or(&self.sha)
  }
}

/// Read-only view of one upstream add-on repository
pub trait UpstreamRepo: Send + Sync {
  /// `owner/name`
  fn full_name(&self) -> &str;

  /// All releases, newest first
  fn releases(&self) -> HostResult<Vec<Release>>;

  /// Resolve `refs/tags/<name>`
  fn find_tag(&self, name: &str) -> HostResult<GitObject>;

  /// Dereference one annotated tag object
  fn peel_tag(&self, tag_sha: &str) -> HostResult<GitObject>;

  /// Fetch a commit by hash or ref name
  fn commit(&self, reference: &str) -> HostResult<HostCommit>;

  /// Newest commit on the default branch
  fn head_commit(&self) -> HostResult<HostCommit>;

  /// Raw file content at a commit; `HostError::NotFound` if absent
  fn file_at(&self, path: &str, commit: &str) -> HostResult<Vec<u8>>;

  /// Commits in `base..head`, oldest first
  fn compare(&self, base: &str, head: &str) -> HostResult<Vec<HostCommit>>;

  /// URL git can clone from
  fn clone_url(&self) -> String;

  /// Web page of the repository
  fn html_url(&self) -> String;
}
