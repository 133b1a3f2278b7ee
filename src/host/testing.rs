//! In-memory upstream used by unit tests

use super::{GitObject, HostCommit, HostResult, ObjectKind, Release, UpstreamRepo};
use crate::core::error::HostError;
use chrono::DateTime;
use std::collections::HashMap;

/// Build a published, non-draft, non-pre-release release
pub fn release(tag: &str, published_at: &str) -> Release {
  Release {
    tag_name: tag.to_string(),
    body: String::new(),
    published_at: Some(DateTime::parse_from_rfc3339(published_at).unwrap()),
    prerelease: false,
    draft: false,
  }
}

pub fn commit(sha: &str, message: &str) -> HostCommit {
  HostCommit {
    sha: sha.to_string(),
    message: message.to_string(),
  }
}

#[derive(Default)]
pub struct FakeUpstream {
  pub releases: Vec<Release>,
  /// tag name -> ref target
  pub tags: HashMap<String, GitObject>,
  /// annotated tag sha -> target
  pub tag_objects: HashMap<String, GitObject>,
  /// sha or ref name -> commit
  pub commits: HashMap<String, HostCommit>,
  pub head: Option<HostCommit>,
  /// (path, commit) -> content
  pub files: HashMap<(String, String), Vec<u8>>,
  /// (base, head) -> commits oldest first
  pub comparisons: HashMap<(String, String), Vec<HostCommit>>,
}

impl FakeUpstream {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a commit reachable by its own sha
  pub fn with_commit(mut self, sha: &str, message: &str) -> Self {
    self.commits.insert(sha.to_string(), commit(sha, message));
    self
  }

  /// Lightweight tag pointing straight at a commit
  pub fn with_tag(mut self, name: &str, sha: &str) -> Self {
    self.tags.insert(
      name.to_string(),
      GitObject {
        sha: sha.to_string(),
        kind: ObjectKind::Commit,
      },
    );
    self
  }

  /// Annotated tag: ref -> tag object -> commit
  pub fn with_annotated_tag(mut self, name: &str, tag_sha: &str, sha: &str) -> Self {
    self.tags.insert(
      name.to_string(),
      GitObject {
        sha: tag_sha.to_string(),
        kind: ObjectKind::Tag,
      },
    );
    self.tag_objects.insert(
      tag_sha.to_string(),
      GitObject {
        sha: sha.to_string(),
        kind: ObjectKind::Commit,
      },
    );
    self
  }

  pub fn with_release(mut self, release: Release) -> Self {
    self.releases.push(release);
    self
  }

  pub fn with_head(mut self, sha: &str, message: &str) -> Self {
    self.head = Some(commit(sha, message));
    self.with_commit(sha, message)
  }

  pub fn with_file(mut self, path: &str, commit: &str, content: &str) -> Self {
    self
      .files
      .insert((path.to_string(), commit.to_string()), content.as_bytes().to_vec());
    self
  }

  pub fn with_comparison(mut self, base: &str, head: &str, commits: Vec<HostCommit>) -> Self {
    self.comparisons.insert((base.to_string(), head.to_string()), commits);
    self
  }
}

fn not_found(resource: String) -> HostError {
  HostError::NotFound { resource }
}

impl UpstreamRepo for FakeUpstream {
  fn full_name(&self) -> &str {
    "owner/addon"
  }

  fn releases(&self) -> HostResult<Vec<Release>> {
    Ok(self.releases.clone())
  }

  fn find_tag(&self, name: &str) -> HostResult<GitObject> {
    self
      .tags
      .get(name)
      .cloned()
      .ok_or_else(|| not_found(format!("refs/tags/{}", name)))
  }

  fn peel_tag(&self, tag_sha: &str) -> HostResult<GitObject> {
    self
      .tag_objects
      .get(tag_sha)
      .cloned()
      .ok_or_else(|| not_found(format!("tag {}", tag_sha)))
  }

  fn commit(&self, reference: &str) -> HostResult<HostCommit> {
    self
      .commits
      .get(reference)
      .cloned()
      .ok_or_else(|| not_found(format!("commit {}", reference)))
  }

  fn head_commit(&self) -> HostResult<HostCommit> {
    self.head.clone().ok_or_else(|| not_found("default branch".to_string()))
  }

  fn file_at(&self, path: &str, commit: &str) -> HostResult<Vec<u8>> {
    self
      .files
      .get(&(path.to_string(), commit.to_string()))
      .cloned()
      .ok_or_else(|| not_found(format!("{}@{}", path, commit)))
  }

  fn compare(&self, base: &str, head: &str) -> HostResult<Vec<HostCommit>> {
    self
      .comparisons
      .get(&(base.to_string(), head.to_string()))
      .cloned()
      .ok_or_else(|| not_found(format!("{}...{}", base, head)))
  }

  fn clone_url(&self) -> String {
    "https://example.invalid/owner/addon.git".to_string()
  }

  fn html_url(&self) -> String {
    "https://example.invalid/owner/addon".to_string()
  }
}
