//! First-parent history walks and version-bump detection with system git

use crate::helpers::*;
use addon_mirror::addon::channel::Channel;
use addon_mirror::addon::detector::AddonState;
use addon_mirror::addon::version::VersionRef;
use addon_mirror::changelog::{MarkdownComposer, Synthesis, Synthesizer};
use addon_mirror::core::error::HostError;
use addon_mirror::core::vcs::{CommitHistory, LogQuery, SystemGit};
use addon_mirror::host::{GitObject, HostCommit, HostResult, Release, UpstreamRepo};
use anyhow::Result;

/// Upstream with no releases and nothing to look up
struct EmptyUpstream;

fn missing<T>(resource: &str) -> HostResult<T> {
  Err(HostError::NotFound {
    resource: resource.to_string(),
  })
}

impl UpstreamRepo for EmptyUpstream {
  fn full_name(&self) -> &str {
    "owner/addon"
  }
  fn releases(&self) -> HostResult<Vec<Release>> {
    Ok(Vec::new())
  }
  fn find_tag(&self, name: &str) -> HostResult<GitObject> {
    missing(name)
  }
  fn peel_tag(&self, tag_sha: &str) -> HostResult<GitObject> {
    missing(tag_sha)
  }
  fn commit(&self, reference: &str) -> HostResult<HostCommit> {
    missing(reference)
  }
  fn head_commit(&self) -> HostResult<HostCommit> {
    missing("head")
  }
  fn file_at(&self, path: &str, _commit: &str) -> HostResult<Vec<u8>> {
    missing(path)
  }
  fn compare(&self, base: &str, _head: &str) -> HostResult<Vec<HostCommit>> {
    missing(base)
  }
  fn clone_url(&self) -> String {
    String::new()
  }
  fn html_url(&self) -> String {
    String::new()
  }
}

fn head_state(sha: &str, subject: &str) -> AddonState {
  let head = HostCommit {
    sha: sha.to_string(),
    message: subject.to_string(),
  };
  AddonState::new(None, VersionRef::from_commit(&head), None, true)
}

fn synthesize(repo: &TestRepo, state: &AddonState) -> Result<String> {
  let git = SystemGit::open(&repo.path)?;
  let synthesizer = Synthesizer::new(&EmptyUpstream, &git, &MarkdownComposer, "example");
  match synthesizer.synthesize(state, Channel::Edge, None)? {
    Synthesis::Write(document) => Ok(document.text),
    Synthesis::Skip => anyhow::bail!("unexpected skip"),
  }
}

#[test]
fn test_log_is_newest_first() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_many("Commit", 3)?;

  let git = SystemGit::open(&repo.path)?;
  let entries = git.log(&LogQuery::default())?;
  let subjects: Vec<&str> = entries.iter().map(|e| e.subject.as_str()).collect();
  assert_eq!(subjects, vec!["Commit 3", "Commit 2", "Commit 1"]);
  assert!(entries.iter().all(|e| e.sha.len() == 40 && e.date == "2024-05-01"));

  let limited = git.log(&LogQuery {
    max_count: Some(2),
    ..LogQuery::default()
  })?;
  assert_eq!(limited.len(), 2);

  Ok(())
}

#[test]
fn test_log_follows_first_parent_only() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit("Initial")?;
  git(&repo.path, &["checkout", "-b", "feature"])?;
  repo.write("feature.txt", "x")?;
  repo.commit("Side branch work")?;
  git(&repo.path, &["checkout", "main"])?;
  git(&repo.path, &["merge", "--no-ff", "-m", "Merge pull request #1", "feature"])?;

  let git = SystemGit::open(&repo.path)?;
  let subjects: Vec<String> = git.log(&LogQuery::default())?.into_iter().map(|e| e.subject).collect();
  assert_eq!(subjects, vec!["Merge pull request #1".to_string(), "Initial".to_string()]);

  Ok(())
}

#[test]
fn test_version_bump_search_reads_added_line() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write("example/config.yaml", "name: Example\nslug: example\nversion: 0.1.0\n")?;
  repo.commit_at("Add add-on", "2024-01-10T09:00:00+00:00")?;
  repo.write("example/config.yaml", "name: Example\nslug: example\nversion: 0.2.0\n")?;
  let bump = repo.commit_at("Bump to 0.2.0", "2024-04-15T23:30:00-05:00")?;
  repo.write("example/run.sh", "#!/bin/sh\n")?;
  repo.commit("Add run script")?;

  let git = SystemGit::open(&repo.path)?;
  let found = git.log(&LogQuery {
    paths: vec!["example/config.yaml".to_string()],
    added_pattern: Some("^version:".to_string()),
    max_count: Some(1),
  })?;

  assert_eq!(found.len(), 1);
  assert_eq!(found[0].sha, bump);
  // Author's own offset, not UTC
  assert_eq!(found[0].date, "2024-04-15");
  assert!(found[0].added_lines.iter().any(|l| l == "version: 0.2.0"));

  Ok(())
}

#[test]
fn test_unreleased_since_version_bump() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write("example/config.yaml", "name: Example\nslug: example\nversion: 0.1.0\n")?;
  repo.commit("Add add-on")?;
  repo.write("example/config.yaml", "name: Example\nslug: example\nversion: 0.2.0\n")?;
  repo.commit_at("Bump to 0.2.0", "2024-04-15T10:00:00+00:00")?;
  repo.commit("Fix :bug: in startup")?;
  let head = repo.commit("Merge pull request #7")?;

  let text = synthesize(&repo, &head_state(&head, "Merge pull request #7"))?;
  assert_eq!(
    text,
    "# Changelog\n\n## Unreleased changes since 0.2.0 - 2024-04-15\n\n- Fix 🐛 in startup\n- Merge pull request #7\n"
  );

  Ok(())
}

#[test]
fn test_unreleased_without_bump_lists_whole_history() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_many("Commit", 5)?;
  let head = SystemGit::open(&repo.path)?.head_commit()?;

  let text = synthesize(&repo, &head_state(&head, "Commit 5"))?;
  assert_eq!(
    text,
    "# Changelog\n\n## Unreleased changes\n\n- Commit 1\n- Commit 2\n- Commit 3\n- Commit 4\n- Commit 5\n"
  );

  Ok(())
}

#[test]
fn test_unreleased_caps_at_one_hundred() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_many("Commit", 101)?;
  let head = SystemGit::open(&repo.path)?.head_commit()?;

  let text = synthesize(&repo, &head_state(&head, "Commit 101"))?;
  let bullets: Vec<&str> = text.lines().filter(|l| l.starts_with("- ")).collect();
  assert_eq!(bullets.len(), 100);
  assert_eq!(bullets[0], "- Commit 2");
  assert!(text.ends_with("\nNote: More than 100 commits, further commits are suppressed.\n"));

  Ok(())
}

#[test]
fn test_clone_and_checkout() -> Result<()> {
  let upstream = TestRepo::new()?;
  upstream.write("example/config.json", "{\"name\":\"E\",\"slug\":\"e\",\"version\":\"1.0.0\"}")?;
  let first = upstream.commit("First")?;
  upstream.commit("Second")?;

  let dest = tempfile::TempDir::new()?;
  let clone = SystemGit::clone(&upstream.path.display().to_string(), &dest.path().join("addon"))?;
  clone.checkout(&first)?;

  assert_eq!(clone.head_commit()?, first);
  assert!(clone.work_tree().join("example/config.json").is_file());

  Ok(())
}
