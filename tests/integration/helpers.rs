//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway git repository
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Create an empty repository on `main`
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    Ok(Self { _root: root, path })
  }

  /// Write a file, creating parent directories
  pub fn write(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    self.commit_at(message, "2024-05-01T12:00:00+00:00")
  }

  /// Commit current changes with a fixed author and committer date
  pub fn commit_at(&self, message: &str, date: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    let output = Command::new("git")
      .current_dir(&self.path)
      .env("GIT_AUTHOR_DATE", date)
      .env("GIT_COMMITTER_DATE", date)
      .args(["commit", "--allow-empty", "-m", message])
      .output()
      .context("Failed to run git commit")?;
    if !output.status.success() {
      anyhow::bail!("git commit failed: {}", String::from_utf8_lossy(&output.stderr));
    }

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Commit `count` empty commits named `<prefix> 1..=count`
  pub fn commit_many(&self, prefix: &str, count: usize) -> Result<()> {
    for n in 1..=count {
      self.commit(&format!("{} {}", prefix, n))?;
    }
    Ok(())
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the addon-mirror binary; failures are returned, not raised
pub fn run_addon_mirror(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_addon-mirror"))
    .current_dir(cwd)
    .env_remove("RUST_LOG")
    .args(args)
    .output()
    .context("Failed to run addon-mirror")
}
