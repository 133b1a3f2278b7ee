//! System git backend - zero dependencies
//!
//! Every operation is one git subprocess with an isolated environment, so the
//! user's global config can never change what history looks like to the engine.

use crate::core::error::{GitError, MirrorError, MirrorResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> MirrorResult<Self> {
    let output = isolated_git()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(MirrorError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(MirrorError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Clone `url` into `dest` (full history; first-parent walks need it)
  pub fn clone(url: &str, dest: &Path) -> MirrorResult<Self> {
    let output = isolated_git()
      .args(["clone", "--quiet", url])
      .arg(dest)
      .output()
      .context("Failed to execute git clone")?;

    if !output.status.success() {
      return Err(MirrorError::Git(GitError::CloneFailed {
        url: url.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }

    Self::open(dest)
  }

  /// Detach HEAD at a commit
  pub fn checkout(&self, commit_sha: &str) -> MirrorResult<()> {
    let output = self
      .git_cmd()
      .args(["checkout", "--quiet", "--detach", commit_sha])
      .output()
      .context("Failed to checkout commit")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(MirrorError::Git(GitError::CommandFailed {
        command: format!("git checkout {}", commit_sha),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> MirrorResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "HEAD"])
      .output()
      .context("Failed to get HEAD commit")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(MirrorError::Git(GitError::CommandFailed {
        command: "git rev-parse HEAD".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Create a safe git command bound to this repository
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = isolated_git();
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }
}

/// Create a git command with an isolated environment
///
/// - Clears environment variables
/// - Whitelists only PATH and HOME
/// - Adds safe configuration overrides
fn isolated_git() -> Command {
  let mut cmd = Command::new("git");

  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }

  cmd.arg("-c").arg("protocol.version=2");
  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
  cmd.arg("-c").arg("log.showSignature=false");

  cmd
}
