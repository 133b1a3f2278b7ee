//! History walking for SystemGit

use super::system_git::SystemGit;
use super::{CommitHistory, LogEntry, LogQuery};
use crate::core::error::{GitError, MirrorError, MirrorResult, ResultExt};

/// Record separator in the log format (one record per commit)
const RECORD_SEP: char = '\u{1e}';
/// Field separator inside the header line of a record
const FIELD_SEP: char = '\u{1f}';

impl CommitHistory for SystemGit {
  /// Walk first-parent history from HEAD
  ///
  /// Uses `git log --first-parent` with `-G` and a zero-context patch when a
  /// pattern is given, so added lines can be read back from the diff.
  fn log(&self, query: &LogQuery) -> MirrorResult<Vec<LogEntry>> {
    let mut cmd = self.git_cmd();
    cmd.args([
      "log",
      "--first-parent",
      "--date=format:%Y-%m-%d",
      "--format=tformat:%x1e%H%x1f%ad%x1f%s",
    ]);

    if let Some(pattern) = &query.added_pattern {
      cmd.args(["-m", "-p", "-U0", "--no-color", "-G", pattern]);
    }

    if let Some(max) = query.max_count {
      cmd.arg(format!("--max-count={}", max));
    }

    cmd.arg("HEAD");

    if !query.paths.is_empty() {
      cmd.arg("--");
      cmd.args(&query.paths);
    }

    let output = cmd.output().context("Failed to run git log")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(MirrorError::Git(GitError::CommandFailed {
        command: "git log --first-parent".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    parse_log_output(&String::from_utf8_lossy(&output.stdout))
  }
}

/// Parse records produced by the log format above
///
/// Each record is a header line `sha<US>date<US>subject`, optionally followed
/// by a `-U0` patch whose `+` lines are collected.
fn parse_log_output(output: &str) -> MirrorResult<Vec<LogEntry>> {
  let mut entries = Vec::new();

  for record in output.split(RECORD_SEP) {
    if record.trim().is_empty() {
      continue;
    }

    let mut lines = record.lines();
    let header = lines.next().unwrap_or_default();
    let mut fields = header.splitn(3, FIELD_SEP);
    let sha = fields
      .next()
      .filter(|s| !s.is_empty())
      .ok_or_else(|| MirrorError::message("Missing commit SHA in git log output"))?;
    let date = fields
      .next()
      .ok_or_else(|| MirrorError::message(format!("Missing date for commit {}", sha)))?;
    let subject = fields.next().unwrap_or_default();

    let added_lines = lines
      .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
      .map(|line| line[1..].to_string())
      .collect();

    entries.push(LogEntry {
      sha: sha.to_string(),
      date: date.to_string(),
      subject: subject.to_string(),
      added_lines,
    });
  }

  Ok(entries)
}
