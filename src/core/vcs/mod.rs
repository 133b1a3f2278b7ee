pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::MirrorResult;

/// One first-parent history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
  pub sha: String,
  /// Author date as `YYYY-MM-DD` in the author's own offset
  pub date: String,
  /// First line of the commit message
  pub subject: String,
  /// Lines added by the commit (leading `+` removed), only when a pattern was queried
  pub added_lines: Vec<String>,
}

/// Filter for a first-parent history walk starting at HEAD
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
  /// Limit to commits touching these paths (empty = whole tree)
  pub paths: Vec<String>,
  /// Only commits whose diff adds or removes a line matching this regex
  pub added_pattern: Option<String>,
  pub max_count: Option<usize>,
}

/// Read access to an add-on's local commit history
pub trait CommitHistory {
  /// Walk first-parent history from HEAD, newest first
  fn log(&self, query: &LogQuery) -> MirrorResult<Vec<LogEntry>>;
}
