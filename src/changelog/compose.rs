//! Release-entry composition
//!
//! A composer receives the current changelog text and one release entry and
//! returns the text with the entry inserted at the top of the body.

use crate::changelog::CHANGELOG_HEADER;
use crate::core::error::ComposeError;
use std::io::{self, Write};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

/// Default executable used by [`ProcessComposer`]
pub const CHANGELOG_UPDATER: &str = "changelog-updater";

/// Release data handed to a composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
  /// Version without a leading `v`
  pub version: String,
  /// `YYYY-MM-DD`
  pub date: String,
  /// Release notes, emoji already substituted
  pub notes: String,
}

/// Inserts one release entry into a changelog document
pub trait ChangelogComposer: Send + Sync {
  fn compose(&self, document: &str, entry: &ReleaseEntry) -> Result<String, ComposeError>;
}

/// Built-in composer writing `## [version] - date` sections
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownComposer;

impl MarkdownComposer {
  fn render_entry(entry: &ReleaseEntry) -> String {
    let mut output = format!("## [{}] - {}\n\n", entry.version, entry.date);
    let notes = entry.notes.trim();
    if !notes.is_empty() {
      output.push_str(notes);
      output.push_str("\n\n");
    }
    output
  }
}

impl ChangelogComposer for MarkdownComposer {
  fn compose(&self, document: &str, entry: &ReleaseEntry) -> Result<String, ComposeError> {
    let rendered = Self::render_entry(entry);

    // Split after the `# Changelog` heading and the blank lines below it
    let (head, body) = match document.find('\n') {
      Some(end) if document.starts_with("# ") => {
        let rest = &document[end + 1..];
        let body = rest.trim_start_matches('\n');
        (&document[..end], body)
      }
      _ => (CHANGELOG_HEADER.trim_end(), document.trim_start_matches('\n')),
    };

    let mut output = String::with_capacity(document.len() + rendered.len() + 2);
    output.push_str(head);
    output.push_str("\n\n");
    output.push_str(&rendered);
    output.push_str(body);
    if !output.ends_with('\n') {
      output.push('\n');
    }
    Ok(output)
  }
}

/// Composer delegating to the external `changelog-updater` tool
///
/// The document is written to a temporary file, the tool edits it in place,
/// and the file is read back.
#[derive(Debug, Clone)]
pub struct ProcessComposer {
  program: String,
}

impl Default for ProcessComposer {
  fn default() -> Self {
    Self {
      program: CHANGELOG_UPDATER.to_string(),
    }
  }
}

impl ProcessComposer {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn spawn_error(&self, reason: impl ToString) -> ComposeError {
    ComposeError::Spawn {
      program: self.program.clone(),
      reason: reason.to_string(),
    }
  }
}

/// Temporary `CHANGELOG*.md` holding `document`
fn scratch_changelog(document: &str) -> io::Result<NamedTempFile> {
  let mut file = tempfile::Builder::new().prefix("CHANGELOG").suffix(".md").tempfile()?;
  file.write_all(document.as_bytes())?;
  file.flush()?;
  Ok(file)
}

impl ChangelogComposer for ProcessComposer {
  fn compose(&self, document: &str, entry: &ReleaseEntry) -> Result<String, ComposeError> {
    let file = scratch_changelog(document).map_err(|e| self.spawn_error(e))?;

    debug!(program = %self.program, version = %entry.version, "running changelog composer");
    let output = Command::new(&self.program)
      .arg("update")
      .arg(format!("--path-to-changelog={}", file.path().display()))
      .args(["--parse-github-usernames", "--no-interaction", "--write", "--quiet"])
      .arg(format!("--latest-version={}", entry.version))
      .arg(format!("--release-date={}", entry.date))
      .arg(format!("--release-notes={}", entry.notes))
      .output()
      .map_err(|e| self.spawn_error(e))?;

    if !output.status.success() {
      let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
      combined.push_str(&String::from_utf8_lossy(&output.stderr));
      return Err(ComposeError::Failed {
        program: self.program.clone(),
        status: output.status.code(),
        output: combined,
      });
    }

    std::fs::read_to_string(file.path()).map_err(|e| self.spawn_error(e))
  }
}
