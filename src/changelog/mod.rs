//! Changelog synthesis
//!
//! - **compose**: release-entry composition (built-in markdown or `changelog-updater`)
//! - **emoji**: `:shortcode:` to glyph substitution
//! - **synthesizer**: the channel/release state machine producing CHANGELOG.md

pub mod compose;
pub mod emoji;
pub mod synthesizer;

pub use compose::{ChangelogComposer, MarkdownComposer, ProcessComposer, ReleaseEntry};
pub use synthesizer::Synthesizer;

/// Every synthesized changelog starts with this
pub const CHANGELOG_HEADER: &str = "# Changelog\n\n";

/// Text on the last non-empty line of a changelog this tool owns
pub const CHANGELOG_MARKER: &str = "generated by the repository updater action";

/// Appended after each stable-channel write
pub const MARKER_BLOCK: &str = "\n[//]: # (do not remove these and the surrounding blank lines)\n[//]: # (generated by the repository updater action)\n\n";

/// Most unreleased commits listed when walking local history
pub const MAX_UNRELEASED_COMMITS: usize = 100;

/// File name inside the target directory
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// One entry written this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogEntry {
  /// Composed from a release
  Release { version: String, date: String },
  /// Commit subjects since a release, a version bump, or the beginning
  Unreleased {
    /// `(label, date)` of the starting point, if one was found
    since: Option<(String, String)>,
    bullets: Vec<String>,
    truncated: bool,
  },
}

/// Full changelog text plus what went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
  pub text: String,
  pub entries: Vec<ChangelogEntry>,
}

/// Outcome of synthesis for one add-on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
  /// Leave the existing file untouched
  Skip,
  Write(ChangelogDocument),
}

/// Whether an existing changelog was written by this tool
///
/// Only the last non-empty line is inspected.
pub fn is_trusted(existing: &str) -> bool {
  existing
    .lines()
    .rev()
    .find(|line| !line.trim().is_empty())
    .is_some_and(|line| line.contains(CHANGELOG_MARKER))
}

/// Remove the trailing marker block so the document can be composed into
///
/// Only the exact block this tool appends is removed. The result ends with
/// exactly one newline.
pub fn strip_marker_block(document: &str) -> String {
  let trimmed = document.trim_end();
  let body = trimmed.strip_suffix(MARKER_BLOCK.trim_end()).unwrap_or(trimmed);
  let mut text = body.trim_end().to_string();
  text.push('\n');
  text
}
