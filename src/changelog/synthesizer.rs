//! CHANGELOG.md synthesis
//!
//! | channel | latest is a release | behaviour |
//! |---------|---------------------|-----------|
//! | stable  | yes | keep a trusted history, add one composed entry, re-append the marker |
//! | beta / edge | yes | header plus one composed entry |
//! | any | no | unreleased commit subjects since the last release or version bump |

use crate::addon::channel::Channel;
use crate::addon::detector::AddonState;
use crate::addon::manifest::ConfigFile;
use crate::addon::resolver::config_path;
use crate::changelog::compose::{ChangelogComposer, ReleaseEntry};
use crate::changelog::emoji::emojize;
use crate::changelog::{
  CHANGELOG_HEADER, ChangelogDocument, ChangelogEntry, MARKER_BLOCK, MAX_UNRELEASED_COMMITS, Synthesis, is_trusted,
  strip_marker_block,
};
use crate::core::error::{MirrorError, MirrorResult};
use crate::core::vcs::{CommitHistory, LogEntry, LogQuery};
use crate::host::{Release, UpstreamRepo};
use tracing::{debug, info};

/// Added-line pattern marking a version bump in an add-on config
const VERSION_BUMP_PATTERN: &str = "^version:";

/// Produces the changelog for one add-on update
pub struct Synthesizer<'a> {
  upstream: &'a dyn UpstreamRepo,
  history: &'a dyn CommitHistory,
  composer: &'a dyn ChangelogComposer,
  /// Add-on directory inside the upstream repository
  addon_dir: &'a str,
}

/// Where an unreleased section starts counting from
struct Baseline {
  label: String,
  date: String,
  stop_at: Option<String>,
}

impl<'a> Synthesizer<'a> {
  pub fn new(
    upstream: &'a dyn UpstreamRepo,
    history: &'a dyn CommitHistory,
    composer: &'a dyn ChangelogComposer,
    addon_dir: &'a str,
  ) -> Self {
    Self {
      upstream,
      history,
      composer,
      addon_dir,
    }
  }

  /// Synthesize the changelog for `state` on `channel`
  ///
  /// `existing` is the current CHANGELOG.md of the target, read once. Nothing
  /// is written here; the caller persists `Synthesis::Write`.
  pub fn synthesize(&self, state: &AddonState, channel: Channel, existing: Option<&str>) -> MirrorResult<Synthesis> {
    let latest = state.latest();

    match (&latest.release, latest.is_release) {
      (Some(release), true) if channel == Channel::Stable => self.append_release(state, release, existing),
      (Some(release), true) => {
        let entry = release_entry(release)?;
        let text = self.composer.compose(CHANGELOG_HEADER, &entry)?;
        Ok(Synthesis::Write(ChangelogDocument {
          text,
          entries: vec![released(entry)],
        }))
      }
      _ => self.unreleased(state).map(Synthesis::Write),
    }
  }

  /// Stable channel: extend a trusted changelog, or start a new one
  fn append_release(&self, state: &AddonState, release: &Release, existing: Option<&str>) -> MirrorResult<Synthesis> {
    let trusted = existing.filter(|text| {
      let trusted = is_trusted(text);
      if !trusted {
        info!(upstream = self.upstream.full_name(), "discarding changelog not generated by addon-mirror");
      }
      trusted
    });

    if state.up_to_date() && trusted.is_some() {
      debug!("add-on up to date and changelog trusted, skipping");
      return Ok(Synthesis::Skip);
    }

    let base = match trusted {
      Some(text) => strip_marker_block(text),
      None => CHANGELOG_HEADER.to_string(),
    };

    let entry = release_entry(release)?;
    let mut text = self.composer.compose(&base, &entry)?;
    text.push_str(MARKER_BLOCK);

    Ok(Synthesis::Write(ChangelogDocument {
      text,
      entries: vec![released(entry)],
    }))
  }

  /// Latest is a bare commit: list what happened since the last known version
  fn unreleased(&self, state: &AddonState) -> MirrorResult<ChangelogDocument> {
    let (since, bullets, truncated) = match state.last_release() {
      Some(release) => {
        let date = published_date(release)?;
        let commits = self.upstream.compare(&release.tag_name, &state.latest().commit_id)?;
        let bullets = commits.iter().map(|c| c.subject().to_string()).collect();
        (Some((release.label().to_string(), date)), bullets, false)
      }
      None => {
        let baseline = self.last_version_bump()?;
        let (bullets, truncated) = self.commits_since(baseline.as_ref().and_then(|b| b.stop_at.as_deref()))?;
        (baseline.map(|b| (b.label, b.date)), bullets, truncated)
      }
    };

    let mut text = String::from(CHANGELOG_HEADER);
    match &since {
      Some((label, date)) => text.push_str(&format!("## Unreleased changes since {} - {}\n\n", label, date)),
      None => text.push_str("## Unreleased changes\n\n"),
    }
    for subject in &bullets {
      text.push_str(&format!("- {}\n", subject));
    }
    if truncated {
      text.push_str(&format!(
        "\nNote: More than {} commits, further commits are suppressed.\n",
        MAX_UNRELEASED_COMMITS
      ));
    }

    Ok(ChangelogDocument {
      text: emojize(&text),
      entries: vec![ChangelogEntry::Unreleased {
        since,
        bullets,
        truncated,
      }],
    })
  }

  /// Newest first-parent commit whose diff adds a `version:` line to the config
  fn last_version_bump(&self) -> MirrorResult<Option<Baseline>> {
    let query = LogQuery {
      paths: ConfigFile::ALL.iter().map(|file| config_path(self.addon_dir, *file)).collect(),
      added_pattern: Some(VERSION_BUMP_PATTERN.to_string()),
      max_count: Some(1),
    };

    let Some(bump) = self.history.log(&query)?.into_iter().next() else {
      debug!("no version bump in history");
      return Ok(None);
    };

    let label = bumped_version(&bump).unwrap_or_else(|| bump.sha.chars().take(7).collect());
    debug!(commit = %bump.sha, version = %label, "found last version bump");
    Ok(Some(Baseline {
      label,
      date: bump.date,
      stop_at: Some(bump.sha),
    }))
  }

  /// Subjects of first-parent commits newer than `stop_at`, oldest first
  ///
  /// At most [`MAX_UNRELEASED_COMMITS`] are kept (the newest ones); the flag
  /// reports whether more existed.
  fn commits_since(&self, stop_at: Option<&str>) -> MirrorResult<(Vec<String>, bool)> {
    let query = LogQuery {
      max_count: Some(MAX_UNRELEASED_COMMITS + 1),
      ..LogQuery::default()
    };

    let mut subjects: Vec<String> = self
      .history
      .log(&query)?
      .into_iter()
      .take_while(|entry| Some(entry.sha.as_str()) != stop_at)
      .map(|entry| entry.subject)
      .collect();

    let truncated = subjects.len() > MAX_UNRELEASED_COMMITS;
    subjects.truncate(MAX_UNRELEASED_COMMITS);
    subjects.reverse();
    Ok((subjects, truncated))
  }
}

/// Version text from an added `version: ...` line
fn bumped_version(entry: &LogEntry) -> Option<String> {
  entry.added_lines.iter().find_map(|line| {
    let value = line.strip_prefix("version:")?.trim();
    let value = value.trim_matches(|c| c == '"' || c == '\'');
    (!value.is_empty()).then(|| value.to_string())
  })
}

fn published_date(release: &Release) -> MirrorResult<String> {
  release
    .published_date()
    .ok_or_else(|| MirrorError::message(format!("Release {} has no publish date", release.tag_name)))
}

fn release_entry(release: &Release) -> MirrorResult<ReleaseEntry> {
  Ok(ReleaseEntry {
    version: release.label().to_string(),
    date: published_date(release)?,
    notes: emojize(&release.body),
  })
}

fn released(entry: ReleaseEntry) -> ChangelogEntry {
  ChangelogEntry::Release {
    version: entry.version,
    date: entry.date,
  }
}
