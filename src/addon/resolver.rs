//! Resolution of published and upstream versions to concrete commits
//!
//! Current version: the version string of the published config, looked up as a
//! tag (semver) or a ref (anything else), each with and without a `v` prefix.
//!
//! Latest version: the newest release the channel admits, replaced by the
//! default-branch head on channels that track commits.

use crate::addon::channel::Channel;
use crate::addon::detector::AddonState;
use crate::addon::manifest::{ConfigFile, LoadedManifest};
use crate::addon::version::{VersionRef, is_semver};
use crate::core::error::{HostError, MirrorError, MirrorResult, ResolutionError};
use crate::host::{GitObject, HostCommit, HostResult, ObjectKind, Release, UpstreamRepo};
use tracing::debug;

/// Annotated tags pointing at annotated tags are legal; stop at this depth
const MAX_TAG_DEPTH: usize = 8;

/// Latest version plus the upstream config found at its commit
#[derive(Debug, Clone)]
pub struct LatestResolution {
  pub latest: VersionRef,
  /// Newest admitted release, kept even when a commit overrode it
  pub last_release: Option<Release>,
  pub manifest: LoadedManifest,
}

/// Everything resolution produces for one add-on
#[derive(Debug, Clone)]
pub struct ResolvedAddon {
  pub state: AddonState,
  /// Upstream config at the latest commit
  pub manifest: LoadedManifest,
}

/// Resolve current and latest and build the add-on state
///
/// `published` is the config currently in the distribution repository. A
/// missing config (or one without a version) means nothing is published yet.
pub fn resolve(
  upstream: &dyn UpstreamRepo,
  addon_dir: &str,
  channel: Channel,
  published: Option<&LoadedManifest>,
  updating: bool,
) -> MirrorResult<ResolvedAddon> {
  let persisted = published.and_then(|p| p.manifest.version.as_deref());
  let current = match resolve_current(upstream, addon_dir, persisted) {
    Ok(current) => Some(current),
    Err(MirrorError::Resolution(e)) if e.is_absent() => None,
    Err(e) => return Err(e),
  };

  let known_config = published.map(|p| p.file);
  let LatestResolution {
    latest,
    last_release,
    manifest,
  } = resolve_latest(upstream, addon_dir, channel, known_config)?;

  Ok(ResolvedAddon {
    state: AddonState::new(current, latest, last_release, updating),
    manifest,
  })
}

/// Resolve the published version string to a commit
///
/// Semver strings are looked up as tags `v<version>` then `<version>`, with
/// annotated tags peeled. Anything else is looked up as a ref with the same
/// two spellings. Fails with `ResolutionError::NotPublished` when there is no
/// version, and `ResolutionError::RefNotFound` when neither spelling exists.
pub fn resolve_current(upstream: &dyn UpstreamRepo, target: &str, persisted: Option<&str>) -> MirrorResult<VersionRef> {
  let Some(version) = persisted else {
    return Err(
      ResolutionError::NotPublished {
        target: target.to_string(),
      }
      .into(),
    );
  };

  let spellings = [format!("v{}", version), version.to_string()];
  let commit = if is_semver(version) {
    let object = first_found(version, &spellings, |name| upstream.find_tag(name))?;
    let sha = peel_to_commit(upstream, object)?;
    upstream.commit(&sha).map_err(|e| ref_error(e, version, &[sha.clone()]))?
  } else {
    first_found(version, &spellings, |name| upstream.commit(name))?
  };

  debug!(version, commit = %commit.sha, "resolved current version");
  Ok(VersionRef::from_version(version, &commit))
}

/// Resolve the latest version for a channel and locate its config
pub fn resolve_latest(
  upstream: &dyn UpstreamRepo,
  addon_dir: &str,
  channel: Channel,
  known_config: Option<ConfigFile>,
) -> MirrorResult<LatestResolution> {
  let policy = channel.policy();

  let last_release = upstream.releases()?.into_iter().find(|r| policy.admits(r));
  let release_commit = match &last_release {
    Some(release) => Some(release_commit(upstream, release)?),
    None => None,
  };

  let latest = match (&last_release, release_commit) {
    (Some(release), Some(commit)) if !policy.commit_override => VersionRef::from_release(release.clone(), &commit),
    (release, commit) if policy.commit_override => {
      let head = upstream.head_commit().map_err(|e| match e {
        HostError::NotFound { .. } => no_latest(upstream, channel),
        other => other.into(),
      })?;
      match (release, commit) {
        (Some(release), Some(commit)) if commit.sha == head.sha => VersionRef::from_release(release.clone(), &commit),
        _ => VersionRef::from_commit(&head),
      }
    }
    _ => return Err(no_latest(upstream, channel)),
  };

  debug!(
    upstream = upstream.full_name(),
    %channel,
    version = %latest.version_label,
    commit = %latest.commit_id,
    is_release = latest.is_release,
    "resolved latest version"
  );

  let manifest = locate_config(upstream, addon_dir, &latest.commit_id, known_config)?;

  Ok(LatestResolution {
    latest,
    last_release,
    manifest,
  })
}

/// Find the add-on config at a commit, trying the known spelling first
pub fn locate_config(
  upstream: &dyn UpstreamRepo,
  addon_dir: &str,
  commit: &str,
  known: Option<ConfigFile>,
) -> MirrorResult<LoadedManifest> {
  let mut tried = Vec::new();

  for candidate in ConfigFile::candidates(known) {
    let path = config_path(addon_dir, candidate);
    match upstream.file_at(&path, commit) {
      Ok(content) => return LoadedManifest::parse(candidate, &content, &path),
      Err(e) if e.is_not_found() => tried.push(path),
      Err(e) => return Err(e.into()),
    }
  }

  Err(
    ResolutionError::ConfigNotFound {
      commit: commit.to_string(),
      tried,
    }
    .into(),
  )
}

/// Path of a config spelling inside the upstream repository
pub fn config_path(addon_dir: &str, file: ConfigFile) -> String {
  let dir = addon_dir.trim_matches('/');
  if dir.is_empty() || dir == "." {
    file.file_name().to_string()
  } else {
    format!("{}/{}", dir, file.file_name())
  }
}

/// Commit a release's tag points at
fn release_commit(upstream: &dyn UpstreamRepo, release: &Release) -> MirrorResult<HostCommit> {
  let tried = [release.tag_name.clone()];
  let object = upstream
    .find_tag(&release.tag_name)
    .map_err(|e| ref_error(e, &release.tag_name, &tried))?;
  let sha = peel_to_commit(upstream, object)?;
  upstream.commit(&sha).map_err(|e| ref_error(e, &release.tag_name, &tried))
}

/// Try each spelling in turn; only "not found" moves on to the next one
fn first_found<T>(version: &str, spellings: &[String], lookup: impl Fn(&str) -> HostResult<T>) -> MirrorResult<T> {
  for spelling in spellings {
    match lookup(spelling) {
      Ok(found) => return Ok(found),
      Err(e) if e.is_not_found() => debug!(spelling = %spelling, "reference not found"),
      Err(e) => return Err(e.into()),
    }
  }
  Err(
    ResolutionError::RefNotFound {
      version: version.to_string(),
      tried: spellings.to_vec(),
    }
    .into(),
  )
}

/// Follow annotated tag objects down to the commit they name
fn peel_to_commit(upstream: &dyn UpstreamRepo, mut object: GitObject) -> MirrorResult<String> {
  for _ in 0..MAX_TAG_DEPTH {
    match object.kind {
      ObjectKind::Commit => return Ok(object.sha),
      ObjectKind::Tag => object = upstream.peel_tag(&object.sha)?,
      ObjectKind::Other => {
        return Err(MirrorError::message(format!(
          "Tag object {} does not point at a commit",
          object.sha
        )));
      }
    }
  }
  Err(MirrorError::message(format!(
    "Tag chain deeper than {} levels at {}",
    MAX_TAG_DEPTH, object.sha
  )))
}

fn ref_error(err: HostError, version: &str, tried: &[String]) -> MirrorError {
  if err.is_not_found() {
    ResolutionError::RefNotFound {
      version: version.to_string(),
      tried: tried.to_vec(),
    }
    .into()
  } else {
    err.into()
  }
}

fn no_latest(upstream: &dyn UpstreamRepo, channel: Channel) -> MirrorError {
  ResolutionError::NoLatestVersion {
    upstream: upstream.full_name().to_string(),
    channel: channel.to_string(),
  }
  .into()
}
