//! Update detection over a resolved current/latest pair

use crate::addon::version::VersionRef;
use crate::host::Release;

/// Version state of one add-on for one run
///
/// Built once after resolution. `up_to_date` is the discovery-time verdict
/// (`force = false`) and is carried unchanged through [`AddonState::advance`].
#[derive(Debug, Clone)]
pub struct AddonState {
  current: Option<VersionRef>,
  latest: VersionRef,
  last_release: Option<Release>,
  updating: bool,
  up_to_date: bool,
}

impl AddonState {
  pub fn new(current: Option<VersionRef>, latest: VersionRef, last_release: Option<Release>, updating: bool) -> Self {
    let mut state = Self {
      current,
      latest,
      last_release,
      updating,
      up_to_date: true,
    };
    state.up_to_date = !needs_update(&state, false);
    state
  }

  /// What is published now; `None` when nothing is published
  pub fn current(&self) -> Option<&VersionRef> {
    self.current.as_ref()
  }

  /// What upstream offers on this channel
  pub fn latest(&self) -> &VersionRef {
    &self.latest
  }

  /// Newest release admitted by the channel, even when edge chose a commit
  pub fn last_release(&self) -> Option<&Release> {
    self.last_release.as_ref()
  }

  pub fn is_updating(&self) -> bool {
    self.updating
  }

  pub fn up_to_date(&self) -> bool {
    self.up_to_date
  }

  /// Replace `current` with `latest`; the discovery verdict is kept
  pub fn advance(self) -> Self {
    Self {
      current: Some(self.latest.clone()),
      ..self
    }
  }
}

/// Whether the add-on must be republished
///
/// Labels and commits are both compared: two commits can share a label after
/// a repository transfer or rebase and must still count as different.
pub fn needs_update(state: &AddonState, force: bool) -> bool {
  if !state.updating {
    return false;
  }
  if force {
    return true;
  }
  match &state.current {
    None => true,
    Some(current) => {
      current.version_label != state.latest.version_label || current.commit_id != state.latest.commit_id
    }
  }
}
