//! Update command: plan by default, republish with `--apply`
//!
//! Each selected add-on runs end-to-end on its own rayon worker with its own
//! temporary clone. A failing add-on is reported and does not stop the others.

use crate::addon::detector::{AddonState, needs_update};
use crate::addon::resolver::ResolvedAddon;
use crate::changelog::{ChangelogComposer, MarkdownComposer, ProcessComposer, Synthesizer};
use crate::commands::{connect, resolve_addon, select_addons};
use crate::core::config::{AddonConfig, ComposerKind};
use crate::core::context::MirrorContext;
use crate::core::error::{MirrorError, MirrorResult};
use crate::core::vcs::{CommitHistory, LogQuery, SystemGit};
use crate::host::{Release, UpstreamRepo};
use crate::publish::readme::{JinjaRenderer, TemplateData, prepare_readme};
use crate::publish::{self, PublishReport};
use rayon::prelude::*;
use tempfile::TempDir;
use tracing::{debug, info};

/// Result of processing one add-on
#[derive(Debug)]
pub enum UpdateOutcome {
  /// Nothing to do
  UpToDate { version: String },
  /// Plan mode: an update would be applied
  Planned { from: Option<String>, to: String },
  /// Republished
  Updated {
    from: Option<String>,
    to: String,
    report: PublishReport,
  },
}

/// Run the update command
pub fn run_update(ctx: &MirrorContext, name: Option<String>, all: bool, force: bool, apply: bool) -> MirrorResult<()> {
  let addons = select_addons(ctx, name.as_deref(), all)?;

  if apply {
    println!("🚀 APPLY MODE - Republishing on channel '{}'\n", ctx.channel);
  } else {
    println!("🔍 PLAN MODE - No changes will be made");
    println!("   Add --apply to republish\n");
  }

  let results: Vec<(&AddonConfig, MirrorResult<UpdateOutcome>)> = addons
    .into_par_iter()
    .map(|addon| (addon, update_addon(ctx, addon, force, apply)))
    .collect();

  let mut failed = 0;
  for (addon, result) in &results {
    match result {
      Ok(outcome) => print_outcome(&addon.name, outcome),
      Err(e) => {
        failed += 1;
        println!("❌ {}: {}", addon.name, e);
        if let Some(help) = e.help_message() {
          println!("   💡 {}", help);
        }
      }
    }
  }

  if failed > 0 {
    let codes = results
      .iter()
      .filter_map(|(_, result)| result.as_ref().err().map(MirrorError::exit_code));
    return Err(MirrorError::partial(format!("{} add-on(s) failed to update", failed), codes));
  }

  if !apply && results.iter().any(|(_, r)| matches!(r, Ok(UpdateOutcome::Planned { .. }))) {
    println!("\n✋ To execute this plan, run:");
    match &name {
      Some(name) if !all => println!("   addon-mirror update {} --apply", name),
      _ => println!("   addon-mirror update --all --apply"),
    }
  }

  Ok(())
}

/// Resolve, and when due, clone, synthesize and publish one add-on
fn update_addon(ctx: &MirrorContext, addon: &AddonConfig, force: bool, apply: bool) -> MirrorResult<UpdateOutcome> {
  let upstream = connect(ctx, addon)?;
  let composer = composer_for(ctx.config.changelog.composer);
  update_with(ctx, addon, &upstream, composer.as_ref(), force, apply)
}

/// Composer selected by `[changelog] composer`
pub fn composer_for(kind: ComposerKind) -> Box<dyn ChangelogComposer> {
  match kind {
    ComposerKind::Builtin => Box::new(MarkdownComposer),
    ComposerKind::ChangelogUpdater => Box::new(ProcessComposer::default()),
  }
}

/// Resolve and, when due, republish one add-on against a given upstream and composer
pub fn update_with(
  ctx: &MirrorContext,
  addon: &AddonConfig,
  upstream: &dyn UpstreamRepo,
  composer: &dyn ChangelogComposer,
  force: bool,
  apply: bool,
) -> MirrorResult<UpdateOutcome> {
  let resolved = resolve_addon(ctx, addon, upstream)?;
  let from = resolved.state.current().map(|c| c.version_label.clone());
  let to = resolved.state.latest().version_label.clone();

  if !needs_update(&resolved.state, force) {
    debug!(addon = %addon.name, version = %to, "already up to date");
    return Ok(UpdateOutcome::UpToDate { version: to });
  }
  if !apply {
    return Ok(UpdateOutcome::Planned { from, to });
  }

  info!(addon = %addon.name, from = from.as_deref().unwrap_or("none"), %to, "updating");
  let report = republish(ctx, addon, upstream, composer, resolved)?;
  Ok(UpdateOutcome::Updated { from, to, report })
}

/// Clone at the latest commit, build every output in memory, then write
///
/// The target directory is untouched unless every step before
/// [`publish::publish`] succeeded.
pub fn republish(
  ctx: &MirrorContext,
  addon: &AddonConfig,
  upstream: &dyn UpstreamRepo,
  composer: &dyn ChangelogComposer,
  resolved: ResolvedAddon,
) -> MirrorResult<PublishReport> {
  let ResolvedAddon { state, manifest } = resolved;

  let workdir = TempDir::new()?;
  let clone = SystemGit::clone(&upstream.clone_url(), &workdir.path().join("addon"))?;
  clone.checkout(&state.latest().commit_id)?;
  debug!(addon = %addon.name, head = %clone.head_commit()?, "checked out upstream");

  let state = state.advance();
  let version = state.latest().version_label.clone();

  let target_dir = ctx.target_dir(&addon.target);
  let existing = publish::read_changelog(&target_dir)?;
  let synthesis = Synthesizer::new(upstream, &clone, composer, &addon.addon_dir).synthesize(
    &state,
    ctx.channel,
    existing.as_deref(),
  )?;

  let source_dir = clone.work_tree().join(&addon.addon_dir);
  let config = publish::prepare_config(&source_dir, &version, &addon.image)?;

  let date = publication_date(&state, &clone)?;
  let data = TemplateData::new(addon, &manifest.manifest, &state, ctx.channel, upstream, date);
  let readme = prepare_readme(&source_dir, &JinjaRenderer, &data)?;

  publish::publish(&source_dir, &target_dir, &config, readme.as_deref(), &synthesis)
}

/// Release date of the published version, else the date of its commit
fn publication_date(state: &AddonState, history: &dyn CommitHistory) -> MirrorResult<String> {
  if let Some(date) = state.latest().release.as_ref().and_then(Release::published_date) {
    return Ok(date);
  }
  let head = history.log(&LogQuery {
    max_count: Some(1),
    ..LogQuery::default()
  })?;
  Ok(head.into_iter().next().map(|entry| entry.date).unwrap_or_default())
}

fn print_outcome(name: &str, outcome: &UpdateOutcome) {
  match outcome {
    UpdateOutcome::UpToDate { version } => println!("✅ {}: up to date ({})", name, version),
    UpdateOutcome::Planned { from, to } => {
      println!("📋 {}: {} -> {}", name, from.as_deref().unwrap_or("not available"), to)
    }
    UpdateOutcome::Updated { from, to, report } => {
      println!("📦 {}: {} -> {}", name, from.as_deref().unwrap_or("not available"), to);
      println!("   Config: {}", report.config_file);
      if report.readme_rendered {
        println!("   README: rendered");
      }
      for (file, outcome) in &report.static_files {
        debug!(addon = name, file = %file, ?outcome, "static file");
      }
      let changelog = if report.changelog_written { "written" } else { "unchanged" };
      println!("   Changelog: {}", changelog);
    }
  }
}
