use crate::addon::detector::needs_update;
use crate::addon::version::VersionRef;
use crate::commands::{connect, resolve_addon};
use crate::core::context::MirrorContext;
use crate::core::error::{ExitCode, MirrorError, MirrorResult};
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

/// Status of one configured add-on
#[derive(Debug, Clone, Serialize)]
pub struct AddonStatus {
  pub name: String,
  pub upstream: String,
  pub channel: String,
  /// `None` when nothing is published yet
  pub current: Option<VersionRef>,
  pub latest: Option<VersionRef>,
  pub up_to_date: bool,
  /// Resolution failure, if any
  pub error: Option<String>,
  #[serde(skip)]
  pub exit_code: Option<ExitCode>,
}

/// Run the status command
pub fn run_status(ctx: &MirrorContext, json: bool) -> MirrorResult<()> {
  if !json {
    println!(
      "📦 {} add-on(s) on channel '{}'\n",
      ctx.config.addons.len(),
      ctx.channel
    );
  }

  let statuses: Vec<AddonStatus> = ctx
    .config
    .addons
    .par_iter()
    .map(|addon| {
      let base = AddonStatus {
        name: addon.name.clone(),
        upstream: addon.upstream.clone(),
        channel: ctx.channel.to_string(),
        current: None,
        latest: None,
        up_to_date: false,
        error: None,
        exit_code: None,
      };
      match connect(ctx, addon).and_then(|upstream| resolve_addon(ctx, addon, &upstream)) {
        Ok(resolved) => AddonStatus {
          current: resolved.state.current().cloned(),
          latest: Some(resolved.state.latest().clone()),
          up_to_date: !needs_update(&resolved.state, false),
          ..base
        },
        Err(e) => {
          warn!(addon = %addon.name, error = %e, "resolution failed");
          AddonStatus {
            error: Some(e.to_string()),
            exit_code: Some(e.exit_code()),
            ..base
          }
        }
      }
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&statuses)?);
  } else {
    for status in &statuses {
      print_status(status);
    }
  }

  let codes: Vec<ExitCode> = statuses.iter().filter_map(|s| s.exit_code).collect();
  if !codes.is_empty() {
    return Err(MirrorError::partial(
      format!("{} add-on(s) could not be resolved", codes.len()),
      codes,
    ));
  }
  Ok(())
}

fn print_status(status: &AddonStatus) {
  println!("📦 {} ({})", status.name, status.upstream);

  if let Some(error) = &status.error {
    println!("   ❌ {}\n", error);
    return;
  }

  match &status.current {
    Some(current) => println!("   Current: {} ({})", current.version_label, current.short_commit()),
    None => println!("   Current: Not available"),
  }
  if let Some(latest) = &status.latest {
    let kind = if latest.is_release { "release" } else { "commit" };
    println!("   Latest:  {} ({}, {})", latest.version_label, latest.short_commit(), kind);
  }

  if status.up_to_date {
    println!("   ✅ Up to date\n");
  } else {
    println!("   ⚠️  Update available\n");
  }
}
