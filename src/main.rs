use addon_mirror::addon::channel::Channel;
use addon_mirror::commands;
use addon_mirror::core::context::MirrorContext;
use addon_mirror::core::error::{MirrorError, print_error};
use addon_mirror::core::logging::{init_tracing, level_for};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mirror add-on repositories into a distribution repository
#[derive(Parser)]
#[command(name = "addon-mirror")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Release channel (default: mirror.toml `channel`, else stable)
  #[arg(long, global = true)]
  channel: Option<Channel>,

  /// Distribution repository (default: current directory)
  #[arg(short = 'C', long = "repo", global = true)]
  repo: Option<PathBuf>,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Emit diagnostic logs as JSON lines on stderr
  #[arg(long, global = true)]
  json_logs: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show current and latest version of every configured add-on
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Republish add-ons whose upstream moved
  Update {
    /// Name of the add-on to update
    name: Option<String>,
    /// Update all configured add-ons
    #[arg(short, long)]
    all: bool,
    /// Republish even when already up to date
    #[arg(long)]
    force: bool,
    /// Actually write files (default: show the plan)
    #[arg(long)]
    apply: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.json_logs, level_for(cli.verbose));

  let repo = match cli.repo {
    Some(path) => path,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(MirrorError::from(e).context("Failed to get current directory")),
    },
  };

  // Build context once (repository root, mirror.toml, channel)
  let ctx = match MirrorContext::build(&repo, cli.channel) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Status { json } => commands::run_status(&ctx, json),
    Commands::Update {
      name,
      all,
      force,
      apply,
    } => commands::run_update(&ctx, name, all, force, apply),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: MirrorError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
