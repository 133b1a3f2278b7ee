//! Error types for addon-mirror with contextual messages and exit codes
//!
//! Every fatal condition of an add-on run maps to one variant here. Absent
//! data (no published version, no prior release, no version bump) is never an
//! error and is modelled with `Option` by the engine instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for addon-mirror
///
/// Ordered by severity: a run with several failures exits with the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, network, I/O, external tools)
  System = 2,
  /// An add-on version could not be resolved
  Resolution = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for addon-mirror
#[derive(Debug)]
pub enum MirrorError {
  /// Configuration errors
  Config(ConfigError),

  /// Local git operation errors
  Git(GitError),

  /// Hosting platform API errors
  Host(HostError),

  /// Version resolution errors
  Resolution(ResolutionError),

  /// Changelog or README composition failures
  Compose(ComposeError),

  /// I/O errors
  Io(io::Error),

  /// Some add-ons of a multi-add-on run failed; each was reported already
  Partial { message: String, exit_code: ExitCode },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl MirrorError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    MirrorError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    MirrorError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Summarize per-add-on failures under the most severe of their exit codes
  pub fn partial(message: impl Into<String>, codes: impl IntoIterator<Item = ExitCode>) -> Self {
    MirrorError::Partial {
      message: message.into(),
      exit_code: codes.into_iter().max().unwrap_or(ExitCode::User),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      MirrorError::Message { message, context, help } => MirrorError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      MirrorError::Config(_) => ExitCode::User,
      MirrorError::Git(_) => ExitCode::System,
      MirrorError::Host(_) => ExitCode::System,
      MirrorError::Resolution(_) => ExitCode::Resolution,
      MirrorError::Compose(_) => ExitCode::System,
      MirrorError::Io(_) => ExitCode::System,
      MirrorError::Partial { exit_code, .. } => *exit_code,
      MirrorError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      MirrorError::Config(e) => e.help_message(),
      MirrorError::Git(e) => e.help_message(),
      MirrorError::Resolution(e) => e.help_message(),
      MirrorError::Compose(e) => e.help_message(),
      MirrorError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for MirrorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MirrorError::Config(e) => write!(f, "{}", e),
      MirrorError::Git(e) => write!(f, "{}", e),
      MirrorError::Host(e) => write!(f, "{}", e),
      MirrorError::Resolution(e) => write!(f, "{}", e),
      MirrorError::Compose(e) => write!(f, "{}", e),
      MirrorError::Io(e) => write!(f, "I/O error: {}", e),
      MirrorError::Partial { message, .. } => write!(f, "{}", message),
      MirrorError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for MirrorError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      MirrorError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for MirrorError {
  fn from(err: io::Error) -> Self {
    MirrorError::Io(err)
  }
}

impl From<String> for MirrorError {
  fn from(msg: String) -> Self {
    MirrorError::message(msg)
  }
}

impl From<&str> for MirrorError {
  fn from(msg: &str) -> Self {
    MirrorError::message(msg)
  }
}

impl From<ConfigError> for MirrorError {
  fn from(err: ConfigError) -> Self {
    MirrorError::Config(err)
  }
}

impl From<GitError> for MirrorError {
  fn from(err: GitError) -> Self {
    MirrorError::Git(err)
  }
}

impl From<HostError> for MirrorError {
  fn from(err: HostError) -> Self {
    MirrorError::Host(err)
  }
}

impl From<ResolutionError> for MirrorError {
  fn from(err: ResolutionError) -> Self {
    MirrorError::Resolution(err)
  }
}

impl From<ComposeError> for MirrorError {
  fn from(err: ComposeError) -> Self {
    MirrorError::Compose(err)
  }
}

impl From<toml_edit::de::Error> for MirrorError {
  fn from(err: toml_edit::de::Error) -> Self {
    MirrorError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for MirrorError {
  fn from(err: serde_json::Error) -> Self {
    MirrorError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for MirrorError {
  fn from(err: serde_yaml::Error) -> Self {
    MirrorError::message(format!("YAML error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for MirrorError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    MirrorError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// mirror.toml not found
  NotFound { repo_root: PathBuf },

  /// Missing or malformed required field
  InvalidField { field: String, reason: String },

  /// Add-on not found in configuration
  AddonNotFound { name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create a mirror.toml with at least one [[addons]] entry in the repository root.".to_string())
      }
      ConfigError::AddonNotFound { .. } => {
        Some("Configured add-ons can be listed with `addon-mirror status`.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { repo_root } => {
        write!(
          f,
          "No addon-mirror configuration found.\nExpected file: {}/mirror.toml",
          repo_root.display()
        )
      }
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid field in config: {} ({})", field, reason)
      }
      ConfigError::AddonNotFound { name } => {
        write!(f, "Add-on '{}' not found in configuration", name)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Clone failed
  CloneFailed { url: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run from inside the distribution repository or pass --repo: {}",
        path.display()
      )),
      GitError::CloneFailed { reason, .. } if reason.contains("not found") => {
        Some("Check the `upstream` value of this add-on in mirror.toml.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::CloneFailed { url, reason } => {
        write!(f, "Failed to clone {}: {}", url, reason)
      }
    }
  }
}

/// Hosting platform API errors
///
/// `NotFound` is kept distinct from other failures so lookups with fallbacks
/// (tag spellings, config file spellings) can move on to the next candidate.
#[derive(Debug)]
pub enum HostError {
  /// The requested object does not exist
  NotFound { resource: String },

  /// Transport-level failure
  Request { url: String, reason: String },

  /// Non-success HTTP status other than 404
  Status { url: String, status: u16, body: String },

  /// Response body could not be decoded
  Decode { url: String, reason: String },
}

impl HostError {
  /// True if the object is missing (as opposed to the request failing)
  pub fn is_not_found(&self) -> bool {
    matches!(self, HostError::NotFound { .. })
  }
}

impl fmt::Display for HostError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostError::NotFound { resource } => write!(f, "Not found on host: {}", resource),
      HostError::Request { url, reason } => write!(f, "Request to {} failed: {}", url, reason),
      HostError::Status { url, status, body } => write!(f, "{} returned HTTP {}: {}", url, status, body),
      HostError::Decode { url, reason } => write!(f, "Invalid response from {}: {}", url, reason),
    }
  }
}

impl From<reqwest::Error> for HostError {
  fn from(err: reqwest::Error) -> Self {
    let url = err.url().map(|u| u.to_string()).unwrap_or_default();
    if err.is_decode() {
      HostError::Decode {
        url,
        reason: err.to_string(),
      }
    } else {
      HostError::Request {
        url,
        reason: err.to_string(),
      }
    }
  }
}

/// Version resolution errors
#[derive(Debug)]
pub enum ResolutionError {
  /// The add-on has no published config in the distribution repository
  NotPublished { target: String },

  /// Neither spelling of a version reference exists upstream
  RefNotFound { version: String, tried: Vec<String> },

  /// No release qualified and the channel does not track commits
  NoLatestVersion { upstream: String, channel: String },

  /// The chosen commit carries no add-on config file
  ConfigNotFound { commit: String, tried: Vec<String> },

  /// The config file exists but cannot be used
  InvalidManifest { path: String, reason: String },
}

impl ResolutionError {
  /// True for the expected "nothing published yet" case
  pub fn is_absent(&self) -> bool {
    matches!(self, ResolutionError::NotPublished { .. })
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ResolutionError::RefNotFound { .. } => Some(
        "The published version no longer exists upstream. Fix the version in the published config or remove it to republish from scratch."
          .to_string(),
      ),
      ResolutionError::NoLatestVersion { .. } => {
        Some("Publish a release upstream or use --channel edge to track the default branch.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ResolutionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResolutionError::NotPublished { target } => {
        write!(f, "No published add-on configuration in '{}'", target)
      }
      ResolutionError::RefNotFound { version, tried } => {
        write!(f, "Version '{}' not found upstream (tried: {})", version, tried.join(", "))
      }
      ResolutionError::NoLatestVersion { upstream, channel } => {
        write!(f, "No version of {} qualifies for the {} channel", upstream, channel)
      }
      ResolutionError::ConfigNotFound { commit, tried } => {
        write!(
          f,
          "No add-on configuration at commit {} (tried: {})",
          commit,
          tried.join(", ")
        )
      }
      ResolutionError::InvalidManifest { path, reason } => {
        write!(f, "Invalid add-on configuration {}: {}", path, reason)
      }
    }
  }
}

/// Changelog and README composition failures
#[derive(Debug)]
pub enum ComposeError {
  /// The composition tool could not be started
  Spawn { program: String, reason: String },

  /// The composition tool exited unsuccessfully; `output` is verbatim
  Failed {
    program: String,
    status: Option<i32>,
    output: String,
  },

  /// A README template could not be rendered
  Template { template: String, reason: String },
}

impl ComposeError {
  fn help_message(&self) -> Option<String> {
    match self {
      ComposeError::Spawn { program, .. } => Some(format!(
        "Install `{}` or set `[changelog] composer = \"builtin\"` in mirror.toml.",
        program
      )),
      ComposeError::Template { template, .. } => {
        Some(format!("Fix the add-on's {} upstream; the previous README is kept.", template))
      }
      ComposeError::Failed { .. } => None,
    }
  }
}

impl fmt::Display for ComposeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ComposeError::Spawn { program, reason } => write!(f, "Failed to run {}: {}", program, reason),
      ComposeError::Failed {
        program,
        status,
        output,
      } => {
        match status {
          Some(code) => writeln!(f, "{} returned non-zero exit code: {}", program, code)?,
          None => writeln!(f, "{} was terminated by a signal", program)?,
        }
        write!(f, "{}", output)
      }
      ComposeError::Template { template, reason } => write!(f, "Failed to render {}: {}", template, reason),
    }
  }
}

/// Result type alias for addon-mirror
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> MirrorResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> MirrorResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<MirrorError>,
{
  fn context(self, ctx: impl Into<String>) -> MirrorResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> MirrorResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &MirrorError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
