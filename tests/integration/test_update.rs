//! Resolve-then-republish runs against a local upstream repository

use crate::helpers::*;
use addon_mirror::addon::channel::Channel;
use addon_mirror::addon::detector::AddonState;
use addon_mirror::addon::manifest::{ConfigFile, LoadedManifest};
use addon_mirror::addon::resolver::ResolvedAddon;
use addon_mirror::addon::version::VersionRef;
use addon_mirror::changelog::{ChangelogComposer, MARKER_BLOCK, MarkdownComposer, ReleaseEntry};
use addon_mirror::commands::update::{UpdateOutcome, republish, update_with};
use addon_mirror::core::config::MirrorConfig;
use addon_mirror::core::context::MirrorContext;
use addon_mirror::core::error::{ComposeError, ExitCode, HostError, MirrorError};
use addon_mirror::host::{GitObject, HostCommit, HostResult, ObjectKind, Release, UpstreamRepo};
use anyhow::Result;
use chrono::DateTime;
use std::fs;
use std::sync::Arc;

const MIRROR_TOML: &str = r#"
[[addons]]
name = "example"
target = "example"
upstream = "owner/addon"
addon_dir = "example"
image = "ghcr.io/owner/{arch}-example"
"#;

/// Upstream answering host queries from a local git repository
struct LocalUpstream<'a> {
  repo: &'a TestRepo,
  releases: Vec<Release>,
}

impl LocalUpstream<'_> {
  fn git_text(&self, args: &[&str], resource: &str) -> HostResult<String> {
    git(&self.repo.path, args)
      .map(|output| String::from_utf8_lossy(&output.stdout).trim_end().to_string())
      .map_err(|_| HostError::NotFound {
        resource: resource.to_string(),
      })
  }
}

impl UpstreamRepo for LocalUpstream<'_> {
  fn full_name(&self) -> &str {
    "owner/addon"
  }

  fn releases(&self) -> HostResult<Vec<Release>> {
    Ok(self.releases.clone())
  }

  fn find_tag(&self, name: &str) -> HostResult<GitObject> {
    let refname = format!("refs/tags/{}", name);
    let sha = self.git_text(&["rev-parse", "--verify", &refname], &refname)?;
    let kind = match self.git_text(&["cat-file", "-t", &sha], &sha)?.as_str() {
      "tag" => ObjectKind::Tag,
      "commit" => ObjectKind::Commit,
      _ => ObjectKind::Other,
    };
    Ok(GitObject { sha, kind })
  }

  fn peel_tag(&self, tag_sha: &str) -> HostResult<GitObject> {
    let sha = self.git_text(&["rev-parse", &format!("{}^{{commit}}", tag_sha)], tag_sha)?;
    Ok(GitObject {
      sha,
      kind: ObjectKind::Commit,
    })
  }

  fn commit(&self, reference: &str) -> HostResult<HostCommit> {
    let sha = self.git_text(
      &["rev-parse", "--verify", &format!("{}^{{commit}}", reference)],
      reference,
    )?;
    let message = self.git_text(&["log", "-1", "--format=%B", &sha], reference)?;
    Ok(HostCommit { sha, message })
  }

  fn head_commit(&self) -> HostResult<HostCommit> {
    self.commit("HEAD")
  }

  fn file_at(&self, path: &str, commit: &str) -> HostResult<Vec<u8>> {
    let spec = format!("{}:{}", commit, path);
    git(&self.repo.path, &["show", &spec])
      .map(|output| output.stdout)
      .map_err(|_| HostError::NotFound { resource: spec })
  }

  fn compare(&self, base: &str, head: &str) -> HostResult<Vec<HostCommit>> {
    let range = format!("{}..{}", base, head);
    let shas = self.git_text(&["log", "--reverse", "--format=%H", &range], &range)?;
    shas.lines().map(|sha| self.commit(sha)).collect()
  }

  fn clone_url(&self) -> String {
    self.repo.path.display().to_string()
  }

  fn html_url(&self) -> String {
    "https://example.invalid/owner/addon".to_string()
  }
}

/// Composer standing in for a failing external tool
struct FailingComposer;

impl ChangelogComposer for FailingComposer {
  fn compose(&self, _document: &str, _entry: &ReleaseEntry) -> Result<String, ComposeError> {
    Err(ComposeError::Failed {
      program: "changelog-updater".to_string(),
      status: Some(1),
      output: "boom".to_string(),
    })
  }
}

fn release(tag: &str, body: &str) -> Result<Release> {
  Ok(Release {
    tag_name: tag.to_string(),
    body: body.to_string(),
    published_at: Some(DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")?),
    prerelease: false,
    draft: false,
  })
}

fn context(dist: &TestRepo, channel: Channel) -> Result<MirrorContext> {
  Ok(MirrorContext {
    root: dist.path.clone(),
    config: Arc::new(MirrorConfig::parse(MIRROR_TOML)?),
    channel,
  })
}

/// Upstream with one released version of the add-on
fn released_upstream() -> Result<TestRepo> {
  let upstream = TestRepo::new()?;
  upstream.write(
    "example/config.yaml",
    "name: Example\nversion: dev\nslug: example\narch:\n- amd64\n- aarch64\n",
  )?;
  upstream.write("example/DOCS.md", "Documentation\n")?;
  upstream.write("example/README.md", "static readme\n")?;
  upstream.write(
    "example/.README.j2",
    "# {{ name }} {{ version }} ({{ date }})\n{% for arch in archs %}\n- {{ images[arch] }}\n{% endfor %}",
  )?;
  upstream.commit("Release 1.3.0")?;
  git(&upstream.path, &["tag", "v1.3.0"])?;
  Ok(upstream)
}

#[test]
fn test_update_republishes_then_reports_up_to_date() -> Result<()> {
  let upstream_repo = released_upstream()?;
  let upstream = LocalUpstream {
    repo: &upstream_repo,
    releases: vec![release("v1.3.0", "Fixed :bug:")?],
  };
  let dist = TestRepo::new()?;
  let ctx = context(&dist, Channel::Stable)?;
  let addon = ctx.config.find_addon("example")?;

  let outcome = update_with(&ctx, addon, &upstream, &MarkdownComposer, false, false)?;
  assert!(matches!(outcome, UpdateOutcome::Planned { from: None, ref to } if to == "1.3.0"));
  assert!(!dist.path.join("example").exists());

  let outcome = update_with(&ctx, addon, &upstream, &MarkdownComposer, false, true)?;
  let (from, to, report) = match outcome {
    UpdateOutcome::Updated { from, to, report } => (from, to, report),
    other => anyhow::bail!("expected an update, got {:?}", other),
  };
  assert_eq!(from, None);
  assert_eq!(to, "1.3.0");
  assert!(report.readme_rendered);
  assert!(report.changelog_written);

  let config = dist.read_file("example/config.yaml")?;
  assert!(config.starts_with("name: Example\nversion: 1.3.0\nslug: example\narch:\n- amd64\n- aarch64\nimage: "));
  assert!(config.contains("ghcr.io/owner/{arch}-example"));
  assert_eq!(dist.read_file("example/DOCS.md")?, "Documentation\n");
  assert_eq!(
    dist.read_file("example/README.md")?,
    "# Example v1.3.0 (2024-03-01)\n- ghcr.io/owner/amd64-example\n- ghcr.io/owner/aarch64-example\n"
  );
  assert_eq!(
    dist.read_file("example/CHANGELOG.md")?,
    format!("# Changelog\n\n## [1.3.0] - 2024-03-01\n\nFixed 🐛\n\n{}", MARKER_BLOCK)
  );

  let again = update_with(&ctx, addon, &upstream, &MarkdownComposer, false, true)?;
  assert!(matches!(again, UpdateOutcome::UpToDate { ref version } if version == "1.3.0"));

  Ok(())
}

#[test]
fn test_composer_failure_leaves_target_untouched() -> Result<()> {
  let upstream_repo = released_upstream()?;
  let upstream = LocalUpstream {
    repo: &upstream_repo,
    releases: vec![release("v1.3.0", "Fixed")?],
  };
  let dist = TestRepo::new()?;
  dist.write("example/DOCS.md", "old docs\n")?;
  let ctx = context(&dist, Channel::Stable)?;
  let addon = ctx.config.find_addon("example")?;

  let err = update_with(&ctx, addon, &upstream, &FailingComposer, false, true).unwrap_err();
  assert!(matches!(err, MirrorError::Compose(ComposeError::Failed { .. })));
  assert_eq!(err.exit_code(), ExitCode::System);

  assert_eq!(dist.read_file("example/DOCS.md")?, "old docs\n");
  assert!(!dist.path.join("example/config.yaml").exists());
  assert!(!dist.path.join("example/README.md").exists());
  assert!(!dist.path.join("example/CHANGELOG.md").exists());

  Ok(())
}

#[test]
fn test_missing_config_in_clone_leaves_target_untouched() -> Result<()> {
  let upstream_repo = TestRepo::new()?;
  upstream_repo.write("other/config.yaml", "name: Other\nslug: other\n")?;
  let head = upstream_repo.commit("Unrelated add-on")?;
  let upstream = LocalUpstream {
    repo: &upstream_repo,
    releases: Vec::new(),
  };

  let dist = TestRepo::new()?;
  dist.write("example/DOCS.md", "old docs\n")?;
  let ctx = context(&dist, Channel::Edge)?;
  let addon = ctx.config.find_addon("example")?;

  let latest = VersionRef::from_commit(&upstream.commit(&head).map_err(MirrorError::from)?);
  let resolved = ResolvedAddon {
    state: AddonState::new(None, latest, None, true),
    manifest: LoadedManifest::parse(ConfigFile::Yaml, b"name: Example\nslug: example\n", "config.yaml")?,
  };

  let err = republish(&ctx, addon, &upstream, &MarkdownComposer, resolved).unwrap_err();
  assert_eq!(err.exit_code(), ExitCode::Resolution);

  let entries: Vec<String> = fs::read_dir(dist.path.join("example"))?
    .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
    .collect::<std::io::Result<_>>()?;
  assert_eq!(entries, vec!["DOCS.md"]);
  assert_eq!(dist.read_file("example/DOCS.md")?, "old docs\n");

  Ok(())
}
