//! Republishing from a checked-out upstream into a target directory

use crate::helpers::*;
use addon_mirror::changelog::{ChangelogDocument, Synthesis};
use addon_mirror::core::vcs::SystemGit;
use addon_mirror::publish::files::StaticOutcome;
use addon_mirror::publish::{prepare_config, publish, read_changelog};
use anyhow::Result;

#[test]
fn test_publish_from_clone() -> Result<()> {
  let upstream = TestRepo::new()?;
  upstream.write(
    "example/config.yaml",
    "name: Example\nversion: dev\nslug: example\nimage: local/example\narch:\n- amd64\n",
  )?;
  upstream.write("example/README.md", "# Example\n")?;
  upstream.write("example/translations/en.yaml", "configuration: {}\n")?;
  let sha = upstream.commit("Add add-on")?;

  let dist = TestRepo::new()?;
  dist.write("example/config.json", "{}")?;
  dist.write("example/logo.png", "stale")?;
  dist.commit("Old publication")?;

  let workdir = tempfile::TempDir::new()?;
  let clone = SystemGit::clone(&upstream.path.display().to_string(), &workdir.path().join("addon"))?;
  clone.checkout(&sha)?;
  let source = clone.work_tree().join("example");
  let target = dist.path.join("example");

  let config = prepare_config(&source, "1.3.0", "ghcr.io/owner/example")?;
  let changelog = Synthesis::Write(ChangelogDocument {
    text: "# Changelog\n\n## Unreleased changes\n\n- Add add-on\n".to_string(),
    entries: Vec::new(),
  });
  let report = publish(&source, &target, &config, None, &changelog)?;

  assert_eq!(report.config_file, "config.yaml");
  assert!(!target.join("config.json").exists());
  assert_eq!(
    dist.read_file("example/config.yaml")?,
    "name: Example\nversion: 1.3.0\nslug: example\nimage: ghcr.io/owner/example\narch:\n- amd64\n"
  );
  assert_eq!(dist.read_file("example/README.md")?, "# Example\n");
  assert!(target.join("translations/en.yaml").is_file());
  assert!(!target.join("logo.png").exists());
  assert!(
    report
      .static_files
      .contains(&("logo.png".to_string(), StaticOutcome::Removed))
  );
  assert_eq!(
    read_changelog(&target)?.as_deref(),
    Some("# Changelog\n\n## Unreleased changes\n\n- Add add-on\n")
  );

  Ok(())
}
