//! GitHub REST API implementation of [`UpstreamRepo`]
//!
//! Uses the blocking reqwest client: the resolution engine is synchronous and
//! each add-on runs on its own rayon worker.

use super::{GitObject, HostCommit, HostResult, ObjectKind, Release, UpstreamRepo};
use crate::core::error::HostError;
use chrono::{DateTime, FixedOffset};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Releases requested per page (API maximum)
const PER_PAGE: usize = 100;

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";

#[derive(Debug, Deserialize)]
struct ReleaseDto {
  tag_name: String,
  body: Option<String>,
  published_at: Option<DateTime<FixedOffset>>,
  prerelease: bool,
  draft: bool,
}

impl From<ReleaseDto> for Release {
  fn from(dto: ReleaseDto) -> Self {
    Release {
      tag_name: dto.tag_name,
      body: dto.body.unwrap_or_default(),
      published_at: dto.published_at,
      prerelease: dto.prerelease,
      draft: dto.draft,
    }
  }
}

#[derive(Debug, Deserialize)]
struct RefDto {
  object: ObjectDto,
}

#[derive(Debug, Deserialize)]
struct ObjectDto {
  sha: String,
  #[serde(rename = "type")]
  kind: String,
}

impl From<ObjectDto> for GitObject {
  fn from(dto: ObjectDto) -> Self {
    let kind = match dto.kind.as_str() {
      "commit" => ObjectKind::Commit,
      "tag" => ObjectKind::Tag,
      _ => ObjectKind::Other,
    };
    GitObject { sha: dto.sha, kind }
  }
}

#[derive(Debug, Deserialize)]
struct CommitDto {
  sha: String,
  commit: CommitDetailDto,
}

#[derive(Debug, Deserialize)]
struct CommitDetailDto {
  message: String,
}

impl From<CommitDto> for HostCommit {
  fn from(dto: CommitDto) -> Self {
    HostCommit {
      sha: dto.sha,
      message: dto.commit.message,
    }
  }
}

#[derive(Debug, Deserialize)]
struct CompareDto {
  commits: Vec<CommitDto>,
}

/// One GitHub repository accessed over the REST API
pub struct GitHubRepo {
  client: Client,
  api_url: String,
  full_name: String,
}

impl GitHubRepo {
  /// Create a client for `owner/name` against `api_url`
  pub fn new(api_url: &str, full_name: &str) -> HostResult<Self> {
    let client = Client::builder()
      .user_agent(concat!("addon-mirror/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(30))
      .build()?;

    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_string(),
      full_name: full_name.to_string(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/repos/{}/{}", self.api_url, self.full_name, path)
  }

  /// GET a repository endpoint, mapping 404 to `HostError::NotFound`
  fn get(&self, path: &str, accept: &str, resource: &str) -> HostResult<Response> {
    let url = self.url(path);
    debug!(%url, "GET");
    let response = self.client.get(&url).header("Accept", accept).send()?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(HostError::NotFound {
        resource: format!("{} in {}", resource, self.full_name),
      });
    }
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      return Err(HostError::Status {
        url,
        status: status.as_u16(),
        body,
      });
    }

    Ok(response)
  }

  fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> HostResult<T> {
    let response = self.get(path, ACCEPT_JSON, resource)?;
    let url = response.url().to_string();
    response.json::<T>().map_err(|e| HostError::Decode {
      url,
      reason: e.to_string(),
    })
  }
}

impl UpstreamRepo for GitHubRepo {
  fn full_name(&self) -> &str {
    &self.full_name
  }

  fn releases(&self) -> HostResult<Vec<Release>> {
    let mut releases = Vec::new();
    for page in 1.. {
      let batch: Vec<ReleaseDto> =
        self.get_json(&format!("releases?per_page={}&page={}", PER_PAGE, page), "releases")?;
      let len = batch.len();
      releases.extend(batch.into_iter().map(Release::from));
      if len < PER_PAGE {
        break;
      }
    }
    Ok(releases)
  }

  fn find_tag(&self, name: &str) -> HostResult<GitObject> {
    let found: RefDto = self.get_json(&format!("git/ref/tags/{}", name), &format!("tag {}", name))?;
    Ok(found.object.into())
  }

  fn peel_tag(&self, tag_sha: &str) -> HostResult<GitObject> {
    let tag: RefDto = self.get_json(&format!("git/tags/{}", tag_sha), &format!("tag object {}", tag_sha))?;
    Ok(tag.object.into())
  }

  fn commit(&self, reference: &str) -> HostResult<HostCommit> {
    let resource = format!("commit {}", reference);
    match self.get_json::<CommitDto>(&format!("commits/{}", reference), &resource) {
      // GitHub answers 422 for refs that do not name a commit
      Err(HostError::Status { status: 422, .. }) => Err(HostError::NotFound { resource }),
      other => other.map(HostCommit::from),
    }
  }

  fn head_commit(&self) -> HostResult<HostCommit> {
    let mut commits: Vec<CommitDto> = self.get_json("commits?per_page=1", "default branch commits")?;
    if commits.is_empty() {
      return Err(HostError::NotFound {
        resource: format!("commits on the default branch of {}", self.full_name),
      });
    }
    Ok(commits.swap_remove(0).into())
  }

  fn file_at(&self, path: &str, commit: &str) -> HostResult<Vec<u8>> {
    let response = self.get(
      &format!("contents/{}?ref={}", path, commit),
      ACCEPT_RAW,
      &format!("{} at {}", path, commit),
    )?;
    Ok(response.bytes()?.to_vec())
  }

  fn compare(&self, base: &str, head: &str) -> HostResult<Vec<HostCommit>> {
    let comparison: CompareDto =
      self.get_json(&format!("compare/{}...{}", base, head), &format!("{}...{}", base, head))?;
    Ok(comparison.commits.into_iter().map(HostCommit::from).collect())
  }

  fn clone_url(&self) -> String {
    format!("https://github.com/{}.git", self.full_name)
  }

  fn html_url(&self) -> String {
    // GitHub Enterprise serves the API under `<host>/api/v3`
    let web = match self.api_url.strip_suffix("/api/v3") {
      Some(host) => host.to_string(),
      None => self.api_url.replacen("://api.", "://", 1),
    };
    format!("{}/{}", web, self.full_name)
  }
}
