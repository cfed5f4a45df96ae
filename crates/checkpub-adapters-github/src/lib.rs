//! GitHub-backed `ChecksClient` adapter.
//!
//! Talks to the commits, git-trees, and check-runs endpoints of the GitHub
//! REST API (or a GitHub Enterprise host via a custom API base). The
//! caller supplies a ready-to-use access token; minting one (app keys,
//! installation tokens) is the identity layer outside this crate.

use checkpub_ports::ChecksClient;
use checkpub_types::{ChangedFile, CheckRunRequest, CommitInfo, TreeEntry};
use serde::Deserialize;
use std::time::Duration;

/// Default API base for github.com.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github.v3+json";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Tree node type for directories; everything else is indexed.
const TREE_TYPE: &str = "tree";

/// HTTP client for one repository.
pub struct GithubChecksClient {
    agent: ureq::Agent,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubChecksClient {
    /// Build a client against the default API base.
    pub fn new(owner: &str, repo: &str, token: &str) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, owner, repo, token)
    }

    /// Build a client against a custom API base (Enterprise hosts).
    pub fn with_api_base(api_base: &str, owner: &str, repo: &str, token: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, tail
        )
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, op: &str) -> Result<T, String> {
        let mut response = self
            .agent
            .get(url)
            .header("Accept", ACCEPT)
            .header("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|e| format!("{op} request failed: {e}"))?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| format!("{op} response did not parse: {e}"))
    }
}

impl ChecksClient for GithubChecksClient {
    fn fetch_commit(&self, commit_sha: &str) -> Result<CommitInfo, String> {
        let url = self.repo_url(&format!("commits/{commit_sha}"));
        let dto: CommitDto = self.get_json(&url, "commit-info")?;
        Ok(commit_from_dto(dto))
    }

    fn fetch_tree(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, String> {
        let url = self.repo_url(&format!("git/trees/{tree_sha}?recursive=1"));
        let dto: TreeListingDto = self.get_json(&url, "tree")?;
        Ok(tree_from_dto(dto))
    }

    fn post_check(&self, request: &CheckRunRequest) -> Result<(), String> {
        let url = self.repo_url("check-runs");
        self.agent
            .post(&url)
            .header("Accept", ACCEPT)
            .header("Authorization", &format!("Bearer {}", self.token))
            .send_json(request)
            .map_err(|e| format!("check-runs request failed: {e}"))?;
        Ok(())
    }
}

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
struct CommitDto {
    commit: CommitDetailDto,
    #[serde(default)]
    files: Vec<ChangedFileDto>,
}

#[derive(Debug, Deserialize)]
struct CommitDetailDto {
    tree: TreeRefDto,
}

#[derive(Debug, Deserialize)]
struct TreeRefDto {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ChangedFileDto {
    filename: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct TreeListingDto {
    #[serde(default)]
    tree: Vec<TreeNodeDto>,
}

#[derive(Debug, Deserialize)]
struct TreeNodeDto {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

fn commit_from_dto(dto: CommitDto) -> CommitInfo {
    CommitInfo {
        tree_sha: dto.commit.tree.sha,
        changed: dto
            .files
            .into_iter()
            .map(|file| ChangedFile {
                path: file.filename,
                status: file.status,
            })
            .collect(),
    }
}

fn tree_from_dto(dto: TreeListingDto) -> Vec<TreeEntry> {
    dto.tree
        .into_iter()
        .filter(|node| node.kind != TREE_TYPE)
        .map(|node| TreeEntry {
            path: node.path,
            sha: node.sha,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
