//! Shared port traits for checkpub's hexagonal architecture.
//!
//! The identity and transport layer behind these traits (token handling,
//! HTTP calls) is deliberately outside the core; report generation depends
//! only on the shapes exchanged here.

use checkpub_types::{CheckRunRequest, CommitInfo, TreeEntry};

/// Port for talking to the host's commits, trees, and checks APIs.
///
/// Errors carry the last known status detail as text; the application
/// layer wraps them into its own taxonomy. Implementations perform no
/// retries; retry policy, if any, belongs behind this boundary.
pub trait ChecksClient {
    /// Fetch commit detail: its tree sha and the set of touched paths.
    fn fetch_commit(&self, commit_sha: &str) -> Result<CommitInfo, String>;

    /// Fetch the recursive tree listing, directories already discarded.
    fn fetch_tree(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, String>;

    /// Post one check-run request. Called once per annotation batch.
    fn post_check(&self, request: &CheckRunRequest) -> Result<(), String>;
}

/// Port for obtaining the current UTC time.
pub trait Clock {
    /// Returns the current time in UTC.
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}
