//! Core types and DTOs for checkpub.
//!
//! This crate defines the data transfer objects used throughout checkpub:
//! the inbound test-run report document, the repository tree and commit
//! shapes, and the check-run request that is posted to the host's checks
//! API.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Changed-file status that excludes a path from the commit path set.
pub const STATUS_REMOVED: &str = "removed";

// ============================================================================
// Severity and Check Levels
// ============================================================================

/// Test-outcome classification as reported by the framework adapter.
///
/// Ordering is presentation rank: `Notice < Failure < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Failure,
    Error,
}

/// Annotation level understood by the checks API.
///
/// `Error` outranks `Failure` for ordering purposes but serializes as
/// `"failure"`; the API has no error level of its own. `Warning` is unused
/// by the severity mapping and retained for rank consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckLevel {
    Notice,
    Warning,
    Failure,
    Error,
}

impl CheckLevel {
    /// Numeric rank used for descending-severity ordering.
    pub fn rank(&self) -> u8 {
        match self {
            CheckLevel::Notice => 1,
            CheckLevel::Warning => 2,
            CheckLevel::Failure => 3,
            CheckLevel::Error => 4,
        }
    }

    /// Name of the level on the wire.
    pub fn api_name(&self) -> &'static str {
        match self {
            CheckLevel::Notice => "notice",
            CheckLevel::Warning => "warning",
            CheckLevel::Failure | CheckLevel::Error => "failure",
        }
    }

    /// One-way mapping from the framework severity.
    pub fn from_severity(severity: Severity) -> CheckLevel {
        match severity {
            Severity::Notice => CheckLevel::Notice,
            Severity::Failure => CheckLevel::Failure,
            Severity::Error => CheckLevel::Error,
        }
    }
}

impl Serialize for CheckLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.api_name())
    }
}

impl<'de> Deserialize<'de> for CheckLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LevelVisitor;

        impl Visitor<'_> for LevelVisitor {
            type Value = CheckLevel;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("one of \"notice\", \"warning\", \"failure\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<CheckLevel, E> {
                match value {
                    "notice" => Ok(CheckLevel::Notice),
                    "warning" => Ok(CheckLevel::Warning),
                    "failure" => Ok(CheckLevel::Failure),
                    other => Err(E::unknown_variant(
                        other,
                        &["notice", "warning", "failure"],
                    )),
                }
            }
        }

        deserializer.deserialize_str(LevelVisitor)
    }
}

// ============================================================================
// Inbound Test Report Document
// ============================================================================

/// Authoritative result counts supplied by the framework adapter.
///
/// These are never recomputed from individual results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCounts {
    pub tests: u32,
    pub failures: u32,
    pub errors: u32,
    pub skipped: u32,
}

/// One file-anchored test result from the framework adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFileResult {
    /// Path as reported by the framework, possibly rooted differently
    /// than the repository tree.
    pub path: String,
    /// First line of the result range (1-indexed).
    pub start_line: u32,
    /// Last line of the result range (1-indexed).
    pub end_line: u32,
    /// Outcome severity.
    pub level: Severity,
    /// Name of the test that produced the result.
    pub test_name: String,
    /// Short human-readable message.
    pub message: String,
    /// Raw framework output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TestFileResult {
    /// Whether the details payload is present and not just whitespace.
    pub fn has_details(&self) -> bool {
        self.details
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

/// The inbound report document posted by a test-framework adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    /// Framework name, used as the check-run name.
    pub framework: String,
    /// Authoritative counts.
    pub counts: TestCounts,
    /// Comma-separated format tokens; blank means default formatting.
    #[serde(default)]
    pub format: String,
    /// Per-file results; may be empty when everything passed.
    #[serde(default)]
    pub results: Vec<TestFileResult>,
}

/// Rejection reasons for a structurally valid but unusable report document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("framework name is blank")]
    BlankFramework,
}

impl TestReport {
    /// Reject documents that cannot produce a meaningful check report.
    ///
    /// Runs before any resolution work begins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.framework.trim().is_empty() {
            return Err(ValidationError::BlankFramework);
        }
        Ok(())
    }
}

// ============================================================================
// Repository Shapes
// ============================================================================

/// Coordinates of the repository and commit the report applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoords {
    pub owner: String,
    pub repo: String,
    pub commit_sha: String,
}

/// One non-directory file in a commit's tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Forward-slash separated path as returned by the host.
    pub path: String,
    /// Content hash of the file.
    pub sha: String,
}

/// One path touched by the commit, with its change status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    /// "added", "removed", "modified", "renamed".
    pub status: String,
}

/// Commit detail needed to build a check report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Sha of the tree snapshot at this commit.
    pub tree_sha: String,
    /// Paths touched by the commit.
    pub changed: Vec<ChangedFile>,
}

impl CommitInfo {
    /// The set of paths considered part of the commit.
    ///
    /// Removed files are excluded: an annotation anchored to a deleted
    /// path cannot render.
    pub fn changed_path_set(&self) -> HashSet<String> {
        self.changed
            .iter()
            .filter(|file| file.status != STATUS_REMOVED)
            .map(|file| file.path.clone())
            .collect()
    }
}

// ============================================================================
// Check-Run Request
// ============================================================================

/// A line-range annotation anchored to a file in the commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(rename = "annotation_level")]
    pub level: CheckLevel,
    pub title: String,
    pub message: String,
    #[serde(rename = "raw_details", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Output block of a check run: title, summary, markdown text, annotations.
///
/// The counts are carried alongside for title/conclusion building but are
/// not part of the wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub text: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(skip)]
    pub test_count: u32,
    #[serde(skip)]
    pub failure_count: u32,
    #[serde(skip)]
    pub error_count: u32,
}

impl CheckRunOutput {
    /// Accumulate counts from a framework report.
    pub fn add_counts(&mut self, tests: u32, failures: u32, errors: u32) {
        self.test_count += tests;
        self.failure_count += failures;
        self.error_count += errors;
    }

    pub fn push_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Order annotations by descending level rank.
    ///
    /// The sort is stable: equal-rank annotations keep their input order.
    pub fn sort_annotations(&mut self) {
        self.annotations
            .sort_by(|a, b| b.level.rank().cmp(&a.level.rank()));
    }
}

/// Status of the check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

/// How the run concluded, once status is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
}

/// The full check-run document posted to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRunRequest {
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    pub conclusion: Conclusion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub output: CheckRunOutput,
}

impl CheckRunRequest {
    /// Build a completed check-run request, deriving the conclusion from
    /// the accumulated failure and error counts.
    pub fn new(
        name: String,
        head_sha: String,
        output: CheckRunOutput,
        completed_at: Option<String>,
    ) -> Self {
        let conclusion = if output.failure_count > 0 || output.error_count > 0 {
            Conclusion::Failure
        } else {
            Conclusion::Success
        };
        Self {
            name,
            head_sha,
            status: CheckStatus::Completed,
            conclusion,
            completed_at,
            output,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
