//! Application orchestration for checkpub.
//!
//! This crate assembles a check report from a test-run document and a
//! repository snapshot, then submits it through the `ChecksClient` port in
//! annotation batches no larger than the API cap:
//!
//! 1. Validate the inbound report document
//! 2. Fetch commit detail and build the commit path set
//! 3. Fetch the tree listing and index it
//! 4. Resolve and render each result (annotation or text block)
//! 5. Sort annotations, build the title, submit in capped batches
//!
//! Everything before submission is pure over its inputs; re-running the
//! assembler on the same inputs yields a byte-identical output.

use checkpub_domain::{Format, PathIndex};
use checkpub_ports::{ChecksClient, Clock};
use checkpub_render::{Rendered, TEXT_BLOCK_SEPARATOR, build_title, render_result};
use checkpub_types::{
    CheckRunOutput, CheckRunRequest, RepoCoords, TestReport, TreeEntry, ValidationError,
};
use std::collections::HashSet;
use thiserror::Error;

/// Hard per-request annotation cap imposed by the checks API.
pub const MAX_ANNOTATIONS_PER_REQUEST: usize = 50;

// ============================================================================
// Clock
// ============================================================================

/// System clock implementation that returns the actual current time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that abort a publish invocation.
///
/// Unresolved result paths are deliberately absent: they are recovered
/// locally (result dropped, diagnostic surfaced) and never fatal.
#[derive(Debug, Error)]
pub enum AppError {
    /// The report document is unusable; rejected before any resolution work.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Commit lookup through the client failed.
    #[error("commit lookup failed: {0}")]
    CommitFetch(String),

    /// Tree lookup through the client failed.
    #[error("tree lookup failed: {0}")]
    TreeFetch(String),

    /// A check-run post failed. Batches posted before the failure stay
    /// posted; the API has already durably recorded them.
    #[error("check submission failed: {0}")]
    Submission(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::MalformedInput(e.to_string())
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Result of assembling a check-run output.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The assembled output: title, summary, text body, sorted annotations.
    pub output: CheckRunOutput,
    /// Distinct result paths that matched nothing in the tree, in first
    /// encounter order. One entry per path regardless of how many results
    /// reported it.
    pub unresolved_paths: Vec<String>,
}

/// Assemble the check-run output for a report against a tree snapshot.
///
/// Counts come from the report document, authoritative, independent of how
/// many results were resolved or rendered.
pub fn build_output(
    report: &TestReport,
    tree: &[TreeEntry],
    commit_paths: &HashSet<String>,
    coords: &RepoCoords,
) -> BuildOutcome {
    let index = PathIndex::build(tree, commit_paths);
    let format = Format::parse(&report.format);

    let mut output = CheckRunOutput::default();
    let mut text = String::new();
    let mut bad_paths: HashSet<String> = HashSet::new();
    let mut unresolved_paths: Vec<String> = Vec::new();

    for result in &report.results {
        if bad_paths.contains(&result.path) {
            // one file can host many results; diagnose its path once
            continue;
        }
        let Some(file) = index.resolve(&result.path) else {
            bad_paths.insert(result.path.clone());
            unresolved_paths.push(result.path.clone());
            continue;
        };
        match render_result(result, file, &format, coords) {
            Rendered::Skip => {}
            Rendered::Annotation(annotation) => output.push_annotation(annotation),
            Rendered::TextBlock(block) => {
                if !text.is_empty() {
                    text.push_str(TEXT_BLOCK_SEPARATOR);
                }
                text.push_str(&block);
            }
        }
    }

    output.add_counts(
        report.counts.tests,
        report.counts.failures,
        report.counts.errors,
    );
    output.sort_annotations();

    let title = build_title(
        output.test_count,
        output.failure_count,
        output.error_count,
        report.counts.skipped,
    );
    output.summary = title.clone();
    output.title = title;
    output.text = text;

    BuildOutcome {
        output,
        unresolved_paths,
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Submit a check-run request, splitting oversized annotation sets.
///
/// Batches are strictly sequential and preserve the established sort
/// order; every sub-request carries the same title, summary, and text.
/// Returns the number of posts made. The first failed post aborts the
/// operation without rolling back earlier batches.
pub fn submit_batched(
    client: &dyn ChecksClient,
    request: &CheckRunRequest,
) -> Result<usize, AppError> {
    if request.output.annotations.len() < MAX_ANNOTATIONS_PER_REQUEST {
        client.post_check(request).map_err(AppError::Submission)?;
        return Ok(1);
    }

    let mut remaining = request.output.annotations.clone();
    let mut posted = 0;
    while remaining.len() > MAX_ANNOTATIONS_PER_REQUEST {
        let batch: Vec<_> = remaining.drain(..MAX_ANNOTATIONS_PER_REQUEST).collect();
        let sub_request = with_annotations(request, batch);
        client
            .post_check(&sub_request)
            .map_err(AppError::Submission)?;
        posted += 1;
    }

    let sub_request = with_annotations(request, remaining);
    client
        .post_check(&sub_request)
        .map_err(AppError::Submission)?;
    Ok(posted + 1)
}

fn with_annotations(
    request: &CheckRunRequest,
    annotations: Vec<checkpub_types::Annotation>,
) -> CheckRunRequest {
    let mut sub_request = request.clone();
    sub_request.output.annotations = annotations;
    sub_request
}

// ============================================================================
// Publish
// ============================================================================

/// Result of a full publish invocation.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// The assembled output, as posted.
    pub output: CheckRunOutput,
    /// Result paths that matched nothing in the tree.
    pub unresolved_paths: Vec<String>,
    /// Number of check-run posts made.
    pub batches_posted: usize,
}

/// Fetch commit and tree detail, assemble the check report, and submit it.
///
/// `check_name` overrides the check-run name; the framework name from the
/// report document is used when absent.
pub fn publish(
    client: &dyn ChecksClient,
    clock: &dyn Clock,
    report: &TestReport,
    coords: &RepoCoords,
    check_name: Option<&str>,
) -> Result<PublishOutcome, AppError> {
    let (request, unresolved_paths) = prepare(client, clock, report, coords, check_name)?;
    let batches_posted = submit_batched(client, &request)?;
    Ok(PublishOutcome {
        output: request.output,
        unresolved_paths,
        batches_posted,
    })
}

/// Fetch and assemble without submitting. Used by `publish` and by the
/// CLI's dry-run path.
pub fn prepare(
    client: &dyn ChecksClient,
    clock: &dyn Clock,
    report: &TestReport,
    coords: &RepoCoords,
    check_name: Option<&str>,
) -> Result<(CheckRunRequest, Vec<String>), AppError> {
    report.validate()?;

    let commit = client
        .fetch_commit(&coords.commit_sha)
        .map_err(AppError::CommitFetch)?;
    let commit_paths = commit.changed_path_set();
    let tree = client
        .fetch_tree(&commit.tree_sha)
        .map_err(AppError::TreeFetch)?;

    let outcome = build_output(report, &tree, &commit_paths, coords);
    let name = check_name.unwrap_or(&report.framework).to_string();
    let completed_at = clock.now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let request = CheckRunRequest::new(
        name,
        coords.commit_sha.clone(),
        outcome.output,
        Some(completed_at),
    );

    Ok((request, outcome.unresolved_paths))
}

// ============================================================================
// Tests
// ============================================================================
