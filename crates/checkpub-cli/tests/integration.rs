//! Integration tests for the checkpub CLI.
//!
//! These tests exercise the CLI as a subprocess with on-disk fixtures,
//! verifying exit codes, stdout/stderr content, and written files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the checkpub binary.
fn checkpub() -> Command {
    Command::new(env!("CARGO_BIN_EXE_checkpub"))
}

/// A report with one failure in a file the framework roots differently
/// than the repository tree.
const REPORT_JSON: &str = r#"{
    "framework": "surefire",
    "counts": {"tests": 3, "failures": 1, "errors": 0, "skipped": 0},
    "format": "",
    "results": [{
        "path": "src/main/java/com/x/Widget.java",
        "startLine": 17,
        "endLine": 17,
        "level": "failure",
        "testName": "testWidget",
        "message": "expected <1> but was <2>",
        "details": "stack\ntrace"
    }]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("report.json"), REPORT_JSON).expect("write report");
        fs::write(
            dir.path().join("tree.txt"),
            "com/x/Widget.java\tabc1\ncom/x/Other.java\tabc2\n# a comment\n",
        )
        .expect("write tree");
        fs::write(dir.path().join("changed.txt"), "com/x/Widget.java\n").expect("write changed");
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    checkpub()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_version_displays_version() {
    checkpub()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("checkpub"));
}

#[test]
fn test_render_help_displays_options() {
    checkpub()
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--report"))
        .stdout(predicate::str::contains("--tree"))
        .stdout(predicate::str::contains("--changed"))
        .stdout(predicate::str::contains("--request-out"));
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_accepts_good_report() {
    let fixture = Fixture::new();
    checkpub()
        .args(["validate", "--report", &fixture.path("report.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("report ok: surefire (1 results)"));
}

#[test]
fn test_validate_rejects_blank_framework_with_exit_2() {
    let fixture = Fixture::new();
    fs::write(
        fixture.dir.path().join("bad.json"),
        r#"{"framework": " ", "counts": {"tests": 0, "failures": 0, "errors": 0, "skipped": 0}}"#,
    )
    .expect("write bad report");

    checkpub()
        .args(["validate", "--report", &fixture.path("bad.json")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("framework name is blank"));
}

#[test]
fn test_validate_rejects_unparseable_json_with_exit_2() {
    let fixture = Fixture::new();
    fs::write(fixture.dir.path().join("garbage.json"), "{not json").expect("write garbage");

    checkpub()
        .args(["validate", "--report", &fixture.path("garbage.json")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("did not parse"));
}

#[test]
fn test_validate_reads_stdin() {
    checkpub()
        .args(["validate", "--report", "-"])
        .write_stdin(REPORT_JSON)
        .assert()
        .success();
}

#[test]
fn test_missing_report_file_fails() {
    checkpub()
        .args(["validate", "--report", "/nonexistent/report.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

// ============================================================================
// Render Tests
// ============================================================================

#[test]
fn test_render_out_of_commit_produces_text_block() {
    let fixture = Fixture::new();
    checkpub()
        .args([
            "render",
            "--report",
            &fixture.path("report.json"),
            "--tree",
            &fixture.path("tree.txt"),
            "--owner",
            "owner",
            "--repo",
            "repo",
            "--sha",
            "abc123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 tests, 1 failure"))
        .stdout(predicate::str::contains(
            "https://github.com/owner/repo/blob/abc123/com/x/Widget.java#L17",
        ))
        .stdout(predicate::str::contains("expected &lt;1&gt; but was &lt;2&gt;"));
}

#[test]
fn test_render_in_commit_produces_annotation() {
    let fixture = Fixture::new();
    let request_out = fixture.path("request.json");

    checkpub()
        .args([
            "render",
            "--report",
            &fixture.path("report.json"),
            "--tree",
            &fixture.path("tree.txt"),
            "--changed",
            &fixture.path("changed.txt"),
            "--owner",
            "owner",
            "--repo",
            "repo",
            "--sha",
            "abc123",
            "--request-out",
            &request_out,
        ])
        .assert()
        .success();

    let written = fs::read_to_string(&request_out).expect("request file written");
    let request: serde_json::Value = serde_json::from_str(&written).expect("request parses");
    assert_eq!(request["name"], "surefire");
    assert_eq!(request["head_sha"], "abc123");
    assert_eq!(request["conclusion"], "failure");

    let annotations = request["output"]["annotations"]
        .as_array()
        .expect("annotations array");
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["path"], "com/x/Widget.java");
    assert_eq!(annotations[0]["start_line"], 17);
    assert_eq!(annotations[0]["annotation_level"], "failure");
    assert_eq!(annotations[0]["title"], "testWidget");
    // structured fields stay unescaped
    assert_eq!(annotations[0]["message"], "expected <1> but was <2>");
    assert_eq!(request["output"]["text"], "");
}

#[test]
fn test_render_warns_on_unresolved_path() {
    let fixture = Fixture::new();
    fs::write(fixture.dir.path().join("empty-tree.txt"), "other/File.java\n")
        .expect("write tree");

    checkpub()
        .args([
            "render",
            "--report",
            &fixture.path("report.json"),
            "--tree",
            &fixture.path("empty-tree.txt"),
            "--owner",
            "owner",
            "--repo",
            "repo",
            "--sha",
            "abc123",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "could not locate file associated with test path",
        ))
        .stdout(predicate::str::contains("3 tests, 1 failure"));
}

#[test]
fn test_render_format_flag_overrides_document() {
    let fixture = Fixture::new();
    checkpub()
        .args([
            "render",
            "--report",
            &fixture.path("report.json"),
            "--tree",
            &fixture.path("tree.txt"),
            "--owner",
            "owner",
            "--repo",
            "repo",
            "--sha",
            "abc123",
            "--format",
            "nodetails",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("#L17").not());
}

// ============================================================================
// Publish Tests (no network: argument plumbing only)
// ============================================================================

#[test]
fn test_publish_requires_owner() {
    let fixture = Fixture::new();
    checkpub()
        .current_dir(fixture.dir.path())
        .env("GITHUB_TOKEN", "tok")
        .args([
            "publish",
            "--report",
            &fixture.path("report.json"),
            "--sha",
            "abc123",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("owner is required"));
}

#[test]
fn test_publish_requires_token_env() {
    let fixture = Fixture::new();
    checkpub()
        .current_dir(fixture.dir.path())
        .env_remove("GITHUB_TOKEN")
        .args([
            "publish",
            "--report",
            &fixture.path("report.json"),
            "--owner",
            "owner",
            "--repo",
            "repo",
            "--sha",
            "abc123",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GITHUB_TOKEN is not set"));
}

#[test]
fn test_publish_reads_config_file() {
    let fixture = Fixture::new();
    fs::write(
        fixture.dir.path().join("checkpub.toml"),
        "[github]\nowner = \"cfg-owner\"\nrepo = \"cfg-repo\"\ntoken_env = \"MISSING_TOKEN_VAR\"\n",
    )
    .expect("write config");

    // config resolves owner/repo, so the failure moves on to the token
    checkpub()
        .current_dir(fixture.dir.path())
        .env_remove("MISSING_TOKEN_VAR")
        .args([
            "publish",
            "--report",
            &fixture.path("report.json"),
            "--sha",
            "abc123",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MISSING_TOKEN_VAR is not set"));
}
