//! checkpub publishes structured test-run results as GitHub check runs,
//! resolving framework-reported paths against the commit's tree snapshot
//! and emitting inline annotations plus a markdown report body.

use checkpub_adapters_github::GithubChecksClient;
use checkpub_app::{build_output, prepare, publish, AppError, SystemClock};
use checkpub_config::{
    discover_config, load_config, resolve_config, CliOverrides, Config, ConfigError,
    EffectiveConfig,
};
use checkpub_types::{CheckRunRequest, RepoCoords, TestReport, TreeEntry};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// checkpub publishes structured test-run results as check runs with
/// line-level annotations for files touched by the commit.
#[derive(Parser)]
#[command(name = "checkpub")]
#[command(
    about = "Publish test-run results as GitHub check runs with inline annotations"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch commit and tree detail, assemble the check report, and post it
    Publish {
        /// Path to the test report document, or "-" for stdin
        #[arg(long)]
        report: String,

        /// Repository owner (overrides config file)
        #[arg(long)]
        owner: Option<String>,

        /// Repository name (overrides config file)
        #[arg(long)]
        repo: Option<String>,

        /// Commit sha the results apply to
        #[arg(long)]
        sha: String,

        /// Path to config file (default: auto-discover checkpub.toml)
        #[arg(long, short = 'c')]
        config: Option<String>,

        /// API base URL, for Enterprise hosts (overrides config file)
        #[arg(long)]
        api_base: Option<String>,

        /// Environment variable holding the access token
        #[arg(long)]
        token_env: Option<String>,

        /// Check-run name (default: the report's framework name)
        #[arg(long)]
        check_name: Option<String>,

        /// Format token list, e.g. "nopass,noemoji" (overrides the report)
        #[arg(long)]
        format: Option<String>,

        /// Assemble and print the check-run request without posting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Assemble the check report offline against a tree listing file
    Render {
        /// Path to the test report document, or "-" for stdin
        #[arg(long)]
        report: String,

        /// Tree listing file: one "path" or "path<TAB>sha" per line
        #[arg(long)]
        tree: String,

        /// Commit changed-path file: one path per line
        #[arg(long)]
        changed: Option<String>,

        /// Repository owner, used in permalinks
        #[arg(long)]
        owner: String,

        /// Repository name, used in permalinks
        #[arg(long)]
        repo: String,

        /// Commit sha, used in permalinks
        #[arg(long)]
        sha: String,

        /// Format token list (overrides the report)
        #[arg(long)]
        format: Option<String>,

        /// Write the full check-run request JSON to this path
        #[arg(long)]
        request_out: Option<String>,
    },

    /// Parse and validate a test report document without any network work
    Validate {
        /// Path to the test report document, or "-" for stdin
        #[arg(long)]
        report: String,
    },
}

// ============================================================================
// Errors and Exit Codes
// ============================================================================

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    App(#[from] AppError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("report document did not parse: {0}")]
    ReportParse(serde_json::Error),

    #[error("failed to encode request JSON: {0}")]
    RequestEncode(serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// 2 for documents rejected before any work, 1 for everything else.
    fn exit_code(&self) -> i32 {
        match self {
            CliError::ReportParse(_) | CliError::App(AppError::MalformedInput(_)) => 2,
            _ => 1,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Publish {
            report,
            owner,
            repo,
            sha,
            config,
            api_base,
            token_env,
            check_name,
            format,
            dry_run,
        } => {
            let overrides = CliOverrides {
                owner,
                repo,
                api_base,
                token_env,
                check_name,
                format: format.clone(),
            };
            let effective = load_effective(config.as_deref(), &overrides)?;
            run_publish(&report, &sha, format.as_deref(), &effective, dry_run)
        }
        Commands::Render {
            report,
            tree,
            changed,
            owner,
            repo,
            sha,
            format,
            request_out,
        } => run_render(
            &report,
            &tree,
            changed.as_deref(),
            RepoCoords {
                owner,
                repo,
                commit_sha: sha,
            },
            format.as_deref(),
            request_out.as_deref(),
        ),
        Commands::Validate { report } => run_validate(&report),
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_publish(
    report_path: &str,
    sha: &str,
    cli_format: Option<&str>,
    effective: &EffectiveConfig,
    dry_run: bool,
) -> Result<(), CliError> {
    let mut report = read_report(report_path)?;
    apply_format_override(&mut report, cli_format, effective.format.as_deref());

    let owner = effective
        .owner
        .clone()
        .ok_or_else(|| CliError::Usage("repository owner is required (--owner)".to_string()))?;
    let repo = effective
        .repo
        .clone()
        .ok_or_else(|| CliError::Usage("repository name is required (--repo)".to_string()))?;
    let token = std::env::var(&effective.token_env).map_err(|_| {
        CliError::Usage(format!(
            "access token env variable {} is not set",
            effective.token_env
        ))
    })?;

    let coords = RepoCoords {
        owner,
        repo,
        commit_sha: sha.to_string(),
    };
    let client =
        GithubChecksClient::with_api_base(&effective.api_base, &coords.owner, &coords.repo, &token);
    let check_name = effective.check_name.as_deref();

    if dry_run {
        let (request, unresolved) =
            prepare(&client, &SystemClock, &report, &coords, check_name)?;
        warn_unresolved(&unresolved);
        let json = serde_json::to_string_pretty(&request).map_err(CliError::RequestEncode)?;
        println!("{json}");
        return Ok(());
    }

    let outcome = publish(&client, &SystemClock, &report, &coords, check_name)?;
    warn_unresolved(&outcome.unresolved_paths);
    if outcome.batches_posted > 1 {
        println!(
            "check-run posted: {} ({} batches)",
            outcome.output.title, outcome.batches_posted
        );
    } else {
        println!("check-run posted: {}", outcome.output.title);
    }
    Ok(())
}

fn run_render(
    report_path: &str,
    tree_path: &str,
    changed_path: Option<&str>,
    coords: RepoCoords,
    cli_format: Option<&str>,
    request_out: Option<&str>,
) -> Result<(), CliError> {
    let mut report = read_report(report_path)?;
    report
        .validate()
        .map_err(|e| CliError::App(AppError::MalformedInput(e.to_string())))?;
    apply_format_override(&mut report, cli_format, None);

    let tree = read_tree_file(tree_path)?;
    let changed = match changed_path {
        Some(path) => read_changed_file(path)?,
        None => HashSet::new(),
    };

    let outcome = build_output(&report, &tree, &changed, &coords);
    warn_unresolved(&outcome.unresolved_paths);

    let request = CheckRunRequest::new(
        report.framework.clone(),
        coords.commit_sha.clone(),
        outcome.output,
        None,
    );

    if let Some(out_path) = request_out {
        let json = serde_json::to_string_pretty(&request).map_err(CliError::RequestEncode)?;
        std::fs::write(out_path, json).map_err(|source| CliError::Write {
            path: out_path.to_string(),
            source,
        })?;
    }

    println!("{}", request.output.title);
    if !request.output.text.is_empty() {
        println!();
        println!("{}", request.output.text);
    }
    Ok(())
}

fn run_validate(report_path: &str) -> Result<(), CliError> {
    let report = read_report(report_path)?;
    report
        .validate()
        .map_err(|e| CliError::App(AppError::MalformedInput(e.to_string())))?;
    println!(
        "report ok: {} ({} results)",
        report.framework,
        report.results.len()
    );
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn load_effective(
    config_path: Option<&str>,
    overrides: &CliOverrides,
) -> Result<EffectiveConfig, CliError> {
    let config = match config_path {
        Some(path) => load_config(Path::new(path))?,
        None => {
            let cwd = std::env::current_dir().map_err(|source| CliError::Io {
                path: ".".to_string(),
                source,
            })?;
            discover_config(&cwd)
                .map(|(_, config)| config)
                .unwrap_or_else(Config::default)
        }
    };
    Ok(resolve_config(&config, overrides))
}

fn read_report(path: &str) -> Result<TestReport, CliError> {
    let content = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Io {
                path: "stdin".to_string(),
                source,
            })?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        })?
    };
    serde_json::from_str(&content).map_err(CliError::ReportParse)
}

/// Format precedence: CLI flag, then the report document, then the config
/// default for documents that carry none.
fn apply_format_override(
    report: &mut TestReport,
    cli_format: Option<&str>,
    config_default: Option<&str>,
) {
    if let Some(format) = cli_format {
        report.format = format.to_string();
    } else if report.format.trim().is_empty() {
        if let Some(format) = config_default {
            report.format = format.to_string();
        }
    }
}

fn read_tree_file(path: &str) -> Result<Vec<TreeEntry>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;

    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (tree_path, sha) = match line.split_once('\t') {
            Some((tree_path, sha)) => (tree_path.trim(), sha.trim()),
            None => (line, ""),
        };
        entries.push(TreeEntry {
            path: tree_path.to_string(),
            sha: sha.to_string(),
        });
    }
    Ok(entries)
}

fn read_changed_file(path: &str) -> Result<HashSet<String>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn warn_unresolved(paths: &[String]) {
    for path in paths {
        eprintln!("warning: could not locate file associated with test path: {path}");
    }
}

// ============================================================================
// Tests
// ============================================================================
