//! Configuration parsing and management for checkpub.
//!
//! This crate provides:
//! - Configuration types loaded from `checkpub.toml`
//! - Precedence handling (CLI > config file > defaults)
//! - Config file discovery in parent directories

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the discovered configuration file.
pub const CONFIG_FILE_NAME: &str = "checkpub.toml";

/// Default API base when none is configured.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default environment variable holding the access token.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Repository and API settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubConfig {
    /// Repository owner.
    #[serde(default)]
    pub owner: Option<String>,

    /// Repository name.
    #[serde(default)]
    pub repo: Option<String>,

    /// API base URL (for GitHub Enterprise hosts).
    #[serde(default)]
    pub api_base: Option<String>,

    /// Environment variable holding the access token.
    #[serde(default)]
    pub token_env: Option<String>,
}

/// Check-report settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckConfig {
    /// Check-run name override; the report's framework name when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Default format token list when the report document carries none.
    #[serde(default)]
    pub format: Option<String>,
}

/// Full configuration for checkpub.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Repository and API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Check-report settings.
    #[serde(default)]
    pub check: CheckConfig,
}

// ============================================================================
// Effective Configuration
// ============================================================================

/// Values supplied on the command line, overriding the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub api_base: Option<String>,
    pub token_env: Option<String>,
    pub check_name: Option<String>,
    pub format: Option<String>,
}

/// Effective configuration after applying CLI > config file > defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub api_base: String,
    pub token_env: String,
    pub check_name: Option<String>,
    pub format: Option<String>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            api_base: DEFAULT_API_BASE.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            check_name: None,
            format: None,
        }
    }
}

/// Resolve the effective configuration.
pub fn resolve_config(config: &Config, cli: &CliOverrides) -> EffectiveConfig {
    let defaults = EffectiveConfig::default();
    EffectiveConfig {
        owner: cli.owner.clone().or_else(|| config.github.owner.clone()),
        repo: cli.repo.clone().or_else(|| config.github.repo.clone()),
        api_base: cli
            .api_base
            .clone()
            .or_else(|| config.github.api_base.clone())
            .unwrap_or(defaults.api_base),
        token_env: cli
            .token_env
            .clone()
            .or_else(|| config.github.token_env.clone())
            .unwrap_or(defaults.token_env),
        check_name: cli
            .check_name
            .clone()
            .or_else(|| config.check.name.clone()),
        format: cli.format.clone().or_else(|| config.check.format.clone()),
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(api_base) = &config.github.api_base {
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "api_base must be an http(s) URL, got {}",
                api_base
            )));
        }
    }
    Ok(())
}

/// Try to find and load configuration from the standard location.
///
/// Searches for `checkpub.toml` in `start` and its parent directories.
pub fn discover_config(start: &Path) -> Option<(PathBuf, Config)> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            if let Ok(config) = load_config(&config_path) {
                return Some((config_path, config));
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parses() {
        let config = parse_config("").expect("empty config is valid");
        assert!(config.github.owner.is_none());
        assert!(config.check.name.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse_config(
            r#"
            [github]
            owner = "j256"
            repo = "ormlite-core"
            api_base = "https://github.example.com/api/v3"
            token_env = "CHECKPUB_TOKEN"

            [check]
            name = "unit tests"
            format = "nopass,noemoji"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.github.owner.as_deref(), Some("j256"));
        assert_eq!(config.github.repo.as_deref(), Some("ormlite-core"));
        assert_eq!(
            config.github.api_base.as_deref(),
            Some("https://github.example.com/api/v3")
        );
        assert_eq!(config.github.token_env.as_deref(), Some("CHECKPUB_TOKEN"));
        assert_eq!(config.check.name.as_deref(), Some("unit tests"));
        assert_eq!(config.check.format.as_deref(), Some("nopass,noemoji"));
    }

    #[test]
    fn test_invalid_api_base_rejected() {
        let result = parse_config(
            r#"
            [github]
            api_base = "ftp://example.com"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_unparseable_toml_rejected() {
        assert!(matches!(
            parse_config("github = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_resolve_defaults() {
        let effective = resolve_config(&Config::default(), &CliOverrides::default());
        assert_eq!(effective, EffectiveConfig::default());
        assert_eq!(effective.api_base, DEFAULT_API_BASE);
        assert_eq!(effective.token_env, DEFAULT_TOKEN_ENV);
    }

    #[test]
    fn test_resolve_cli_beats_file() {
        let config = parse_config(
            r#"
            [github]
            owner = "from-file"
            repo = "repo-file"

            [check]
            format = "nopass"
            "#,
        )
        .expect("config parses");

        let cli = CliOverrides {
            owner: Some("from-cli".to_string()),
            format: Some("noemoji".to_string()),
            ..Default::default()
        };

        let effective = resolve_config(&config, &cli);
        assert_eq!(effective.owner.as_deref(), Some("from-cli"));
        assert_eq!(effective.repo.as_deref(), Some("repo-file"));
        assert_eq!(effective.format.as_deref(), Some("noemoji"));
    }

    #[test]
    fn test_discover_config_walks_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create nested dirs");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[github]\nowner = \"found\"\n",
        )
        .expect("write config");

        let (path, config) = discover_config(&nested).expect("config discovered");
        assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.github.owner.as_deref(), Some("found"));
    }

    #[test]
    fn test_discover_skips_unparseable_candidate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("inner");
        std::fs::create_dir_all(&nested).expect("create nested dir");
        std::fs::write(nested.join(CONFIG_FILE_NAME), "github = [").expect("write bad config");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[github]\nowner = \"outer\"\n",
        )
        .expect("write config");

        let (path, config) = discover_config(&nested).expect("outer config discovered");
        assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.github.owner.as_deref(), Some("outer"));
    }

    #[test]
    fn test_load_config_io_error() {
        let result = load_config(Path::new("/nonexistent/checkpub.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
