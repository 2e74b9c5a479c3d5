//! Grader configuration.
//!
//! Configuration is loaded once and handed to the response intake
//! explicitly; the validator itself takes no configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How the response intake treats submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Let a student replace an earlier answer to the same question within
    /// an attempt. When false, a second answer is rejected.
    #[serde(default)]
    pub allow_retry: bool,
    /// Attach the question's explanation to every recorded response.
    #[serde(default = "default_true")]
    pub show_explanations: bool,
    /// Attach the question's hint to incorrect responses.
    #[serde(default = "default_true")]
    pub hints_on_incorrect: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            allow_retry: false,
            show_explanations: true,
            hints_on_incorrect: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Top-level exgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExgradeConfig {
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Where grade reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./exgrade-results")
}

impl Default for ExgradeConfig {
    fn default() -> Self {
        Self {
            intake: IntakeConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `exgrade.toml` in the current directory
/// 2. `~/.config/exgrade/config.toml`
///
/// Environment variable overrides: `EXGRADE_ALLOW_RETRY`, `EXGRADE_OUTPUT_DIR`.
pub fn load_config() -> Result<ExgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("exgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => ExgradeConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("EXGRADE_ALLOW_RETRY").ok(),
        std::env::var("EXGRADE_OUTPUT_DIR").ok(),
    )?;

    Ok(config)
}

fn parse_config(path: &Path) -> Result<ExgradeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<ExgradeConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(
    config: &mut ExgradeConfig,
    allow_retry: Option<String>,
    output_dir: Option<String>,
) -> Result<()> {
    if let Some(value) = allow_retry {
        config.intake.allow_retry = parse_bool(&value)
            .with_context(|| format!("invalid EXGRADE_ALLOW_RETRY value: '{value}'"))?;
    }
    if let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) {
        config.output_dir = PathBuf::from(dir);
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("exgrade"))
}
