//! Locating and reading `doodle.toml`
//!
//! A project file is searched for in the working directory and its
//! ancestors, then in the per-user config directory. Values from the command
//! line are layered on top with [`merge_cli_overrides`].

use super::schema::DoodleConfig;
use crate::output::OutputFormat;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "doodle.toml";

/// Failure while reading a config file
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Cannot read doodle.toml: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid doodle.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Every problem found by [`DoodleConfig::validate`]
    #[error("doodle.toml has {} problem(s):\n{}", .0.len(), bullet_list(.0))]
    Validation(Vec<String>),
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|item| format!("  - {}", item)).collect::<Vec<_>>().join("\n")
}

/// Settings given on the command line; `None` leaves the file value alone.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CliOverrides {
    pub grid: Option<String>,
    pub seed: Option<u64>,
    pub minify: Option<bool>,
    pub format: Option<OutputFormat>,
}

/// Search the working directory and its parents, then the user config dir.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from).or_else(find_xdg_config)
}

/// `$XDG_CONFIG_HOME/doodlecss/doodle.toml`, falling back to `~/.config`.
pub fn find_xdg_config() -> Option<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env::var_os("HOME")?).join(".config"),
    };
    Some(base.join("doodlecss").join(CONFIG_FILE)).filter(|candidate| candidate.is_file())
}

/// Closest `doodle.toml` at or above `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE)).find(|candidate| candidate.is_file())
}

/// Read the config at `path`, or discover one when `path` is `None`.
///
/// Discovery that finds nothing yields [`DoodleConfig::default`]; an explicit
/// path that cannot be read is an error.
pub fn load_config(path: Option<&Path>) -> Result<DoodleConfig, ConfigError> {
    let located = path.map(Path::to_path_buf).or_else(find_config);
    let Some(file) = located else {
        return Ok(DoodleConfig::default());
    };

    tracing::debug!("reading {}", file.display());
    let config: DoodleConfig = toml::from_str(&fs::read_to_string(&file)?)?;
    let problems: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
    if problems.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(problems))
    }
}

/// Layer command-line values over `config`.
pub fn merge_cli_overrides(config: &mut DoodleConfig, overrides: &CliOverrides) {
    if let Some(grid) = &overrides.grid {
        config.grid.default.clone_from(grid);
    }
    if let Some(seed) = overrides.seed {
        config.random.seed = seed;
    }
    if let Some(minify) = overrides.minify {
        config.output.minify = minify;
    }
    if let Some(format) = overrides.format {
        config.output.format = format;
    }
}
