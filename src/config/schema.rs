//! Configuration schema types for `doodle.toml`
//!
//! Every section is optional; a missing file behaves like an empty one.

use serde::{Deserialize, Serialize};

use crate::cell::DEFAULT_SEED;
use crate::models::GridSize;
use crate::output::OutputFormat;
use crate::properties::parse_grid;

/// Grid defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid used when the token tree declares none (e.g. `"5x5"`)
    #[serde(default = "default_grid")]
    pub default: String,
}

fn default_grid() -> String {
    "1x1".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { default: default_grid() }
    }
}

/// Random number generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Seed of the context shared by all cells
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self { seed: default_seed() }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Minify CSS output
    #[serde(default)]
    pub minify: bool,
    /// `css` or `json`
    #[serde(default)]
    pub format: OutputFormat,
}

/// Watch mode settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            clear_screen: true,
        }
    }
}

/// Complete doodle.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoodleConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "grid.default")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doodle.toml: '{}' {}", self.field, self.message)
    }
}

impl DoodleConfig {
    /// The configured default grid, clamped to the grid limits.
    pub fn default_grid(&self) -> GridSize {
        parse_grid(&self.grid.default)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if !is_grid_text(&self.grid.default) {
            errors.push(ConfigValidationError {
                field: "grid.default".to_string(),
                message: format!("must look like \"5\", \"4x3\" or \"1x1x8\", got \"{}\"", self.grid.default),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }
}

/// One to three positive integers separated by `x`.
pub fn is_grid_text(text: &str) -> bool {
    let axes: Vec<&str> = text.trim().split(['x', 'X']).map(str::trim).collect();
    (1..=3).contains(&axes.len()) && axes.iter().all(|a| a.parse::<u32>().map_or(false, |v| v > 0))
}
