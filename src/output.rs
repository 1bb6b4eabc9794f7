//! Stylesheet output and file path generation

use std::io;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::Output;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The stylesheet could not be minified
    #[error("minify error: {0}")]
    Minify(String),
}

/// Suffix of generated JSON files. Token files share the `.json` extension,
/// so generated results carry this longer suffix to stay recognizable.
pub const JSON_OUTPUT_SUFFIX: &str = ".out.json";

/// How a compiled result is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Css,
    Json,
}

impl OutputFormat {
    /// File extension used for generated paths.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Css => "css",
            OutputFormat::Json => "out.json",
        }
    }
}

/// Render a compiled result in the requested format.
///
/// Minification only applies to CSS. If the stylesheet cannot be minified
/// the unminified text is returned and a warning logged.
pub fn render(output: &Output, format: OutputFormat, minify: bool) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => render_json(output),
        OutputFormat::Css => {
            let css = output.styles.to_css();
            if !minify {
                return Ok(css);
            }
            match minify_css(&css) {
                Ok(minified) => Ok(minified),
                Err(e) => {
                    warn!("{}; writing unminified css", e);
                    Ok(css)
                }
            }
        }
    }
}

/// Pretty JSON of the whole result: props, the four style buffers and grid.
pub fn render_json(output: &Output) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// Minify a stylesheet with lightningcss.
pub fn minify_css(css: &str) -> Result<String, OutputError> {
    let mut sheet =
        StyleSheet::parse(css, ParserOptions::default()).map_err(|e| OutputError::Minify(e.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| OutputError::Minify(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions { minify: true, ..PrinterOptions::default() })
        .map_err(|e| OutputError::Minify(e.to_string()))?;
    Ok(printed.code)
}

/// Write output text to a file, creating parent directories as needed.
pub fn save_output(text: &str, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

/// Generate the output path for a compiled token file.
///
/// | Scenario | Output |
/// |----------|--------|
/// | No `-o` | `<input stem>.<ext>` next to the input |
/// | `-o out.css` | `out.css` |
/// | `-o dir/` | `dir/<input stem>.<ext>` |
pub fn generate_output_path(input: &Path, output_arg: Option<&Path>, extension: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let file_name = format!("{}.{}", stem, extension);

    match output_arg {
        Some(output) => {
            let is_dir = output.as_os_str().to_string_lossy().ends_with('/') || output.is_dir();
            if is_dir {
                output.join(file_name)
            } else {
                output.to_path_buf()
            }
        }
        None => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
            _ => PathBuf::from(file_name),
        },
    }
}
