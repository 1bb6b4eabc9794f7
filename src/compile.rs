//! File-level compilation shared by the `compile` and `watch` commands
//!
//! Loads a token file, runs a fresh [`Generator`] configured from
//! [`DoodleConfig`] and renders the result in the configured format.

use std::path::{Path, PathBuf};

use glob::glob;
use thiserror::Error;
use tracing::debug;

use crate::config::DoodleConfig;
use crate::functions::FunctionError;
use crate::generator::Generator;
use crate::output::{render, save_output, OutputError, JSON_OUTPUT_SUFFIX};
use crate::parser::{parse_tokens, ParseError};

/// Error type for compiling a single token file
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Function(#[from] FunctionError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("output would overwrite input {}", .0.display())]
    Overwrite(PathBuf),
}

/// Check if a path is a token file (.json or .json5).
///
/// Generated JSON results (`*.out.json`) are not token files.
pub fn is_token_file(path: &Path) -> bool {
    let generated = path.file_name().and_then(|n| n.to_str()).map_or(false, |n| n.ends_with(JSON_OUTPUT_SUFFIX));
    !generated && matches!(path.extension().and_then(|e| e.to_str()), Some("json") | Some("json5"))
}

/// Find all token files in a directory (recursively), sorted by path.
pub fn find_token_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let dir_str = dir.display().to_string();

    for ext in ["json", "json5"] {
        if let Ok(paths) = glob(&format!("{}/**/*.{}", dir_str, ext)) {
            files.extend(paths.filter_map(Result::ok));
        }
    }

    files.retain(|f| is_token_file(f));
    files.sort();
    files
}

/// Compile token source text into rendered output.
///
/// A grid declared by the document replaces the configured default grid.
pub fn compile_source(source: &str, config: &DoodleConfig) -> Result<String, CompileError> {
    let document = parse_tokens(source)?;
    let grid = document.grid.unwrap_or_else(|| config.default_grid());

    let generator = Generator::new().with_seed(config.random.seed);
    let output = generator.generate(&document.tokens, grid)?;
    debug!("compiled {} tokens over {}x{}x{}", document.tokens.len(), output.grid.x, output.grid.y, output.grid.z);

    Ok(render(&output, config.output.format, config.output.minify)?)
}

/// Read and compile a token file.
pub fn compile_file(path: &Path, config: &DoodleConfig) -> Result<String, CompileError> {
    let source = std::fs::read_to_string(path)?;
    compile_source(&source, config)
}

/// Compile a token file and write the result to `out_path`.
pub fn compile_to(input: &Path, out_path: &Path, config: &DoodleConfig) -> Result<(), CompileError> {
    if out_path == input {
        return Err(CompileError::Overwrite(input.to_path_buf()));
    }
    let text = compile_file(input, config)?;
    save_output(&text, out_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use std::fs;
    use tempfile::TempDir;

    const RED: &str = r#"[{ "type": "rule", "property": "color", "value": [[{ "type": "text", "value": "red" }]] }]"#;

    #[test]
    fn test_is_token_file() {
        assert!(is_token_file(Path::new("art/waves.json")));
        assert!(is_token_file(Path::new("doodle.json5")));
        assert!(!is_token_file(Path::new("doodle.css")));
        assert!(!is_token_file(Path::new("doodle.toml")));
        assert!(!is_token_file(Path::new("json")));
        assert!(!is_token_file(Path::new("art/waves.out.json")));
    }

    #[test]
    fn test_find_token_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.json"), "[]").unwrap();
        fs::write(temp.path().join("b.json5"), "[]").unwrap();
        fs::write(temp.path().join("c.css"), "").unwrap();
        let sub = temp.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("d.json"), "[]").unwrap();
        fs::write(sub.join("d.out.json"), "{}").unwrap();

        let files = find_token_files(temp.path());
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| is_token_file(f)));
    }

    #[test]
    fn test_compile_source_uses_config_grid() {
        let mut config = DoodleConfig::default();
        config.grid.default = "2x1".to_string();
        let css = compile_source(RED, &config).unwrap();
        assert_eq!(css, "#cell-1-1-1 {\n  color: red;\n}\n#cell-2-1-1 {\n  color: red;\n}\n");
    }

    #[test]
    fn test_compile_source_document_grid_wins() {
        let mut config = DoodleConfig::default();
        config.grid.default = "5x5".to_string();
        let source = format!(r#"{{ "grid": "1x2", "tokens": {} }}"#, RED);
        let css = compile_source(&source, &config).unwrap();
        assert!(css.contains("#cell-1-2-1"));
        assert!(!css.contains("#cell-2-1-1"));
    }

    #[test]
    fn test_compile_source_json_format() {
        let mut config = DoodleConfig::default();
        config.output.format = OutputFormat::Json;
        let text = compile_source(RED, &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["grid"]["count"], 1);
    }

    #[test]
    fn test_compile_source_parse_error() {
        let result = compile_source("[{ not tokens", &DoodleConfig::default());
        assert!(matches!(result, Err(CompileError::Parse(_))));
    }

    #[test]
    fn test_compile_to_writes_file() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("red.json");
        fs::write(&input, RED).unwrap();
        let out = temp.path().join("build/red.css");

        compile_to(&input, &out, &DoodleConfig::default()).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "#cell-1-1-1 {\n  color: red;\n}\n");
    }

    #[test]
    fn test_compile_to_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("red.json");
        fs::write(&input, RED).unwrap();

        let result = compile_to(&input, &input, &DoodleConfig::default());
        assert!(matches!(result, Err(CompileError::Overwrite(_))));
        assert_eq!(fs::read_to_string(&input).unwrap(), RED);
    }

    #[test]
    fn test_compile_file_missing() {
        let result = compile_file(Path::new("/nonexistent/doodle.json"), &DoodleConfig::default());
        assert!(matches!(result, Err(CompileError::Io(_))));
    }
}
