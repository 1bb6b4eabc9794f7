//! Compile and watch command implementations

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::compile::{compile_file, compile_to, find_token_files, CompileError};
use crate::config::{is_grid_text, load_config, merge_cli_overrides, CliOverrides};
use crate::output::{generate_output_path, OutputFormat};
use crate::watch::{watch_and_rebuild, WatchOptions};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the compile command
pub fn run_compile(
    inputs: &[PathBuf],
    output: Option<&Path>,
    grid: Option<String>,
    seed: Option<u64>,
    minify: bool,
    json: bool,
    config_path: Option<&Path>,
) -> ExitCode {
    if let Some(ref grid) = grid {
        if !is_grid_text(grid) {
            eprintln!("Error: Invalid --grid '{}' (expected e.g. \"5\", \"4x3\" or \"1x1x8\")", grid);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let overrides = CliOverrides {
        grid,
        seed,
        minify: minify.then_some(true),
        format: json.then_some(OutputFormat::Json),
    };
    merge_cli_overrides(&mut config, &overrides);

    // Expand directories into the token files they contain
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = find_token_files(input);
            if found.is_empty() {
                eprintln!("Warning: No token files found in {}", input.display());
            }
            files.extend(found);
        } else if input.exists() {
            files.push(input.clone());
        } else {
            eprintln!("Error: Input file not found: {}", input.display());
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if files.is_empty() {
        eprintln!("Error: Nothing to compile");
        return ExitCode::from(EXIT_ERROR);
    }

    // A single file without -o goes to stdout
    if output.is_none() && inputs.len() == 1 && !inputs[0].is_dir() {
        return match compile_file(&files[0], &config) {
            Ok(text) => {
                print!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}: {}", files[0].display(), e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let output_is_dir = output.map_or(false, |o| o.to_string_lossy().ends_with('/') || o.is_dir());
    if files.len() > 1 && output.is_some() && !output_is_dir {
        eprintln!("Error: --output must be a directory (ending in /) when compiling several files");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let extension = config.output.format.extension();
    let results: Vec<(PathBuf, PathBuf, Result<(), CompileError>)> = files
        .par_iter()
        .map(|input| {
            let out_path = generate_output_path(input, output, extension);
            let result = compile_to(input, &out_path, &config);
            (input.clone(), out_path, result)
        })
        .collect();

    let mut failed = 0;
    for (input, out_path, result) in &results {
        match result {
            Ok(()) => println!("Compiled: {} -> {}", input.display(), out_path.display()),
            Err(e) => {
                eprintln!("Error: {}: {}", input.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} files failed", failed, results.len());
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Execute the watch command
pub fn run_watch(dir: &Path, output: Option<&Path>, config_path: Option<&Path>) -> ExitCode {
    if !dir.is_dir() {
        eprintln!("Error: Not a directory: {}", dir.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Starting watch mode...");
    println!("Press Ctrl+C to stop");
    println!();

    let options = WatchOptions { src_dir: dir.to_path_buf(), out_dir: output.map(Path::to_path_buf), config };
    match watch_and_rebuild(options) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
