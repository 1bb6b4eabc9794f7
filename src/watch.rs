//! Watch mode: recompile a directory of token files whenever one changes
//!
//! Used by `doodlecss watch`. Changes are debounced, every pass recompiles
//! the whole directory, and files that stop failing are reported as fixed.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;
use tracing::debug;

use crate::compile::{compile_to, find_token_files, is_token_file};
use crate::config::DoodleConfig;
use crate::output::generate_output_path;

/// Error that stops watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// One token file that failed to compile
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub message: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in {}: {}", self.file.display(), self.message)
    }
}

/// Outcome of compiling every token file once
#[derive(Debug, Default)]
pub struct CompilePass {
    pub compiled: usize,
    pub failures: Vec<FileFailure>,
    pub elapsed: Duration,
}

impl CompilePass {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Remembers which files were broken on the previous pass.
#[derive(Debug, Default)]
pub struct BrokenFiles {
    files: BTreeSet<PathBuf>,
}

impl BrokenFiles {
    /// Record a pass and return the files it fixed, sorted.
    pub fn record(&mut self, pass: &CompilePass) -> Vec<PathBuf> {
        let now: BTreeSet<PathBuf> = pass.failures.iter().map(|f| f.file.clone()).collect();
        let fixed = self.files.difference(&now).cloned().collect();
        self.files = now;
        fixed
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Options for watch mode
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory of token files to watch
    pub src_dir: PathBuf,
    /// Output directory; compiled files land next to their inputs when unset
    pub out_dir: Option<PathBuf>,
    pub config: DoodleConfig,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self { src_dir: PathBuf::from("."), out_dir: None, config: DoodleConfig::default() }
    }
}

impl WatchOptions {
    /// Token files to compile, skipping anything inside the output directory.
    fn inputs(&self) -> Vec<PathBuf> {
        find_token_files(&self.src_dir)
            .into_iter()
            .filter(|input| !self.out_dir.as_ref().map_or(false, |dir| input.starts_with(dir)))
            .collect()
    }
}

/// Compile every token file under the source directory.
///
/// Files are compiled in parallel; a failing file never stops the others.
pub fn compile_all(options: &WatchOptions) -> CompilePass {
    let start = Instant::now();
    let extension = options.config.output.format.extension();
    // trailing separator marks the argument as a directory
    let out_dir = options.out_dir.as_deref().map(|dir| dir.join(""));

    let results: Vec<(PathBuf, Result<(), String>)> = options
        .inputs()
        .into_par_iter()
        .map(|input| {
            let out_path = generate_output_path(&input, out_dir.as_deref(), extension);
            let result = compile_to(&input, &out_path, &options.config).map_err(|e| e.to_string());
            (input, result)
        })
        .collect();

    let mut pass = CompilePass::default();
    for (file, result) in results {
        match result {
            Ok(()) => pass.compiled += 1,
            Err(message) => pass.failures.push(FileFailure { file, message }),
        }
    }
    pass.elapsed = start.elapsed();
    pass
}

/// Watch the source directory and recompile on every relevant change.
///
/// Blocks until the watcher channel closes or the process is interrupted.
pub fn watch_and_rebuild(options: WatchOptions) -> Result<(), WatchError> {
    if !options.src_dir.exists() {
        return Err(WatchError::SourceNotFound(options.src_dir.clone()));
    }
    if let Some(ref out_dir) = options.out_dir {
        std::fs::create_dir_all(out_dir).ok();
    }
    // events for compiled output are ignored
    let ignored = options.out_dir.as_ref().and_then(|dir| dir.canonicalize().ok());

    let (tx, rx) = channel();
    let delay = Duration::from_millis(u64::from(options.config.watch.debounce_ms));
    let mut debouncer = new_debouncer(delay, tx).map_err(WatchError::WatcherInit)?;
    debouncer
        .watcher()
        .watch(&options.src_dir, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    let mut broken = BrokenFiles::default();
    run_pass(&options, &mut broken);

    loop {
        let events = match rx.recv() {
            Ok(Ok(events)) => events,
            Ok(Err(error)) => {
                eprintln!("[{}] Watch error: {:?}", clock(), error);
                continue;
            }
            Err(e) => return Err(WatchError::ChannelError(e.to_string())),
        };

        let changed: Vec<&Path> = events
            .iter()
            .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
            .map(|e| e.path.as_path())
            .filter(|path| triggers_rebuild(path, ignored.as_deref()))
            .collect();
        if changed.is_empty() {
            continue;
        }
        for path in &changed {
            debug!("changed {}", path.display());
            if let Some(name) = path.file_name() {
                println!("[{}] Changed: {}", clock(), name.to_string_lossy());
            }
        }
        run_pass(&options, &mut broken);
    }
}

fn run_pass(options: &WatchOptions, broken: &mut BrokenFiles) {
    if options.config.watch.clear_screen {
        print!("\x1B[2J\x1B[1;1H");
    }
    println!("[{}] Compiling {}...", clock(), options.src_dir.display());
    let pass = compile_all(options);
    let fixed = broken.record(&pass);
    report(&pass, &fixed);
    println!("[{}] Watching {} for changes...", clock(), options.src_dir.display());
}

/// Token files outside the ignored directory trigger a new pass.
fn triggers_rebuild(path: &Path, ignored: Option<&Path>) -> bool {
    is_token_file(path) && !ignored.map_or(false, |dir| path.starts_with(dir))
}

fn report(pass: &CompilePass, fixed: &[PathBuf]) {
    for file in fixed {
        println!("[{}] Fixed: {}", clock(), file.display());
    }

    if pass.is_clean() {
        println!("[{}] Compiled {} file(s) in {}", clock(), pass.compiled, human_duration(pass.elapsed));
        return;
    }

    let failed = pass.failures.len();
    println!(
        "[{}] {} of {} file(s) failed in {}",
        clock(),
        failed,
        failed + pass.compiled,
        human_duration(pass.elapsed)
    );
    for failure in &pass.failures {
        eprintln!("[{}] {}", clock(), failure);
    }
}

fn human_duration(duration: Duration) -> String {
    match duration.as_millis() {
        ms if ms < 1000 => format!("{}ms", ms),
        _ => format!("{:.2}s", duration.as_secs_f64()),
    }
}

/// Wall clock time of day (UTC) as `HH:MM:SS`.
fn clock() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() % 86_400)
        .unwrap_or_default();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
