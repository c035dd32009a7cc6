//! Periodic screenshot acquisition through an external capture program.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

pub const WINDOW_PLACEHOLDER: &str = "{window}";
pub const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Parser, Debug, Clone)]
pub struct CaptureOpts {
    /// Window id substituted for {window} in the capture arguments
    #[arg(short, long, help_heading = "Capture")]
    pub window: String,
    /// Delay between screenshots in milliseconds
    #[arg(short, long, default_value_t = 250, help_heading = "Capture")]
    pub delay: u64,
    /// Capture program
    #[arg(long, default_value = "screencapture", help_heading = "Capture")]
    pub program: String,
    /// Capture program arguments; {window} and {file} are substituted
    #[arg(
        long = "arg",
        allow_hyphen_values = true,
        default_values_t = default_capture_args(),
        help_heading = "Capture"
    )]
    pub args: Vec<String>,
}

fn default_capture_args() -> Vec<String> {
    vec!["-o".into(), "-l{window}".into(), "-x".into(), "{file}".into()]
}

/// What a capture session produced.
#[derive(Debug, Default)]
pub struct CaptureSummary {
    pub spawned: usize,
    pub failed: usize,
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// `<timestamp>.png`, the name frame discovery expects.
pub fn frame_file_name(timestamp: u64) -> String {
    format!("{timestamp}.png")
}

pub fn substitute_args(args: &[String], window: &str, file: &Path) -> Vec<String> {
    let file = file.to_string_lossy();
    args.iter()
        .map(|a| {
            a.replace(WINDOW_PLACEHOLDER, window)
                .replace(FILE_PLACEHOLDER, &file)
        })
        .collect()
}

/// Spawn the capture program every `opts.delay` ms until `stop` is set,
/// then wait for every child to exit.
pub fn capture_until(
    opts: &CaptureOpts,
    frames_dir: &Path,
    stop: &AtomicBool,
) -> anyhow::Result<CaptureSummary> {
    fs::create_dir_all(frames_dir)
        .with_context(|| format!("create frames dir {}", frames_dir.display()))?;
    let delay = Duration::from_millis(opts.delay);
    let mut children: Vec<(PathBuf, Child)> = Vec::new();
    let mut summary = CaptureSummary::default();

    while !stop.load(Ordering::Relaxed) {
        let file = frames_dir.join(frame_file_name(unix_millis()));
        let args = substitute_args(&opts.args, &opts.window, &file);
        match Command::new(&opts.program)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                debug!(file = %file.display(), "capture spawned");
                children.push((file, child));
                summary.spawned += 1;
            }
            Err(e) => {
                warn!(program = %opts.program, error = %e, "capture spawn failed");
                summary.failed += 1;
            }
        }
        thread::sleep(delay);
    }

    for (file, mut child) in children {
        match child.wait() {
            Ok(status) if !status.success() => {
                warn!(file = %file.display(), %status, "capture exited with failure");
                summary.failed += 1;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(file = %file.display(), error = %e, "capture wait failed");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// Capture on a background thread until a line is read from stdin.
pub fn capture_interactive(opts: &CaptureOpts, frames_dir: &Path) -> anyhow::Result<CaptureSummary> {
    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let stop = Arc::clone(&stop);
        let opts = opts.clone();
        let dir = frames_dir.to_path_buf();
        thread::spawn(move || capture_until(&opts, &dir, &stop))
    };

    info!(dir = %frames_dir.display(), "capturing; press enter to stop");
    let mut line = String::new();
    let read = std::io::stdin().read_line(&mut line);
    stop.store(true, Ordering::Relaxed);
    read.context("read stdin")?;

    let summary = worker
        .join()
        .map_err(|_| anyhow::anyhow!("capture thread panicked"))??;
    info!(
        spawned = summary.spawned,
        failed = summary.failed,
        "capture stopped"
    );
    Ok(summary)
}
