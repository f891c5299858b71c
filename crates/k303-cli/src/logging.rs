//! # Run Logging
//!
//! Console output goes to stderr through an `EnvFilter`: `RUST_LOG` when
//! set, otherwise a level chosen by `-v` repetitions. With `--log-dir`,
//! each run also gets its own directory `<YYYYmmdd_HHMMSS>_<uuid8>` holding
//! a JSON-lines `run.log`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// File name of the per-run JSON log.
pub const RUN_LOG_FILE: &str = "run.log";

/// Where this run's artifacts live.
#[derive(Debug, Clone)]
pub struct RunLog {
    pub run_id: String,
    /// Per-run directory, when `--log-dir` was given.
    pub dir: Option<PathBuf>,
}

/// Default filter directive for a `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Run identifier: local timestamp plus the first eight hex digits of a v4 UUID.
pub fn run_id(now: DateTime<Local>) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &uuid[..8])
}

/// Create `<base>/<run_id>/` and open the run log inside it.
pub fn open_run_log(base: &Path, run_id: &str) -> Result<(PathBuf, File)> {
    let dir = base.join(run_id);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create run directory {}", dir.display()))?;
    let path = dir.join(RUN_LOG_FILE);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok((dir, file))
}

/// Install the global subscriber. Call once, before any logging.
pub fn init(verbosity: u8, log_dir: Option<&Path>) -> Result<RunLog> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
    let run_id = run_id(Local::now());

    let (dir, json_layer) = match log_dir {
        Some(base) => {
            let (dir, file) = open_run_log(base, &run_id)?;
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(Mutex::new(file));
            (Some(dir), Some(layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(json_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(dir) = &dir {
        tracing::info!(run_id = %run_id, dir = %dir.display(), "run log opened");
    }
    Ok(RunLog { run_id, dir })
}
