//! File-backed tracing setup.
//!
//! The terminal stays reserved for operator-facing output; structured
//! events go to `wpmig.log` in the working directory.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Run log in the working directory.
pub const LOG_FILE: &str = "wpmig.log";

/// Initialize the tracing pipeline. Level defaults to `info` and is
/// overridable through `WPMIG_LOG`. Safe to call more than once.
pub fn init() -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("cannot open {LOG_FILE} for logging"))?;
    let filter =
        EnvFilter::try_from_env("WPMIG_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();
    Ok(())
}
