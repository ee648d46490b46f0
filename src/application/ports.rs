//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;

use anyhow::Result;

use crate::domain::endpoint::ServerEndpoint;
use crate::domain::exec::ExecOutput;
use crate::domain::shell::RemoteCommand;

// ── Remote Execution Ports ────────────────────────────────────────────────────

/// One established session against a remote server: command execution plus
/// file transfer. A connection-level fault (drop, channel failure) is an
/// `Err`; a non-zero exit status is a successful call with a non-zero
/// [`ExecOutput::exit_code`].
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Execute a command and capture exit status and both streams.
    async fn exec(&self, command: &RemoteCommand) -> Result<ExecOutput>;
    /// Download a remote file to a local path. Returns bytes transferred.
    async fn download(&self, remote: &str, local: &Path) -> Result<u64>;
    /// Upload a local file to a remote path. Returns bytes transferred.
    async fn upload(&self, local: &Path, remote: &str) -> Result<u64>;
    /// Close the underlying connection.
    async fn close(&self) -> Result<()>;
}

/// Opens sessions. Preflight opens and closes short-lived sessions through
/// this; the orchestrator opens the two long-lived ones.
#[allow(async_fn_in_trait)]
pub trait SessionFactory {
    type Session: RemoteShell;
    /// Connect and authenticate against the given endpoint.
    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<Self::Session>;
}

// ── Interaction Ports ─────────────────────────────────────────────────────────

/// Abstracts interactive prompting so configuration collection can be
/// tested with scripted answers. Sync trait — no async needed.
pub trait Prompter {
    /// Prompt for a line of text, with an optional default. Empty input is
    /// re-prompted unless a default exists.
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String>;
    /// Prompt for a secret without echo.
    fn password(&self, prompt: &str) -> Result<String>;
    /// Yes/no confirmation.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    /// Pick one item from a list; returns the chosen index.
    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize>;
}

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Announce a new stage of the run.
    fn section(&self, title: &str);
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit a failure message. Never suppressed, even in quiet mode.
    fn fail(&self, message: &str);
}
