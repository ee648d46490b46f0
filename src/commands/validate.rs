//! Validate command — run the pre-migration checks and stop.

use anyhow::{bail, Result};

use crate::application::services::{configure, preflight};
use crate::domain::endpoint::Role;
use crate::infra::env;
use crate::infra::prompt::DialoguerPrompter;
use crate::infra::ssh::SshConnector;
use crate::output::{OutputContext, TerminalReporter};

/// Collect both endpoints, run preflight, and report the result.
///
/// # Errors
///
/// Fails when any check fails, so the process exit code reflects the
/// validation outcome.
pub async fn run(ctx: &OutputContext, json: bool) -> Result<()> {
    let prompter = DialoguerPrompter;
    let source = configure::collect_endpoint(
        &prompter,
        Role::Source,
        &env::endpoint_defaults(Role::Source),
    )?;
    let destination = configure::collect_endpoint(
        &prompter,
        Role::Destination,
        &env::endpoint_defaults(Role::Destination),
    )?;

    let reporter = TerminalReporter::new(ctx);
    let report =
        preflight::run_preflight(&SshConnector, &source, &destination, &reporter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if !report.passed() {
        bail!("pre-migration validation failed");
    }
    ctx.success("all pre-migration checks passed");
    Ok(())
}
