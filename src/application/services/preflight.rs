//! Pre-migration validation of both servers.
//!
//! Opens its own short-lived sessions: a connect failure on either side is
//! itself a check outcome, so the validation pass never propagates it as an
//! error. Sessions are closed on every path through the checks.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RemoteShell, SessionFactory};
use crate::application::services::database::read_db_credentials;
use crate::domain::endpoint::ServerEndpoint;
use crate::domain::health::{disk_space_sufficient, PreflightReport};
use crate::domain::wpconfig;

/// Run every preflight check and return the full report.
///
/// # Errors
///
/// Fails only on a connection fault after both sessions are up; check
/// failures are recorded in the report instead.
pub async fn run_preflight<F: SessionFactory>(
    factory: &F,
    source: &ServerEndpoint,
    destination: &ServerEndpoint,
    reporter: &impl ProgressReporter,
) -> Result<PreflightReport> {
    let mut report = PreflightReport::default();
    reporter.section("Pre-migration validation");

    reporter.step(&format!("connecting to source server {}", source.address()));
    let src = match factory.connect(source).await {
        Ok(session) => {
            report.record("ssh-source", true, format!("connected to {}", source.address()));
            reporter.success(&format!("source server {} reachable", source.address()));
            session
        }
        Err(e) => {
            report.record("ssh-source", false, format!("{e:#}"));
            reporter.fail(&format!("cannot reach source server {}: {e:#}", source.address()));
            return Ok(report);
        }
    };

    reporter.step(&format!("connecting to destination server {}", destination.address()));
    let dst = match factory.connect(destination).await {
        Ok(session) => {
            report.record(
                "ssh-destination",
                true,
                format!("connected to {}", destination.address()),
            );
            reporter.success(&format!("destination server {} reachable", destination.address()));
            session
        }
        Err(e) => {
            report.record("ssh-destination", false, format!("{e:#}"));
            reporter.fail(&format!(
                "cannot reach destination server {}: {e:#}",
                destination.address()
            ));
            let _ = src.close().await;
            return Ok(report);
        }
    };

    let outcome = run_checks(&src, &dst, reporter, &mut report).await;
    let _ = src.close().await;
    let _ = dst.close().await;
    outcome?;
    Ok(report)
}

/// The server-level checks, run with both sessions already up.
async fn run_checks(
    src: &impl RemoteShell,
    dst: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    report: &mut PreflightReport,
) -> Result<()> {
    // ── wordpress-install ───────────────────────────────────────────────
    // A missing install is a soft failure: the stack check below still
    // runs, only the two checks that need the install path are skipped.
    reporter.step("locating the WordPress install on the source server");
    let mut found = None;
    for candidate in wpconfig::PROBE_PATHS {
        if src.exec(&wpconfig::marker_probe(candidate)).await?.ok() {
            found = Some(candidate.to_string());
            break;
        }
    }
    match &found {
        Some(wp_path) => {
            let version = src.exec(&wpconfig::wp_version(wp_path)).await?;
            let message = if version.ok() && !version.stdout.is_empty() {
                format!("WordPress {} at {wp_path}", version.stdout)
            } else {
                format!("WordPress install at {wp_path}")
            };
            report.record("wordpress-install", true, message.clone());
            report.wp_path = Some(wp_path.clone());
            reporter.success(&message);
        }
        None => {
            let message =
                format!("no wp-config.php found under {}", wpconfig::PROBE_PATHS.join(", "));
            report.record("wordpress-install", false, message.clone());
            reporter.fail(&message);
        }
    }

    // ── lamp-stack ──────────────────────────────────────────────────────
    reporter.step("checking web, database and PHP services on the destination");
    let mut missing = Vec::new();
    if !dst.exec(&wpconfig::web_server_active()).await?.ok() {
        missing.push("web server");
    }
    if !dst.exec(&wpconfig::db_server_active()).await?.ok() {
        missing.push("database server");
    }
    let php = dst.exec(&wpconfig::php_version()).await?;
    if !php.ok() || php.stdout.is_empty() {
        missing.push("PHP");
    }
    if missing.is_empty() {
        let message = format!("web server, database server and PHP {} active", php.stdout);
        report.record("lamp-stack", true, message.clone());
        reporter.success(&message);
    } else {
        let message = format!("destination stack incomplete: {}", missing.join(", "));
        report.record("lamp-stack", false, message.clone());
        reporter.fail(&message);
    }

    let Some(wp_path) = found else {
        return Ok(());
    };

    // ── database-access ─────────────────────────────────────────────────
    reporter.step("reading database credentials from the source wp-config.php");
    match read_db_credentials(src, &wp_path).await {
        Ok(creds) => {
            let probe = src
                .exec(&wpconfig::db_probe(&creds.user, &creds.password, &creds.host, &creds.name))
                .await?;
            if probe.ok() {
                let message = format!("source database {} reachable", creds.locator());
                report.record("database-access", true, message.clone());
                report.source_creds = Some(creds);
                reporter.success(&message);
            } else {
                let message = format!("source database query failed: {}", probe.detail());
                report.record("database-access", false, message.clone());
                reporter.fail(&message);
            }
        }
        Err(e) => {
            let message = format!("{e:#}");
            report.record("database-access", false, message.clone());
            reporter.fail(&message);
        }
    }

    // ── disk-space ──────────────────────────────────────────────────────
    reporter.step("comparing source size against destination free space");
    let size = src.exec(&wpconfig::dir_size_mb(&wp_path)).await?;
    let free = dst.exec(&wpconfig::free_space_mb()).await?;
    match (size.stdout.trim().parse::<u64>(), free.stdout.trim().parse::<u64>()) {
        (Ok(source_mb), Ok(free_mb)) => {
            if disk_space_sufficient(source_mb, free_mb) {
                let message = format!("source tree {source_mb} MB, destination {free_mb} MB free");
                report.record("disk-space", true, message.clone());
                reporter.success(&message);
            } else {
                let message = format!(
                    "insufficient space: source tree {source_mb} MB needs {} MB free, {free_mb} MB available",
                    source_mb.saturating_mul(2)
                );
                report.record("disk-space", false, message.clone());
                reporter.fail(&message);
            }
        }
        _ => {
            let message = format!(
                "could not read sizes (du: {:?}, df: {:?})",
                size.stdout.trim(),
                free.stdout.trim()
            );
            report.record("disk-space", false, message.clone());
            reporter.fail(&message);
        }
    }

    Ok(())
}
