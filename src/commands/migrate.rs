//! Migrate command — the full orchestration.
//!
//! Collects everything up front, asks for one confirmation, validates both
//! servers, then runs the three stages over two long-lived sessions. The
//! sessions are closed at a single point whether the pipeline finishes,
//! fails, or is interrupted with Ctrl-C.

use anyhow::{bail, Result};
use clap::Args;

use crate::application::ports::{
    ProgressReporter, Prompter, RemoteShell, SessionFactory,
};
use crate::application::services::database::{self, DatabaseParams};
use crate::application::services::filesystem::{self, FilesystemParams};
use crate::application::services::{configure, postmigrate, preflight};
use crate::domain::credentials::DbCredentials;
use crate::domain::endpoint::Role;
use crate::infra::prompt::DialoguerPrompter;
use crate::infra::ssh::SshConnector;
use crate::infra::{env, logging};
use crate::output::{progress, OutputContext, TerminalReporter};

#[derive(Args)]
pub struct MigrateArgs {
    /// Do not keep a copy of an existing destination tree
    #[arg(long)]
    pub no_backup: bool,

    /// Turn on WP_DEBUG logging in the migrated wp-config.php
    #[arg(long)]
    pub enable_debug: bool,
}

/// Run the migration end to end.
///
/// # Errors
///
/// Fails when validation fails, any critical step fails, or the run is
/// interrupted. A declined confirmation is not an error.
pub async fn run(ctx: &OutputContext, args: &MigrateArgs, yes: bool) -> Result<()> {
    let prompter = DialoguerPrompter;

    ctx.header("Connection details");
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
    let dest_creds = configure::collect_db_credentials(&prompter, &env::db_defaults())?;

    let defaults = env::migration_defaults();
    let old_url = match &defaults.old_url {
        Some(url) => url.clone(),
        None => prompter.input("current site URL (e.g. https://old.example.com)", None)?,
    };
    let new_url = match &defaults.new_url {
        Some(url) => url.clone(),
        None => prompter.input("new site URL (e.g. https://new.example.com)", None)?,
    };
    let dest_path_default = defaults
        .dest_wp_path
        .clone()
        .or_else(|| defaults.source_wp_path.clone())
        .unwrap_or_else(|| "/var/www/html".to_string());
    let dest_path =
        prompter.input("destination WordPress path", Some(&dest_path_default))?;

    ctx.header("Migration plan");
    ctx.kv("source     ", &format!("{}@{}", source.username, source.address()));
    ctx.kv("destination", &format!("{}@{}", destination.username, destination.address()));
    ctx.kv("database   ", &dest_creds.locator());
    ctx.kv("site URL   ", &format!("{old_url} -> {new_url}"));
    ctx.kv("target path", &dest_path);
    ctx.kv("log file   ", logging::LOG_FILE);

    if !yes && !prompter.confirm("proceed with the migration?", false)? {
        ctx.info("migration cancelled, nothing was changed");
        return Ok(());
    }

    let reporter = TerminalReporter::new(ctx);
    let report =
        preflight::run_preflight(&SshConnector, &source, &destination, &reporter).await?;
    let Some(wp_path) = report.wp_path.clone() else {
        bail!("pre-migration validation failed, nothing was changed");
    };
    if !report.passed() {
        bail!("pre-migration validation failed, nothing was changed");
    }

    let spinner = ctx
        .show_progress()
        .then(|| progress::spinner("opening migration sessions"));
    let src = SshConnector.connect(&source).await?;
    let dst = match SshConnector.connect(&destination).await {
        Ok(session) => session,
        Err(e) => {
            let _ = src.close().await;
            return Err(e);
        }
    };
    if let Some(pb) = &spinner {
        progress::finish_ok(pb, "migration sessions established");
    }

    let source_path = filesystem::resolve_source_path(
        &src,
        &reporter,
        defaults.source_wp_path.as_deref(),
        &wp_path,
    )
    .await?;

    let db_params = DatabaseParams {
        source_wp_path: source_path.clone(),
        old_url,
        new_url: new_url.clone(),
    };
    let fs_params = FilesystemParams {
        source_path,
        dest_path,
        web_user: defaults.web_user,
        create_backup: !args.no_backup,
    };

    let outcome = {
        let pipeline = run_pipeline(
            &src,
            &dst,
            &reporter,
            &db_params,
            &fs_params,
            &dest_creds,
            args.enable_debug,
        );
        tokio::pin!(pipeline);
        tokio::select! {
            result = &mut pipeline => result,
            _ = tokio::signal::ctrl_c() => {
                reporter.fail("interrupted, closing sessions");
                Err(anyhow::anyhow!("migration interrupted"))
            }
        }
    };
    let _ = src.close().await;
    let _ = dst.close().await;
    let dest_path = outcome?;

    ctx.header("Migration complete");
    ctx.success(&format!("site migrated into {dest_path}, now serving {new_url}"));
    ctx.info(&format!("full transcript in {}", logging::LOG_FILE));
    Ok(())
}

/// The three stages in order. Any critical failure surfaces as an error;
/// a post-migration failure additionally flags that data already moved.
async fn run_pipeline(
    src: &impl RemoteShell,
    dst: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    db_params: &DatabaseParams,
    fs_params: &FilesystemParams,
    dest_creds: &DbCredentials,
    enable_debug: bool,
) -> Result<String> {
    let verdict = database::migrate_database(src, dst, reporter, db_params, dest_creds).await?;
    if !verdict.passed {
        bail!("database migration failed: {}", verdict.message);
    }

    let verdict = filesystem::migrate_filesystem(src, dst, reporter, fs_params).await?;
    if !verdict.passed {
        bail!("filesystem migration failed: {}", verdict.message);
    }
    let dest_path = verdict.payload.unwrap_or_else(|| fs_params.dest_path.clone());

    let verdict =
        postmigrate::run_post_migration(dst, reporter, &dest_path, dest_creds, enable_debug)
            .await?;
    if !verdict.passed {
        reporter.warn(
            "database and files are already migrated, wp-config.php needs manual fixing",
        );
        bail!("post-migration configuration failed: {}", verdict.message);
    }

    Ok(dest_path)
}
