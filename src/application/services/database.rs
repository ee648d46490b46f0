//! Database migration stage: dump, compress, relay, import, URL rewrite.

use anyhow::Result;
use chrono::Local;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::relay::relay_file;
use crate::application::services::settle;
use crate::domain::credentials::DbCredentials;
use crate::domain::error::CredentialError;
use crate::domain::exec::Verdict;
use crate::domain::plan::{Criticality, StageLog, StepDisposition, StepSpec};
use crate::domain::wpconfig;

/// Working directory for dumps and archives on both servers.
pub const BACKUP_DIR: &str = "/tmp/wp_migration_backup";

/// Inputs to the database stage collected before it starts.
#[derive(Debug, Clone)]
pub struct DatabaseParams {
    pub source_wp_path: String,
    pub old_url: String,
    pub new_url: String,
}

const READ_CREDENTIALS: StepSpec = StepSpec {
    id: "read-credentials",
    label: "read source database credentials",
    criticality: Criticality::Critical,
};
const PREPARE_DIRS: StepSpec = StepSpec {
    id: "prepare-dirs",
    label: "create backup directories",
    criticality: Criticality::Critical,
};
const DUMP: StepSpec = StepSpec {
    id: "dump",
    label: "dump source database",
    criticality: Criticality::Critical,
};
const COMPRESS: StepSpec = StepSpec {
    id: "compress",
    label: "compress dump",
    criticality: Criticality::Critical,
};
const TRANSFER: StepSpec = StepSpec {
    id: "transfer",
    label: "transfer dump to destination",
    criticality: Criticality::Critical,
};
const ENSURE_DATABASE: StepSpec = StepSpec {
    id: "ensure-database",
    label: "ensure destination database exists",
    criticality: Criticality::BestEffort,
};
const DECOMPRESS: StepSpec = StepSpec {
    id: "decompress",
    label: "decompress dump on destination",
    criticality: Criticality::Critical,
};
const IMPORT: StepSpec = StepSpec {
    id: "import",
    label: "import database",
    criticality: Criticality::Critical,
};
const UPDATE_URLS: StepSpec = StepSpec {
    id: "update-urls",
    label: "rewrite site URLs",
    criticality: Criticality::Critical,
};

/// Extract the four DB_* directives from the source wp-config.php.
///
/// # Errors
///
/// Returns [`CredentialError::MissingDirective`] when a directive is
/// absent or empty.
pub async fn read_db_credentials(
    shell: &impl RemoteShell,
    wp_path: &str,
) -> Result<DbCredentials> {
    Ok(DbCredentials {
        name: extract(shell, wp_path, "DB_NAME").await?,
        user: extract(shell, wp_path, "DB_USER").await?,
        password: extract(shell, wp_path, "DB_PASSWORD").await?,
        host: extract(shell, wp_path, "DB_HOST").await?,
    })
}

async fn extract(
    shell: &impl RemoteShell,
    wp_path: &str,
    directive: &'static str,
) -> Result<String> {
    let out = shell.exec(&wpconfig::extract_directive(wp_path, directive)).await?;
    let value = out.stdout.trim().to_string();
    if !out.ok() || value.is_empty() {
        return Err(CredentialError::MissingDirective(directive).into());
    }
    Ok(value)
}

/// Run the whole database stage. Returns the source credentials as the
/// verdict payload for the final summary.
pub async fn migrate_database(
    source: &impl RemoteShell,
    destination: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    params: &DatabaseParams,
    dest_creds: &DbCredentials,
) -> Result<Verdict<DbCredentials>> {
    reporter.section("Database migration");
    let mut log = StageLog::new("database");

    reporter.step(READ_CREDENTIALS.label);
    let source_creds = match read_db_credentials(source, &params.source_wp_path).await {
        Ok(creds) => {
            settle(&mut log, &READ_CREDENTIALS, reporter, true, format!("source database {}", creds.locator()));
            creds
        }
        Err(e) => {
            let message = format!("{e:#}");
            settle(&mut log, &READ_CREDENTIALS, reporter, false, message.clone());
            return Ok(Verdict::fail(message));
        }
    };

    reporter.step(PREPARE_DIRS.label);
    let src_mkdir = source.exec(&wpconfig::make_dir(BACKUP_DIR)).await?;
    let dst_mkdir = destination.exec(&wpconfig::make_dir(BACKUP_DIR)).await?;
    let prepared = src_mkdir.ok() && dst_mkdir.ok();
    let message = if prepared {
        format!("backup directory {BACKUP_DIR} ready on both servers")
    } else {
        format!("mkdir failed: {} {}", src_mkdir.detail(), dst_mkdir.detail())
    };
    if settle(&mut log, &PREPARE_DIRS, reporter, prepared, message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    let dump_name = Local::now().format("wordpress_db_%Y%m%d_%H%M%S.sql").to_string();
    let dump_path = format!("{BACKUP_DIR}/{dump_name}");
    let archive_path = format!("{dump_path}.gz");

    reporter.step(DUMP.label);
    let dump = source
        .exec(&wpconfig::dump_database(
            &source_creds.user,
            &source_creds.password,
            &source_creds.host,
            &source_creds.name,
            &dump_path,
        ))
        .await?;
    let message = if dump.ok() {
        format!("database dumped to {dump_path}")
    } else {
        format!("mysqldump failed: {}", dump.detail())
    };
    if settle(&mut log, &DUMP, reporter, dump.ok(), message.clone()) == StepDisposition::Abort {
        return Ok(Verdict::fail(message));
    }

    reporter.step(COMPRESS.label);
    let gzip = source.exec(&wpconfig::gzip_file(&dump_path)).await?;
    let message = if gzip.ok() {
        let size = source.exec(&wpconfig::file_size_human(&archive_path)).await?;
        format!("compressed to {archive_path} ({})", size.stdout.trim())
    } else {
        format!("gzip failed: {}", gzip.detail())
    };
    if settle(&mut log, &COMPRESS, reporter, gzip.ok(), message.clone()) == StepDisposition::Abort {
        return Ok(Verdict::fail(message));
    }

    reporter.step(TRANSFER.label);
    match relay_file(source, destination, &archive_path, &archive_path).await {
        Ok(timing) => {
            settle(
                &mut log,
                &TRANSFER,
                reporter,
                true,
                format!(
                    "{} bytes relayed (down {:.1}s, up {:.1}s)",
                    timing.bytes, timing.download_secs, timing.upload_secs
                ),
            );
        }
        Err(e) => {
            let message = format!("transfer failed: {e:#}");
            settle(&mut log, &TRANSFER, reporter, false, message.clone());
            return Ok(Verdict::fail(message));
        }
    }

    reporter.step(ENSURE_DATABASE.label);
    ensure_database(destination, reporter, &mut log, dest_creds).await?;

    reporter.step(DECOMPRESS.label);
    let sql_path = format!("{BACKUP_DIR}/{dump_name}");
    let gunzip = destination.exec(&wpconfig::gunzip_keep(&archive_path, &sql_path)).await?;
    let message = if gunzip.ok() {
        format!("decompressed to {sql_path}")
    } else {
        format!("gunzip failed: {}", gunzip.detail())
    };
    if settle(&mut log, &DECOMPRESS, reporter, gunzip.ok(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    reporter.step(IMPORT.label);
    let import = destination
        .exec(&wpconfig::import_database(
            &dest_creds.user,
            &dest_creds.password,
            &dest_creds.host,
            &dest_creds.name,
            &sql_path,
        ))
        .await?;
    // The decompressed copy goes away whether or not the import worked;
    // the compressed archive stays behind as the backup.
    let _ = destination.exec(&wpconfig::remove_file(&sql_path)).await;
    let message = if import.ok() {
        format!("imported into {}", dest_creds.locator())
    } else {
        format!("import failed: {}", import.detail())
    };
    if settle(&mut log, &IMPORT, reporter, import.ok(), message.clone()) == StepDisposition::Abort {
        return Ok(Verdict::fail(message));
    }

    reporter.step(UPDATE_URLS.label);
    let update = destination
        .exec(&wpconfig::update_site_urls(
            &dest_creds.user,
            &dest_creds.password,
            &dest_creds.host,
            &dest_creds.name,
            &params.new_url,
        ))
        .await?;
    let message = if update.ok() {
        format!("siteurl and home set to {} (was {})", params.new_url, params.old_url)
    } else {
        format!("URL rewrite failed: {}", update.detail())
    };
    if settle(&mut log, &UPDATE_URLS, reporter, update.ok(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    Ok(Verdict::pass_with(
        format!("database migrated into {}", dest_creds.locator()),
        source_creds,
    ))
}

/// Best-effort creation of the destination database when it is missing.
/// Runs as root without a password; failure is a warning because the
/// database may have been provisioned out of band.
async fn ensure_database(
    destination: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    log: &mut StageLog,
    creds: &DbCredentials,
) -> Result<()> {
    let listing = destination
        .exec(&wpconfig::show_databases(&creds.user, &creds.password, &creds.host))
        .await?;
    if listing.ok() && listing.stdout.lines().any(|line| line.trim() == creds.name) {
        settle(
            log,
            &ENSURE_DATABASE,
            reporter,
            true,
            format!("database {} already exists", creds.name),
        );
        return Ok(());
    }

    let created = destination
        .exec(&wpconfig::create_database(&creds.name, &creds.user, &creds.password))
        .await?;
    let message = if created.ok() {
        format!("created database {} and granted {}", creds.name, creds.user)
    } else {
        format!("could not create database {} (continuing): {}", creds.name, created.detail())
    };
    settle(log, &ENSURE_DATABASE, reporter, created.ok(), message);
    Ok(())
}
