//! Filesystem migration stage: archive, relay, extract, ownership and
//! permissions.

use anyhow::Result;
use chrono::Local;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::application::services::relay::relay_file;
use crate::application::services::settle;
use crate::domain::exec::Verdict;
use crate::domain::plan::{Criticality, StageLog, StepDisposition, StepSpec};
use crate::domain::wpconfig;

/// Archive staging path, same on both servers.
pub const ARCHIVE_PATH: &str = "/tmp/wordpress_files.tar.gz";

/// Inputs to the filesystem stage, fully resolved by the caller.
#[derive(Debug, Clone)]
pub struct FilesystemParams {
    pub source_path: String,
    pub dest_path: String,
    pub web_user: String,
    /// Keep a copy of any existing destination tree before clearing it.
    pub create_backup: bool,
}

const ARCHIVE: StepSpec = StepSpec {
    id: "archive",
    label: "archive the source WordPress tree",
    criticality: Criticality::Critical,
};
const TRANSFER: StepSpec = StepSpec {
    id: "transfer",
    label: "transfer archive to destination",
    criticality: Criticality::Critical,
};
// A failed backup must abort: the next step clears the destination tree,
// and without the copy there is nothing to restore from.
const BACKUP_EXISTING: StepSpec = StepSpec {
    id: "backup-existing",
    label: "back up the existing destination tree",
    criticality: Criticality::Critical,
};
const PREPARE_TARGET: StepSpec = StepSpec {
    id: "prepare-target",
    label: "prepare the destination directory",
    criticality: Criticality::Critical,
};
const EXTRACT: StepSpec = StepSpec {
    id: "extract",
    label: "extract archive on destination",
    criticality: Criticality::Critical,
};
const VERIFY_COUNT: StepSpec = StepSpec {
    id: "verify-count",
    label: "compare file counts",
    criticality: Criticality::BestEffort,
};
const OWNERSHIP: StepSpec = StepSpec {
    id: "ownership",
    label: "set file ownership",
    criticality: Criticality::BestEffort,
};
const PERMISSIONS: StepSpec = StepSpec {
    id: "permissions",
    label: "set file permissions",
    criticality: Criticality::Critical,
};

/// Pick the source tree to migrate. An override only wins when it really
/// holds a wp-config.php; otherwise the probed path stands.
pub async fn resolve_source_path(
    source: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    override_path: Option<&str>,
    detected: &str,
) -> Result<String> {
    if let Some(path) = override_path {
        if source.exec(&wpconfig::marker_probe(path)).await?.ok() {
            return Ok(path.to_string());
        }
        reporter.warn(&format!(
            "no wp-config.php under configured path {path}, using detected {detected}"
        ));
    }
    Ok(detected.to_string())
}

/// Run the whole filesystem stage. The verdict payload is the destination
/// WordPress path for the stages that follow.
pub async fn migrate_filesystem(
    source: &impl RemoteShell,
    destination: &impl RemoteShell,
    reporter: &impl ProgressReporter,
    params: &FilesystemParams,
) -> Result<Verdict<String>> {
    reporter.section("Filesystem migration");
    let mut log = StageLog::new("filesystem");

    reporter.step(ARCHIVE.label);
    let packed = source.exec(&wpconfig::archive_tree(&params.source_path, ARCHIVE_PATH)).await?;
    let message = if packed.ok() {
        let size = source.exec(&wpconfig::file_size_human(ARCHIVE_PATH)).await?;
        format!("archived {} ({})", params.source_path, size.stdout.trim())
    } else {
        format!("tar failed: {}", packed.detail())
    };
    if settle(&mut log, &ARCHIVE, reporter, packed.ok(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    reporter.step(TRANSFER.label);
    match relay_file(source, destination, ARCHIVE_PATH, ARCHIVE_PATH).await {
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

    let target_exists =
        destination.exec(&wpconfig::dir_exists(&params.dest_path)).await?.ok();

    if target_exists && params.create_backup {
        reporter.step(BACKUP_EXISTING.label);
        let backup_path = format!(
            "{}_backup_{}",
            params.dest_path.trim_end_matches('/'),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let copied =
            destination.exec(&wpconfig::copy_tree(&params.dest_path, &backup_path)).await?;
        let message = if copied.ok() {
            format!("existing tree copied to {backup_path}")
        } else {
            format!("backup copy failed: {}", copied.detail())
        };
        if settle(&mut log, &BACKUP_EXISTING, reporter, copied.ok(), message.clone())
            == StepDisposition::Abort
        {
            return Ok(Verdict::fail(message));
        }
    }

    reporter.step(PREPARE_TARGET.label);
    let prepared = if target_exists {
        destination.exec(&wpconfig::clear_dir_contents(&params.dest_path)).await?
    } else {
        destination.exec(&wpconfig::sudo_make_dir(&params.dest_path)).await?
    };
    let message = if prepared.ok() {
        format!("destination directory {} ready", params.dest_path)
    } else {
        format!("could not prepare {}: {}", params.dest_path, prepared.detail())
    };
    if settle(&mut log, &PREPARE_TARGET, reporter, prepared.ok(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    reporter.step(EXTRACT.label);
    let extracted =
        destination.exec(&wpconfig::extract_tree(ARCHIVE_PATH, &params.dest_path)).await?;
    let message = if extracted.ok() {
        format!("archive extracted into {}", params.dest_path)
    } else {
        format!("tar extract failed: {}", extracted.detail())
    };
    if settle(&mut log, &EXTRACT, reporter, extracted.ok(), message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    reporter.step(VERIFY_COUNT.label);
    let src_count = source.exec(&wpconfig::file_count(&params.source_path)).await?;
    let dst_count = destination.exec(&wpconfig::file_count(&params.dest_path)).await?;
    let src_n = src_count.stdout.trim().to_string();
    let dst_n = dst_count.stdout.trim().to_string();
    let counts_match = !src_n.is_empty() && src_n == dst_n;
    let message = if counts_match {
        format!("{src_n} files on both sides")
    } else {
        format!("file counts differ: {src_n} on source, {dst_n} on destination")
    };
    settle(&mut log, &VERIFY_COUNT, reporter, counts_match, message);

    reporter.step(OWNERSHIP.label);
    let owned =
        destination.exec(&wpconfig::chown_tree(&params.web_user, &params.dest_path)).await?;
    let message = if owned.ok() {
        format!("ownership set to {0}:{0}", params.web_user)
    } else {
        format!("chown failed (continuing): {}", owned.detail())
    };
    settle(&mut log, &OWNERSHIP, reporter, owned.ok(), message);

    reporter.step(PERMISSIONS.label);
    let dirs = destination.exec(&wpconfig::chmod_dirs(&params.dest_path)).await?;
    let files = destination.exec(&wpconfig::chmod_files(&params.dest_path)).await?;
    // wp-config.php is tightened further; failure here is not actionable
    // when the blanket pass succeeded.
    let _ = destination.exec(&wpconfig::chmod_config(&params.dest_path)).await;
    let perms_ok = dirs.ok() && files.ok();
    let message = if perms_ok {
        "permissions set (755 directories, 644 files, 640 wp-config.php)".to_string()
    } else {
        format!("chmod failed: {} {}", dirs.detail(), files.detail())
    };
    if settle(&mut log, &PERMISSIONS, reporter, perms_ok, message.clone())
        == StepDisposition::Abort
    {
        return Ok(Verdict::fail(message));
    }

    // Staging archives are not needed once the tree is in place.
    let _ = source.exec(&wpconfig::remove_file(ARCHIVE_PATH)).await;
    let _ = destination.exec(&wpconfig::remove_file(ARCHIVE_PATH)).await;

    Ok(Verdict::pass_with(
        format!("files migrated into {}", params.dest_path),
        params.dest_path.clone(),
    ))
}
