//! File relay between the two servers.
//!
//! There is no server-to-server channel: files hop through a local staging
//! directory that lives only for the duration of the transfer.

use std::time::Instant;

use anyhow::Result;

use crate::application::ports::RemoteShell;

/// Timing and volume of one relayed file.
#[derive(Debug, Clone, Copy)]
pub struct RelayTiming {
    pub bytes: u64,
    pub download_secs: f64,
    pub upload_secs: f64,
}

/// Download `remote_src` from the source server into a temporary local
/// file, then upload it to `remote_dst` on the destination server. The
/// staging file is removed when the transfer finishes, on success and
/// failure alike.
pub async fn relay_file(
    source: &impl RemoteShell,
    destination: &impl RemoteShell,
    remote_src: &str,
    remote_dst: &str,
) -> Result<RelayTiming> {
    let staging = tempfile::tempdir()?;
    let local = staging.path().join(file_name_of(remote_src));

    let started = Instant::now();
    let bytes = source.download(remote_src, &local).await?;
    let download_secs = started.elapsed().as_secs_f64();

    let started = Instant::now();
    destination.upload(&local, remote_dst).await?;
    let upload_secs = started.elapsed().as_secs_f64();

    Ok(RelayTiming { bytes, download_secs, upload_secs })
}

/// Final path component of a remote path.
#[must_use]
pub fn file_name_of(remote: &str) -> &str {
    remote.rsplit('/').next().unwrap_or(remote)
}
