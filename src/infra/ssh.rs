//! SSH adapter: russh sessions implementing the remote execution ports.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{RemoteShell, SessionFactory};
use crate::domain::endpoint::{AuthMethod, ServerEndpoint};
use crate::domain::exec::ExecOutput;
use crate::domain::shell::RemoteCommand;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Host keys are accepted unconditionally: runs target fresh or
/// short-lived servers whose keys are not in any known_hosts yet.
struct AcceptAllHostKeys;

#[async_trait]
impl client::Handler for AcceptAllHostKeys {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Opens authenticated [`SshSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl SessionFactory for SshConnector {
    type Session = SshSession;

    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<SshSession> {
        let config = Arc::new(client::Config::default());
        let mut handle = tokio::time::timeout(
            CONNECT_TIMEOUT,
            client::connect(
                config,
                (endpoint.host.as_str(), endpoint.port),
                AcceptAllHostKeys,
            ),
        )
        .await
        .with_context(|| format!("connection to {} timed out", endpoint.address()))?
        .with_context(|| format!("cannot connect to {}", endpoint.address()))?;

        let authenticated = match &endpoint.auth {
            AuthMethod::Password(password) => {
                handle.authenticate_password(&endpoint.username, password).await?
            }
            AuthMethod::Key(path) => {
                let key = russh_keys::load_secret_key(path, None)
                    .with_context(|| format!("cannot load private key {}", path.display()))?;
                handle.authenticate_publickey(&endpoint.username, Arc::new(key)).await?
            }
        };
        if !authenticated {
            bail!(
                "authentication failed for {}@{}",
                endpoint.username,
                endpoint.address()
            );
        }
        tracing::info!(host = %endpoint.address(), user = %endpoint.username, "ssh session established");
        Ok(SshSession { handle, label: endpoint.address() })
    }
}

/// One authenticated connection. Commands run on fresh exec channels;
/// transfers run over an SFTP subsystem channel opened per call.
pub struct SshSession {
    handle: Handle<AcceptAllHostKeys>,
    label: String,
}

impl SshSession {
    async fn sftp(&self) -> Result<SftpSession> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .with_context(|| format!("cannot start sftp on {}", self.label))?;
        Ok(sftp)
    }
}

impl RemoteShell for SshSession {
    async fn exec(&self, command: &RemoteCommand) -> Result<ExecOutput> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command.text()).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    stderr.extend_from_slice(data);
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = Some(i32::try_from(exit_status).unwrap_or(i32::MAX));
                }
                _ => {}
            }
        }
        let Some(code) = exit_code else {
            bail!("channel to {} closed without an exit status", self.label);
        };
        tracing::debug!(host = %self.label, code, command = command.text(), "remote command finished");
        Ok(ExecOutput::new(
            code,
            String::from_utf8_lossy(&stdout).trim().to_string(),
            String::from_utf8_lossy(&stderr).trim().to_string(),
        ))
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<u64> {
        let sftp = self.sftp().await?;
        let mut src = sftp
            .open_with_flags(remote, OpenFlags::READ)
            .await
            .with_context(|| format!("cannot open {remote} on {}", self.label))?;
        let mut dst = tokio::fs::File::create(local)
            .await
            .with_context(|| format!("cannot create {}", local.display()))?;
        let bytes = tokio::io::copy(&mut src, &mut dst).await?;
        dst.flush().await?;
        tracing::debug!(host = %self.label, remote, bytes, "downloaded");
        Ok(bytes)
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<u64> {
        let sftp = self.sftp().await?;
        let mut src = tokio::fs::File::open(local)
            .await
            .with_context(|| format!("cannot open {}", local.display()))?;
        let mut dst = sftp
            .open_with_flags(
                remote,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await
            .with_context(|| format!("cannot create {remote} on {}", self.label))?;
        let bytes = tokio::io::copy(&mut src, &mut dst).await?;
        dst.flush().await?;
        dst.shutdown().await?;
        tracing::debug!(host = %self.label, remote, bytes, "uploaded");
        Ok(bytes)
    }

    async fn close(&self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        tracing::info!(host = %self.label, "ssh session closed");
        Ok(())
    }
}
