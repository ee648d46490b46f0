//! Interactive collection of connection details and database settings.
//!
//! Environment variables seed prompt defaults; every answer is validated
//! before it is accepted, and invalid input re-prompts rather than failing
//! the run.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::Prompter;
use crate::domain::credentials::DbCredentials;
use crate::domain::endpoint::{parse_port, validate_host, Role, ServerEndpoint};

/// Prompt defaults for one endpoint, usually read from the environment.
#[derive(Debug, Default, Clone)]
pub struct EndpointDefaults {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    /// `"key"` or `"password"`; anything else falls back to the prompt.
    pub auth_method: Option<String>,
    pub key_path: Option<String>,
    pub password: Option<String>,
}

/// Prompt defaults for the destination database.
#[derive(Debug, Default, Clone)]
pub struct DbDefaults {
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
}

/// Collect one fully-validated endpoint from the operator.
///
/// # Errors
///
/// Fails only when the prompt backend itself fails (closed terminal);
/// invalid answers loop.
pub fn collect_endpoint(
    prompter: &impl Prompter,
    role: Role,
    defaults: &EndpointDefaults,
) -> Result<ServerEndpoint> {
    let label = role.label();

    let host = loop {
        let answer = prompter.input(
            &format!("{label} server host (IP or hostname)"),
            defaults.host.as_deref(),
        )?;
        let answer = answer.trim().to_string();
        if validate_host(&answer) {
            break answer;
        }
    };

    let port_default = defaults.port.unwrap_or(22).to_string();
    let port = loop {
        let answer = prompter.input(&format!("{label} SSH port"), Some(&port_default))?;
        if let Some(port) = parse_port(&answer) {
            break port;
        }
    };

    let username =
        prompter.input(&format!("{label} SSH username"), defaults.username.as_deref())?;

    let (key_path, password) = collect_auth(prompter, label, defaults)?;

    Ok(ServerEndpoint::from_parts(&host, port, username.trim(), key_path, password)?)
}

/// Authentication sub-flow: key file (with retry and password fallback)
/// or straight password.
fn collect_auth(
    prompter: &impl Prompter,
    label: &str,
    defaults: &EndpointDefaults,
) -> Result<(Option<PathBuf>, Option<String>)> {
    let use_key = match defaults.auth_method.as_deref() {
        Some("key") => true,
        Some("password") => false,
        _ => {
            let choice = prompter.select(
                &format!("{label} authentication method"),
                &["private key", "password"],
                0,
            )?;
            choice == 0
        }
    };

    if use_key {
        let mut default_path = defaults.key_path.clone();
        loop {
            let answer =
                prompter.input(&format!("{label} private key path"), default_path.as_deref())?;
            let path = expand_tilde(answer.trim());
            if path.is_file() {
                return Ok((Some(path), None));
            }
            if !prompter.confirm(
                &format!("key file {} not found, try another path?", path.display()),
                true,
            )? {
                break;
            }
            default_path = None;
        }
    }

    let password = match &defaults.password {
        Some(pw) if !pw.is_empty() => pw.clone(),
        _ => prompter.password(&format!("{label} SSH password"))?,
    };
    Ok((None, Some(password)))
}

/// Collect destination database settings, prompting only for what the
/// environment left blank.
pub fn collect_db_credentials(
    prompter: &impl Prompter,
    defaults: &DbDefaults,
) -> Result<DbCredentials> {
    let name = match &defaults.name {
        Some(name) => name.clone(),
        None => prompter.input("destination database name", Some("wordpress_db"))?,
    };
    let user = match &defaults.user {
        Some(user) => user.clone(),
        None => prompter.input("destination database user", Some("wordpress_user"))?,
    };
    let password = match &defaults.password {
        Some(pw) if !pw.is_empty() => pw.clone(),
        _ => prompter.password(&format!("password for database user {user}"))?,
    };
    let host = defaults.host.clone().unwrap_or_else(|| "localhost".to_string());
    Ok(DbCredentials { name, user, password, host })
}

/// Expand a leading `~` or `~/` to the user's home directory.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(path).to_path_buf()
}
