//! Server endpoints — the two SSH targets of a migration run.

use std::path::PathBuf;

use crate::domain::error::EndpointError;

/// Which side of the migration an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

impl Role {
    /// Human-facing label used in prompts and log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Destination => "destination",
        }
    }

    /// Prefix for the environment variables that seed this endpoint's
    /// defaults (`SOURCE_HOST`, `DESTINATION_USER`, ...).
    #[must_use]
    pub fn env_prefix(self) -> &'static str {
        match self {
            Role::Source => "SOURCE",
            Role::Destination => "DESTINATION",
        }
    }
}

/// SSH authentication material — exactly one of key or password, by
/// construction.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Path to a private key file.
    Key(PathBuf),
    /// Plain password.
    Password(String),
}

/// One remote SSH target, immutable for the run.
#[derive(Debug, Clone)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,
}

impl ServerEndpoint {
    /// Build an endpoint from loosely-typed parts, as collected from the
    /// environment or interactive prompts.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidHost`] for a malformed host and
    /// [`EndpointError::MissingAuth`] when neither a key path nor a
    /// password is supplied. When both are present the key wins.
    pub fn from_parts(
        host: &str,
        port: u16,
        username: &str,
        key_path: Option<PathBuf>,
        password: Option<String>,
    ) -> Result<Self, EndpointError> {
        if !validate_host(host) {
            return Err(EndpointError::InvalidHost(host.to_string()));
        }
        let auth = match (key_path, password) {
            (Some(path), _) => AuthMethod::Key(path),
            (None, Some(password)) => AuthMethod::Password(password),
            (None, None) => return Err(EndpointError::MissingAuth),
        };
        Ok(Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            auth,
        })
    }

    /// `host:port` form used in log and error messages.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Basic validation of an IPv4 address or hostname.
///
/// Accepts a dotted quad with all octets in 0–255, or a name made of
/// alphanumerics, dots and hyphens, up to 253 characters.
#[must_use]
pub fn validate_host(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() == 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        return parts.iter().all(|p| p.parse::<u16>().is_ok_and(|n| n <= 255));
    }
    value.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Parse an SSH port, accepting 1–65535 only.
#[must_use]
pub fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|p| *p >= 1)
}
