//! Environment-variable defaults for prompts and stage parameters.
//!
//! Nothing here is mandatory: every variable only pre-fills a prompt or a
//! documented fallback.

use std::env;

use crate::application::services::configure::{DbDefaults, EndpointDefaults};
use crate::domain::endpoint::Role;

/// An environment variable treated as unset when empty or whitespace.
#[must_use]
pub fn var_nonempty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `SOURCE_*` / `DESTINATION_*` connection defaults for one endpoint.
#[must_use]
pub fn endpoint_defaults(role: Role) -> EndpointDefaults {
    let prefix = role.env_prefix();
    EndpointDefaults {
        host: var_nonempty(&format!("{prefix}_HOST")),
        port: var_nonempty(&format!("{prefix}_PORT")).and_then(|v| v.parse().ok()),
        username: var_nonempty(&format!("{prefix}_USER")),
        auth_method: var_nonempty(&format!("{prefix}_AUTH_METHOD")).map(|v| v.to_lowercase()),
        key_path: var_nonempty(&format!("{prefix}_KEY_PATH")),
        password: var_nonempty(&format!("{prefix}_PASSWORD")),
    }
}

/// Defaults for migration-wide parameters.
#[derive(Debug, Clone)]
pub struct MigrationDefaults {
    pub old_url: Option<String>,
    pub new_url: Option<String>,
    /// Overrides the probed install path when it actually holds a
    /// wp-config.php; verified before use.
    pub source_wp_path: Option<String>,
    pub dest_wp_path: Option<String>,
    pub web_user: String,
}

#[must_use]
pub fn migration_defaults() -> MigrationDefaults {
    MigrationDefaults {
        old_url: var_nonempty("OLD_URL"),
        new_url: var_nonempty("NEW_URL"),
        source_wp_path: var_nonempty("SOURCE_WP_PATH"),
        dest_wp_path: var_nonempty("DESTINATION_WP_PATH"),
        // DESTINATION_WEB_USER wins over the legacy WEB_USER spelling.
        web_user: var_nonempty("DESTINATION_WEB_USER")
            .or_else(|| var_nonempty("WEB_USER"))
            .unwrap_or_else(|| "www-data".to_string()),
    }
}

/// Destination database defaults. Only the password has no fallback and
/// is prompted for when unset.
#[must_use]
pub fn db_defaults() -> DbDefaults {
    DbDefaults {
        name: Some(
            var_nonempty("DESTINATION_DB_NAME").unwrap_or_else(|| "wordpress_db".to_string()),
        ),
        user: Some(
            var_nonempty("DESTINATION_DB_USER").unwrap_or_else(|| "wordpress_user".to_string()),
        ),
        password: var_nonempty("DESTINATION_DB_PASS"),
        host: Some(
            var_nonempty("DESTINATION_DB_HOST").unwrap_or_else(|| "localhost".to_string()),
        ),
    }
}
