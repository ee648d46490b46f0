//! Database credentials for one MySQL/MariaDB instance.

use std::fmt;

/// Connection parameters for one database. Two instances exist per run:
/// the source set extracted from wp-config.php and the destination set
/// collected from the environment or the operator.
#[derive(Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
}

impl fmt::Debug for DbCredentials {
    // The password never reaches log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}

impl DbCredentials {
    /// `name @ host` form used in log lines.
    #[must_use]
    pub fn locator(&self) -> String {
        format!("{} @ {}", self.name, self.host)
    }
}
