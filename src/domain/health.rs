//! Preflight report model.

use serde::Serialize;

use crate::domain::credentials::DbCredentials;

/// One named preflight check with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

/// Everything preflight learned about the two servers. Serializable for
/// `validate --json`; extracted credentials stay out of the wire form.
#[derive(Debug, Default, Serialize)]
pub struct PreflightReport {
    pub checks: Vec<CheckOutcome>,
    /// WordPress root discovered on the source, when found.
    pub wp_path: Option<String>,
    #[serde(skip)]
    pub source_creds: Option<DbCredentials>,
}

impl PreflightReport {
    pub fn record(&mut self, name: &'static str, passed: bool, message: impl Into<String>) {
        self.checks.push(CheckOutcome { name, passed, message: message.into() });
    }

    /// The report passes only when every recorded check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Destination free space must cover the source tree twice over (archive
/// plus extracted copy). Exact equality is sufficient.
#[must_use]
pub fn disk_space_sufficient(source_mb: u64, free_mb: u64) -> bool {
    free_mb >= source_mb.saturating_mul(2)
}
