//! Result shapes shared by every remote invocation and migration step.

/// Captured result of one remote command: exit status plus both output
/// streams, already trimmed. A connection-level fault is an `Err` at the
/// call site and never becomes an `ExecOutput`.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    #[must_use]
    pub fn new(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self { exit_code, stdout, stderr }
    }

    /// Exit status 0 means success; everything else is caller-interpreted.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }

    /// Both streams joined for error surfaces, verbatim.
    #[must_use]
    pub fn detail(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, true) => format!("exit status {}", self.exit_code),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{} {}", self.stdout, self.stderr),
        }
    }
}

/// Explicit step result: a pass/fail tag, a human-readable message, and an
/// optional payload for the caller. Replaces the positional
/// `(success, message, value)` tuple convention.
#[derive(Debug, Clone)]
pub struct Verdict<T = ()> {
    pub passed: bool,
    pub message: String,
    pub payload: Option<T>,
}

impl<T> Verdict<T> {
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self { passed: true, message: message.into(), payload: None }
    }

    #[must_use]
    pub fn pass_with(message: impl Into<String>, payload: T) -> Self {
        Self { passed: true, message: message.into(), payload: Some(payload) }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self { passed: false, message: message.into(), payload: None }
    }
}
