//! Shell command construction with explicit quoting.
//!
//! Untrusted values never reach a remote shell line raw: they pass through
//! [`sh_quote`] at construction time, either via the [`RemoteCommand`]
//! builder or when a fixed template interpolates a pre-quoted value.

use std::fmt;

/// Quote a value for POSIX `sh`.
///
/// Values made only of unambiguous characters are returned as-is; anything
/// else is wrapped in single quotes with embedded quotes closed-escaped
/// (`'` becomes `'\''`).
#[must_use]
pub fn sh_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(b, b'_' | b'-' | b'.' | b'/' | b':' | b'=' | b'@' | b'%' | b'+' | b',')
        });
    if safe {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Escape a value for use inside a PHP single-quoted string literal.
#[must_use]
pub fn php_string_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Escape a value for use in the replacement side of a `sed s///` or `c\`
/// command (backslash, delimiter slash, and ampersand are special there).
#[must_use]
pub fn sed_replacement_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('/', "\\/").replace('&', "\\&")
}

/// A fully-formed remote shell command line.
///
/// Built either from a program plus individually-quoted arguments, or from
/// a fixed template whose interpolations were quoted by the caller
/// (pipelines, redirections, heredocs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    text: String,
}

impl RemoteCommand {
    /// Start building `program arg arg ...` with per-argument quoting.
    #[must_use]
    pub fn builder(program: &str) -> CommandBuilder {
        CommandBuilder { parts: vec![program.to_string()] }
    }

    /// Wrap a fixed shell template. Every interpolated value in `text`
    /// must already have gone through [`sh_quote`] (or an
    /// escaping helper) — the template itself is trusted.
    #[must_use]
    pub fn script(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builder for simple `program arg...` command lines.
#[derive(Debug)]
pub struct CommandBuilder {
    parts: Vec<String>,
}

impl CommandBuilder {
    /// Append a trusted token (a flag like `-sm`) verbatim.
    #[must_use]
    pub fn opt(mut self, flag: &str) -> Self {
        self.parts.push(flag.to_string());
        self
    }

    /// Append an untrusted value, quoted.
    #[must_use]
    pub fn arg(mut self, value: &str) -> Self {
        self.parts.push(sh_quote(value));
        self
    }

    #[must_use]
    pub fn build(self) -> RemoteCommand {
        RemoteCommand { text: self.parts.join(" ") }
    }
}
