//! Shared mock infrastructure for unit tests.
//!
//! Provides scripted [`RemoteShell`], [`SessionFactory`], [`Prompter`] and
//! [`ProgressReporter`] implementations so each test file doesn't have to
//! re-define the same boilerplate.

#![allow(clippy::expect_used)]
#![allow(dead_code)] // Not every test file uses every helper

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use wpmig::application::ports::{ProgressReporter, Prompter, RemoteShell, SessionFactory};
use wpmig::domain::endpoint::ServerEndpoint;
use wpmig::domain::exec::ExecOutput;
use wpmig::domain::shell::RemoteCommand;

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &str) -> ExecOutput {
    ExecOutput::new(0, stdout.to_string(), String::new())
}

pub fn err_output(stderr: &str) -> ExecOutput {
    ExecOutput::new(1, String::new(), stderr.to_string())
}

pub fn endpoint(host: &str) -> ServerEndpoint {
    ServerEndpoint::from_parts(host, 22, "deploy", None, Some("pw".into())).expect("endpoint")
}

// ── Scripted remote shell ─────────────────────────────────────────────────────

/// Rule-based shell: the first rule whose pattern appears in the command
/// text supplies the response. Unmatched commands fail the test unless a
/// fallback is installed, so a test can't silently run commands it didn't
/// anticipate.
pub struct ScriptedShell {
    rules: Vec<(&'static str, ExecOutput)>,
    fallback: Option<ExecOutput>,
    transfers_fail: bool,
    pub commands: Mutex<Vec<String>>,
    pub close_count: Arc<AtomicUsize>,
}

impl ScriptedShell {
    pub fn new(rules: Vec<(&'static str, ExecOutput)>) -> Self {
        Self {
            rules,
            fallback: None,
            transfers_fail: false,
            commands: Mutex::new(Vec::new()),
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Any command not matched by a rule succeeds with empty output.
    pub fn with_fallback_ok(mut self) -> Self {
        self.fallback = Some(ok_output(""));
        self
    }

    pub fn with_close_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.close_count = counter;
        self
    }

    pub fn with_failing_transfers(mut self) -> Self {
        self.transfers_fail = true;
        self
    }

    /// Whether any executed command contained `pattern`.
    pub fn ran(&self, pattern: &str) -> bool {
        self.commands.lock().expect("lock").iter().any(|c| c.contains(pattern))
    }
}

impl RemoteShell for ScriptedShell {
    async fn exec(&self, command: &RemoteCommand) -> Result<ExecOutput> {
        let text = command.text().to_string();
        self.commands.lock().expect("lock").push(text.clone());
        for (pattern, output) in &self.rules {
            if text.contains(pattern) {
                return Ok(output.clone());
            }
        }
        match &self.fallback {
            Some(output) => Ok(output.clone()),
            None => bail!("unexpected command: {text}"),
        }
    }

    async fn download(&self, _remote: &str, local: &Path) -> Result<u64> {
        if self.transfers_fail {
            bail!("sftp download refused");
        }
        tokio::fs::write(local, b"payload").await?;
        Ok(7)
    }

    async fn upload(&self, local: &Path, _remote: &str) -> Result<u64> {
        if self.transfers_fail {
            bail!("sftp upload refused");
        }
        let data = tokio::fs::read(local).await?;
        Ok(data.len() as u64)
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Scripted session factory ──────────────────────────────────────────────────

/// Hands out pre-built sessions (or connect errors) in order.
pub struct ScriptedFactory {
    sessions: Mutex<VecDeque<Result<ScriptedShell>>>,
}

impl ScriptedFactory {
    pub fn new(sessions: Vec<Result<ScriptedShell>>) -> Self {
        Self { sessions: Mutex::new(sessions.into_iter().collect()) }
    }
}

impl SessionFactory for ScriptedFactory {
    type Session = ScriptedShell;

    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<ScriptedShell> {
        match self.sessions.lock().expect("lock").pop_front() {
            Some(result) => result,
            None => bail!("unexpected connect to {}", endpoint.address()),
        }
    }
}

// ── Recording reporter ────────────────────────────────────────────────────────

/// Captures every progress event as a `"kind: message"` line.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn saw(&self, fragment: &str) -> bool {
        self.events.lock().expect("lock").iter().any(|e| e.contains(fragment))
    }
}

impl ProgressReporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.events.lock().expect("lock").push(format!("section: {title}"));
    }
    fn step(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("warn: {message}"));
    }
    fn fail(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("fail: {message}"));
    }
}

// ── Scripted prompter ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Answer {
    /// Text answer; an empty string accepts the prompt default.
    Input(String),
    Password(String),
    Confirm(bool),
    Select(usize),
}

pub fn input(value: &str) -> Answer {
    Answer::Input(value.to_string())
}

/// Replays canned answers in order; a prompt of the wrong kind or an
/// exhausted script fails the test.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self { answers: Mutex::new(answers.into_iter().collect()) }
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        match self.answers.lock().expect("lock").pop_front() {
            Some(Answer::Input(value)) if value.is_empty() => {
                Ok(default.unwrap_or_default().to_string())
            }
            Some(Answer::Input(value)) => Ok(value),
            other => bail!("unexpected input prompt {prompt:?} (next answer: {other:?})"),
        }
    }

    fn password(&self, prompt: &str) -> Result<String> {
        match self.answers.lock().expect("lock").pop_front() {
            Some(Answer::Password(value)) => Ok(value),
            other => bail!("unexpected password prompt {prompt:?} (next answer: {other:?})"),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        match self.answers.lock().expect("lock").pop_front() {
            Some(Answer::Confirm(value)) => Ok(value),
            other => bail!("unexpected confirm prompt {prompt:?} (next answer: {other:?})"),
        }
    }

    fn select(&self, prompt: &str, _items: &[&str], _default: usize) -> Result<usize> {
        match self.answers.lock().expect("lock").pop_front() {
            Some(Answer::Select(index)) => Ok(index),
            other => bail!("unexpected select prompt {prompt:?} (next answer: {other:?})"),
        }
    }
}
