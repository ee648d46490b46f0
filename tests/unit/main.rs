//! Unit tests for the wpmig CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod configure_flow;
mod filesystem_stage;
mod mocks;
mod preflight_checks;
