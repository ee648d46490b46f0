//! Pure domain types and functions — no I/O, no async, no infra imports.

pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod exec;
pub mod health;
pub mod plan;
pub mod shell;
pub mod wpconfig;
