//! Command handlers — one module per subcommand.

pub mod migrate;
pub mod validate;
pub mod version;
