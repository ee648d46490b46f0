pub mod env;
pub mod logging;
pub mod prompt;
pub mod ssh;
