//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// One-shot WordPress migration between two SSH hosts
#[derive(Parser)]
#[command(
    name = "wpmig",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip the confirmation prompt before migrating
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full migration (database, files, wp-config.php)
    Migrate(commands::migrate::MigrateArgs),

    /// Run the pre-migration checks only
    Validate,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli { no_color, quiet, json, yes, command } = self;
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(())
            }
            Command::Validate => {
                crate::infra::logging::init()?;
                let ctx = crate::output::OutputContext::new(no_color, quiet);
                commands::validate::run(&ctx, json).await
            }
            Command::Migrate(args) => {
                crate::infra::logging::init()?;
                let ctx = crate::output::OutputContext::new(no_color, quiet);
                commands::migrate::run(&ctx, &args, yes).await
            }
        }
    }
}
