//! wpmig — one-shot WordPress migration between two SSH hosts.

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;

use wpmig::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
