//! addonsync CLI: enrich an addon catalog from CurseForge and Modrinth.
//!
//! Reads the catalog table, resolves CurseForge project ids, fetches
//! registry metadata, and writes the YAML document the site renders.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
