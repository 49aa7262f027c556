//! plugindoc: documentation build tooling for jsPsych plugins.
//!
//! Renders plugin parameter tables, summaries, badges and install snippets
//! from TypeDoc output, and writes redirect stubs between docs versions.

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
