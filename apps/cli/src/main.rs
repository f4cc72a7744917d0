//! KeywordForge CLI — keyword clustering and content planning tool.
//!
//! Turns comma-separated keyword submissions into semantic groups,
//! blog post outlines, and paginated text reports.

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
