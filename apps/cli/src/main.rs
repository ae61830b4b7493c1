//! listing-rewriter CLI: batch-rewrite property listings with a local model.
//!
//! Rewrites each listing's title and description, then stores a generated
//! summary that also covers the listing's amenities.

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
