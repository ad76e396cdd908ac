//! docscope CLI: filter one documentation tree into per-audience builds.
//!
//! Reads MDX pages and the `docs.json` navigation manifest, keeps only what a
//! build target may see, and writes the result under `build/<target>/`.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
