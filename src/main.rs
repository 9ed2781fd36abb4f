//! `org`: inspect and restructure an organization chart from the command
//! line.
//!
//! The chart is loaded from a YAML dataset. Structural edits are applied in
//! memory and the resulting tree is printed; the dataset is never rewritten.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
