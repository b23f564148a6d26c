//! CLI entry point for wave function collapse image generation

use clap::Parser;
use wavegrid::io::cli::{Cli, ModelRunner};

fn main() -> wavegrid::Result<()> {
    let cli = Cli::parse();
    let runner = ModelRunner::new(cli);
    runner.process()
}
