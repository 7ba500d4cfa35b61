use catalog_cli::Cli;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
