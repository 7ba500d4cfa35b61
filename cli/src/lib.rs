//! `catalog` command line.
//!
//! ## Commands
//!
//! - `catalog serve [--config FILE] [--bind ADDR] [--data PATH] [--workers N] [--init]`
//! - `catalog items list [--q Q] [--limit N] [--page N] [--json]`
//! - `catalog items get <ID>`
//! - `catalog items add --name N [--description D] [--category C] [--field k=v]...`
//! - `catalog stats`
//! - `catalog browse`

use clap::Parser;
use clap::Subcommand;

pub mod items_cmd;
pub mod serve_cmd;

use items_cmd::ItemsCli;
use serve_cmd::ServeArgs;

#[derive(Debug, Parser)]
#[command(name = "catalog", version, about = "Serve and browse a flat-file item catalog")]
pub struct Cli {
    /// Base URL of a running catalog server.
    #[arg(
        long = "base-url",
        global = true,
        env = catalog_client::ENV_BASE_URL,
        default_value = catalog_protocol::DEFAULT_BASE_URL
    )]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API in the foreground until Ctrl+C.
    Serve(ServeArgs),
    /// Query or add items through the API.
    Items(ItemsCli),
    /// Print item counts per category.
    Stats(StatsArgs),
    /// Browse items in a terminal UI.
    Browse(BrowseArgs),
}

#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct BrowseArgs {
    /// Directory for the browser's log file.
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: std::path::PathBuf,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve(args) => serve_cmd::run(&args),
            Command::Items(items) => items.run(&self.base_url),
            Command::Stats(args) => items_cmd::run_stats(&self.base_url, &args),
            Command::Browse(args) => {
                let _log_guard = catalog_tui::init_file_logging(&args.log_dir)?;
                catalog_tui::run(&self.base_url)
            }
        }
    }
}
