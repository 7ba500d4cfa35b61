use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use catalog_protocol::Item;
use catalog_server::ServerConfig;
use catalog_store::ItemStore;
use clap::Parser;

/// Sample catalog written by `serve --init` when the data file is missing.
const SEED_ITEMS: &str = include_str!("../../data/items.json");

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// TOML config file. Environment and flags override its values.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:3001.
    #[arg(long = "bind")]
    pub bind: Option<SocketAddr>,

    /// Catalog JSON document.
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// Worker threads.
    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// Write the sample catalog if the data file does not exist.
    #[arg(long = "init")]
    pub init: bool,
}

impl ServeArgs {
    /// Layer the flags on top of file and environment values.
    pub fn resolve(&self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if let Err(e) = subscriber.try_init() {
        eprintln!("logging already initialized: {e}");
    }
}

pub fn run(args: &ServeArgs) -> anyhow::Result<()> {
    init_logging();
    tracing::info!("catalog v{} starting", env!("CARGO_PKG_VERSION"));

    let config = args.resolve()?;
    if args.init {
        let seed: Vec<Item> =
            serde_json::from_str(SEED_ITEMS).context("parsing built-in sample catalog")?;
        let store = ItemStore::open(&config.data_path);
        if !store.init_if_missing(&seed)? {
            tracing::info!("{} already exists; leaving it alone", config.data_path.display());
        }
    }

    let handle = catalog_server::start(&config)
        .with_context(|| format!("binding {}", config.bind))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting signal runtime")?;
    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("waiting for Ctrl+C")?;

    tracing::info!("shutting down");
    handle.shutdown();
    Ok(())
}
