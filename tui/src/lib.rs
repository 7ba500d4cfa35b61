//! Terminal browser for the catalog.
//!
//! Shows one page of items at a time with a search line, page-size
//! selector and prev/next navigation. The UI thread owns the state; list
//! requests run on a tokio runtime and report back over a channel.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;

use anyhow::Context;
use catalog_client::DataContext;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod app_event;
pub mod items_page;
pub mod render;

use app::App;
use app_event::AppEventSender;

const LOG_FILE: &str = "catalog-browse.log";

/// Route tracing output to `<log_dir>/catalog-browse.log`; the terminal
/// belongs to the UI. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init_file_logging(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log dir {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;
    Ok(guard)
}

/// Run the browser against `base_url` until the user quits.
pub fn run(base_url: &str) -> anyhow::Result<()> {
    let ctx = DataContext::new(base_url)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("catalog-fetch")
        .enable_all()
        .build()
        .context("starting fetch runtime")?;

    let (tx, rx) = mpsc::channel();
    let sender = AppEventSender::new(tx);
    let stop = Arc::new(AtomicBool::new(false));

    tracing::info!("browsing {}", ctx.base_url());
    let mut guard = app::TerminalGuard::enter().context("initializing terminal")?;
    let input = app::spawn_input_thread(sender.clone(), Arc::clone(&stop))?;
    let result = App::new(ctx, runtime.handle().clone(), sender).run(&mut guard.terminal, rx);
    drop(guard);

    stop.store(true, Ordering::Relaxed);
    if input.join().is_err() {
        tracing::warn!("input thread panicked");
    }
    runtime.shutdown_background();
    result.context("terminal I/O failed")
}
