use std::sync::mpsc::Sender;

use catalog_client::ClientError;
use catalog_protocol::ItemsPage;
use crossterm::event::KeyEvent;

#[derive(Debug)]
pub(crate) enum AppEvent {
    Key(KeyEvent),

    /// Terminal size changed; redraw.
    Resize,

    /// A list fetch finished. `generation` identifies which request it
    /// answers so that stale results can be dropped.
    FetchSettled {
        generation: u64,
        result: Result<ItemsPage, ClientError>,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct AppEventSender {
    tx: Sender<AppEvent>,
}

impl AppEventSender {
    pub(crate) fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Send an event to the app loop. If the loop is gone we swallow the
    /// error and log it.
    pub(crate) fn send(&self, event: AppEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::error!("failed to send event: {e}");
        }
    }
}
