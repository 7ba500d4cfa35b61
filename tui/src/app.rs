use std::io;
use std::io::Stdout;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use catalog_client::CancellationToken;
use catalog_client::DataContext;
use crossterm::event;
use crossterm::event::Event;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Handle;

use crate::app_event::AppEvent;
use crate::app_event::AppEventSender;
use crate::items_page::ItemsPageState;
use crate::items_page::PageAction;
use crate::render::render_items_page;

const INPUT_POLL: Duration = Duration::from_millis(250);

/// Event loop state. Only one list request is live at a time; starting a
/// new one cancels the previous token and bumps `generation`.
pub(crate) struct App {
    ctx: DataContext,
    runtime: Handle,
    tx: AppEventSender,
    state: ItemsPageState,
    in_flight: Option<CancellationToken>,
    generation: u64,
}

impl App {
    pub(crate) fn new(ctx: DataContext, runtime: Handle, tx: AppEventSender) -> Self {
        Self {
            ctx,
            runtime,
            tx,
            state: ItemsPageState::new(),
            in_flight: None,
            generation: 0,
        }
    }

    fn start_fetch(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.generation += 1;
        self.state.begin_fetch();

        let params = self.state.params();
        tracing::debug!(
            "fetch #{} page={} limit={} q={:?}",
            self.generation,
            params.page,
            params.limit,
            params.q
        );

        let _enter = self.runtime.enter();
        let handle = self.ctx.spawn_fetch(params);
        self.in_flight = Some(handle.token().clone());

        let generation = self.generation;
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = handle.join().await;
            tx.send(AppEvent::FetchSettled { generation, result });
        });
    }

    fn teardown(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Returns `false` once the user asked to quit.
    fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Key(key) => match self.state.handle_key(key) {
                PageAction::Quit => return false,
                PageAction::Fetch => self.start_fetch(),
                PageAction::Redraw | PageAction::None => {}
            },
            AppEvent::Resize => {}
            AppEvent::FetchSettled { generation, result } => {
                if generation == self.generation {
                    self.in_flight = None;
                    self.state.finish_fetch(result);
                } else {
                    tracing::debug!("dropping result of superseded fetch #{generation}");
                }
            }
        }
        true
    }

    pub(crate) fn run(
        mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        rx: Receiver<AppEvent>,
    ) -> io::Result<()> {
        self.start_fetch();
        loop {
            terminal.draw(|f| render_items_page(f.area(), f.buffer_mut(), &self.state))?;
            let Ok(event) = rx.recv() else {
                break;
            };
            if !self.handle_event(event) {
                break;
            }
        }
        self.teardown();
        Ok(())
    }
}

/// Forward terminal input to the app loop until `stop` is set.
pub(crate) fn spawn_input_thread(
    tx: AppEventSender,
    stop: Arc<AtomicBool>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("catalog-input".to_string())
        .spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                match event::poll(INPUT_POLL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        tracing::error!("terminal poll failed: {e}");
                        break;
                    }
                }
                match event::read() {
                    Ok(Event::Key(key)) => tx.send(AppEvent::Key(key)),
                    Ok(Event::Resize(..)) => tx.send(AppEvent::Resize),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("terminal read failed: {e}");
                        break;
                    }
                }
            }
        })
}

/// Restores the terminal when dropped, including on early return.
pub(crate) struct TerminalGuard {
    pub(crate) terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    pub(crate) fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("failed to disable raw mode: {e}");
        }
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::warn!("failed to leave alternate screen: {e}");
        }
        if let Err(e) = self.terminal.show_cursor() {
            tracing::warn!("failed to show cursor: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_client::ClientError;
    use catalog_protocol::ItemsPage;
    use crossterm::event::KeyCode;
    use crossterm::event::KeyEvent;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    fn app() -> (tokio::runtime::Runtime, App) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let (tx, _rx) = mpsc::channel();
        // Port 9 (discard) is never served; requests fail or get cancelled.
        let ctx = DataContext::new("http://127.0.0.1:9").unwrap();
        let app = App::new(ctx, runtime.handle().clone(), AppEventSender::new(tx));
        (runtime, app)
    }

    #[test]
    fn param_change_cancels_previous_fetch() {
        let (_runtime, mut app) = app();
        app.start_fetch();
        let first = app.in_flight.clone().unwrap();

        app.handle_event(AppEvent::Key(KeyEvent::new(
            KeyCode::Char('s'),
            KeyModifiers::NONE,
        )));

        assert!(first.is_cancelled());
        assert_eq!(app.generation, 2);
        assert!(!app.in_flight.as_ref().unwrap().is_cancelled());
    }

    #[test]
    fn stale_results_are_dropped() {
        let (_runtime, mut app) = app();
        app.start_fetch();
        app.start_fetch();

        app.handle_event(AppEvent::FetchSettled {
            generation: 1,
            result: Ok(ItemsPage {
                items: Vec::new(),
                total: 99,
            }),
        });
        assert!(app.state.is_loading());
        assert_eq!(app.state.total(), 0);

        app.handle_event(AppEvent::FetchSettled {
            generation: 2,
            result: Err(ClientError::Status {
                action: "fetch items",
                status: 502,
                detail: None,
            }),
        });
        assert!(!app.state.is_loading());
        assert_eq!(app.state.error(), Some("Failed to fetch items (502)"));
    }

    #[test]
    fn quit_key_stops_loop() {
        let (_runtime, mut app) = app();
        let keep_going = app.handle_event(AppEvent::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
        )));
        assert!(!keep_going);
    }
}
