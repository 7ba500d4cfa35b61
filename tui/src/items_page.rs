//! State of the items browser.
//!
//! Owns everything the screen shows: the search text being edited, the
//! submitted search, page number and size, the loading flag, the last error,
//! and the current page of items. Key presses mutate the state and report
//! whether the list parameters changed, in which case the app starts a new
//! fetch and cancels the previous one.

use std::ops::Range;

use catalog_client::ClientError;
use catalog_client::FetchParams;
use catalog_protocol::Item;
use catalog_protocol::ItemsPage;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;

/// Page sizes offered by the size selector.
pub const PAGE_SIZES: [usize; 4] = [10, 20, 50, 100];

/// Rows materialized at once, regardless of page size.
pub const VISIBLE_ROWS: usize = 10;

pub const EMPTY_MESSAGE: &str = "No results. Try a different search.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    List,
}

/// What the app should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    None,
    Redraw,
    Fetch,
    Quit,
}

#[derive(Debug, Clone)]
pub struct ItemsPageState {
    input: String,
    query: String,
    page: usize,
    limit: usize,
    loading: bool,
    error: Option<String>,
    items: Vec<Item>,
    total: usize,
    selected: usize,
    offset: usize,
    focus: Focus,
}

impl Default for ItemsPageState {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemsPageState {
    pub fn new() -> Self {
        let defaults = FetchParams::default();
        Self {
            input: String::new(),
            query: defaults.q,
            page: defaults.page,
            limit: defaults.limit,
            loading: false,
            error: None,
            items: Vec::new(),
            total: 0,
            selected: 0,
            offset: 0,
            focus: Focus::List,
        }
    }

    pub fn params(&self) -> FetchParams {
        FetchParams {
            page: self.page,
            limit: self.limit,
            q: self.query.clone(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// A short page, or one that reaches the server's match count.
    pub fn is_last_page(&self) -> bool {
        self.items.len() < self.limit || self.page.saturating_mul(self.limit) >= self.total
    }

    pub fn can_prev(&self) -> bool {
        !self.loading && self.page > 1
    }

    pub fn can_next(&self) -> bool {
        !self.loading && !self.is_last_page()
    }

    /// Only true once a fetch has settled with zero items.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.error.is_none() && self.items.is_empty()
    }

    /// Indices of the rows to materialize.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + VISIBLE_ROWS).min(self.items.len());
        self.offset.min(end)..end
    }

    /// Mark a new request as in flight.
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Apply the outcome of the current request.
    ///
    /// Cancellations are ignored: a newer request is already in flight and
    /// owns the loading flag.
    pub fn finish_fetch(&mut self, result: Result<ItemsPage, ClientError>) {
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total = page.total;
                self.selected = 0;
                self.offset = 0;
                self.loading = false;
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                tracing::warn!("fetch failed: {err}");
                self.error = Some(err.to_string());
                self.loading = false;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PageAction {
        if key.kind == KeyEventKind::Release {
            return PageAction::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return PageAction::Quit;
        }
        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> PageAction {
        match key.code {
            KeyCode::Enter => self.submit_search(),
            KeyCode::Esc | KeyCode::Tab => {
                self.focus = Focus::List;
                PageAction::Redraw
            }
            KeyCode::Backspace => {
                self.input.pop();
                PageAction::Redraw
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                PageAction::Redraw
            }
            _ => PageAction::None,
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> PageAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => PageAction::Quit,
            KeyCode::Char('/') | KeyCode::Tab => {
                self.focus = Focus::Search;
                PageAction::Redraw
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-(VISIBLE_ROWS as isize)),
            KeyCode::PageDown => self.move_selection(VISIBLE_ROWS as isize),
            KeyCode::Left | KeyCode::Char('p') => self.prev_page(),
            KeyCode::Right | KeyCode::Char('n') => self.next_page(),
            KeyCode::Char('s') => self.cycle_limit(),
            KeyCode::Char('r') => PageAction::Fetch,
            _ => PageAction::None,
        }
    }

    /// Enter on the search line. Always goes back to the first page.
    pub fn submit_search(&mut self) -> PageAction {
        self.query = self.input.trim().to_string();
        self.page = 1;
        self.focus = Focus::List;
        PageAction::Fetch
    }

    pub fn prev_page(&mut self) -> PageAction {
        if !self.can_prev() {
            return PageAction::None;
        }
        self.page -= 1;
        PageAction::Fetch
    }

    pub fn next_page(&mut self) -> PageAction {
        if !self.can_next() {
            return PageAction::None;
        }
        self.page += 1;
        PageAction::Fetch
    }

    /// Step to the next page size and restart from page 1.
    pub fn cycle_limit(&mut self) -> PageAction {
        let next = PAGE_SIZES
            .iter()
            .position(|&size| size == self.limit)
            .map_or(0, |i| (i + 1) % PAGE_SIZES.len());
        self.set_limit(PAGE_SIZES[next])
    }

    pub fn set_limit(&mut self, limit: usize) -> PageAction {
        self.limit = limit;
        self.page = 1;
        PageAction::Fetch
    }

    fn move_selection(&mut self, delta: isize) -> PageAction {
        if self.items.is_empty() {
            return PageAction::None;
        }
        let last = self.items.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + VISIBLE_ROWS {
            self.offset = self.selected + 1 - VISIBLE_ROWS;
        }
        PageAction::Redraw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item {
                id: i as i64 + 1,
                name: format!("Item {i}"),
                description: String::new(),
                category: None,
                extra: Default::default(),
            })
            .collect()
    }

    fn loaded(n: usize, total: usize) -> ItemsPageState {
        let mut state = ItemsPageState::new();
        state.begin_fetch();
        state.finish_fetch(Ok(ItemsPage {
            items: items(n),
            total,
        }));
        state
    }

    #[test]
    fn search_submit_resets_to_first_page() {
        let mut state = loaded(20, 100);
        assert_eq!(state.next_page(), PageAction::Fetch);
        assert_eq!(state.page(), 2);

        state.handle_key(key(KeyCode::Char('/')));
        for c in " alpha ".chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(state.handle_key(key(KeyCode::Enter)), PageAction::Fetch);

        assert_eq!(
            state.params(),
            FetchParams {
                page: 1,
                limit: 20,
                q: "alpha".to_string(),
            }
        );
        assert_eq!(state.focus(), Focus::List);
    }

    #[test]
    fn page_size_cycles_and_resets_page() {
        let mut state = loaded(20, 100);
        state.next_page();
        assert_eq!(state.cycle_limit(), PageAction::Fetch);
        assert_eq!((state.page(), state.limit()), (1, 50));
        state.cycle_limit();
        state.cycle_limit();
        assert_eq!(state.limit(), 10);
    }

    #[test]
    fn prev_disabled_on_first_page_and_while_loading() {
        let mut state = loaded(20, 100);
        assert!(!state.can_prev());
        assert_eq!(state.prev_page(), PageAction::None);

        state.next_page();
        assert!(state.can_prev());
        state.begin_fetch();
        assert!(!state.can_prev());
        assert!(!state.can_next());
    }

    #[test]
    fn last_page_detection() {
        // Short page.
        assert!(loaded(7, 0).is_last_page());
        // Full page that exactly reaches the total.
        assert!(loaded(20, 20).is_last_page());
        // Full page with more to come.
        let state = loaded(20, 21);
        assert!(!state.is_last_page());
        assert!(state.can_next());
    }

    #[test]
    fn cancelled_result_is_ignored() {
        let mut state = loaded(3, 3);
        state.begin_fetch();
        state.finish_fetch(Err(ClientError::Cancelled));
        assert!(state.is_loading());
        assert_eq!(state.error(), None);
        assert_eq!(state.items().len(), 3);
    }

    #[test]
    fn failed_result_is_shown() {
        let mut state = ItemsPageState::new();
        state.begin_fetch();
        state.finish_fetch(Err(ClientError::Status {
            action: "fetch items",
            status: 503,
            detail: None,
        }));
        assert!(!state.is_loading());
        assert_eq!(state.error(), Some("Failed to fetch items (503)"));
        assert!(!state.is_empty_result());
    }

    #[test]
    fn window_follows_selection() {
        let mut state = loaded(50, 50);
        assert_eq!(state.visible_range(), 0..10);

        for _ in 0..12 {
            state.handle_key(key(KeyCode::Down));
        }
        assert_eq!(state.selected(), 12);
        assert_eq!(state.visible_range(), 3..13);

        state.handle_key(key(KeyCode::PageDown));
        state.handle_key(key(KeyCode::PageDown));
        state.handle_key(key(KeyCode::PageDown));
        state.handle_key(key(KeyCode::PageDown));
        assert_eq!(state.selected(), 49);
        assert_eq!(state.visible_range(), 40..50);

        state.handle_key(key(KeyCode::PageUp));
        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.selected(), 38);
        assert_eq!(state.visible_range(), 38..48);
        assert!(state.visible_range().len() <= VISIBLE_ROWS);
    }

    #[test]
    fn typing_q_in_search_does_not_quit() {
        let mut state = ItemsPageState::new();
        state.handle_key(key(KeyCode::Tab));
        assert_eq!(state.handle_key(key(KeyCode::Char('q'))), PageAction::Redraw);
        assert_eq!(state.input(), "q");
        state.handle_key(key(KeyCode::Esc));
        assert_eq!(state.handle_key(key(KeyCode::Char('q'))), PageAction::Quit);
    }
}
