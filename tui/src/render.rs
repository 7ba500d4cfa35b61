use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;

use crate::items_page::EMPTY_MESSAGE;
use crate::items_page::Focus;
use crate::items_page::ItemsPageState;
use crate::items_page::PAGE_SIZES;
use crate::items_page::VISIBLE_ROWS;

/// Draw the whole browser into `area`.
pub fn render_items_page(area: Rect, buf: &mut Buffer, state: &ItemsPageState) {
    let [header, search, status, list, footer, hints] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(VISIBLE_ROWS as u16 + 2),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .areas(area);

    Paragraph::new(Line::from(vec![
        "Catalog".bold(),
        "  ".into(),
        Span::raw(format!("{} matching", state.total())).dim(),
    ]))
    .render(header, buf);

    Paragraph::new(search_line(state)).render(search, buf);
    Paragraph::new(status_line(state)).render(status, buf);
    render_rows(list, buf, state);
    Paragraph::new(footer_line(state)).render(footer, buf);
    Paragraph::new(hint_line(state)).render(hints, buf);
}

fn search_line(state: &ItemsPageState) -> Line<'static> {
    let mut spans = vec![Span::raw("Search: ")];
    if state.input().is_empty() && state.focus() != Focus::Search {
        spans.push("press / to search".dim().italic());
    } else {
        spans.push(Span::raw(state.input().to_string()));
    }
    if state.focus() == Focus::Search {
        spans.push("▌".cyan());
    }
    Line::from(spans)
}

fn status_line(state: &ItemsPageState) -> Line<'static> {
    if state.is_loading() {
        return Line::from("Loading items…".cyan());
    }
    if let Some(err) = state.error() {
        return Line::from(Span::raw(format!("Error: {err}")).red().bold());
    }
    if state.is_empty_result() {
        return Line::from(EMPTY_MESSAGE.dim());
    }
    Line::default()
}

fn render_rows(area: Rect, buf: &mut Buffer, state: &ItemsPageState) {
    let block = Block::default().borders(Borders::ALL).title(" Items ");
    let inner = block.inner(area);
    block.render(area, buf);

    let items = state.items();
    let lines: Vec<Line<'static>> = state
        .visible_range()
        .map(|i| {
            let item = &items[i];
            let mut spans = vec![
                Span::styled(
                    item.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::raw(item.description.clone()).dim(),
            ];
            if let Some(category) = &item.category {
                spans.push(Span::raw("  "));
                spans.push(Span::raw(format!("[{category}]")).magenta());
            }
            let line = Line::from(spans);
            if i == state.selected() && state.focus() == Focus::List {
                line.reversed()
            } else {
                line
            }
        })
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

fn footer_line(state: &ItemsPageState) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("Page {}", state.page())),
        " · ".dim(),
        Span::raw(format!("Showing {} item(s)", state.items().len())),
        " · ".dim(),
        Span::raw(format!("{} per page", state.limit())).dim(),
    ])
}

fn hint_line(state: &ItemsPageState) -> Line<'static> {
    let enabled = |on: bool, label: &'static str| {
        if on { Span::raw(label) } else { label.dim() }
    };
    let sizes = PAGE_SIZES
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/");
    Line::from(vec![
        enabled(state.can_prev(), "← prev"),
        "  ".into(),
        enabled(state.can_next(), "next →"),
        "  ".into(),
        Span::raw(format!("s size ({sizes})")).dim(),
        "  / search  q quit".dim(),
    ])
}
