//! Detail screen
//!
//! Overview of one recording (info, thumbnail status, play actions) above
//! the two related-content rows. Rows scroll horizontally around their
//! cursor; a trailing placeholder stands for the next page.

use std::ops::Range;

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{DetailFocus, DetailScreen};
use crate::models::RowSlot;
use crate::related::RowItem;
use crate::ui::{truncate, Theme};

/// Width of one card in a related row, borders included
const CARD_WIDTH: u16 = 22;

pub fn render(frame: &mut Frame, area: Rect, screen: &DetailScreen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(5),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[0]);

    render_info(frame, top[0], screen);
    render_actions(frame, top[1], screen);
    render_row(frame, chunks[1], screen, RowSlot::SameSeries);
    render_row(frame, chunks[2], screen, RowSlot::SameRule);
}

fn panel(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
        .title(Span::styled(title, Theme::title()))
}

fn render_info(frame: &mut Frame, area: Rect, screen: &DetailScreen) {
    let work = &screen.work;
    let block = panel(" OVERVIEW ".into(), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut title = vec![Span::styled("▶ ", Theme::accent())];
    if work.is_recording {
        title.push(Span::styled(" REC ", Theme::recording_badge()));
        title.push(Span::raw(" "));
    }
    title.push(Span::styled(work.name.clone(), Theme::title()));

    let mut lines = vec![
        Line::from(title),
        Line::from(vec![
            Span::styled(format!("ch {}", work.channel_id), Theme::secondary()),
            Span::styled(" │ ", Theme::dimmed()),
            Span::styled(
                format!("{} UTC ({}m)", work.time_range(), work.duration_minutes()),
                Theme::secondary(),
            ),
            Span::styled(" │ ", Theme::dimmed()),
            Span::styled(screen.artwork.to_string(), Theme::dimmed()),
        ]),
        Line::from(Span::styled("─".repeat(inner.width as usize), Theme::dimmed())),
    ];
    for text in [&work.description, &work.extended] {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            lines.push(Line::from(Span::styled(line.to_string(), Theme::text())));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_actions(frame: &mut Frame, area: Rect, screen: &DetailScreen) {
    let focused = screen.focus == DetailFocus::Actions;
    let block = panel(" PLAY ".into(), focused);

    if screen.work.playable_files.is_empty() {
        let empty = Paragraph::new("No playable files")
            .style(Theme::dimmed())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = screen
        .work
        .playable_files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let style = if focused && i == screen.actions.selected {
                Theme::list_item_selected()
            } else {
                Theme::list_item()
            };
            ListItem::new(Line::from(Span::styled(file.action_label(), style)))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_row(frame: &mut Frame, area: Rect, screen: &DetailScreen, slot: RowSlot) {
    let row = screen.rows.row(slot);
    let focused = screen.focus == DetailFocus::Row(slot);
    let title = if row.is_built() {
        format!(" {} ({}) ", row.title, row.works().count())
    } else {
        " - ".to_string()
    };
    let block = panel(title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if row.is_empty() {
        let msg = if row.is_built() { "Nothing related" } else { "" };
        frame.render_widget(
            Paragraph::new(msg).style(Theme::dimmed()).alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let cursor = screen.cursor(slot);
    let visible = (inner.width / CARD_WIDTH).max(1) as usize;
    let window = row_window(row.len(), cursor, visible);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(CARD_WIDTH); window.len()])
        .split(inner);

    for (rect, index) in cards.iter().zip(window) {
        let Some(item) = row.get(index) else {
            continue;
        };
        let selected = focused && index == cursor;
        let (label, style) = match item {
            RowItem::Work(w) => (
                truncate(&w.name, CARD_WIDTH as usize - 2),
                if w.is_recording {
                    Theme::warning()
                } else {
                    Theme::list_item()
                },
            ),
            RowItem::More(c) => {
                let label = if screen.rows.is_loading(slot, c.offset()) {
                    "loading…".to_string()
                } else {
                    format!("more from {}", c.offset() + 1)
                };
                (label, Theme::placeholder())
            }
        };
        let style = if selected { Theme::list_item_selected() } else { style };
        frame.render_widget(Paragraph::new(label).style(style), *rect);
    }
}

/// Indices of the items to draw so the cursor stays in view
pub fn row_window(len: usize, cursor: usize, visible: usize) -> Range<usize> {
    if len == 0 || visible == 0 {
        return 0..0;
    }
    let cursor = cursor.min(len - 1);
    let start = (cursor + 1).saturating_sub(visible);
    start..(start + visible).min(len)
}
