//! Terminal UI
//!
//! Built with ratatui. Keyboard-first navigation throughout.

pub mod detail;
pub mod home;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, AppState};

/// Main render function - dispatches to view-specific renderers
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Style::default().bg(Theme::BACKGROUND)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    match app.state {
        AppState::Home => home::render(frame, chunks[1], app),
        AppState::Detail => match app.current_screen() {
            Some(screen) => detail::render(frame, chunks[1], screen),
            None => home::render(frame, chunks[1], app),
        },
    }
    render_status_bar(frame, chunks[2], app);

    if let Some(notice) = &app.notice {
        render_notice(frame, area, notice);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(1)])
        .split(area);

    let logo = Paragraph::new(Line::from(vec![
        Span::styled("REC", Theme::error()),
        Span::styled("DECK", Theme::title()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(logo, chunks[0]);

    let server = Paragraph::new(Line::from(vec![
        Span::styled(app.config.server_url.clone(), Theme::text()),
        Span::styled(format!("  api {}", app.config.api_version), Theme::dimmed()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border())
            .title(Span::styled(" SERVER ", Theme::title())),
    );
    frame.render_widget(server, chunks[1]);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let label = match app.state {
        AppState::Home => " HOME ",
        AppState::Detail => " DETAIL ",
    };
    let help: &[(&str, &str)] = match app.state {
        AppState::Home => &[("↑↓", "move"), ("Enter", "open"), ("r", "reload"), ("q", "quit")],
        AppState::Detail => &[
            ("↑↓", "section"),
            ("←→", "item"),
            ("Enter", "select"),
            ("r", "refresh"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(
        label,
        Style::default().fg(Theme::BACKGROUND).bg(Theme::PRIMARY),
    )];
    if app.screens.len() > 1 {
        spans.push(Span::styled(format!(" {} deep ", app.screens.len()), Theme::dimmed()));
    }
    spans.push(Span::raw(" │ "));
    for (key, action) in help {
        spans.push(Span::styled(*key, Theme::keybind()));
        spans.push(Span::styled(format!(":{}  ", action), Theme::dimmed()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(Theme::status_bar()), area);
}

/// Transient notice centered over the screen
fn render_notice(frame: &mut Frame, area: Rect, notice: &str) {
    let width = 64.min(area.width.saturating_sub(4));
    let height = 5;
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let block = Paragraph::new(vec![Line::from(Span::styled(notice, Theme::warning()))])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::warning())
                .title(Span::styled(" NOTICE ", Theme::warning())),
        );
    frame.render_widget(block, popup);
}

/// Cut a string to at most `max` terminal columns, marking the cut.
/// CJK characters take two columns.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max > 0 {
        out.push('…');
    }
    out
}
