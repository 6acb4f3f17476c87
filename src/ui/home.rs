//! Home screen: the most recent recordings on the server

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
};

use crate::app::{App, LoadingState};
use crate::models::RecordedWork;
use crate::ui::{truncate, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let home = &app.home;
    let title = format!(" RECORDINGS ({}/{}) ", home.works.len(), home.total);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border_focused())
        .title(Span::styled(title, Theme::title()));

    if home.works.is_empty() {
        let (msg, style) = match &home.loading {
            LoadingState::Loading(_) => (
                home.loading.message().unwrap_or("Loading...").to_string(),
                Theme::loading(),
            ),
            LoadingState::Error(e) => (format!("Could not load recordings: {}", e), Theme::error()),
            LoadingState::Idle => ("No recordings".to_string(), Theme::dimmed()),
        };
        let empty = Paragraph::new(msg)
            .style(style)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    let visible = inner.height as usize;
    let offset = (home.list.selected + 1).saturating_sub(visible);

    let items: Vec<ListItem> = home
        .works
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, w)| work_item(w, i == home.list.selected, inner.width as usize))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn work_item(work: &RecordedWork, selected: bool, width: usize) -> ListItem<'static> {
    let name_style = if selected {
        Theme::list_item_selected()
    } else {
        Theme::list_item()
    };

    let mut spans = Vec::new();
    if work.is_recording {
        spans.push(Span::styled(" REC ", Theme::recording_badge()));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(truncate(&work.name, width.saturating_sub(20)), name_style));
    spans.push(Span::styled(
        format!("  {}m  {} file(s)", work.duration_minutes(), work.playable_files.len()),
        Theme::dimmed(),
    ));
    ListItem::new(Line::from(spans))
}
