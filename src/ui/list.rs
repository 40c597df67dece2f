//! Conversation list pane.

use chrono::{Local, NaiveDate};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState},
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use super::widgets::{format_list_time, sanitize_text, truncate_to_width};
use crate::app::state::{AppState, Focus};
use crate::chat::ConversationSummary;
use crate::constants::PREVIEW_MAX_CHARS;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus == Focus::List;
    let block = Block::bordered()
        .title(Span::styled(
            format!(" Conversations ({}) ", state.conversations.len()),
            Theme::title(),
        ))
        .border_style(Theme::border(focused));
    let inner_width = usize::from(area.width.saturating_sub(2));

    if state.conversations.is_empty() {
        let empty = List::new([ListItem::new(Span::styled(
            "No conversations",
            Theme::text_muted(),
        ))])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let today = Local::now().date_naive();
    let items: Vec<ListItem> = state
        .conversations
        .iter()
        .map(|c| card(c, state.open_id.as_deref() == Some(c.id.as_str()), inner_width, today))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Theme::selected());
    let mut list_state = ListState::default().with_selected(Some(state.cursor));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Two lines per conversation: name with time, then platform, preview and count
fn card(
    conversation: &ConversationSummary,
    open: bool,
    width: usize,
    today: NaiveDate,
) -> ListItem<'static> {
    let time = conversation
        .last_message_time
        .map(|t| format_list_time(t, today))
        .unwrap_or_default();
    let marker = if open { "▌" } else { " " };
    let name_width = width.saturating_sub(time.len() + 2);
    let name = truncate_to_width(&conversation.name, name_width);
    let padding = width.saturating_sub(1 + name.width() + time.len());

    let title = Line::from(vec![
        Span::styled(marker, Theme::text_accent()),
        Span::styled(name, Theme::title()),
        Span::raw(" ".repeat(padding)),
        Span::styled(time, Theme::text_muted()),
    ]);

    let platform = conversation.platform.label();
    let count = conversation.message_count.to_string();
    let preview_width = width
        .saturating_sub(platform.len() + count.len() + 4)
        .min(PREVIEW_MAX_CHARS);
    let preview = sanitize_text(&conversation.preview).replace('\n', " ");
    let preview = truncate_to_width(&preview, preview_width);
    let padding = width.saturating_sub(platform.len() + 3 + preview.width() + count.len());

    let detail = Line::from(vec![
        Span::raw(" "),
        Span::styled(platform, Theme::text_accent()),
        Span::raw(" "),
        Span::styled(preview, Theme::text_secondary()),
        Span::raw(" ".repeat(padding)),
        Span::styled(count, Theme::text_muted()),
    ]);

    ListItem::new(vec![title, detail])
}
