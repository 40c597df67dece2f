//! Timeline pane: the visible rows of the open conversation.

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use super::theme::Theme;
use super::viewport::{BODY_INDENT, TimelineLine};
use super::widgets::{day_label, format_time};
use crate::app::state::{AppState, Focus};
use crate::timeline::Placeholder;
use crate::timeline::renderer::{newer_label, older_label};

fn block(state: &AppState) -> Block<'static> {
    let title = state
        .open_name
        .as_deref()
        .map(|name| format!(" {} ", name))
        .unwrap_or_default();
    Block::bordered()
        .title(Span::styled(title, Theme::title()))
        .border_style(Theme::border(state.focus == Focus::Timeline))
}

/// Area inside the pane border
pub fn content_area(area: Rect) -> Rect {
    Block::bordered().inner(area)
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let today = Local::now().date_naive();
    let indent = " ".repeat(usize::from(BODY_INDENT));

    let lines: Vec<Line> = state
        .timeline
        .iter()
        .map(|line| match line {
            TimelineLine::DateSeparator(day) => {
                Line::styled(format!("── {} ──", day_label(*day, today)), Theme::date_separator())
                    .alignment(Alignment::Center)
            }
            TimelineLine::OlderMessages(remaining) => {
                Line::styled(format!("↑ {}", older_label(*remaining)), Theme::affordance())
                    .alignment(Alignment::Center)
            }
            TimelineLine::NewerMessages(remaining) => {
                Line::styled(format!("↓ {}", newer_label(*remaining)), Theme::affordance())
                    .alignment(Alignment::Center)
            }
            TimelineLine::Loading => {
                Line::styled("Loading…", Theme::text_muted()).alignment(Alignment::Center)
            }
            TimelineLine::Header { sender, time } => Line::from(vec![
                Span::styled(sender.clone(), Theme::sender()),
                Span::raw(" "),
                Span::styled(format_time(*time, &state.time_format), Theme::text_muted()),
            ]),
            TimelineLine::Body { text, media } => {
                let style = if *media { Theme::media() } else { Theme::text() };
                Line::from(vec![
                    Span::raw(indent.clone()),
                    Span::styled(text.clone(), style),
                ])
            }
            TimelineLine::Placeholder(placeholder) => {
                let text = match placeholder {
                    Placeholder::NoSelection => "Select a conversation",
                    Placeholder::NoMessages => "No messages in this conversation",
                };
                Line::styled(text, Theme::text_muted()).alignment(Alignment::Center)
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block(state)), area);
}
