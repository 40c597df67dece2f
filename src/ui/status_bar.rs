//! Status bar: render progress of the open conversation and poll state

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::state::AppState;
use crate::timeline::RenderStatus;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(error) = &state.status.error {
        let bar = Paragraph::new(format!(" Error: {}", error)).style(Theme::error_bar());
        frame.render_widget(bar, area);
        return;
    }

    let left = left_text(&state.render, &state.status.message);
    let right = match (state.status.polling_enabled, state.status.last_poll) {
        (false, _) => "polling off".to_string(),
        (true, Some(time)) => format!("updated {}", time.format("%H:%M:%S")),
        (true, None) => "watching".to_string(),
    };
    let style = Theme::status_bar();

    let used = left.width() + right.width() + 4;
    let padding = " ".repeat(usize::from(area.width).saturating_sub(used));
    let line = Line::from(vec![
        Span::styled(format!(" {} ", left), style),
        Span::styled(padding, style),
        Span::styled(format!(" {} ", right), style),
    ]);
    frame.render_widget(Paragraph::new(line).style(style), area);
}

fn left_text(render: &RenderStatus, message: &str) -> String {
    let mut parts = Vec::new();
    if render.conversation_id.is_some() {
        parts.push(format!("{}/{} messages", render.rendered, render.total));
        if render.older_remaining > 0 {
            parts.push(format!("{} older", render.older_remaining));
        }
        if render.newer_remaining > 0 {
            parts.push(format!("{} newer", render.newer_remaining));
        }
        if render.loading {
            parts.push("loading…".to_string());
        }
    }
    if !message.is_empty() {
        parts.push(message.to_string());
    }
    parts.join(" │ ")
}
