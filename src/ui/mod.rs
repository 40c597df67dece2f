//! Terminal UI: conversation list, timeline pane and status bar.

mod list;
mod status_bar;
pub mod theme;
mod timeline;
pub mod viewport;
mod widgets;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
};

use crate::app::state::AppState;
use crate::constants::MIN_SPLIT_VIEW_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    pub list: Option<Rect>,
    pub timeline: Option<Rect>,
    pub status: Rect,
}

/// Split the terminal into panes.
///
/// Narrow terminals show one pane at a time: the timeline while a conversation
/// is open, the list otherwise.
pub fn pane_layout(area: Rect, list_width: u16, conversation_open: bool) -> PaneLayout {
    let [main, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    if main.width >= MIN_SPLIT_VIEW_WIDTH {
        let list_width = list_width.min(main.width / 2);
        let [list, timeline] =
            Layout::horizontal([Constraint::Length(list_width), Constraint::Min(1)]).areas(main);
        PaneLayout {
            list: Some(list),
            timeline: Some(timeline),
            status,
        }
    } else if conversation_open {
        PaneLayout {
            list: None,
            timeline: Some(main),
            status,
        }
    } else {
        PaneLayout {
            list: Some(main),
            timeline: None,
            status,
        }
    }
}

/// Columns and rows available to messages in a terminal of the given size
pub fn timeline_content_size(width: u16, height: u16, list_width: u16) -> (u16, u16) {
    pane_layout(Rect::new(0, 0, width, height), list_width, true)
        .timeline
        .map(|area| {
            let inner = timeline::content_area(area);
            (inner.width, inner.height)
        })
        .unwrap_or((0, 0))
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let layout = pane_layout(frame.area(), state.list_width, state.open_id.is_some());

    if let Some(area) = layout.list {
        list::render(frame, area, state);
    }
    if let Some(area) = layout.timeline {
        timeline::render(frame, area, state);
    }
    status_bar::render(frame, layout.status, state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_terminal_splits() {
        let layout = pane_layout(Rect::new(0, 0, 120, 40), 32, false);
        assert_eq!(layout.list.unwrap().width, 32);
        assert_eq!(layout.timeline.unwrap().width, 88);
        assert_eq!(layout.status.y, 39);
        assert_eq!(layout.status.height, 1);
    }

    #[test]
    fn test_narrow_terminal_shows_one_pane() {
        let area = Rect::new(0, 0, 60, 20);
        let closed = pane_layout(area, 32, false);
        assert!(closed.list.is_some());
        assert!(closed.timeline.is_none());

        let open = pane_layout(area, 32, true);
        assert!(open.list.is_none());
        assert_eq!(open.timeline.unwrap().width, 60);
    }

    #[test]
    fn test_timeline_content_size_excludes_border() {
        assert_eq!(timeline_content_size(120, 40, 32), (86, 37));
        assert_eq!(timeline_content_size(60, 20, 32), (58, 17));
    }
}
