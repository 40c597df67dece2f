//! Snapshot of everything the UI draws. Cloned and sent to the render thread.

use chrono::{DateTime, Local};

use crate::chat::ConversationSummary;
use crate::constants::ERROR_TTL_SECS;
use crate::timeline::RenderStatus;
use crate::ui::viewport::TimelineLine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    List,
    Timeline,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub error: Option<String>,
    pub error_time: Option<std::time::Instant>,
    pub message: String,
    /// Last time the source was checked successfully
    pub last_poll: Option<DateTime<Local>>,
    pub polling_enabled: bool,
}

impl StatusState {
    pub fn set_error(&mut self, error: impl ToString) {
        self.error = Some(error.to_string());
        self.error_time = Some(std::time::Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.error_time = None;
    }

    /// Clear error if TTL expired. Returns true if error was cleared.
    pub fn clear_error_if_expired(&mut self) -> bool {
        if let Some(time) = self.error_time
            && time.elapsed().as_secs() >= ERROR_TTL_SECS
        {
            self.clear_error();
            true
        } else {
            false
        }
    }

    pub fn set_message(&mut self, msg: impl ToString) {
        self.message = msg.to_string();
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub focus: Focus,
    /// Conversation list in display order
    pub conversations: Vec<ConversationSummary>,
    /// Cursor in the conversation list
    pub cursor: usize,
    /// Name of the open conversation
    pub open_name: Option<String>,
    pub open_id: Option<String>,
    /// Visible rows of the timeline pane
    pub timeline: Vec<TimelineLine>,
    pub render: RenderStatus,
    pub status: StatusState,
    pub list_width: u16,
    pub time_format: String,
}

impl AppState {
    pub fn set_error(&mut self, error: impl ToString) {
        self.status.set_error(error);
    }

    pub fn clear_error_if_expired(&mut self) -> bool {
        self.status.clear_error_if_expired()
    }

    pub fn set_status(&mut self, msg: impl ToString) {
        self.status.set_message(msg);
    }

    pub fn cursor_conversation(&self) -> Option<&ConversationSummary> {
        self.conversations.get(self.cursor)
    }

    /// Replace the list, keeping the cursor on the same conversation when it survived
    pub fn set_conversations(&mut self, conversations: Vec<ConversationSummary>) {
        let current = self.cursor_conversation().map(|c| c.id.clone());
        self.conversations = conversations;
        self.cursor = current
            .and_then(|id| self.conversations.iter().position(|c| c.id == id))
            .unwrap_or(self.cursor)
            .min(self.conversations.len().saturating_sub(1));
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.conversations.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.conversations.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(max);
    }
}
