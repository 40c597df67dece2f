//! Actions triggered by key bindings, the mouse and terminal events

use chrono::Local;
use std::time::Instant;

use crate::chat::Manifest;
use crate::constants::{ROW_UNITS, SCROLL_STEP_ROWS};
use crate::input::Action;
use crate::source::relist_all;
use crate::sync::apply_manifests;
use crate::ui;

use super::App;
use super::state::Focus;

impl App {
    pub(crate) async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Up => self.move_by(-1),
            Action::Down => self.move_by(1),
            Action::PageUp => self.page(-1),
            Action::PageDown => self.page(1),
            Action::Oldest => self.jump_oldest(),
            Action::Latest => self.jump_latest(),
            Action::SwitchFocus => self.switch_focus(),
            Action::Open => {
                if self.state.focus == Focus::List {
                    self.open_selected().await;
                }
            }
            Action::Back => self.back(),
            Action::Refresh => self.refresh().await,
            // Handled by the event loop
            Action::Quit => {}
        }
    }

    fn move_by(&mut self, delta: i64) {
        match self.state.focus {
            Focus::List => self.state.move_cursor(delta as isize),
            Focus::Timeline => self.scroll_timeline(delta * i64::from(SCROLL_STEP_ROWS)),
        }
    }

    fn page(&mut self, direction: i64) {
        match self.state.focus {
            Focus::List => {
                let (_, height) = self.renderer.viewport().size();
                // Cards are two rows high
                let cards = i64::from(height / 2).max(1);
                self.state.move_cursor((direction * cards) as isize);
            }
            Focus::Timeline => {
                let (_, height) = self.renderer.viewport().size();
                self.scroll_timeline(direction * i64::from(height.saturating_sub(1).max(1)));
            }
        }
    }

    /// Scroll the timeline by whole rows (negative is up)
    pub(crate) fn scroll_timeline(&mut self, rows: i64) {
        if self.renderer.selected_id().is_none() {
            return;
        }
        self.renderer.scroll_by(rows * i64::from(ROW_UNITS));
        self.sync_timeline();
    }

    fn jump_oldest(&mut self) {
        match self.state.focus {
            Focus::List => self.state.cursor = 0,
            Focus::Timeline => {
                self.renderer.jump_to(0);
                self.sync_timeline();
            }
        }
    }

    fn jump_latest(&mut self) {
        match self.state.focus {
            Focus::List => self.state.move_cursor(isize::MAX),
            Focus::Timeline => {
                self.renderer.jump_to_latest(Instant::now());
                self.sync_timeline();
            }
        }
    }

    fn switch_focus(&mut self) {
        self.state.focus = match self.state.focus {
            Focus::List if self.state.open_id.is_some() => Focus::Timeline,
            _ => Focus::List,
        };
    }

    fn back(&mut self) {
        match self.state.focus {
            Focus::Timeline => self.state.focus = Focus::List,
            Focus::List if self.state.open_id.is_some() => self.close_conversation(),
            Focus::List => {}
        }
    }

    /// Check the source now
    async fn refresh(&mut self) {
        if let Some(poller) = &self.poller {
            poller.notify_visible();
            self.state.set_status("Checking for updates");
            return;
        }

        // Without a poller every category is re-listed; the diff skips unchanged cards
        let known: Vec<String> = self
            .engine
            .cards()
            .summaries()
            .into_iter()
            .map(|c| c.category)
            .collect();
        match relist_all(self.parser.inner(), known.iter().map(String::as_str)).await {
            Ok(manifests) => self.apply_changes(manifests).await,
            // The list stays as it is until the next refresh succeeds
            Err(e) => tracing::warn!("Manual refresh failed: {}", e),
        }
    }

    pub(crate) fn on_focus_gained(&mut self) {
        if let Some(poller) = &self.poller {
            poller.notify_visible();
        }
    }

    pub(crate) fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = ui::timeline_content_size(width, height, self.config.ui.list_width);
        self.renderer
            .update_viewport(|viewport, surface| viewport.resize(width, height, surface));
        // A taller pane can bring an edge within the load threshold
        self.renderer.on_scroll();
        self.sync_timeline();
    }

    /// Reconcile the list and the open conversation with refreshed manifests
    pub(crate) async fn apply_changes(&mut self, manifests: Vec<Manifest>) {
        let outcome =
            apply_manifests(&mut self.engine, &mut self.renderer, &self.parser, &manifests).await;

        if let Some(outcome) = outcome {
            tracing::debug!(
                "Reconciled {} categories: {} added, {} removed, {} updated",
                manifests.len(),
                outcome.diff.added.len(),
                outcome.diff.removed.len(),
                outcome.diff.updated.len()
            );
            if !outcome.diff.is_empty() {
                self.state
                    .set_status(format!("{} conversations", self.engine.cards().len()));
            }
        }
        self.state.status.last_poll = Some(Local::now());
        self.sync_conversations();
        self.sync_timeline();
    }
}
