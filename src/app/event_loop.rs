//! Main event loop and poll event processing

use anyhow::Result;
use crossterm::event;
use std::time::{Duration, Instant};

use crate::constants::{FRAME_INTERVAL_MS, IDLE_POLL_MS};
use crate::input::{InputResult, handle_input};
use crate::sync::PollEvent;

use super::App;
use super::render_thread::RenderThread;

impl App {
    pub(crate) async fn event_loop(&mut self, render_thread: &RenderThread) -> Result<()> {
        loop {
            // Source changes first so a reconciliation isn't delayed by input
            if self.process_poll_events().await {
                self.dirty = true;
            }

            // Layout passes, scroll restores and started loads
            if self.renderer.needs_frames() {
                self.renderer.frame(Instant::now());
                self.sync_timeline();
            }

            if self.state.clear_error_if_expired() {
                self.dirty = true;
            }

            // Render only when dirty (non-blocking - sends to render thread)
            if self.dirty && render_thread.render(self.state.clone()) {
                self.dirty = false;
            }

            // Short timeout while the renderer has frames queued or a snapshot is pending
            let poll_timeout = if self.renderer.needs_frames() || self.dirty {
                FRAME_INTERVAL_MS
            } else {
                IDLE_POLL_MS
            };
            if event::poll(Duration::from_millis(poll_timeout))? {
                let evt = event::read()?;
                self.dirty = true;
                match handle_input(evt, &self.bindings) {
                    InputResult::Quit => break,
                    InputResult::Action(action) => {
                        self.state.status.clear_error();
                        self.handle_action(action).await;
                    }
                    InputResult::Scroll(rows) => self.scroll_timeline(i64::from(rows)),
                    InputResult::FocusGained => self.on_focus_gained(),
                    InputResult::Resize { width, height } => self.resize(width, height),
                    InputResult::Continue => {}
                }
            }
        }

        Ok(())
    }

    /// Drain the poller's events. Returns true if anything changed.
    pub(crate) async fn process_poll_events(&mut self) -> bool {
        let mut events = Vec::new();
        if let Some(poller) = self.poller.as_mut() {
            while let Ok(event) = poller.event_rx.try_recv() {
                events.push(event);
            }
            if events.is_empty() && poller.is_finished() {
                tracing::error!("Poller stopped unexpectedly");
                self.state.set_error("Background polling stopped");
                self.state.status.polling_enabled = false;
                self.poller = None;
                return true;
            }
        }

        let changed = !events.is_empty();
        for event in events {
            match event {
                PollEvent::Changed(manifests) => self.apply_changes(manifests).await,
                // Treated as no change; `last_poll` keeps the last successful check
                PollEvent::Failed(e) => tracing::debug!("Skipping failed poll: {}", e),
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::App;
    use super::super::testing::*;
    use crate::chat::types::fixtures::messages;
    use crate::config::Config;

    async fn polling_app(root: &std::path::Path) -> App {
        let mut config = Config::default();
        config.source.root = root.to_path_buf();
        config.poll.interval_secs = 3600;
        App::with_terminal_size(config, 120, 40).await.unwrap()
    }

    #[tokio::test]
    async fn test_poll_event_applied() {
        let dir = tempfile::tempdir().unwrap();
        write_category(dir.path(), "whatsapp", &[("alice", messages(5))]);
        let mut app = polling_app(dir.path()).await;

        write_category(
            dir.path(),
            "whatsapp",
            &[("alice", messages(5)), ("bob", messages(2))],
        );
        app.poller.as_ref().unwrap().notify_visible();

        let mut changed = false;
        for _ in 0..100 {
            if app.process_poll_events().await {
                changed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(changed);
        assert_eq!(app.state.conversations.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_list_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("chats");
        sample_source(&root);
        let mut app = polling_app(&root).await;
        let before: Vec<String> = app.state.conversations.iter().map(|c| c.id.clone()).collect();
        let last_poll = app.state.status.last_poll;

        std::fs::remove_dir_all(&root).unwrap();
        app.poller.as_ref().unwrap().notify_visible();

        let mut received = false;
        for _ in 0..100 {
            if app.process_poll_events().await {
                received = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(received);
        assert!(app.state.status.error.is_none());
        assert_eq!(app.state.status.last_poll, last_poll);
        let after: Vec<String> = app.state.conversations.iter().map(|c| c.id.clone()).collect();
        assert_eq!(after, before);
        assert!(app.poller.is_some());
    }

    #[tokio::test]
    async fn test_no_poller_no_events() {
        let dir = tempfile::tempdir().unwrap();
        sample_source(dir.path());
        let mut app = app_with(dir.path()).await;
        assert!(app.poller.is_none());
        assert!(!app.process_poll_events().await);
    }
}
