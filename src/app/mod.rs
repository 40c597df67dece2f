//! Application core: owns the source, the renderer and the reconciliation engine,
//! and turns input and poll events into calls on them.

mod actions;
mod event_loop;
pub mod render_thread;
pub mod state;

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use render_thread::RenderThread;

use crate::config::Config;
use crate::input::KeyBindings;
use crate::source::{CachedParser, FsSource, Parser, fetch_all};
use crate::sync::{ChangeDetector, PollHandle, ReconciliationEngine, spawn_poller};
use crate::timeline::{RenderStatus, ViewportRenderer};
use crate::ui::viewport::TerminalViewport;
use state::{AppState, Focus, StatusState};

pub struct App {
    pub(crate) config: Config,
    pub(crate) parser: CachedParser<FsSource>,
    pub(crate) engine: ReconciliationEngine,
    pub(crate) renderer: ViewportRenderer<TerminalViewport>,
    /// Render-complete notifications from the renderer
    pub(crate) status_rx: watch::Receiver<RenderStatus>,
    /// Background poller (None when polling is disabled)
    pub(crate) poller: Option<PollHandle>,
    pub(crate) state: AppState,
    pub(crate) bindings: KeyBindings,
    /// Dirty flag: when true, UI needs re-render. Skips renders when nothing changed.
    pub(crate) dirty: bool,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
        Self::with_terminal_size(config, width, height).await
    }

    pub(crate) async fn with_terminal_size(config: Config, width: u16, height: u16) -> Result<Self> {
        let source = Arc::new(FsSource::new(&config.source.root));
        let parser = CachedParser::new(
            FsSource::new(&config.source.root),
            config.source.cache_capacity,
        );

        let mut status = StatusState {
            polling_enabled: config.poll.enabled,
            ..StatusState::default()
        };

        // A missing or unreadable source still opens the UI with an empty list
        let manifests = match fetch_all(source.as_ref()).await {
            Ok(manifests) => {
                status.last_poll = Some(Local::now());
                manifests
            }
            Err(e) => {
                tracing::warn!("Initial listing of {} failed: {}", source.root().display(), e);
                Vec::new()
            }
        };

        let mut detector = ChangeDetector::new();
        for manifest in &manifests {
            detector.observe(&manifest.category, &manifest.change_token);
        }
        let engine = ReconciliationEngine::with_manifests(&manifests);
        tracing::info!(
            "Loaded {} conversations from {} categories",
            engine.cards().len(),
            manifests.len()
        );

        let (timeline_width, timeline_height) =
            crate::ui::timeline_content_size(width, height, config.ui.list_width);
        let renderer = ViewportRenderer::new(
            TerminalViewport::new(timeline_width, timeline_height),
            config.timeline.renderer_settings(),
        );
        let status_rx = renderer.subscribe();

        let poller = config.poll.enabled.then(|| {
            spawn_poller(
                source,
                detector,
                Duration::from_secs(config.poll.interval_secs.max(1)),
            )
        });

        let state = AppState {
            conversations: engine.cards().summaries(),
            status,
            list_width: config.ui.list_width,
            time_format: config.ui.time_format.clone(),
            ..AppState::default()
        };
        let bindings = KeyBindings::new(&config.ui.keybinding_mode);

        let mut app = Self {
            config,
            parser,
            engine,
            renderer,
            status_rx,
            poller,
            state,
            bindings,
            dirty: true,
        };
        app.sync_timeline();
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let render_thread = RenderThread::spawn()?;

        let result = self.event_loop(&render_thread).await;

        render_thread.shutdown();
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }

        result
    }

    /// Open the conversation under the list cursor
    pub(crate) async fn open_selected(&mut self) {
        let Some(conversation) = self.state.cursor_conversation().cloned() else {
            return;
        };

        match self.parser.messages(&conversation.id).await {
            Ok(messages) => {
                self.renderer
                    .render_initial(&conversation.id, messages, Instant::now());
                self.state.open_id = Some(conversation.id);
                self.state.open_name = Some(conversation.name);
                self.state.focus = Focus::Timeline;
            }
            Err(e) => tracing::warn!("Failed to open '{}': {}", conversation.id, e),
        }
        self.sync_timeline();
    }

    /// Close the open conversation
    pub(crate) fn close_conversation(&mut self) {
        self.renderer.deselect();
        self.state.open_id = None;
        self.state.open_name = None;
        self.state.focus = Focus::List;
        self.sync_timeline();
    }

    /// Copy what the UI draws out of the renderer and the engine
    pub(crate) fn sync_timeline(&mut self) {
        self.state.timeline = self
            .renderer
            .viewport()
            .visible_lines(self.renderer.surface());

        if self.status_rx.has_changed().unwrap_or(false) {
            self.state.render = self.status_rx.borrow_and_update().clone();
        }

        // The renderer may have dropped the conversation during reconciliation
        if self.renderer.selected_id().is_none() && self.state.open_id.is_some() {
            self.state.open_id = None;
            self.state.open_name = None;
            self.state.focus = Focus::List;
        }
        self.dirty = true;
    }

    /// Refresh the list after a reconciliation pass
    pub(crate) fn sync_conversations(&mut self) {
        self.state
            .set_conversations(self.engine.cards().summaries());
        if let Some(id) = &self.state.open_id
            && let Some(card) = self.engine.cards().get(id)
        {
            self.state.open_name = Some(card.summary.name.clone());
        }
        self.dirty = true;
    }
}
