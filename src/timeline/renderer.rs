//! Materializes the render window onto the surface.
//!
//! The renderer owns the message store, the per-conversation pagination controller,
//! the surface and the viewport. All mutations go through it so the guard flags
//! are checked at a single place.

use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;
use tokio::sync::watch;

use crate::chat::{Message, MessageStore};

use super::anchor::{
    RestoreMode, RestoreSchedule, RestoreTarget, ScrollAnchor, Viewport, pin_to_bottom,
};
use super::surface::{NodeKind, Placeholder, Surface};
use super::window::{LoadDirection, LoadRange, PaginationController, PaginationSettings};

#[derive(Debug, Clone, Copy)]
pub struct RendererSettings {
    pub pagination: PaginationSettings,
    /// Distance from the bottom (units) that still counts as "at the newest message"
    pub bottom_tolerance: u32,
    /// Gap after which a message from the same sender starts a new group
    pub group_gap: Duration,
}

/// Published after every completed render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStatus {
    pub conversation_id: Option<String>,
    pub rendered: usize,
    pub total: usize,
    pub older_remaining: usize,
    pub newer_remaining: usize,
    pub loading: bool,
    /// Number of completed renders, increases monotonically
    pub renders: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    Idle,
    LoadStarted(LoadRange),
}

/// "N older messages" label for the top affordance
pub fn older_label(remaining: usize) -> String {
    format!(
        "{} older message{}",
        remaining,
        if remaining == 1 { "" } else { "s" }
    )
}

pub fn newer_label(remaining: usize) -> String {
    format!(
        "{} newer message{}",
        remaining,
        if remaining == 1 { "" } else { "s" }
    )
}

#[derive(Debug)]
struct PendingLoad {
    /// Captured before the batch is inserted; `None` for loads below the visible area
    anchor: Option<ScrollAnchor>,
}

pub struct ViewportRenderer<V: Viewport> {
    settings: RendererSettings,
    store: MessageStore,
    controller: Option<PaginationController>,
    surface: Surface,
    viewport: V,
    pending_load: Option<PendingLoad>,
    /// A load was applied this frame; `loading` clears on the next one
    settling: bool,
    restore: Option<RestoreSchedule>,
    status_tx: watch::Sender<RenderStatus>,
}

impl<V: Viewport> ViewportRenderer<V> {
    pub fn new(viewport: V, settings: RendererSettings) -> Self {
        let (status_tx, _) = watch::channel(RenderStatus::default());
        let mut renderer = Self {
            settings,
            store: MessageStore::new(),
            controller: None,
            surface: Surface::new(),
            viewport,
            pending_load: None,
            settling: false,
            restore: None,
            status_tx,
        };
        renderer.show_placeholder(Placeholder::NoSelection);
        renderer
    }

    /// Render-complete notifications
    pub fn subscribe(&self) -> watch::Receiver<RenderStatus> {
        self.status_tx.subscribe()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn controller(&self) -> Option<&PaginationController> {
        self.controller.as_ref()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    #[cfg(test)]
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Change the viewport against the current surface (e.g. a resize), staying
    /// pinned to the newest message when the view was there.
    ///
    /// Pending restores were measured against the old viewport and are dropped.
    pub fn update_viewport(&mut self, f: impl FnOnce(&mut V, &Surface)) {
        let pinned = self.controller.is_some()
            && self.viewport.metrics().distance_from_bottom() <= self.settings.bottom_tolerance;
        self.restore = None;
        f(&mut self.viewport, &self.surface);
        if pinned {
            pin_to_bottom(&mut self.viewport);
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.store.conversation_id()
    }

    /// Whether upcoming `frame` calls still have work to do
    pub fn needs_frames(&self) -> bool {
        self.restore.is_some() || self.pending_load.is_some() || self.settling
    }

    /// Open a conversation at its newest message.
    ///
    /// Replaces the store and the controller, so the previous conversation's window
    /// and any in-flight load are gone.
    pub fn render_initial(
        &mut self,
        conversation_id: &str,
        messages: Arc<[Message]>,
        now: Instant,
    ) {
        self.store.select(conversation_id, messages);
        self.controller = Some(PaginationController::new(
            conversation_id,
            self.store.len(),
            self.settings.pagination,
        ));
        self.pending_load = None;
        self.settling = false;

        let kinds = self.window_nodes();
        self.surface.clear();
        self.surface.insert_many(0, kinds);
        self.viewport.surface_changed(&self.surface);

        if self.store.is_empty() {
            self.restore = None;
            self.viewport.set_scroll_top(0);
        } else {
            self.schedule_restore(RestoreTarget::Bottom, now);
        }

        tracing::debug!(
            "Opened '{}' with {} messages ({} rendered)",
            conversation_id,
            self.store.len(),
            self.surface.message_count()
        );
        self.publish();
    }

    /// Re-open the current conversation at its newest message
    pub fn jump_to_latest(&mut self, now: Instant) {
        let Some(id) = self.store.conversation_id().map(str::to_string) else {
            return;
        };
        let messages = self.store.messages();
        self.render_initial(&id, messages, now);
    }

    /// Clear the selection and show the deselected state
    pub fn deselect(&mut self) {
        if let Some(id) = self.store.conversation_id() {
            tracing::debug!("Deselecting '{}'", id);
        }
        self.store.clear();
        self.controller = None;
        self.pending_load = None;
        self.settling = false;
        self.restore = None;
        self.show_placeholder(Placeholder::NoSelection);
        self.viewport.set_scroll_top(0);
        self.publish();
    }

    /// User scrolled to an absolute offset
    pub fn scroll_to(&mut self, top: u32) -> ScrollOutcome {
        self.restore = None;
        let metrics = self.viewport.metrics();
        let max = metrics.scroll_height.saturating_sub(metrics.client_height);
        self.viewport.set_scroll_top(top.min(max));
        self.on_scroll()
    }

    /// User scrolled by a relative amount
    pub fn scroll_by(&mut self, delta: i64) -> ScrollOutcome {
        let top = i64::from(self.viewport.metrics().scroll_top) + delta;
        self.scroll_to(top.clamp(0, i64::from(u32::MAX)) as u32)
    }

    /// Scroll event: start loading the next batch if an edge is close enough.
    ///
    /// The batch itself is applied on the next `frame` so the affordance can show
    /// the loading state first.
    pub fn on_scroll(&mut self) -> ScrollOutcome {
        let metrics = self.viewport.metrics();
        let Some(range) = self
            .controller
            .as_mut()
            .and_then(|c| c.try_begin_load(&metrics))
        else {
            return ScrollOutcome::Idle;
        };

        let affordance = match range.direction {
            LoadDirection::Older => {
                self.surface
                    .position(|k| matches!(k, NodeKind::OlderMessages { .. }))
            }
            LoadDirection::Newer => {
                self.surface
                    .position(|k| matches!(k, NodeKind::NewerMessages { .. }))
            }
        };
        if let Some(pos) = affordance {
            self.surface.replace(pos, NodeKind::Loading);
            self.viewport.surface_changed(&self.surface);
        }

        let anchor = (range.direction == LoadDirection::Older).then(|| {
            ScrollAnchor::capture(
                &self.viewport,
                RestoreMode::Prepend,
                self.settings.bottom_tolerance,
            )
        });
        self.pending_load = Some(PendingLoad { anchor });
        ScrollOutcome::LoadStarted(range)
    }

    /// One scheduling pass: commit layout, re-apply pending scroll restores, apply a
    /// started load, and release the loading flag of the previous one.
    pub fn frame(&mut self, now: Instant) {
        self.viewport.layout(&self.surface);

        if let Some(schedule) = self.restore.as_mut() {
            if schedule.due(now) {
                schedule.target().apply(&mut self.viewport);
            }
            if schedule.is_done() {
                self.restore = None;
            }
        }

        if self.settling {
            self.settling = false;
            if let Some(controller) = self.controller.as_mut() {
                controller.finish_load();
            }
            self.publish();
        }

        if let Some(pending) = self.pending_load.take() {
            self.complete_load(pending, now);
        }
    }

    /// Show message `index`, rebuilding the window around it if it isn't rendered
    pub fn jump_to(&mut self, index: usize) -> bool {
        let Some(controller) = self.controller.as_mut() else {
            return false;
        };
        if index >= controller.message_count() {
            return false;
        }

        if let Some((start, end)) = controller.jump_to(index) {
            tracing::debug!("Jumping to message {} (window {}..{})", index, start, end);
            self.pending_load = None;
            self.settling = false;
            let kinds = self.window_nodes();
            self.surface.clear();
            self.surface.insert_many(0, kinds);
            self.viewport.surface_changed(&self.surface);
            self.publish();
        }

        self.restore = None;
        let Some(pos) = self
            .surface
            .position(|k| matches!(k, NodeKind::Message { index: i, .. } if *i == index))
        else {
            return false;
        };
        let offset = self.viewport.node_offset(&self.surface, pos);
        let client = self.viewport.metrics().client_height;
        self.viewport.set_scroll_top(offset.saturating_sub(client / 3));
        true
    }

    /// Adopt a refreshed message sequence for the open conversation.
    ///
    /// The window keeps its first rendered message (relocated in the new sequence).
    /// An attached window extends to the newest message; a detached one keeps its
    /// size. Unchanged nodes keep their identity; the scroll
    /// position is restored append-aware. Returns the number of structural changes.
    pub fn render_reconciled(
        &mut self,
        conversation_id: &str,
        messages: Arc<[Message]>,
        now: Instant,
    ) -> u64 {
        if self.store.conversation_id() != Some(conversation_id) {
            return 0;
        }

        let anchor = ScrollAnchor::capture(
            &self.viewport,
            RestoreMode::AppendAware,
            self.settings.bottom_tolerance,
        );
        let previous = self
            .controller
            .as_ref()
            .map(|c| (c.is_attached(), *c.window()));
        let first_rendered = self.surface.first_message().map(|(_, m)| m.clone());

        self.store.select(conversation_id, messages);
        let first_position = first_rendered.and_then(|m| self.store.position_of(&m));
        let count = self.store.len();
        match (self.controller.as_mut(), previous) {
            // A jumped-to window stays where the user is reading
            (Some(controller), Some((false, window))) => controller.resize_detached(
                count,
                first_position.unwrap_or(window.start_index),
                window.rendered_count,
            ),
            (Some(controller), _) => controller.resize(count, first_position),
            (None, _) => {
                self.controller = Some(PaginationController::new(
                    conversation_id,
                    count,
                    self.settings.pagination,
                ))
            }
        }
        // A load in flight was computed against the old sequence
        self.pending_load = None;
        self.settling = false;

        let changes = self.surface.rebuild(self.window_nodes());
        if changes > 0 {
            self.viewport.surface_changed(&self.surface);
            self.schedule_restore(RestoreTarget::Anchor(anchor), now);
            tracing::debug!(
                "Reconciled '{}': {} messages, {} node changes",
                conversation_id,
                count,
                changes
            );
        }
        self.publish();
        changes
    }

    fn complete_load(&mut self, pending: PendingLoad, now: Instant) {
        let Some(range) = self.controller.as_mut().and_then(|c| c.apply_load()) else {
            return;
        };

        match range.direction {
            LoadDirection::Older => self.render_older_batch(range),
            LoadDirection::Newer => self.render_newer_batch(range),
        }
        self.viewport.surface_changed(&self.surface);

        if let Some(anchor) = pending.anchor {
            self.schedule_restore(RestoreTarget::Anchor(anchor), now);
        }
        self.settling = true;
        tracing::debug!(
            "Loaded {} {:?} messages ({}..{})",
            range.len(),
            range.direction,
            range.start,
            range.end
        );
        self.publish();
    }

    /// Prepend `range` above the rendered messages.
    ///
    /// When the batch ends on the same calendar day the rendered messages start on,
    /// the existing separator for that day is dropped so the day appears once.
    fn render_older_batch(&mut self, range: LoadRange) {
        self.surface
            .remove_where(|k| matches!(k, NodeKind::OlderMessages { .. } | NodeKind::Loading));

        let batch = self.batch_nodes(range.start, range.end);
        let last_day = range
            .end
            .checked_sub(1)
            .and_then(|i| self.store.get(i))
            .map(Message::day);
        if let Some((pos, first)) = self.surface.first_message()
            && pos > 0
            && Some(first.day()) == last_day
            && matches!(self.surface.nodes()[pos - 1].kind, NodeKind::DateSeparator(_))
        {
            self.surface.remove(pos - 1);
        }

        self.surface.insert_many(0, batch);
        let remaining = self.controller.as_ref().map_or(0, |c| c.older_remaining());
        if remaining > 0 {
            self.surface.insert(0, NodeKind::OlderMessages { remaining });
        }
    }

    /// Append `range` below the rendered messages of a detached window
    fn render_newer_batch(&mut self, range: LoadRange) {
        self.surface
            .remove_where(|k| matches!(k, NodeKind::NewerMessages { .. } | NodeKind::Loading));

        let last_day = self
            .surface
            .nodes()
            .iter()
            .rev()
            .find_map(|n| match &n.kind {
                NodeKind::Message { message, .. } => Some(message.day()),
                _ => None,
            });
        let mut batch = self.batch_nodes(range.start, range.end);
        if let (Some(NodeKind::DateSeparator(day)), Some(last)) = (batch.first(), last_day)
            && *day == last
        {
            batch.remove(0);
        }
        let end = self.surface.len();
        self.surface.insert_many(end, batch);

        let remaining = self.controller.as_ref().map_or(0, |c| c.newer_remaining());
        if remaining > 0 {
            self.surface.push(NodeKind::NewerMessages { remaining });
        }
    }

    /// Nodes for the whole current window, affordances included
    fn window_nodes(&self) -> Vec<NodeKind> {
        let Some(controller) = self.controller.as_ref() else {
            return vec![NodeKind::Placeholder(Placeholder::NoSelection)];
        };
        if self.store.is_empty() {
            return vec![NodeKind::Placeholder(Placeholder::NoMessages)];
        }

        let window = controller.window();
        let mut kinds = Vec::with_capacity(window.rendered_count * 2 + 2);
        if controller.older_remaining() > 0 {
            kinds.push(NodeKind::OlderMessages {
                remaining: controller.older_remaining(),
            });
        }
        kinds.extend(self.batch_nodes(window.start_index, window.end_index));
        if controller.newer_remaining() > 0 {
            kinds.push(NodeKind::NewerMessages {
                remaining: controller.newer_remaining(),
            });
        }
        kinds
    }

    /// Messages `[start, end)` with a separator before each new calendar day.
    ///
    /// `group_start` only depends on the previous message in the sequence, so a node
    /// keeps the same content whichever batch rendered it.
    fn batch_nodes(&self, start: usize, end: usize) -> Vec<NodeKind> {
        let mut kinds = Vec::new();
        let mut current_day = None;

        for (offset, message) in self.store.slice(start, end).iter().enumerate() {
            let index = start + offset;
            let day = message.day();

            let group_start = match index.checked_sub(1).and_then(|i| self.store.get(i)) {
                Some(prev) => {
                    prev.sender != message.sender
                        || message.timestamp - prev.timestamp > self.settings.group_gap
                }
                None => true,
            };
            if current_day != Some(day) {
                kinds.push(NodeKind::DateSeparator(day));
                current_day = Some(day);
            }

            kinds.push(NodeKind::Message {
                index,
                message: message.clone(),
                group_start,
            });
        }
        kinds
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        self.surface.clear();
        self.surface.push(NodeKind::Placeholder(placeholder));
        self.viewport.surface_changed(&self.surface);
    }

    /// Apply now and keep re-applying over the next passes
    fn schedule_restore(&mut self, target: RestoreTarget, now: Instant) {
        target.apply(&mut self.viewport);
        self.restore = Some(RestoreSchedule::new(target, now));
    }

    fn publish(&self) {
        let (rendered, total, older, newer, loading) = match self.controller.as_ref() {
            Some(c) => (
                c.window().rendered_count,
                c.message_count(),
                c.older_remaining(),
                c.newer_remaining(),
                c.window().loading,
            ),
            None => (0, 0, 0, 0, false),
        };
        let conversation_id = self.store.conversation_id().map(str::to_string);
        self.status_tx.send_modify(|status| {
            status.conversation_id = conversation_id;
            status.rendered = rendered;
            status.total = total;
            status.older_remaining = older;
            status.newer_remaining = newer;
            status.loading = loading;
            status.renders += 1;
        });
    }
}
