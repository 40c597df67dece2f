//! Render-window bookkeeping for one open conversation.
//!
//! The window is the contiguous range of the message sequence that is currently
//! materialized on the surface. Normally it is a suffix of the sequence and grows
//! backward in time one batch at a time. A jump to an arbitrary message detaches it
//! from the end; a detached window also grows forward until it re-attaches.

use super::anchor::ScrollMetrics;

/// Batch size and trigger distance shared by every controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub batch_size: usize,
    /// Distance (viewport units) from an edge at which the next batch loads
    pub threshold: u32,
}

impl PaginationSettings {
    pub fn new(batch_size: usize, threshold: u32) -> Self {
        Self {
            batch_size: batch_size.max(1),
            threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub rendered_count: usize,
    pub loading: bool,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDirection {
    Older,
    Newer,
}

/// Messages `[start, end)` about to be added to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRange {
    pub direction: LoadDirection,
    pub start: usize,
    pub end: usize,
}

impl LoadRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Owns the render window of exactly one open conversation.
///
/// A new controller is constructed on every selection; nothing survives a switch.
#[derive(Debug, Clone)]
pub struct PaginationController {
    conversation_id: String,
    message_count: usize,
    settings: PaginationSettings,
    window: RenderWindow,
    in_flight: Option<LoadRange>,
}

impl PaginationController {
    /// Window showing only the newest batch
    pub fn new(
        conversation_id: impl Into<String>,
        message_count: usize,
        settings: PaginationSettings,
    ) -> Self {
        let mut controller = Self {
            conversation_id: conversation_id.into(),
            message_count,
            settings,
            window: RenderWindow {
                start_index: 0,
                end_index: 0,
                rendered_count: 0,
                loading: false,
                has_more: false,
            },
            in_flight: None,
        };
        controller.reset_to_latest();
        controller
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn window(&self) -> &RenderWindow {
        &self.window
    }

    pub fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    /// Whether the window ends at the newest message
    pub fn is_attached(&self) -> bool {
        self.window.end_index == self.message_count
    }

    /// Number of messages older than the window
    pub fn older_remaining(&self) -> usize {
        self.window.start_index
    }

    /// Number of messages newer than the window
    pub fn newer_remaining(&self) -> usize {
        self.message_count - self.window.end_index
    }

    pub fn reset_to_latest(&mut self) {
        let rendered = self.settings.batch_size.min(self.message_count);
        let start = self.message_count - rendered;
        self.set_range(start, self.message_count);
    }

    /// Start a load if the viewport is close enough to an edge.
    ///
    /// Sets `loading` before returning so re-entrant scroll events arriving before the
    /// batch is applied are ignored.
    pub fn try_begin_load(&mut self, metrics: &ScrollMetrics) -> Option<LoadRange> {
        if self.window.loading {
            return None;
        }

        let range = if self.window.has_more && metrics.scroll_top <= self.settings.threshold {
            let start = self
                .window
                .start_index
                .saturating_sub(self.settings.batch_size);
            LoadRange {
                direction: LoadDirection::Older,
                start,
                end: self.window.start_index,
            }
        } else if !self.is_attached()
            && metrics.distance_from_bottom() <= self.settings.threshold
        {
            let end = (self.window.end_index + self.settings.batch_size).min(self.message_count);
            LoadRange {
                direction: LoadDirection::Newer,
                start: self.window.end_index,
                end,
            }
        } else {
            return None;
        };

        tracing::debug!(
            "Starting {:?} load of messages {}..{} in '{}'",
            range.direction,
            range.start,
            range.end,
            self.conversation_id
        );
        self.window.loading = true;
        self.in_flight = Some(range);
        Some(range)
    }

    /// Extend the window by the in-flight range. `loading` stays set until
    /// `finish_load` so nothing can start before the scroll position is restored.
    pub fn apply_load(&mut self) -> Option<LoadRange> {
        let range = self.in_flight.take()?;
        match range.direction {
            LoadDirection::Older => {
                self.window.rendered_count += self.window.start_index - range.start;
                self.window.start_index = range.start;
                self.window.has_more = range.start > 0;
            }
            LoadDirection::Newer => {
                self.window.rendered_count += range.end - self.window.end_index;
                self.window.end_index = range.end;
            }
        }
        Some(range)
    }

    pub fn finish_load(&mut self) {
        self.window.loading = false;
    }

    /// Re-center the window on `target` if it isn't rendered yet.
    ///
    /// Returns the new range to rebuild, or `None` if the target is already in the
    /// window or doesn't exist.
    pub fn jump_to(&mut self, target: usize) -> Option<(usize, usize)> {
        if target >= self.message_count {
            return None;
        }
        if (self.window.start_index..self.window.end_index).contains(&target) {
            return None;
        }

        let half = (self.settings.batch_size / 2).max(1);
        let start = target.saturating_sub(half);
        let end = (target + half).min(self.message_count).max(target + 1);
        self.set_range(start, end);
        Some((start, end))
    }

    /// Adopt a replaced message sequence, keeping the window's first message at
    /// `first_rendered` (its position in the new sequence) and extending to the end.
    ///
    /// `has_more` is recomputed and can become true again after a backfill.
    pub fn resize(&mut self, message_count: usize, first_rendered: Option<usize>) {
        self.message_count = message_count;
        match first_rendered {
            Some(start) if start < message_count => self.set_range(start, message_count),
            _ => self.reset_to_latest(),
        }
    }

    /// Adopt a replaced message sequence without re-attaching: the window keeps
    /// `rendered` messages from `first_rendered`, clamped to the new end.
    pub fn resize_detached(&mut self, message_count: usize, first_rendered: usize, rendered: usize) {
        self.message_count = message_count;
        if first_rendered >= message_count {
            self.reset_to_latest();
            return;
        }
        let end = (first_rendered + rendered.max(1)).min(message_count);
        self.set_range(first_rendered, end);
    }

    fn set_range(&mut self, start: usize, end: usize) {
        self.window = RenderWindow {
            start_index: start,
            end_index: end,
            rendered_count: end - start,
            loading: false,
            has_more: start > 0,
        };
        self.in_flight = None;
    }
}
