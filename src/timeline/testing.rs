//! Test doubles for the timeline.

use super::anchor::{ScrollMetrics, Viewport};
use super::surface::{NodeKind, Surface};

pub const MESSAGE_HEIGHT: u32 = 40;
pub const SEPARATOR_HEIGHT: u32 = 24;
pub const AFFORDANCE_HEIGHT: u32 = 32;
pub const PLACEHOLDER_HEIGHT: u32 = 48;

pub fn node_height(kind: &NodeKind) -> u32 {
    match kind {
        NodeKind::Message { .. } => MESSAGE_HEIGHT,
        NodeKind::DateSeparator(_) => SEPARATOR_HEIGHT,
        NodeKind::OlderMessages { .. } | NodeKind::Loading | NodeKind::NewerMessages { .. } => {
            AFFORDANCE_HEIGHT
        }
        NodeKind::Placeholder(_) => PLACEHOLDER_HEIGHT,
    }
}

/// Viewport with fixed node heights and an unclamped offset.
///
/// With `deferred` set, surface changes are only measured on the next `layout`
/// call, like a display that hasn't committed its layout yet.
#[derive(Debug, Clone, Default)]
pub struct MockViewport {
    pub scroll_top: u32,
    pub scroll_height: u32,
    pub client_height: u32,
    pub deferred: bool,
    pending_height: Option<u32>,
}

impl MockViewport {
    pub fn new(client_height: u32) -> Self {
        Self {
            client_height,
            ..Self::default()
        }
    }

    pub fn deferred(client_height: u32) -> Self {
        Self {
            client_height,
            deferred: true,
            ..Self::default()
        }
    }

    pub fn with_metrics(metrics: ScrollMetrics) -> Self {
        Self {
            scroll_top: metrics.scroll_top,
            scroll_height: metrics.scroll_height,
            client_height: metrics.client_height,
            ..Self::default()
        }
    }

    pub fn force_scroll_height(&mut self, height: u32) {
        self.scroll_height = height;
    }

    /// Simulates the user dragging the scrollbar
    pub fn user_scroll_to(&mut self, top: u32) {
        self.scroll_top = top;
    }

    fn measure(surface: &Surface) -> u32 {
        surface.nodes().iter().map(|n| node_height(&n.kind)).sum()
    }
}

impl Viewport for MockViewport {
    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.scroll_height,
            client_height: self.client_height,
        }
    }

    fn set_scroll_top(&mut self, top: u32) {
        self.scroll_top = top;
    }

    fn surface_changed(&mut self, surface: &Surface) {
        let height = Self::measure(surface);
        if self.deferred {
            self.pending_height = Some(height);
        } else {
            self.scroll_height = height;
        }
    }

    fn layout(&mut self, _surface: &Surface) {
        if let Some(height) = self.pending_height.take() {
            self.scroll_height = height;
        }
    }

    fn node_offset(&self, surface: &Surface, pos: usize) -> u32 {
        surface
            .nodes()
            .iter()
            .take(pos)
            .map(|n| node_height(&n.kind))
            .sum()
    }
}
