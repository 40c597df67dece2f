//! Scroll anchoring around content mutations.
//!
//! Metrics are captured right before the surface changes height and an equivalent
//! position is restored afterwards. Surfaces may commit their layout late, so a
//! restore is re-applied over a few frame passes and fallback delays.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::constants::{RESTORE_FALLBACK_DELAYS_MS, RESTORE_FRAME_PASSES};

use super::surface::Surface;

/// Scroll state of a viewport, in viewport units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_top: u32,
    pub scroll_height: u32,
    pub client_height: u32,
}

impl ScrollMetrics {
    /// Units between the bottom of the visible area and the end of the content
    pub fn distance_from_bottom(&self) -> u32 {
        self.scroll_height
            .saturating_sub(self.client_height)
            .saturating_sub(self.scroll_top)
    }
}

/// The scrollable display the timeline is rendered into.
pub trait Viewport {
    fn metrics(&self) -> ScrollMetrics;

    /// Implementations may clamp the offset to their scrollable range.
    fn set_scroll_top(&mut self, top: u32);

    /// The surface changed. Implementations may measure immediately or defer until
    /// their next `layout` pass.
    fn surface_changed(&mut self, surface: &Surface);

    /// Frame boundary: commit any deferred layout.
    fn layout(&mut self, surface: &Surface);

    /// Offset of the node at `pos` from the top of the content
    fn node_offset(&self, surface: &Surface, pos: usize) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Content was inserted above the visible area
    Prepend,
    /// Content was replaced; stay at the bottom if we were there
    AppendAware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollAnchor {
    before: ScrollMetrics,
    mode: RestoreMode,
    was_at_bottom: bool,
}

impl ScrollAnchor {
    pub fn capture<V: Viewport + ?Sized>(
        viewport: &V,
        mode: RestoreMode,
        bottom_tolerance: u32,
    ) -> Self {
        let before = viewport.metrics();
        let slack = i64::from(before.scroll_height)
            - i64::from(before.client_height)
            - i64::from(before.scroll_top);
        Self {
            before,
            mode,
            was_at_bottom: mode == RestoreMode::AppendAware && slack < i64::from(bottom_tolerance),
        }
    }

    #[cfg(test)]
    pub fn was_at_bottom(&self) -> bool {
        self.was_at_bottom
    }

    /// Offset that shows the same content as before, given post-mutation metrics
    pub fn target(&self, after: &ScrollMetrics) -> u32 {
        if self.was_at_bottom {
            return after.scroll_height;
        }
        let delta = i64::from(after.scroll_height) - i64::from(self.before.scroll_height);
        let top = i64::from(self.before.scroll_top) + delta;
        top.clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn restore<V: Viewport + ?Sized>(&self, viewport: &mut V) -> u32 {
        let top = self.target(&viewport.metrics());
        viewport.set_scroll_top(top);
        top
    }
}

/// Pin a viewport to its newest content
pub fn pin_to_bottom<V: Viewport + ?Sized>(viewport: &mut V) -> u32 {
    let height = viewport.metrics().scroll_height;
    viewport.set_scroll_top(height);
    height
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTarget {
    Bottom,
    Anchor(ScrollAnchor),
}

impl RestoreTarget {
    pub fn apply<V: Viewport + ?Sized>(&self, viewport: &mut V) -> u32 {
        match self {
            Self::Bottom => pin_to_bottom(viewport),
            Self::Anchor(anchor) => anchor.restore(viewport),
        }
    }
}

/// Remaining re-application passes of a restore that was already applied once
#[derive(Debug, Clone)]
pub struct RestoreSchedule {
    target: RestoreTarget,
    started: Instant,
    frames_left: usize,
    delays: VecDeque<Duration>,
}

impl RestoreSchedule {
    pub fn new(target: RestoreTarget, now: Instant) -> Self {
        Self {
            target,
            started: now,
            frames_left: RESTORE_FRAME_PASSES,
            delays: RESTORE_FALLBACK_DELAYS_MS
                .iter()
                .map(|&ms| Duration::from_millis(ms))
                .collect(),
        }
    }

    pub fn target(&self) -> RestoreTarget {
        self.target
    }

    /// Whether the restore should be re-applied on this frame
    pub fn due(&mut self, now: Instant) -> bool {
        if self.frames_left > 0 {
            self.frames_left -= 1;
            return true;
        }
        let elapsed = now.saturating_duration_since(self.started);
        let mut due = false;
        while self.delays.front().is_some_and(|d| *d <= elapsed) {
            self.delays.pop_front();
            due = true;
        }
        due
    }

    pub fn is_done(&self) -> bool {
        self.frames_left == 0 && self.delays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::testing::MockViewport;

    fn metrics(top: u32, height: u32, client: u32) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: top,
            scroll_height: height,
            client_height: client,
        }
    }

    #[test]
    fn test_prepend_keeps_offset_by_height_delta() {
        let vp = MockViewport::with_metrics(metrics(120, 2000, 500));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::Prepend, 50);
        assert!(!anchor.was_at_bottom());
        assert_eq!(anchor.target(&metrics(0, 3760, 500)), 120 + 1760);
    }

    #[test]
    fn test_prepend_never_pins_even_at_bottom() {
        let vp = MockViewport::with_metrics(metrics(1500, 2000, 500));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::Prepend, 50);
        assert!(!anchor.was_at_bottom());
        assert_eq!(anchor.target(&metrics(0, 2400, 500)), 1900);
    }

    #[test]
    fn test_append_aware_pins_when_near_bottom() {
        let vp = MockViewport::with_metrics(metrics(1460, 2000, 500));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::AppendAware, 50);
        assert!(anchor.was_at_bottom());
        assert_eq!(anchor.target(&metrics(0, 2600, 500)), 2600);
    }

    #[test]
    fn test_append_aware_tolerance_is_exclusive() {
        let vp = MockViewport::with_metrics(metrics(1450, 2000, 500));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::AppendAware, 50);
        assert!(!anchor.was_at_bottom());
        assert_eq!(anchor.target(&metrics(0, 2600, 500)), 2050);
    }

    #[test]
    fn test_short_content_counts_as_bottom() {
        let vp = MockViewport::with_metrics(metrics(0, 200, 500));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::AppendAware, 50);
        assert!(anchor.was_at_bottom());
    }

    #[test]
    fn test_shrinking_content_clamps_at_zero() {
        let vp = MockViewport::with_metrics(metrics(100, 2000, 500));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::AppendAware, 50);
        assert_eq!(anchor.target(&metrics(0, 1000, 500)), 0);
    }

    #[test]
    fn test_restore_writes_viewport() {
        let mut vp = MockViewport::with_metrics(metrics(10, 1000, 400));
        let anchor = ScrollAnchor::capture(&vp, RestoreMode::Prepend, 50);
        vp.force_scroll_height(1300);
        assert_eq!(anchor.restore(&mut vp), 310);
        assert_eq!(vp.metrics().scroll_top, 310);

        assert_eq!(pin_to_bottom(&mut vp), 1300);
        assert_eq!(vp.metrics().scroll_top, 1300);
    }

    #[test]
    fn test_schedule_frames_then_delays() {
        let start = Instant::now();
        let mut schedule = RestoreSchedule::new(RestoreTarget::Bottom, start);

        assert!(schedule.due(start));
        assert!(schedule.due(start));
        assert!(!schedule.due(start + Duration::from_millis(10)));
        assert!(schedule.due(start + Duration::from_millis(60)));
        assert!(!schedule.due(start + Duration::from_millis(70)));
        assert!(!schedule.is_done());
        // Both remaining delays have elapsed; applied once
        assert!(schedule.due(start + Duration::from_millis(500)));
        assert!(schedule.is_done());
        assert!(!schedule.due(start + Duration::from_secs(1)));
    }
}
