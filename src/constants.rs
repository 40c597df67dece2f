//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Number of messages materialized per pagination step.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Distance from the top (in viewport units) at which older messages start loading.
/// Loading before the literal top avoids a dead zone when the scroll event already
/// fired slightly below zero offset.
pub const DEFAULT_SCROLL_THRESHOLD: u32 = 300;

/// A viewport within this many units of the bottom counts as pinned to the newest
/// message when content is reconciled.
pub const DEFAULT_BOTTOM_TOLERANCE: u32 = 50;

/// Consecutive messages from the same sender further apart than this start a new group.
pub const DEFAULT_GROUP_GAP_SECS: i64 = 5 * 60;

/// Default manifest poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Category manifests fetched in parallel during a poll.
pub const MANIFEST_FETCH_CONCURRENCY: usize = 4;

/// Number of frame passes a scroll restore is re-applied on after the immediate one.
pub const RESTORE_FRAME_PASSES: usize = 2;

/// Fallback delays (ms) at which a scroll restore is re-applied in case the surface
/// had not committed its layout yet.
pub const RESTORE_FALLBACK_DELAYS_MS: [u64; 3] = [50, 100, 200];

// === Terminal UI Constants ===

/// Viewport units per terminal row.
pub const ROW_UNITS: u32 = 16;

/// Default width of the conversation list pane in columns.
pub const DEFAULT_LIST_WIDTH: u16 = 32;

/// Below this terminal width the list pane is hidden while a conversation is open.
pub const MIN_SPLIT_VIEW_WIDTH: u16 = 72;

/// Rows scrolled per arrow key press.
pub const SCROLL_STEP_ROWS: u32 = 1;

/// Rows scrolled per mouse wheel notch.
pub const WHEEL_STEP_ROWS: u32 = 3;

/// Maximum characters of a preview shown on a list card.
pub const PREVIEW_MAX_CHARS: usize = 60;

/// Seconds an error stays in the status bar.
pub const ERROR_TTL_SECS: u64 = 5;

/// Input poll timeout (ms) while scroll restores or loads are pending.
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Input poll timeout (ms) when nothing is pending.
pub const IDLE_POLL_MS: u64 = 150;
