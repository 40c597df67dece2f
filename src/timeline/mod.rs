//! Incremental timeline rendering: render window, scroll anchoring and the surface.

pub mod anchor;
pub mod renderer;
pub mod surface;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use anchor::{ScrollMetrics, Viewport};
pub use renderer::{RenderStatus, RendererSettings, ScrollOutcome, ViewportRenderer};
pub use surface::{Node, NodeKind, Placeholder, Surface};
pub use window::PaginationSettings;
