//! Keeps the conversation list in line with the source.

pub mod detector;
pub mod poller;
pub mod reconcile;

pub use detector::ChangeDetector;
pub use poller::{PollEvent, PollHandle, spawn_poller};
pub use reconcile::{ReconciliationEngine, apply_manifests};
