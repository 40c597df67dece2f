//! Background polling of the conversation source.
//!
//! The poller owns the `ChangeDetector` and only reports categories whose change
//! token moved, so the UI thread never touches unchanged manifests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::chat::Manifest;
use crate::error::SourceError;
use crate::source::{SourcePoller, fetch_manifests, vanished_manifests};

use super::detector::ChangeDetector;

#[derive(Debug, Clone)]
pub enum PollEvent {
    /// Manifests of the categories that changed since the last poll.
    /// A category that disappeared is reported with an empty listing.
    Changed(Vec<Manifest>),
    /// The source couldn't be listed this cycle
    Failed(String),
}

/// Handle to a running poller. Dropping it stops the task.
pub struct PollHandle {
    shutdown_tx: mpsc::Sender<()>,
    wake_tx: mpsc::Sender<()>,
    pub event_rx: mpsc::Receiver<PollEvent>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        self.shutdown_tx.try_send(()).ok();
    }

    /// Poll now instead of waiting for the next tick (e.g. the terminal regained focus)
    pub fn notify_visible(&self) {
        // A full channel means a poll is already pending
        self.wake_tx.try_send(()).ok();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the polling loop.
///
/// `detector` should already hold the baseline of the listing the UI shows, so the
/// first tick doesn't report everything as changed.
pub fn spawn_poller<S: SourcePoller>(
    source: Arc<S>,
    detector: ChangeDetector,
    interval: Duration,
) -> PollHandle {
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let (wake_tx, wake_rx) = mpsc::channel(1);
    let (event_tx, event_rx) = mpsc::channel(16);

    let task = tokio::spawn(poll_loop(
        source,
        detector,
        interval,
        shutdown_rx,
        wake_rx,
        event_tx,
    ));

    PollHandle {
        shutdown_tx,
        wake_tx,
        event_rx,
        task,
    }
}

async fn poll_loop<S: SourcePoller>(
    source: Arc<S>,
    mut detector: ChangeDetector,
    interval: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
    mut wake_rx: mpsc::Receiver<()>,
    event_tx: mpsc::Sender<PollEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the baseline is already known
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            Some(()) = wake_rx.recv() => ticker.reset(),
            _ = ticker.tick() => {}
        }

        let event = match poll_once(source.as_ref(), &mut detector).await {
            Ok(changed) if changed.is_empty() => continue,
            Ok(changed) => PollEvent::Changed(changed),
            Err(e) => {
                tracing::warn!("Poll failed: {}", e);
                PollEvent::Failed(e.to_string())
            }
        };
        if event_tx.send(event).await.is_err() {
            break;
        }
    }
    tracing::debug!("Poller stopped");
}

/// Fetch every category and keep the manifests whose change token moved.
///
/// A category fetch that fails counts as "no change" for that category.
pub async fn poll_once<S: SourcePoller + ?Sized>(
    source: &S,
    detector: &mut ChangeDetector,
) -> Result<Vec<Manifest>, SourceError> {
    let categories = source.categories().await?;
    let mut changed = Vec::new();

    for (category, result) in fetch_manifests(source, &categories).await {
        let manifest = match result {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!("Failed to fetch '{}': {}", category, e);
                continue;
            }
        };
        let known = detector.has_baseline(&category);
        if detector.observe(&category, &manifest.change_token) || !known {
            tracing::debug!("Category '{}' changed", category);
            changed.push(manifest);
        }
    }

    let known: Vec<String> = detector.categories().map(str::to_string).collect();
    for manifest in vanished_manifests(known.iter().map(String::as_str), &categories) {
        detector.forget(&manifest.category);
        changed.push(manifest);
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::fixtures::summary;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    const INTERVAL: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct MockSource {
        tokens: Mutex<BTreeMap<String, String>>,
        offline: AtomicBool,
    }

    impl MockSource {
        fn with(entries: &[(&str, &str)]) -> Arc<Self> {
            let source = Self::default();
            for (category, token) in entries {
                source.set(category, token);
            }
            Arc::new(source)
        }

        fn set(&self, category: &str, token: &str) {
            self.tokens
                .lock()
                .unwrap()
                .insert(category.to_string(), token.to_string());
        }

        fn remove(&self, category: &str) {
            self.tokens.lock().unwrap().remove(category);
        }
    }

    impl SourcePoller for MockSource {
        async fn categories(&self) -> Result<Vec<String>, SourceError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(SourceError::UnknownCategory("offline".to_string()));
            }
            Ok(self.tokens.lock().unwrap().keys().cloned().collect())
        }

        async fn fetch_manifest(&self, category: &str) -> Result<Manifest, SourceError> {
            let token = self
                .tokens
                .lock()
                .unwrap()
                .get(category)
                .cloned()
                .ok_or_else(|| SourceError::UnknownCategory(category.to_string()))?;
            Ok(Manifest {
                category: category.to_string(),
                conversations: vec![summary(&token, 1, "")],
                change_token: token,
            })
        }
    }

    fn seeded(source: &MockSource) -> ChangeDetector {
        let mut detector = ChangeDetector::new();
        for (category, token) in source.tokens.lock().unwrap().iter() {
            detector.observe(category, token);
        }
        detector
    }

    fn categories(event: PollEvent) -> Vec<String> {
        match event {
            PollEvent::Changed(manifests) => manifests.into_iter().map(|m| m.category).collect(),
            PollEvent::Failed(e) => panic!("unexpected failure: {}", e),
        }
    }

    #[tokio::test]
    async fn test_poll_once_reports_only_changes() {
        let source = MockSource::with(&[("insta", "a"), ("whatsapp", "a")]);
        let mut detector = seeded(&source);
        assert!(poll_once(source.as_ref(), &mut detector).await.unwrap().is_empty());

        source.set("whatsapp", "b");
        let changed = poll_once(source.as_ref(), &mut detector).await.unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].category, "whatsapp");
        assert!(poll_once(source.as_ref(), &mut detector).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_once_new_and_vanished_categories() {
        let source = MockSource::with(&[("whatsapp", "a")]);
        let mut detector = seeded(&source);

        source.set("insta", "a");
        source.remove("whatsapp");
        let changed = poll_once(source.as_ref(), &mut detector).await.unwrap();
        assert_eq!(changed.len(), 2);
        assert_eq!(changed[0].category, "insta");
        assert_eq!(changed[1].category, "whatsapp");
        assert!(changed[1].conversations.is_empty());
        assert!(!detector.has_baseline("whatsapp"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_emits_on_interval() {
        let source = MockSource::with(&[("whatsapp", "a")]);
        let mut handle = spawn_poller(source.clone(), seeded(&source), INTERVAL);

        tokio::time::sleep(INTERVAL * 3).await;
        assert!(handle.event_rx.try_recv().is_err(), "nothing changed");

        source.set("whatsapp", "b");
        let event = tokio::time::timeout(INTERVAL * 2, handle.event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(categories(event), vec!["whatsapp"]);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_visible_polls_immediately() {
        let source = MockSource::with(&[("whatsapp", "a")]);
        let mut handle = spawn_poller(source.clone(), seeded(&source), Duration::from_secs(3600));
        tokio::task::yield_now().await;

        source.set("whatsapp", "b");
        handle.notify_visible();
        let event = tokio::time::timeout(Duration::from_secs(1), handle.event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(categories(event), vec!["whatsapp"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported_and_polling_continues() {
        let source = MockSource::with(&[("whatsapp", "a")]);
        let mut handle = spawn_poller(source.clone(), seeded(&source), INTERVAL);

        source.offline.store(true, Ordering::SeqCst);
        let event = handle.event_rx.recv().await.unwrap();
        assert!(matches!(event, PollEvent::Failed(_)));

        source.offline.store(false, Ordering::SeqCst);
        source.set("whatsapp", "b");
        let event = handle.event_rx.recv().await.unwrap();
        assert_eq!(categories(event), vec!["whatsapp"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_task() {
        let source = MockSource::with(&[("whatsapp", "a")]);
        let mut handle = spawn_poller(source.clone(), seeded(&source), INTERVAL);

        handle.stop();
        assert!(handle.event_rx.recv().await.is_none());
        tokio::task::yield_now().await;
        assert!(handle.is_finished());
    }
}
