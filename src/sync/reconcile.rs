//! Diff-and-patch of the conversation list against refreshed manifests.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::chat::{ConversationSummary, Manifest};
use crate::source::Parser;
use crate::timeline::{Viewport, ViewportRenderer};

/// Changes between two conversation lists, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: Vec<ConversationSummary>,
    pub removed: Vec<ConversationSummary>,
    pub updated: Vec<ConversationSummary>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    pub fn is_removed(&self, id: &str) -> bool {
        self.removed.iter().any(|c| c.id == id)
    }

    pub fn is_updated(&self, id: &str) -> bool {
        self.updated.iter().any(|c| c.id == id)
    }
}

/// `added = N - P`, `removed = P - N`, `updated` = present in both with a different card
pub fn diff(previous: &[ConversationSummary], next: &[ConversationSummary]) -> DiffResult {
    let before: HashMap<&str, &ConversationSummary> =
        previous.iter().map(|c| (c.id.as_str(), c)).collect();
    let after: HashSet<&str> = next.iter().map(|c| c.id.as_str()).collect();

    let mut result = DiffResult::default();
    for conversation in next {
        match before.get(conversation.id.as_str()) {
            None => result.added.push(conversation.clone()),
            Some(old) if old.card_changed(conversation) => {
                result.updated.push(conversation.clone())
            }
            Some(_) => {}
        }
    }
    result.removed = previous
        .iter()
        .filter(|c| !after.contains(c.id.as_str()))
        .cloned()
        .collect();
    result
}

/// Newest conversation first, undated ones last
fn sort_by_recency(conversations: &mut [ConversationSummary]) {
    conversations.sort_by(|a, b| {
        b.last_message_time
            .cmp(&a.last_message_time)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub type CardKey = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub key: CardKey,
    pub summary: ConversationSummary,
}

/// The visible conversation list. Cards keep their key until their content changes.
#[derive(Debug, Clone, Default)]
pub struct CardList {
    cards: Vec<Card>,
    next_key: CardKey,
    mutations: u64,
}

impl CardList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards created or dropped since creation
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    pub fn get(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.summary.id == id)
    }

    pub fn summaries(&self) -> Vec<ConversationSummary> {
        self.cards.iter().map(|c| c.summary.clone()).collect()
    }

    /// Adopt `ordered`, reusing the key of every card that isn't in `diff.updated`
    fn patch(&mut self, ordered: Vec<ConversationSummary>, diff: &DiffResult) {
        let mut keys: HashMap<String, CardKey> = self
            .cards
            .drain(..)
            .map(|c| (c.summary.id, c.key))
            .collect();

        let mut cards = Vec::with_capacity(ordered.len());
        for summary in ordered {
            let reused = if diff.is_updated(&summary.id) {
                None
            } else {
                keys.remove(&summary.id)
            };
            let key = match reused {
                Some(key) => key,
                None => {
                    self.mutations += 1;
                    self.next_key += 1;
                    self.next_key
                }
            };
            cards.push(Card { key, summary });
        }
        // Dropped cards: removed conversations plus the old cards of updated ones
        self.mutations += (diff.removed.len() + diff.updated.len()) as u64;
        self.cards = cards;
    }
}

/// What happens to the open conversation after a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAction {
    Keep,
    Deselect,
    Reload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub diff: DiffResult,
    pub open: OpenAction,
}

/// Owns the conversation list and serializes reconciliation passes.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    cards: CardList,
    updating: bool,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine showing the initial listing
    pub fn with_manifests(manifests: &[Manifest]) -> Self {
        let mut conversations: Vec<ConversationSummary> = manifests
            .iter()
            .flat_map(|m| m.conversations.iter().cloned())
            .collect();
        sort_by_recency(&mut conversations);

        let mut engine = Self::new();
        let diff = diff(&[], &conversations);
        engine.cards.patch(conversations, &diff);
        engine
    }

    pub fn cards(&self) -> &CardList {
        &self.cards
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Merge changed manifests into the list and apply the diff to the cards.
    ///
    /// Categories not present in `changed` keep their entries. Returns `None` while a
    /// previous pass is still applying the open conversation. When the outcome asks for
    /// a reload, the engine stays in the updating state until `finish`.
    pub fn begin(&mut self, changed: &[Manifest], open_id: Option<&str>) -> Option<ReconcileOutcome> {
        if self.updating {
            tracing::debug!("Reconciliation already in progress, skipping");
            return None;
        }
        self.updating = true;

        let changed_categories: HashSet<&str> =
            changed.iter().map(|m| m.category.as_str()).collect();
        let previous = self.cards.summaries();
        let mut merged: Vec<ConversationSummary> = previous
            .iter()
            .filter(|c| !changed_categories.contains(c.category.as_str()))
            .cloned()
            .chain(changed.iter().flat_map(|m| m.conversations.iter().cloned()))
            .collect();
        sort_by_recency(&mut merged);

        let result = diff(&previous, &merged);
        if result.is_empty() {
            self.updating = false;
            return Some(ReconcileOutcome {
                diff: result,
                open: OpenAction::Keep,
            });
        }

        tracing::info!(
            "Reconciling: {} added, {} removed, {} updated",
            result.added.len(),
            result.removed.len(),
            result.updated.len()
        );
        self.cards.patch(merged, &result);

        let open = match open_id {
            Some(id) if result.is_removed(id) => OpenAction::Deselect,
            Some(id) if result.is_updated(id) => OpenAction::Reload(id.to_string()),
            _ => OpenAction::Keep,
        };
        if !matches!(open, OpenAction::Reload(_)) {
            self.updating = false;
        }
        Some(ReconcileOutcome { diff: result, open })
    }

    /// The open conversation's new messages have been applied
    pub fn finish(&mut self) {
        self.updating = false;
    }
}

/// Run one full reconciliation pass: patch the list, then bring the open conversation
/// in line with it.
pub async fn apply_manifests<P: Parser, V: Viewport>(
    engine: &mut ReconciliationEngine,
    renderer: &mut ViewportRenderer<V>,
    parser: &P,
    changed: &[Manifest],
) -> Option<ReconcileOutcome> {
    let open_id = renderer.selected_id().map(str::to_string);
    let outcome = engine.begin(changed, open_id.as_deref())?;

    for conversation in outcome.diff.updated.iter().chain(&outcome.diff.removed) {
        parser.invalidate(&conversation.id).await;
    }

    match &outcome.open {
        OpenAction::Keep => {}
        OpenAction::Deselect => {
            tracing::info!("Open conversation was removed from the source");
            renderer.deselect();
        }
        OpenAction::Reload(id) => {
            match parser.messages(id).await {
                // The user may have switched while the messages were loading
                Ok(messages) if renderer.selected_id() == Some(id.as_str()) => {
                    renderer.render_reconciled(id, messages, Instant::now());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to reload '{}': {}", id, e),
            }
            engine.finish();
        }
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use crate::chat::types::fixtures::{messages, summary, ts};
    use crate::error::SourceError;
    use crate::timeline::testing::MockViewport;
    use crate::timeline::{PaginationSettings, RendererSettings};
    use std::sync::{Arc, Mutex};

    fn manifest(category: &str, conversations: Vec<ConversationSummary>) -> Manifest {
        let conversations = conversations
            .into_iter()
            .map(|mut c| {
                c.category = category.to_string();
                c
            })
            .collect();
        Manifest {
            category: category.to_string(),
            conversations,
            change_token: String::new(),
        }
    }

    #[test]
    fn test_diff_added_removed_updated() {
        let a = summary("a", 1, "x");
        let b = summary("b", 1, "x");
        let c = summary("c", 1, "x");
        let d = summary("d", 1, "x");
        let mut c2 = c.clone();
        c2.preview = "new".to_string();

        let result = diff(&[a.clone(), b.clone(), c], &[a, c2.clone(), d.clone()]);
        assert_eq!(result.added, vec![d]);
        assert_eq!(result.removed, vec![b]);
        assert_eq!(result.updated, vec![c2]);
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let list = vec![summary("a", 1, "x"), summary("b", 2, "y")];
        assert!(diff(&list, &list).is_empty());
    }

    #[test]
    fn test_reconcile_idempotent() {
        let m = manifest("whatsapp", vec![summary("a", 1, "x"), summary("b", 2, "y")]);
        let mut engine = ReconciliationEngine::with_manifests(std::slice::from_ref(&m));
        let keys: Vec<_> = engine.cards().cards().iter().map(|c| c.key).collect();
        let mutations = engine.cards().mutations();

        let outcome = engine.begin(std::slice::from_ref(&m), Some("a")).unwrap();
        assert!(outcome.diff.is_empty());
        assert_eq!(outcome.open, OpenAction::Keep);
        assert_eq!(engine.cards().mutations(), mutations);
        let after: Vec<_> = engine.cards().cards().iter().map(|c| c.key).collect();
        assert_eq!(keys, after);
        assert!(!engine.is_updating());
    }

    #[test]
    fn test_unaffected_cards_keep_identity() {
        let m = manifest("whatsapp", vec![summary("a", 1, "x"), summary("b", 1, "x")]);
        let mut engine = ReconciliationEngine::with_manifests(&[m]);
        let key_a = engine.cards().get("a").unwrap().key;
        let key_b = engine.cards().get("b").unwrap().key;

        let next = manifest(
            "whatsapp",
            vec![summary("a", 1, "x"), summary("b", 2, "y"), summary("c", 1, "x")],
        );
        engine.begin(&[next], None).unwrap();
        assert_eq!(engine.cards().get("a").unwrap().key, key_a);
        assert_ne!(engine.cards().get("b").unwrap().key, key_b);
        assert_eq!(engine.cards().len(), 3);
    }

    #[test]
    fn test_unchanged_categories_are_kept_and_sorted() {
        let mut old = summary("w", 1, "x");
        old.last_message_time = Some(ts(1, 8, 0));
        let mut newer = summary("i", 1, "x");
        newer.last_message_time = Some(ts(5, 8, 0));
        let mut engine = ReconciliationEngine::with_manifests(&[
            manifest("whatsapp", vec![old]),
            manifest("insta", vec![]),
        ]);

        let outcome = engine.begin(&[manifest("insta", vec![newer])], None).unwrap();
        assert_eq!(outcome.diff.added.len(), 1);
        let ids: Vec<_> = engine
            .cards()
            .cards()
            .iter()
            .map(|c| c.summary.id.as_str())
            .collect();
        assert_eq!(ids, vec!["i", "w"]);
    }

    #[test]
    fn test_open_conversation_actions() {
        let m = manifest("whatsapp", vec![summary("a", 1, "x"), summary("b", 1, "x")]);
        let mut engine = ReconciliationEngine::with_manifests(&[m]);

        let removed = engine
            .begin(&[manifest("whatsapp", vec![summary("b", 1, "x")])], Some("a"))
            .unwrap();
        assert_eq!(removed.open, OpenAction::Deselect);
        assert!(!engine.is_updating());

        let updated = engine
            .begin(&[manifest("whatsapp", vec![summary("b", 3, "z")])], Some("b"))
            .unwrap();
        assert_eq!(updated.open, OpenAction::Reload("b".to_string()));
        assert!(engine.is_updating());
        assert!(engine.begin(&[], Some("b")).is_none());

        engine.finish();
        assert!(!engine.is_updating());
    }

    struct MapParser {
        sequences: Mutex<HashMap<String, Arc<[Message]>>>,
        invalidated: Mutex<Vec<String>>,
    }

    impl MapParser {
        fn new(entries: &[(&str, usize)]) -> Self {
            Self {
                sequences: Mutex::new(
                    entries
                        .iter()
                        .map(|(id, n)| (id.to_string(), Arc::from(messages(*n))))
                        .collect(),
                ),
                invalidated: Mutex::new(Vec::new()),
            }
        }
    }

    impl Parser for MapParser {
        async fn messages(&self, conversation_id: &str) -> Result<Arc<[Message]>, SourceError> {
            self.sequences
                .lock()
                .unwrap()
                .get(conversation_id)
                .cloned()
                .ok_or_else(|| SourceError::InvalidId(conversation_id.to_string()))
        }

        async fn invalidate(&self, conversation_id: &str) {
            self.invalidated
                .lock()
                .unwrap()
                .push(conversation_id.to_string());
        }
    }

    fn renderer() -> ViewportRenderer<MockViewport> {
        ViewportRenderer::new(
            MockViewport::new(600),
            RendererSettings {
                pagination: PaginationSettings::new(50, 300),
                bottom_tolerance: 50,
                group_gap: chrono::Duration::minutes(5),
            },
        )
    }

    #[tokio::test]
    async fn test_removed_open_conversation_deselects() {
        let parser = MapParser::new(&[("a", 10), ("b", 10)]);
        let mut engine = ReconciliationEngine::with_manifests(&[manifest(
            "whatsapp",
            vec![summary("a", 10, "x"), summary("b", 10, "x")],
        )]);
        let mut r = renderer();
        r.render_initial("a", parser.messages("a").await.unwrap(), Instant::now());

        let outcome = apply_manifests(
            &mut engine,
            &mut r,
            &parser,
            &[manifest("whatsapp", vec![summary("b", 10, "x")])],
        )
        .await
        .unwrap();

        assert_eq!(outcome.open, OpenAction::Deselect);
        assert_eq!(r.selected_id(), None);
        assert!(r.surface().nodes()[0].kind == crate::timeline::NodeKind::Placeholder(
            crate::timeline::Placeholder::NoSelection
        ));
        assert_eq!(*parser.invalidated.lock().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_updated_open_conversation_rerenders() {
        let parser = MapParser::new(&[("a", 120)]);
        let mut engine = ReconciliationEngine::with_manifests(&[manifest(
            "whatsapp",
            vec![summary("a", 120, "x")],
        )]);
        let mut r = renderer();
        r.render_initial("a", parser.messages("a").await.unwrap(), Instant::now());

        parser
            .sequences
            .lock()
            .unwrap()
            .insert("a".to_string(), Arc::from(messages(125)));
        let outcome = apply_manifests(
            &mut engine,
            &mut r,
            &parser,
            &[manifest("whatsapp", vec![summary("a", 125, "y")])],
        )
        .await
        .unwrap();

        assert_eq!(outcome.open, OpenAction::Reload("a".to_string()));
        assert!(!engine.is_updating());
        assert_eq!(r.store().len(), 125);
        let m = r.viewport().metrics();
        assert_eq!(m.scroll_top, m.scroll_height, "stays pinned to newest");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_current_view() {
        let parser = MapParser::new(&[("a", 10)]);
        let mut engine = ReconciliationEngine::with_manifests(&[manifest(
            "whatsapp",
            vec![summary("a", 10, "x")],
        )]);
        let mut r = renderer();
        r.render_initial("a", parser.messages("a").await.unwrap(), Instant::now());
        parser.sequences.lock().unwrap().clear();

        apply_manifests(
            &mut engine,
            &mut r,
            &parser,
            &[manifest("whatsapp", vec![summary("a", 11, "y")])],
        )
        .await
        .unwrap();
        assert_eq!(r.selected_id(), Some("a"));
        assert_eq!(r.store().len(), 10);
        assert!(!engine.is_updating());
    }
}
