//! The render target: an ordered list of display nodes with stable identities.
//!
//! Node ids play the role of element identity. Reconciliation reuses the ids of
//! unchanged nodes so the viewport only re-measures what actually changed, and the
//! mutation counter lets callers verify that a no-op pass touched nothing.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;

use crate::chat::Message;

pub type NodeId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    NoSelection,
    NoMessages,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// "N older messages" affordance at the top
    OlderMessages { remaining: usize },
    /// Replaces the affordance while a batch is loading
    Loading,
    /// "N newer messages" affordance at the bottom of a detached window
    NewerMessages { remaining: usize },
    DateSeparator(NaiveDate),
    Message {
        index: usize,
        message: Message,
        group_start: bool,
    },
    Placeholder(Placeholder),
}

impl NodeKind {
    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message { .. })
    }

    pub fn is_affordance(&self) -> bool {
        matches!(
            self,
            Self::OlderMessages { .. } | Self::Loading | Self::NewerMessages { .. }
        )
    }

    /// Identity used for reuse: everything except the sequence index, which shifts
    /// when older history is backfilled.
    fn reuse_key(&self) -> NodeKind {
        let mut key = self.clone();
        if let NodeKind::Message { index, .. } = &mut key {
            *index = 0;
        }
        key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Default)]
pub struct Surface {
    nodes: Vec<Node>,
    next_id: NodeId,
    mutations: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total structural changes (inserted + removed nodes) since creation
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    pub fn clear(&mut self) {
        self.mutations += self.nodes.len() as u64;
        self.nodes.clear();
    }

    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let pos = self.nodes.len();
        self.insert(pos, kind)
    }

    pub fn insert(&mut self, pos: usize, kind: NodeKind) -> NodeId {
        let id = self.alloc_id();
        let pos = pos.min(self.nodes.len());
        self.nodes.insert(pos, Node { id, kind });
        self.mutations += 1;
        id
    }

    /// Insert several nodes at `pos`, keeping their order
    pub fn insert_many(&mut self, pos: usize, kinds: Vec<NodeKind>) {
        let pos = pos.min(self.nodes.len());
        let count = kinds.len();
        let new_nodes: Vec<Node> = kinds
            .into_iter()
            .map(|kind| Node {
                id: self.alloc_id(),
                kind,
            })
            .collect();
        self.nodes.splice(pos..pos, new_nodes);
        self.mutations += count as u64;
    }

    pub fn remove(&mut self, pos: usize) -> Option<Node> {
        if pos >= self.nodes.len() {
            return None;
        }
        self.mutations += 1;
        Some(self.nodes.remove(pos))
    }

    /// Swap the node at `pos` for a new one (new identity)
    pub fn replace(&mut self, pos: usize, kind: NodeKind) -> Option<NodeId> {
        if pos >= self.nodes.len() {
            return None;
        }
        let id = self.alloc_id();
        self.nodes[pos] = Node { id, kind };
        self.mutations += 2;
        Some(id)
    }

    pub fn position(&self, predicate: impl Fn(&NodeKind) -> bool) -> Option<usize> {
        self.nodes.iter().position(|n| predicate(&n.kind))
    }

    pub fn remove_where(&mut self, predicate: impl Fn(&NodeKind) -> bool) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| !predicate(&n.kind));
        let removed = before - self.nodes.len();
        self.mutations += removed as u64;
        removed
    }

    /// Position and content of the first rendered message
    pub fn first_message(&self) -> Option<(usize, &Message)> {
        self.nodes
            .iter()
            .enumerate()
            .find_map(|(pos, node)| match &node.kind {
                NodeKind::Message { message, .. } => Some((pos, message)),
                _ => None,
            })
    }

    pub fn message_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind.is_message()).count()
    }

    /// Replace all nodes with `kinds`, keeping the identity of every node whose
    /// content is unchanged. Returns the number of structural changes.
    pub fn rebuild(&mut self, kinds: Vec<NodeKind>) -> u64 {
        let mut reusable: HashMap<NodeKind, VecDeque<NodeId>> = HashMap::new();
        for node in &self.nodes {
            reusable
                .entry(node.kind.reuse_key())
                .or_default()
                .push_back(node.id);
        }
        let old_len = self.nodes.len() as u64;

        let mut reused = 0u64;
        let mut inserted = 0u64;
        let mut nodes = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let id = match reusable
                .get_mut(&kind.reuse_key())
                .and_then(|ids| ids.pop_front())
            {
                Some(id) => {
                    reused += 1;
                    id
                }
                None => {
                    inserted += 1;
                    self.alloc_id()
                }
            };
            nodes.push(Node { id, kind });
        }

        let changes = (old_len - reused) + inserted;
        self.nodes = nodes;
        self.mutations += changes;
        changes
    }

    fn alloc_id(&mut self) -> NodeId {
        self.next_id += 1;
        self.next_id
    }
}
