//! Conversation Store
//!
//! Append-only log of everything shown in the widget, in arrival order.
//! Entries are never edited or removed for the lifetime of the widget.

use crate::messages::NodeId;
use crate::render::RenderedNode;

/// A stored node and its position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationEntry {
    /// Position in the store
    pub id: NodeId,
    /// The rendered node
    pub node: RenderedNode,
}

/// Ordered, append-only conversation log
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    entries: Vec<ConversationEntry>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id
    pub fn append(&mut self, node: RenderedNode) -> NodeId {
        let id = NodeId(self.entries.len() as u64);
        self.entries.push(ConversationEntry { id, node });
        id
    }

    /// All entries in order
    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Look up a node
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&RenderedNode> {
        usize::try_from(id.0)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|e| &e.node)
    }

    /// Id of the most recent node
    #[must_use]
    pub fn last_id(&self) -> Option<NodeId> {
        self.entries.last().map(|e| e.id)
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been shown yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}
