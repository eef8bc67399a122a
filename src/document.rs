use crate::names::Names;
use crate::node::{DocumentId, Node, LOCAL_SPACE};
use crate::store::NodeStore;

/// A sealed, read-only document.
///
/// Produced by a [`Builder`](crate::Builder) or one of the parse functions.
/// Every node is addressed by a [`Node`] handle whose high bits name one of
/// the document's identifiers. A document that is not registered with a
/// [`DocumentManager`](crate::DocumentManager) uses identifiers counting up
/// from zero; registering it assigns it unique ones. Handles are checked
/// against these identifiers only, so a node of one unregistered document
/// may address a node of another.
///
/// A `Document` is immutable and can be shared between threads; any number
/// of axis iterators may walk it concurrently.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) store: NodeStore,
    pub(crate) names: Names,
    ids: Vec<DocumentId>,
}

impl Document {
    pub(crate) fn new(store: NodeStore, names: Names) -> Self {
        let needed = identifiers_needed(store.len());
        let ids = (0..needed).map(|id| DocumentId(id as u16)).collect();
        Document { store, names, ids }
    }

    /// The document identifiers, base identifier first.
    ///
    /// Block `i` of local indices starts at `i * LOCAL_SPACE`.
    pub fn document_ids(&self) -> &[DocumentId] {
        &self.ids
    }

    /// Number of identifiers this document needs to address all its nodes.
    pub fn identifiers_needed(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn set_ids(&mut self, ids: Vec<DocumentId>) {
        debug_assert_eq!(ids.len(), self.ids.len());
        self.ids = ids;
    }

    /// Handle for a local index.
    #[inline]
    pub(crate) fn handle(&self, local: u32) -> Node {
        let block = (local / LOCAL_SPACE) as usize;
        Node::new(self.ids[block], local % LOCAL_SPACE)
    }

    /// Handle for an optional local index.
    #[inline]
    pub(crate) fn handle_opt(&self, local: Option<u32>) -> Option<Node> {
        local.map(|local| self.handle(local))
    }

    fn block_of(&self, node: Node) -> Option<usize> {
        let id = node.document_id();
        // nearly all documents fit in one block
        if self.ids[0] == id {
            return Some(0);
        }
        self.ids.iter().position(|candidate| *candidate == id)
    }

    /// Whether a handle addresses a node in this document.
    pub fn contains(&self, node: Node) -> bool {
        match self.block_of(node) {
            Some(block) => (block as u32 * LOCAL_SPACE + node.low()) < self.store.len(),
            None => false,
        }
    }

    /// Local index for a handle.
    ///
    /// # Panics
    ///
    /// Panics if the node's identifier is not one of this document's, or
    /// its index is out of range.
    #[inline]
    pub(crate) fn local(&self, node: Node) -> u32 {
        let block = self
            .block_of(node)
            .unwrap_or_else(|| panic!("{:?} does not belong to this document", node));
        let local = block as u32 * LOCAL_SPACE + node.low();
        assert!(
            local < self.store.len(),
            "{:?} is out of range for this document",
            node
        );
        local
    }

    /// Number of nodes, attributes and namespace declarations included.
    pub fn len(&self) -> usize {
        self.store.len() as usize
    }

    /// A document always has at least its root.
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Number of nodes in document order: root, elements, text, comments
    /// and processing instructions.
    pub fn structural_len(&self) -> usize {
        self.store.first_attribute as usize
    }

    /// The registry holding this document's names.
    pub fn names(&self) -> &Names {
        &self.names
    }

    /// Give up the document and keep its registry, for example to seed the
    /// builder of another document.
    pub fn into_names(self) -> Names {
        self.names
    }
}

pub(crate) fn identifiers_needed(nodes: u32) -> usize {
    (nodes.max(1) as usize).div_ceil(LOCAL_SPACE as usize)
}
