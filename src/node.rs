use std::fmt::{Debug, Formatter};

/// Number of low handle bits that hold a node's local index.
pub const LOCAL_BITS: u32 = 16;
/// Number of local indices addressable through one document identifier.
pub const LOCAL_SPACE: u32 = 1 << LOCAL_BITS;
const LOCAL_MASK: u32 = LOCAL_SPACE - 1;
/// Number of document identifiers available.
pub const MAX_DOCUMENT_IDS: usize = 1 << (32 - LOCAL_BITS);

/// Identifier for one address block of a document.
///
/// A document normally has one identifier. A document with more nodes than
/// [`LOCAL_SPACE`] has one additional overflow identifier per extra block.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct DocumentId(pub(crate) u16);

impl DocumentId {
    /// The raw identifier.
    pub fn get(self) -> u16 {
        self.0
    }
}

/// A node handle.
///
/// The high bits identify the owning document block, the low bits are the
/// local index within that block. This is a lightweight value and can be
/// copied. The absence of a node is expressed as `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(u32);

impl Node {
    #[inline]
    pub(crate) fn new(document_id: DocumentId, low: u32) -> Self {
        debug_assert!(low < LOCAL_SPACE);
        Node(((document_id.0 as u32) << LOCAL_BITS) | low)
    }

    /// Recreate a handle from its raw integer form.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Node(raw)
    }

    /// The raw integer form of the handle.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The identifier in the high bits of the handle.
    #[inline]
    pub fn document_id(self) -> DocumentId {
        DocumentId((self.0 >> LOCAL_BITS) as u16)
    }

    /// The low bits of the handle: the local index relative to the start of
    /// the block named by [`Node::document_id`].
    #[inline]
    pub fn low(self) -> u32 {
        self.0 & LOCAL_MASK
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({}:{})", self.document_id().0, self.low())
    }
}

/// The kind of a node.
///
/// Derived from a node's type code and its position: nodes in the
/// attribute range are attributes or namespace declarations.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Document root that holds everything. Not the document element.
    Root,
    /// Element.
    Element,
    /// Attribute.
    Attribute,
    /// Namespace declaration.
    Namespace,
    /// Text.
    Text,
    /// Comment.
    Comment,
    /// Processing instruction.
    ProcessingInstruction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_bits() {
        let node = Node::new(DocumentId(3), 17);
        assert_eq!(node.document_id(), DocumentId(3));
        assert_eq!(node.low(), 17);
        assert_eq!(node.raw(), (3 << LOCAL_BITS) | 17);
        assert_eq!(Node::from_raw(node.raw()), node);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Node::new(DocumentId(1), 2)), "Node(1:2)");
    }
}
