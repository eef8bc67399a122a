//! Columnar node storage.
//!
//! Nodes live in parallel vectors addressed by local index. Structural nodes
//! (root, elements, text, comments, processing instructions) occupy
//! `0..first_attribute` in document order; attribute and namespace
//! declaration nodes follow, grouped per owning element.

use roaring::RoaringBitmap;

use crate::id::{PrefixId, TypeCode};

/// A link to another node by local index, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link(u32);

impl Link {
    pub(crate) const NONE: Link = Link(u32::MAX);

    #[inline]
    pub(crate) fn to(index: u32) -> Self {
        debug_assert!(index != u32::MAX);
        Link(index)
    }

    #[inline]
    pub(crate) fn get(self) -> Option<u32> {
        if self == Link::NONE {
            None
        } else {
            Some(self.0)
        }
    }

    #[inline]
    pub(crate) fn shifted(self, offset: u32) -> Link {
        match self.get() {
            Some(index) => Link(index + offset),
            None => Link::NONE,
        }
    }
}

/// A region of the shared text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Span {
    pub(crate) start: u32,
    pub(crate) len: u32,
}

impl Span {
    #[inline]
    pub(crate) fn new(start: usize, end: usize) -> Self {
        Span {
            start: start as u32,
            len: (end - start) as u32,
        }
    }

    #[inline]
    pub(crate) fn range(self) -> std::ops::Range<usize> {
        let start = self.start as usize;
        start..start + self.len as usize
    }
}

/// Per-node payload. Which variant applies follows from the node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Content {
    /// Root and element nodes.
    Branch {
        first_child: Link,
        first_attribute: Link,
    },
    /// Text, comment, attribute and namespace nodes.
    Value(Span),
    /// Processing instructions keep their target apart from their data.
    Instruction { target: Span, data: Span },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeStore {
    pub(crate) types: Vec<TypeCode>,
    pub(crate) parents: Vec<Link>,
    pub(crate) next_siblings: Vec<Link>,
    pub(crate) contents: Vec<Content>,
    pub(crate) prefixes: Vec<PrefixId>,
    pub(crate) text: String,
    pub(crate) whitespace: RoaringBitmap,
    pub(crate) first_attribute: u32,
}

impl NodeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Total number of nodes, attributes included.
    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.types.len() as u32
    }

    pub(crate) fn push(
        &mut self,
        type_code: TypeCode,
        parent: Link,
        content: Content,
        prefix: PrefixId,
    ) -> u32 {
        let index = self.len();
        self.types.push(type_code);
        self.parents.push(parent);
        self.next_siblings.push(Link::NONE);
        self.contents.push(content);
        self.prefixes.push(prefix);
        index
    }

    #[inline]
    pub(crate) fn type_code(&self, index: u32) -> TypeCode {
        self.types[index as usize]
    }

    #[inline]
    pub(crate) fn is_structural(&self, index: u32) -> bool {
        index < self.first_attribute
    }

    #[inline]
    pub(crate) fn is_element(&self, index: u32) -> bool {
        self.is_structural(index) && self.type_code(index).is_name()
    }

    #[inline]
    pub(crate) fn is_namespace(&self, index: u32) -> bool {
        !self.is_structural(index) && self.type_code(index) == TypeCode::NAMESPACE
    }

    #[inline]
    pub(crate) fn is_attribute(&self, index: u32) -> bool {
        !self.is_structural(index) && self.type_code(index) != TypeCode::NAMESPACE
    }

    #[inline]
    pub(crate) fn parent(&self, index: u32) -> Option<u32> {
        self.parents[index as usize].get()
    }

    #[inline]
    pub(crate) fn next_sibling(&self, index: u32) -> Option<u32> {
        self.next_siblings[index as usize].get()
    }

    #[inline]
    pub(crate) fn first_child(&self, index: u32) -> Option<u32> {
        match self.contents[index as usize] {
            Content::Branch { first_child, .. } => first_child.get(),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn first_attribute(&self, index: u32) -> Option<u32> {
        match self.contents[index as usize] {
            Content::Branch {
                first_attribute, ..
            } => first_attribute.get(),
            _ => None,
        }
    }

    pub(crate) fn span_str(&self, span: Span) -> &str {
        &self.text[span.range()]
    }

    pub(crate) fn value_is_empty(&self, index: u32) -> bool {
        matches!(self.contents[index as usize], Content::Value(span) if span.len == 0)
    }

    /// One past the last descendant of a structural node: the next node in
    /// document order that is not inside its subtree.
    pub(crate) fn subtree_end(&self, index: u32) -> u32 {
        let mut current = index;
        loop {
            if let Some(next) = self.next_sibling(current) {
                return next;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return self.first_attribute,
            }
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: u32, node: u32) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.parent(index);
        }
        false
    }

    /// Move the staged attribute block behind the structural nodes.
    ///
    /// The staged nodes keep their relative order; their sibling links,
    /// and the attribute links of their owning elements, are shifted by the
    /// number of structural nodes.
    pub(crate) fn append_attributes(&mut self, staged: StagedAttributes) {
        let offset = self.len();
        self.first_attribute = offset;
        for content in self.contents.iter_mut() {
            if let Content::Branch {
                first_attribute, ..
            } = content
            {
                *first_attribute = first_attribute.shifted(offset);
            }
        }
        self.types.extend(staged.types);
        self.parents
            .extend(staged.owners.into_iter().map(Link::to));
        self.next_siblings
            .extend(staged.next_siblings.into_iter().map(|link| link.shifted(offset)));
        self.contents
            .extend(staged.values.into_iter().map(Content::Value));
        self.prefixes.extend(staged.prefixes);
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.types.shrink_to_fit();
        self.parents.shrink_to_fit();
        self.next_siblings.shrink_to_fit();
        self.contents.shrink_to_fit();
        self.prefixes.shrink_to_fit();
        self.text.shrink_to_fit();
    }
}

/// Attribute and namespace nodes collected while the document is open.
///
/// Indices here are relative to the staging area; they become local
/// indices once the block is appended behind the structural nodes.
#[derive(Debug, Clone, Default)]
pub(crate) struct StagedAttributes {
    pub(crate) types: Vec<TypeCode>,
    pub(crate) owners: Vec<u32>,
    pub(crate) next_siblings: Vec<Link>,
    pub(crate) values: Vec<Span>,
    pub(crate) prefixes: Vec<PrefixId>,
}

impl StagedAttributes {
    pub(crate) fn len(&self) -> u32 {
        self.types.len() as u32
    }

    pub(crate) fn push(&mut self, type_code: TypeCode, owner: u32, value: Span, prefix: PrefixId) -> u32 {
        let index = self.len();
        self.types.push(type_code);
        self.owners.push(owner);
        self.next_siblings.push(Link::NONE);
        self.values.push(value);
        self.prefixes.push(prefix);
        index
    }
}
