//! Axis iterators.
//!
//! Every XPath axis is available as a [`NodeIter`]: a restartable cursor over
//! one document. The plain axis walk can be wrapped by a [`NodeTest`] filter,
//! a whitespace stripping wrapper and an ordering wrapper; all of them go
//! through the same [`AxisIterator`] interface.
mod cursor;
mod strip;

use std::fmt;

use roaring::RoaringBitmap;

use crate::axis::Axis;
use crate::builder::is_xml_whitespace;
use crate::document::Document;
use crate::id::TypeCode;
use crate::node::Node;

use cursor::Cursor;
pub(crate) use cursor::in_scope_namespaces;
pub use strip::{StripFilter, StripSpace};

/// The cursor contract shared by all axis iterators.
///
/// `next` returns `None` at the end of the axis; that's not an error.
pub trait AxisIterator: Iterator<Item = Node> {
    /// Start (or restart) the iterator at a node.
    ///
    /// A non-restartable iterator ignores this once it has a start node.
    fn set_start_node(&mut self, node: Node) -> &mut Self;

    /// Rewind to the position established by the last start node.
    fn reset(&mut self) -> &mut Self;

    /// Remember the current position.
    fn set_mark(&mut self);

    /// Return to the position remembered by [`AxisIterator::set_mark`].
    /// Without a mark this is the same as [`AxisIterator::reset`].
    fn goto_mark(&mut self);

    /// An independent cursor over the same document in the same state.
    ///
    /// # Panics
    ///
    /// Panics if the iterator was made non-restartable.
    fn clone_iterator(&self) -> Self
    where
        Self: Sized;

    /// Whether nodes come in reverse document order.
    fn is_reverse(&self) -> bool;

    /// The node the iterator was started at.
    fn start_node(&self) -> Option<Node>;

    /// One-based position of the node last returned; 0 before the first.
    fn position(&self) -> usize;

    /// The number of nodes in the whole sequence from the start node.
    fn last_position(&self) -> usize;
}

/// Node test applied by a filtered iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeTest {
    /// Any node.
    Any,
    /// Any element.
    Element,
    /// Nodes with exactly this type code. The marker codes
    /// [`TypeCode::ELEMENT`], [`TypeCode::ATTRIBUTE`] and
    /// [`TypeCode::NAMESPACE`] match any element, attribute or namespace
    /// node.
    Type(TypeCode),
}

impl NodeTest {
    fn matches(self, document: &Document, index: u32) -> bool {
        let store = &document.store;
        match self {
            NodeTest::Any => true,
            NodeTest::Element => store.is_element(index),
            NodeTest::Type(TypeCode::ELEMENT) => store.is_element(index),
            NodeTest::Type(TypeCode::ATTRIBUTE) => store.is_attribute(index),
            NodeTest::Type(TypeCode::NAMESPACE) => store.is_namespace(index),
            NodeTest::Type(code) => store.type_code(index) == code,
        }
    }
}

#[derive(Clone)]
enum Source<'a> {
    Axis { axis: Axis, cursor: Cursor },
    Filtered { inner: Box<Source<'a>>, test: NodeTest },
    Stripping {
        inner: Box<Source<'a>>,
        filter: Option<&'a dyn StripFilter>,
    },
    Ordered {
        inner: Box<Source<'a>>,
        replay: Option<(Vec<u32>, usize)>,
    },
}

impl<'a> Source<'a> {
    fn restart(&mut self, document: &Document, start: u32) {
        match self {
            Source::Axis { axis, cursor } => *cursor = Cursor::new(*axis, &document.store, start),
            Source::Filtered { inner, .. } | Source::Stripping { inner, .. } => {
                inner.restart(document, start)
            }
            Source::Ordered { inner, replay } => {
                *replay = None;
                inner.restart(document, start);
            }
        }
    }

    fn axis(&self) -> Axis {
        match self {
            Source::Axis { axis, .. } => *axis,
            Source::Filtered { inner, .. }
            | Source::Stripping { inner, .. }
            | Source::Ordered { inner, .. } => inner.axis(),
        }
    }

    fn is_reverse(&self) -> bool {
        match self {
            Source::Axis { axis, .. } => axis.is_reverse(),
            Source::Filtered { inner, .. } | Source::Stripping { inner, .. } => inner.is_reverse(),
            Source::Ordered { .. } => false,
        }
    }

    fn next(&mut self, document: &Document) -> Option<u32> {
        match self {
            Source::Axis { cursor, .. } => cursor.next(&document.store),
            Source::Filtered { inner, test } => loop {
                let index = inner.next(document)?;
                if test.matches(document, index) {
                    return Some(index);
                }
            },
            Source::Stripping { inner, filter } => loop {
                let index = inner.next(document)?;
                if !strips(document, *filter, index) {
                    return Some(index);
                }
            },
            Source::Ordered { inner, replay } => {
                let (nodes, position) = replay.get_or_insert_with(|| {
                    let mut visited = RoaringBitmap::new();
                    while let Some(index) = inner.next(document) {
                        visited.insert(index);
                    }
                    (visited.iter().collect(), 0)
                });
                let index = nodes.get(*position).copied()?;
                *position += 1;
                Some(index)
            }
        }
    }
}

fn strips(document: &Document, filter: Option<&dyn StripFilter>, index: u32) -> bool {
    let store = &document.store;
    if !store.is_structural(index) || store.type_code(index) != TypeCode::TEXT {
        return false;
    }
    match filter {
        None => store.whitespace.contains(index),
        Some(filter) => {
            let whitespace = document.value_of(index).map(is_xml_whitespace).unwrap_or(false);
            whitespace
                && match store.parent(index) {
                    Some(parent) => filter.strip_space(document, document.handle(parent)),
                    None => false,
                }
        }
    }
}

/// An axis iterator over one document.
///
/// Obtain one with [`Document::axis_iter`] or [`Document::typed_axis_iter`],
/// optionally wrap it, and start it at a node:
///
/// ```rust
/// use xdtm::{Axis, AxisIterator, Document};
///
/// let document = Document::parse("<r><x/><y/><z/></r>").unwrap();
/// let r = document.document_element().unwrap();
/// let z = document.children(r).last().unwrap();
///
/// let mut iter = document.axis_iter(Axis::PrecedingSibling);
/// iter.set_start_node(z);
/// let names = iter.by_ref().map(|n| document.node_name(n)).collect::<Vec<_>>();
/// assert_eq!(names, vec!["y", "x"]);
/// assert!(iter.is_reverse());
///
/// // drain again from the same start
/// iter.reset();
/// assert_eq!(iter.count(), 2);
/// ```
pub struct NodeIter<'a> {
    document: &'a Document,
    source: Source<'a>,
    start: Option<u32>,
    restartable: bool,
    position: usize,
    mark: Option<(Source<'a>, usize)>,
}

impl<'a> NodeIter<'a> {
    fn new(document: &'a Document, axis: Axis) -> Self {
        NodeIter {
            document,
            source: Source::Axis {
                axis,
                cursor: Cursor::Single(None),
            },
            start: None,
            restartable: true,
            position: 0,
            mark: None,
        }
    }

    fn wrap(mut self, f: impl FnOnce(Box<Source<'a>>) -> Source<'a>) -> Self {
        let inner = std::mem::replace(
            &mut self.source,
            Source::Axis {
                axis: Axis::Self_,
                cursor: Cursor::Single(None),
            },
        );
        self.source = f(Box::new(inner));
        self.restart();
        self
    }

    fn restart(&mut self) {
        if let Some(start) = self.start {
            self.source.restart(self.document, start);
        }
        self.position = 0;
    }

    /// Only yield nodes that pass a node test.
    pub fn matching(self, test: NodeTest) -> Self {
        self.wrap(|inner| Source::Filtered { inner, test })
    }

    /// Suppress whitespace-only text nodes.
    ///
    /// With a filter, a text node is dropped when all its characters are XML
    /// whitespace and the filter strips space in its parent element. Without
    /// one, the whitespace flag computed at build time decides.
    pub fn stripping(self, filter: Option<&'a dyn StripFilter>) -> Self {
        self.wrap(|inner| Source::Stripping { inner, filter })
    }

    /// Yield the nodes in ascending document order without duplicates,
    /// whatever order the wrapped iterator produces.
    pub fn ordered(self) -> Self {
        self.wrap(|inner| Source::Ordered {
            inner,
            replay: None,
        })
    }

    /// Make the iterator non-restartable: once it has a start node, further
    /// start nodes are ignored and it cannot be cloned.
    pub fn non_restartable(mut self) -> Self {
        self.restartable = false;
        self
    }

    /// Whether the iterator can be restarted and cloned.
    pub fn is_restartable(&self) -> bool {
        self.restartable
    }

    /// Start the iterator at a node and return it.
    pub fn start_at(mut self, node: Node) -> Self {
        self.set_start_node(node);
        self
    }

    /// The underlying axis.
    pub fn axis(&self) -> Axis {
        self.source.axis()
    }

    /// The document this iterator walks.
    pub fn document(&self) -> &'a Document {
        self.document
    }
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        self.start?;
        let index = self.source.next(self.document)?;
        self.position += 1;
        Some(self.document.handle(index))
    }
}

impl<'a> AxisIterator for NodeIter<'a> {
    fn set_start_node(&mut self, node: Node) -> &mut Self {
        if !self.restartable && self.start.is_some() {
            return self;
        }
        self.start = Some(self.document.local(node));
        self.mark = None;
        self.restart();
        self
    }

    fn reset(&mut self) -> &mut Self {
        self.restart();
        self
    }

    fn set_mark(&mut self) {
        self.mark = Some((self.source.clone(), self.position));
    }

    fn goto_mark(&mut self) {
        match &self.mark {
            Some((source, position)) => {
                self.source = source.clone();
                self.position = *position;
            }
            None => self.restart(),
        }
    }

    fn clone_iterator(&self) -> Self {
        assert!(
            self.restartable,
            "cannot clone a non-restartable {} iterator",
            self.axis()
        );
        NodeIter {
            document: self.document,
            source: self.source.clone(),
            start: self.start,
            restartable: true,
            position: self.position,
            mark: self.mark.clone(),
        }
    }

    fn is_reverse(&self) -> bool {
        self.source.is_reverse()
    }

    fn start_node(&self) -> Option<Node> {
        self.start.map(|start| self.document.handle(start))
    }

    fn position(&self) -> usize {
        self.position
    }

    fn last_position(&self) -> usize {
        let Some(start) = self.start else {
            return 0;
        };
        let mut probe = self.source.clone();
        probe.restart(self.document, start);
        std::iter::from_fn(|| probe.next(self.document)).count()
    }
}

impl<'a> fmt::Debug for NodeIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIter")
            .field("axis", &self.axis())
            .field("start", &self.start_node())
            .field("position", &self.position)
            .field("restartable", &self.restartable)
            .finish()
    }
}

/// ## Axis iterators
impl Document {
    /// An iterator for an axis. It yields nothing until a start node is set.
    pub fn axis_iter(&self, axis: Axis) -> NodeIter<'_> {
        NodeIter::new(self, axis)
    }

    /// An iterator for an axis, filtered to one type code.
    ///
    /// ```rust
    /// use xdtm::{Axis, Document};
    ///
    /// let document = Document::parse("<a><b/>text<c/><b/></a>").unwrap();
    /// let a = document.document_element().unwrap();
    /// let b = document.generalized_type("", "b").unwrap();
    /// let found = document.typed_axis_iter(Axis::Child, b).start_at(a).count();
    /// assert_eq!(found, 2);
    /// ```
    pub fn typed_axis_iter(&self, axis: Axis, code: TypeCode) -> NodeIter<'_> {
        self.axis_iter(axis).matching(NodeTest::Type(code))
    }

    /// An iterator for an axis given by XPath name.
    ///
    /// # Panics
    ///
    /// Panics if the name is not an axis name.
    pub fn named_axis_iter(&self, name: &str) -> NodeIter<'_> {
        match Axis::from_name(name) {
            Some(axis) => self.axis_iter(axis),
            None => panic!("unknown axis: {}", name),
        }
    }

    /// Shorthand for an axis iterator started at `node`.
    pub fn axis(&self, axis: Axis, node: Node) -> NodeIter<'_> {
        self.axis_iter(axis).start_at(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(document: &Document, iter: NodeIter) -> Vec<String> {
        iter.map(|node| document.node_name(node)).collect()
    }

    #[test]
    fn test_unstarted_iterator_is_empty() {
        let document = Document::parse("<a/>").unwrap();
        assert_eq!(document.axis_iter(Axis::DescendantOrSelf).count(), 0);
    }

    #[test]
    fn test_mark() {
        let document = Document::parse("<a><b/><c/><d/></a>").unwrap();
        let a = document.document_element().unwrap();
        let mut iter = document.axis(Axis::Child, a);
        iter.next();
        iter.set_mark();
        assert_eq!(iter.position(), 1);
        let rest = iter.by_ref().map(|n| document.node_name(n)).collect::<Vec<_>>();
        assert_eq!(rest, vec!["c", "d"]);
        iter.goto_mark();
        assert_eq!(iter.position(), 1);
        assert_eq!(iter.next().map(|n| document.node_name(n)), Some("c".to_string()));
    }

    #[test]
    fn test_last_position_does_not_move() {
        let document = Document::parse("<a><b/><c/><d/></a>").unwrap();
        let a = document.document_element().unwrap();
        let mut iter = document.axis(Axis::Child, a);
        iter.next();
        assert_eq!(iter.last_position(), 3);
        assert_eq!(iter.position(), 1);
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn test_non_restartable_ignores_new_start() {
        let document = Document::parse("<a><b/><c/></a>").unwrap();
        let a = document.document_element().unwrap();
        let b = document.first_child(a).unwrap();
        let mut iter = document.axis_iter(Axis::Child).non_restartable();
        iter.set_start_node(a);
        iter.set_start_node(b);
        assert_eq!(iter.start_node(), Some(a));
        assert_eq!(names(&document, iter), vec!["b", "c"]);
    }

    #[test]
    #[should_panic(expected = "non-restartable")]
    fn test_clone_non_restartable_panics() {
        let document = Document::parse("<a/>").unwrap();
        let iter = document
            .axis_iter(Axis::Child)
            .non_restartable()
            .start_at(document.root());
        iter.clone_iterator();
    }

    #[test]
    fn test_clone_is_independent() {
        let document = Document::parse("<a><b/><c/></a>").unwrap();
        let a = document.document_element().unwrap();
        let mut iter = document.axis(Axis::Child, a);
        iter.next();
        let clone = iter.clone_iterator();
        assert_eq!(names(&document, clone), vec!["c"]);
        assert_eq!(names(&document, iter), vec!["c"]);
    }

    #[test]
    fn test_ordered_reverses_reverse_axis() {
        let document = Document::parse("<a><b><c/></b></a>").unwrap();
        let a = document.document_element().unwrap();
        let c = document.axis(Axis::Descendant, a).last().unwrap();
        let iter = document.axis_iter(Axis::AncestorOrSelf).ordered().start_at(c);
        assert!(!iter.is_reverse());
        assert_eq!(names(&document, iter), vec!["", "a", "b", "c"]);
    }

    #[test]
    fn test_stripping_uses_whitespace_flag() {
        let document = Document::parse("<a> <b/> x </a>").unwrap();
        let a = document.document_element().unwrap();
        let iter = document.axis_iter(Axis::Child).stripping(None).start_at(a);
        let kinds = iter.map(|n| document.kind(n)).collect::<Vec<_>>();
        assert_eq!(kinds, vec![crate::NodeKind::Element, crate::NodeKind::Text]);
    }

    #[test]
    fn test_element_filter() {
        let document = Document::parse("<a>t<b/><!--c--><d/></a>").unwrap();
        let a = document.document_element().unwrap();
        let iter = document
            .axis_iter(Axis::Child)
            .matching(NodeTest::Element)
            .start_at(a);
        assert_eq!(names(&document, iter), vec!["b", "d"]);
    }

    #[test]
    #[should_panic(expected = "unknown axis")]
    fn test_unknown_axis_name() {
        let document = Document::parse("<a/>").unwrap();
        document.named_axis_iter("sideways");
    }
}
