use genawaiter::rc::gen;
use genawaiter::yield_;

use crate::document::Document;
use crate::id::TypeCode;
use crate::node::{Node, NodeKind};
use crate::store::Content;

/// Node edges.
///
/// Used by [`Document::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEdge {
    /// The start edge of a node. In case of an element
    /// this is the start tag. In case of root
    /// the start of the document.
    Start(Node),
    /// The end edge of a node. In case of an element
    /// this is the end tag. In case of root the end
    /// of the document. For any other node, the
    /// end edge occurs immediately after the start
    /// edge.
    End(Node),
}

/// ## Read-only access
///
/// All accessors panic when handed a node whose identifier this document
/// does not have, or whose index is out of range. Unregistered documents all
/// count their identifiers from zero, so they can't tell each other's nodes
/// apart; register documents with a [`DocumentManager`](crate::DocumentManager)
/// to have foreign nodes rejected.
impl Document {
    /// The document root. This is not the document element.
    pub fn root(&self) -> Node {
        self.handle(0)
    }

    /// The single element child of the root, if any.
    ///
    /// ```rust
    /// let document = xdtm::Document::parse("<!--c--><p>Example</p>").unwrap();
    /// let p = document.document_element().unwrap();
    /// assert_eq!(document.node_name(p), "p");
    /// ```
    pub fn document_element(&self) -> Option<Node> {
        let mut current = self.store.first_child(0);
        while let Some(index) = current {
            if self.store.type_code(index).is_name() {
                return Some(self.handle(index));
            }
            current = self.store.next_sibling(index);
        }
        None
    }

    pub(crate) fn kind_of(&self, local: u32) -> NodeKind {
        let code = self.store.type_code(local);
        if !self.store.is_structural(local) {
            return if code == TypeCode::NAMESPACE {
                NodeKind::Namespace
            } else {
                NodeKind::Attribute
            };
        }
        match code {
            TypeCode::ROOT => NodeKind::Root,
            TypeCode::TEXT => NodeKind::Text,
            TypeCode::COMMENT => NodeKind::Comment,
            TypeCode::PROCESSING_INSTRUCTION => NodeKind::ProcessingInstruction,
            _ => NodeKind::Element,
        }
    }

    /// The kind of a node.
    pub fn kind(&self, node: Node) -> NodeKind {
        self.kind_of(self.local(node))
    }

    /// The type code of a node.
    ///
    /// Elements and attributes give the code of their expanded name, all
    /// other nodes the code of their kind.
    pub fn type_code(&self, node: Node) -> TypeCode {
        self.store.type_code(self.local(node))
    }

    /// Local part of the node name.
    ///
    /// For a processing instruction this is its target, for a namespace
    /// node its prefix. Nodes without a name give the empty string.
    pub fn local_name(&self, node: Node) -> &str {
        let local = self.local(node);
        match (self.kind_of(local), self.store.contents[local as usize]) {
            (NodeKind::Element | NodeKind::Attribute, _) => {
                self.names.local_name(self.store.type_code(local))
            }
            (NodeKind::Namespace, _) => self.prefix_of(local),
            (NodeKind::ProcessingInstruction, Content::Instruction { target, .. }) => {
                self.store.span_str(target)
            }
            _ => "",
        }
    }

    /// Qualified node name, `prefix:local` or `local`.
    ///
    /// ```rust
    /// let document = xdtm::Document::parse(r#"<p:a xmlns:p="urn:p"/>"#).unwrap();
    /// let a = document.document_element().unwrap();
    /// assert_eq!(document.node_name(a), "p:a");
    /// assert_eq!(document.local_name(a), "a");
    /// assert_eq!(document.namespace_uri(a), "urn:p");
    /// ```
    pub fn node_name(&self, node: Node) -> String {
        let local = self.local(node);
        match self.kind_of(local) {
            NodeKind::Element | NodeKind::Attribute => {
                let prefix = self.prefix_of(local);
                let name = self.names.local_name(self.store.type_code(local));
                if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}:{}", prefix, name)
                }
            }
            _ => self.local_name(node).to_string(),
        }
    }

    /// Namespace URI of an element or attribute; empty for anything else.
    pub fn namespace_uri(&self, node: Node) -> &str {
        let local = self.local(node);
        match self.kind_of(local) {
            NodeKind::Element | NodeKind::Attribute => {
                self.names.namespace_uri(self.store.type_code(local))
            }
            _ => "",
        }
    }

    fn prefix_of(&self, local: u32) -> &str {
        self.names.prefix_str(self.store.prefixes[local as usize])
    }

    /// The prefix an element or attribute was written with, or the prefix
    /// a namespace node declares.
    pub fn prefix(&self, node: Node) -> &str {
        self.prefix_of(self.local(node))
    }

    pub(crate) fn value_of(&self, local: u32) -> Option<&str> {
        match self.store.contents[local as usize] {
            Content::Value(span) => Some(self.store.span_str(span)),
            Content::Instruction { data, .. } => Some(self.store.span_str(data)),
            Content::Branch { .. } => None,
        }
    }

    /// The value of a text, comment, attribute or namespace node, or the
    /// data of a processing instruction. `None` for root and elements.
    pub fn node_value(&self, node: Node) -> Option<&str> {
        self.value_of(self.local(node))
    }

    /// XPath string value: the concatenated descendant text of root and
    /// elements, the node value of everything else.
    ///
    /// ```rust
    /// let document = xdtm::Document::parse("<a>x<b>y</b><!--no-->z</a>").unwrap();
    /// let a = document.document_element().unwrap();
    /// assert_eq!(document.string_value(a), "xyz");
    /// ```
    pub fn string_value(&self, node: Node) -> String {
        let local = self.local(node);
        match self.store.contents[local as usize] {
            Content::Branch { .. } if self.store.is_structural(local) => {
                let mut value = String::new();
                for index in local + 1..self.store.subtree_end(local) {
                    if self.store.type_code(index) == TypeCode::TEXT {
                        if let Some(text) = self.value_of(index) {
                            value.push_str(text);
                        }
                    }
                }
                value
            }
            _ => self.value_of(local).unwrap_or_default().to_string(),
        }
    }

    /// Parent of a node. The parent of an attribute or namespace node is its
    /// element. The root has no parent.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.handle_opt(self.store.parent(self.local(node)))
    }

    /// First child of root or an element.
    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.handle_opt(self.store.first_child(self.local(node)))
    }

    /// Next sibling in document order. Attribute and namespace nodes have
    /// no siblings.
    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        let local = self.local(node);
        if !self.store.is_structural(local) {
            return None;
        }
        self.handle_opt(self.store.next_sibling(local))
    }

    /// Iterate over the children of a node.
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        let mut current = self.store.first_child(self.local(node));
        std::iter::from_fn(move || {
            let index = current?;
            current = self.store.next_sibling(index);
            Some(self.handle(index))
        })
    }

    /// The namespace declarations made on an element itself, as
    /// `(prefix, namespace URI)` pairs.
    pub fn declared_namespaces(&self, element: Node) -> impl Iterator<Item = (&str, &str)> + '_ {
        let mut current = self.store.first_attribute(self.local(element));
        std::iter::from_fn(move || loop {
            let index = current?;
            current = self.store.next_sibling(index);
            if self.store.is_namespace(index) {
                return Some((self.prefix_of(index), self.value_of(index).unwrap_or_default()));
            }
        })
    }

    /// Value of the attribute with the given name code on an element.
    ///
    /// ```rust
    /// let document = xdtm::Document::parse(r#"<a x="1" y="2"/>"#).unwrap();
    /// let a = document.document_element().unwrap();
    /// let y = document.generalized_type("", "y").unwrap();
    /// assert_eq!(document.attribute_value(y, a), Some("2"));
    /// ```
    pub fn attribute_value(&self, code: TypeCode, element: Node) -> Option<&str> {
        let mut current = self.store.first_attribute(self.local(element));
        while let Some(index) = current {
            if self.store.type_code(index) == code && !self.store.is_namespace(index) {
                return self.value_of(index);
            }
            current = self.store.next_sibling(index);
        }
        None
    }

    /// The type code of an expanded name, if it occurs in this document's
    /// registry.
    pub fn generalized_type(&self, namespace_uri: &str, local_name: &str) -> Option<TypeCode> {
        self.names.lookup(namespace_uri, local_name)
    }

    /// Like [`Document::generalized_type`] with the name in Clark
    /// notation: `{uri}local`, or `local` for no namespace.
    pub fn generalized_type_clark(&self, expanded: &str) -> Option<TypeCode> {
        self.names.lookup_clark(expanded)
    }

    /// Whether a node is whitespace-only text that the build flagged as
    /// strippable.
    pub fn is_whitespace(&self, node: Node) -> bool {
        self.store.whitespace.contains(self.local(node))
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: Node, node: Node) -> bool {
        self.store
            .is_ancestor_or_self(self.local(ancestor), self.local(node))
    }

    /// Traverse over node edges in document order.
    ///
    /// For the tree `<a><b/></a>` this generates a [`NodeEdge::Start`] for
    /// `<a>`, then a [`NodeEdge::Start`] for `<b>`, immediately followed by a
    /// [`NodeEdge::End`] for `<b>`, and finally a [`NodeEdge::End`] for `<a>`.
    ///
    /// Attribute and namespace nodes are not included.
    ///
    /// ```rust
    /// use xdtm::NodeEdge;
    ///
    /// let document = xdtm::Document::parse("<a><b>Text</b></a>").unwrap();
    /// let a = document.document_element().unwrap();
    /// let b = document.first_child(a).unwrap();
    /// let text = document.first_child(b).unwrap();
    /// let edges = document.traverse(a).collect::<Vec<_>>();
    /// assert_eq!(edges, vec![
    ///  NodeEdge::Start(a),
    ///  NodeEdge::Start(b),
    ///  NodeEdge::Start(text),
    ///  NodeEdge::End(text),
    ///  NodeEdge::End(b),
    ///  NodeEdge::End(a),
    /// ]);
    /// ```
    pub fn traverse(&self, node: Node) -> impl Iterator<Item = NodeEdge> + '_ {
        let top = self.local(node);
        gen!({
            let store = &self.store;
            let mut index = top;
            'descend: loop {
                yield_!(NodeEdge::Start(self.handle(index)));
                if let Some(child) = store.first_child(index) {
                    index = child;
                    continue;
                }
                loop {
                    yield_!(NodeEdge::End(self.handle(index)));
                    if index == top {
                        break 'descend;
                    }
                    if let Some(next) = store.next_sibling(index) {
                        index = next;
                        continue 'descend;
                    }
                    match store.parent(index) {
                        Some(parent) => index = parent,
                        None => break 'descend,
                    }
                }
            }
        })
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let document =
            Document::parse(r#"<a xmlns:p="urn:p" x="1"><!--c--><?pi data?>text</a>"#).unwrap();
        let a = document.document_element().unwrap();
        assert_eq!(document.kind(document.root()), NodeKind::Root);
        assert_eq!(document.kind(a), NodeKind::Element);
        let kinds = document
            .children(a)
            .map(|child| document.kind(child))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Comment,
                NodeKind::ProcessingInstruction,
                NodeKind::Text
            ]
        );
    }

    #[test]
    fn test_processing_instruction_name_and_value() {
        let document = Document::parse("<a><?target some data?></a>").unwrap();
        let a = document.document_element().unwrap();
        let pi = document.first_child(a).unwrap();
        assert_eq!(document.node_name(pi), "target");
        assert_eq!(document.node_value(pi), Some("some data"));
    }

    #[test]
    fn test_attribute_parent_and_siblings() {
        let document = Document::parse(r#"<a x="1" y="2"/>"#).unwrap();
        let a = document.document_element().unwrap();
        let x = document.generalized_type("", "x").unwrap();
        assert_eq!(document.attribute_value(x, a), Some("1"));
        let missing = document.generalized_type("", "a").unwrap();
        assert_eq!(document.attribute_value(missing, a), None);
    }

    #[test]
    fn test_string_value_of_root() {
        let document = Document::parse("<a>x<b>y</b></a>").unwrap();
        assert_eq!(document.string_value(document.root()), "xy");
    }

    #[test]
    fn test_traverse_leaf() {
        let document = Document::parse("<a/>").unwrap();
        let a = document.document_element().unwrap();
        assert_eq!(
            document.traverse(a).collect::<Vec<_>>(),
            vec![NodeEdge::Start(a), NodeEdge::End(a)]
        );
    }

    #[test]
    #[should_panic]
    fn test_foreign_node_panics() {
        let small = Document::parse("<a/>").unwrap();
        let large = Document::parse("<a><b/><c/><d/></a>").unwrap();
        let d = large.children(large.document_element().unwrap()).last().unwrap();
        small.kind(d);
    }
}
