//! A fixed representation of a tree of nodes.
//!
//! Documents are sealed once built, but it is useful to have an owned
//! description of a tree that you can create, compare and store separately.
//! It has no dependency on a [`Builder`]; replay it into one with
//! [`Element::replay`] or build a whole document with [`Document::build`].
//! [`Document::from_document`] goes the other way.
//!
//! Example:
//!
//! ```rust
//! use xdtm::fixed;
//!
//! let fixed_document = fixed::Document {
//!   before: vec![],
//!   document_element: fixed::Element {
//!     name: fixed::Name::local("foo"),
//!     attributes: vec![],
//!     prefixes: vec![],
//!     children: vec![fixed::Content::Text("Example".to_string())],
//!   },
//!   after: vec![],
//! };
//!
//! let document = fixed_document.build().unwrap();
//! let foo = document.document_element().unwrap();
//! assert_eq!(document.string_value(foo), "Example");
//! assert_eq!(fixed::Document::from_document(&document), Some(fixed_document));
//! ```

use crate::axis::Axis;
use crate::builder::{Attribute, Builder};
use crate::error::Error;
use crate::node::{Node, NodeKind};

/// A fixed representation of an XML document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    /// Comments and processing instructions before the document element
    pub before: Vec<DocumentContent>,
    /// The document element
    pub document_element: Element,
    /// Comments and processing instructions after the document element
    pub after: Vec<DocumentContent>,
}

/// A fixed representation of an XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    /// Namespace URI. Empty string means no namespace
    pub namespace: String,
    /// Prefix the name is written with. Empty string means none
    pub prefix: String,
    /// Localname.
    pub localname: String,
}

/// A fixed representation of an XML namespace prefix declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// Name of prefix. Empty string means default namespace
    pub name: String,
    /// Namespace URI.
    pub namespace: String,
}

/// A fixed representation of an XML element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    /// Name of element
    pub name: Name,
    /// Namespace prefix declarations
    pub prefixes: Vec<Prefix>,
    /// Attributes
    pub attributes: Vec<(Name, String)>,
    /// Children
    pub children: Vec<Content>,
}

/// A fixed representation of element content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    /// A text node
    Text(String),
    /// A comment node
    Comment(String),
    /// A processing instruction node
    ProcessingInstruction(ProcessingInstruction),
    /// An element node
    Element(Element),
}

/// Content that is allowed next to the document element (the root element)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentContent {
    /// A comment node
    Comment(String),
    /// A processing instruction node
    ProcessingInstruction(ProcessingInstruction),
}

/// A fixed representation of a processing instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessingInstruction {
    /// Target of processing instruction
    pub target: String,
    /// Content of processing instruction
    pub content: String,
}

impl Name {
    /// A name in no namespace.
    pub fn local(localname: &str) -> Self {
        Name {
            namespace: String::new(),
            prefix: String::new(),
            localname: localname.to_string(),
        }
    }

    /// The qualified name, `prefix:localname` or `localname`.
    pub fn qname(&self) -> String {
        if self.prefix.is_empty() {
            self.localname.clone()
        } else {
            format!("{}:{}", self.prefix, self.localname)
        }
    }

    fn from_node(document: &crate::Document, node: Node) -> Self {
        Name {
            namespace: document.namespace_uri(node).to_string(),
            prefix: document.prefix(node).to_string(),
            localname: document.local_name(node).to_string(),
        }
    }
}

impl Document {
    /// Build a sealed document from this description.
    pub fn build(&self) -> Result<crate::Document, Error> {
        let mut builder = Builder::new();
        self.replay(&mut builder)?;
        builder.end_document()
    }

    /// Send the events for this document to a builder, from start-document
    /// up to but not including end-document.
    pub fn replay(&self, builder: &mut Builder) -> Result<(), Error> {
        builder.start_document()?;
        for content in &self.before {
            content.replay(builder)?;
        }
        self.document_element.replay(builder)?;
        for content in &self.after {
            content.replay(builder)?;
        }
        Ok(())
    }

    /// Describe a sealed document.
    ///
    /// `None` if the document has no document element, or if text sits next
    /// to it: a builder accepts both, but neither has a fixed form.
    pub fn from_document(document: &crate::Document) -> Option<Self> {
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut document_element = None;
        for child in document.children(document.root()) {
            match Content::from_node(document, child) {
                Content::Element(element) => document_element = Some(element),
                Content::Comment(comment) => {
                    let content = DocumentContent::Comment(comment);
                    if document_element.is_none() {
                        before.push(content)
                    } else {
                        after.push(content)
                    }
                }
                Content::ProcessingInstruction(pi) => {
                    let content = DocumentContent::ProcessingInstruction(pi);
                    if document_element.is_none() {
                        before.push(content)
                    } else {
                        after.push(content)
                    }
                }
                Content::Text(_) => return None,
            }
        }
        Some(Document {
            before,
            document_element: document_element?,
            after,
        })
    }
}

impl DocumentContent {
    fn replay(&self, builder: &mut Builder) -> Result<(), Error> {
        match self {
            DocumentContent::Comment(comment) => builder.comment(comment),
            DocumentContent::ProcessingInstruction(pi) => pi.replay(builder),
        }
    }
}

impl Element {
    /// Send the events for this element and its content to a builder.
    pub fn replay(&self, builder: &mut Builder) -> Result<(), Error> {
        for prefix in &self.prefixes {
            builder.start_prefix_mapping(&prefix.name, &prefix.namespace)?;
        }
        let qnames = self
            .attributes
            .iter()
            .map(|(name, _)| name.qname())
            .collect::<Vec<_>>();
        let attributes = self
            .attributes
            .iter()
            .zip(qnames.iter())
            .map(|((name, value), qname)| {
                Attribute::new(&name.namespace, &name.localname, qname, value)
            })
            .collect::<Vec<_>>();
        builder.start_element(
            &self.name.namespace,
            &self.name.localname,
            &self.name.qname(),
            &attributes,
        )?;
        for child in &self.children {
            child.replay(builder)?;
        }
        builder.end_element()?;
        for prefix in self.prefixes.iter().rev() {
            builder.end_prefix_mapping(&prefix.name)?;
        }
        Ok(())
    }

    /// Describe an element of a sealed document. Attributes come in stored
    /// order.
    pub fn from_node(document: &crate::Document, element: Node) -> Self {
        let attributes = document
            .axis(Axis::Attribute, element)
            .map(|attribute| {
                (
                    Name::from_node(document, attribute),
                    document.node_value(attribute).unwrap_or_default().to_string(),
                )
            })
            .collect();
        Element {
            name: Name::from_node(document, element),
            prefixes: document
                .declared_namespaces(element)
                .map(|(name, namespace)| Prefix {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                })
                .collect(),
            attributes,
            children: document
                .children(element)
                .map(|child| Content::from_node(document, child))
                .collect(),
        }
    }
}

impl ProcessingInstruction {
    fn replay(&self, builder: &mut Builder) -> Result<(), Error> {
        builder.processing_instruction(&self.target, &self.content)
    }
}

impl Content {
    fn replay(&self, builder: &mut Builder) -> Result<(), Error> {
        match self {
            Content::Text(text) => builder.characters(text),
            Content::Comment(comment) => builder.comment(comment),
            Content::ProcessingInstruction(pi) => pi.replay(builder),
            Content::Element(element) => element.replay(builder),
        }
    }

    fn from_node(document: &crate::Document, node: Node) -> Self {
        let value = || document.node_value(node).unwrap_or_default().to_string();
        match document.kind(node) {
            NodeKind::Text => Content::Text(value()),
            NodeKind::Comment => Content::Comment(value()),
            NodeKind::ProcessingInstruction => {
                Content::ProcessingInstruction(ProcessingInstruction {
                    target: document.local_name(node).to_string(),
                    content: value(),
                })
            }
            _ => Content::Element(Element::from_node(document, node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let document = Document {
            before: vec![DocumentContent::Comment("before".to_string())],
            document_element: Element {
                name: Name::local("foo"),
                attributes: vec![(Name::local("a"), "1".to_string())],
                prefixes: vec![Prefix {
                    name: "x".to_string(),
                    namespace: "urn:x".to_string(),
                }],
                children: vec![Content::Element(Element {
                    name: Name {
                        namespace: "urn:x".to_string(),
                        prefix: "x".to_string(),
                        localname: "bar".to_string(),
                    },
                    attributes: vec![],
                    prefixes: vec![],
                    children: vec![Content::Text("Example".to_string())],
                })],
            },
            after: vec![],
        };
        let built = document.build().unwrap();
        let foo = built.document_element().unwrap();
        let bar = built.first_child(foo).unwrap();
        assert_eq!(built.node_name(bar), "x:bar");
        assert_eq!(built.namespace_uri(bar), "urn:x");
        assert_eq!(Document::from_document(&built), Some(document));
    }

    #[test]
    fn test_from_document_without_document_element() {
        let mut builder = Builder::new();
        builder.start_document().unwrap();
        builder.comment("only").unwrap();
        let comments_only = builder.end_document().unwrap();
        assert_eq!(Document::from_document(&comments_only), None);

        let mut builder = Builder::new();
        builder.start_document().unwrap();
        builder.characters("loose").unwrap();
        builder.start_element("", "a", "a", &[]).unwrap();
        builder.end_element().unwrap();
        let text_at_root = builder.end_document().unwrap();
        assert_eq!(Document::from_document(&text_at_root), None);
    }
}
