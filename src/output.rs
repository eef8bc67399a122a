use genawaiter::rc::gen;
use genawaiter::yield_;

use crate::access::NodeEdge;
use crate::builder::{Attribute, Builder};
use crate::document::Document;
use crate::error::Error;
use crate::iter::in_scope_namespaces;
use crate::node::{Node, NodeKind};
use crate::store::Content;

/// Output of copying
///
/// The events [`Document::copy`] feeds to an [`OutputSink`], as produced by
/// [`Document::outputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output<'a> {
    /// Start of an element. Its namespace declarations and attributes follow
    /// before any content.
    StartElement(Node),
    /// Namespace declaration on the element just started.
    Namespace { prefix: &'a str, namespace_uri: &'a str },
    /// Attribute node.
    Attribute(Node),
    /// Text.
    Text(&'a str),
    /// Comment.
    Comment(&'a str),
    /// Processing instruction.
    ProcessingInstruction { target: &'a str, data: &'a str },
    /// End of an element.
    EndElement(Node),
}

/// Receives copied nodes.
///
/// The calls arrive in document order. After `start_element` come the
/// element's namespace declarations, then its attributes, then its content
/// and finally `end_element`.
pub trait OutputSink {
    fn start_element(&mut self, namespace_uri: &str, local_name: &str, qname: &str) -> Result<(), Error>;
    fn namespace(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), Error>;
    fn attribute(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qname: &str,
        value: &str,
    ) -> Result<(), Error>;
    fn characters(&mut self, text: &str) -> Result<(), Error>;
    fn comment(&mut self, text: &str) -> Result<(), Error>;
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), Error>;
    fn end_element(&mut self, namespace_uri: &str, local_name: &str, qname: &str) -> Result<(), Error>;
}

/// Copying into a builder clones nodes into a new document. The document is
/// started on the first call if that hasn't happened yet; ending it is up to
/// the caller.
///
/// ```rust
/// use xdtm::{Builder, Document};
///
/// let source = Document::parse(r#"<a><b x="1">text</b></a>"#).unwrap();
/// let a = source.document_element().unwrap();
/// let b = source.first_child(a).unwrap();
///
/// let mut builder = Builder::new();
/// source.copy(b, &mut builder)?;
/// let copy = builder.end_document()?;
/// let b = copy.document_element().unwrap();
/// assert_eq!(copy.node_name(b), "b");
/// assert_eq!(copy.string_value(b), "text");
/// # Ok::<(), xdtm::Error>(())
/// ```
impl OutputSink for Builder {
    fn start_element(&mut self, namespace_uri: &str, local_name: &str, qname: &str) -> Result<(), Error> {
        self.ensure_started()?;
        Builder::start_element(self, namespace_uri, local_name, qname, &[])
    }

    fn namespace(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), Error> {
        self.add_namespace(prefix, namespace_uri)
    }

    fn attribute(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qname: &str,
        value: &str,
    ) -> Result<(), Error> {
        self.add_attribute(&Attribute::new(namespace_uri, local_name, qname, value))
    }

    fn characters(&mut self, text: &str) -> Result<(), Error> {
        self.ensure_started()?;
        Builder::characters(self, text)
    }

    fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.ensure_started()?;
        Builder::comment(self, text)
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), Error> {
        self.ensure_started()?;
        Builder::processing_instruction(self, target, data)
    }

    fn end_element(&mut self, _namespace_uri: &str, _local_name: &str, _qname: &str) -> Result<(), Error> {
        Builder::end_element(self)
    }
}

/// ## Copying
impl Document {
    /// The output events for a node and everything below it.
    ///
    /// The top element also declares the namespaces it inherits, so the
    /// output is self-contained.
    pub fn outputs(&self, node: Node) -> impl Iterator<Item = Output<'_>> + '_ {
        let top = node;
        gen!({
            for edge in self.traverse(top) {
                match edge {
                    NodeEdge::Start(current) => {
                        let local = self.local(current);
                        match self.kind_of(local) {
                            NodeKind::Root => {}
                            NodeKind::Element => {
                                yield_!(Output::StartElement(current));
                                let namespaces = if current == top {
                                    in_scope_namespaces(&self.store, local)
                                } else {
                                    self.own_namespaces(local)
                                };
                                for namespace in namespaces {
                                    yield_!(self.namespace_output(namespace));
                                }
                                let mut attribute = self.store.first_attribute(local);
                                while let Some(index) = attribute {
                                    if self.store.is_attribute(index) {
                                        yield_!(Output::Attribute(self.handle(index)));
                                    }
                                    attribute = self.store.next_sibling(index);
                                }
                            }
                            NodeKind::Attribute => yield_!(Output::Attribute(current)),
                            NodeKind::Namespace => yield_!(self.namespace_output(local)),
                            NodeKind::Text => {
                                yield_!(Output::Text(self.value_of(local).unwrap_or_default()))
                            }
                            NodeKind::Comment => {
                                yield_!(Output::Comment(self.value_of(local).unwrap_or_default()))
                            }
                            NodeKind::ProcessingInstruction => {
                                if let Content::Instruction { target, data } =
                                    self.store.contents[local as usize]
                                {
                                    yield_!(Output::ProcessingInstruction {
                                        target: self.store.span_str(target),
                                        data: self.store.span_str(data),
                                    });
                                }
                            }
                        }
                    }
                    NodeEdge::End(current) => {
                        if self.kind(current) == NodeKind::Element {
                            yield_!(Output::EndElement(current));
                        }
                    }
                }
            }
        })
        .into_iter()
    }

    fn own_namespaces(&self, element: u32) -> Vec<u32> {
        let mut namespaces = Vec::new();
        let mut attribute = self.store.first_attribute(element);
        while let Some(index) = attribute {
            if self.store.is_namespace(index) {
                namespaces.push(index);
            }
            attribute = self.store.next_sibling(index);
        }
        namespaces
    }

    fn namespace_output(&self, namespace: u32) -> Output<'_> {
        Output::Namespace {
            prefix: self.names.prefix_str(self.store.prefixes[namespace as usize]),
            namespace_uri: self.value_of(namespace).unwrap_or_default(),
        }
    }

    /// Send one output event to a sink.
    pub fn emit<S: OutputSink + ?Sized>(&self, output: Output, sink: &mut S) -> Result<(), Error> {
        match output {
            Output::StartElement(element) => sink.start_element(
                self.namespace_uri(element),
                self.local_name(element),
                &self.node_name(element),
            ),
            Output::Namespace {
                prefix,
                namespace_uri,
            } => sink.namespace(prefix, namespace_uri),
            Output::Attribute(attribute) => sink.attribute(
                self.namespace_uri(attribute),
                self.local_name(attribute),
                &self.node_name(attribute),
                self.node_value(attribute).unwrap_or_default(),
            ),
            Output::Text(text) => sink.characters(text),
            Output::Comment(text) => sink.comment(text),
            Output::ProcessingInstruction { target, data } => sink.processing_instruction(target, data),
            Output::EndElement(element) => sink.end_element(
                self.namespace_uri(element),
                self.local_name(element),
                &self.node_name(element),
            ),
        }
    }

    /// Copy a node and its subtree to a sink.
    ///
    /// Copying the root copies its children.
    pub fn copy<S: OutputSink + ?Sized>(&self, node: Node, sink: &mut S) -> Result<(), Error> {
        for output in self.outputs(node) {
            self.emit(output, sink)?;
        }
        Ok(())
    }

    /// Copy a single node to a sink.
    ///
    /// An element is copied with its in-scope namespaces but without its
    /// attributes and content. Copying the root emits nothing.
    pub fn shallow_copy<S: OutputSink + ?Sized>(&self, node: Node, sink: &mut S) -> Result<(), Error> {
        let local = self.local(node);
        match self.kind_of(local) {
            NodeKind::Root => Ok(()),
            NodeKind::Element => {
                self.emit(Output::StartElement(node), sink)?;
                for namespace in in_scope_namespaces(&self.store, local) {
                    self.emit(self.namespace_output(namespace), sink)?;
                }
                self.emit(Output::EndElement(node), sink)
            }
            _ => self.copy(node, sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl OutputSink for Recorder {
        fn start_element(&mut self, _: &str, _: &str, qname: &str) -> Result<(), Error> {
            self.0.push(format!("<{}", qname));
            Ok(())
        }
        fn namespace(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), Error> {
            self.0.push(format!("ns {}={}", prefix, namespace_uri));
            Ok(())
        }
        fn attribute(&mut self, _: &str, _: &str, qname: &str, value: &str) -> Result<(), Error> {
            self.0.push(format!("@{}={}", qname, value));
            Ok(())
        }
        fn characters(&mut self, text: &str) -> Result<(), Error> {
            self.0.push(format!("{:?}", text));
            Ok(())
        }
        fn comment(&mut self, text: &str) -> Result<(), Error> {
            self.0.push(format!("<!--{}-->", text));
            Ok(())
        }
        fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), Error> {
            self.0.push(format!("<?{} {}?>", target, data));
            Ok(())
        }
        fn end_element(&mut self, _: &str, _: &str, qname: &str) -> Result<(), Error> {
            self.0.push(format!("</{}", qname));
            Ok(())
        }
    }

    #[test]
    fn test_copy_declares_inherited_namespaces_on_top() {
        let document =
            Document::parse(r#"<a xmlns:p="urn:p"><p:b x="1"><c/></p:b></a>"#).unwrap();
        let a = document.document_element().unwrap();
        let b = document.first_child(a).unwrap();
        let mut recorder = Recorder::default();
        document.copy(b, &mut recorder).unwrap();
        assert_eq!(
            recorder.0,
            vec!["<p:b", "ns p=urn:p", "@x=1", "<c", "</c", "</p:b"]
        );
    }

    #[test]
    fn test_shallow_copy_element() {
        let document = Document::parse(r#"<a xmlns="urn:d" x="1">text</a>"#).unwrap();
        let a = document.document_element().unwrap();
        let mut recorder = Recorder::default();
        document.shallow_copy(a, &mut recorder).unwrap();
        assert_eq!(recorder.0, vec!["<a", "ns =urn:d", "</a"]);
    }

    #[test]
    fn test_copy_other_nodes() {
        let document = Document::parse("<a><!--c--><?t d?>x</a>").unwrap();
        let a = document.document_element().unwrap();
        let mut recorder = Recorder::default();
        for child in document.children(a) {
            document.shallow_copy(child, &mut recorder).unwrap();
        }
        assert_eq!(recorder.0, vec!["<!--c-->", "<?t d?>", "\"x\""]);
    }
}
