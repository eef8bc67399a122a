use ahash::HashMap;

use crate::document::Document;
use crate::error::Error;
use crate::id::{NamespaceId, PrefixId, TypeCode};
use crate::names::{split_qname, Names, XML_NAMESPACE};
use crate::store::{Content, Link, NodeStore, Span, StagedAttributes};

const MAX_NODES: usize = u32::MAX as usize - 1;

/// Options that control how a document is built.
///
/// ```rust
/// use xdtm::BuilderOptions;
///
/// let options = BuilderOptions {
///     strip_whitespace: false,
///     ..Default::default()
/// };
/// assert_eq!(options.intern_limit, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Flag whitespace-only text nodes as strippable unless an enclosing
    /// `xml:space="preserve"` protects them.
    pub strip_whitespace: bool,
    /// Text and attribute values up to this many bytes are interned, so
    /// repeated values share one region of the text buffer.
    pub intern_limit: usize,
    /// Refuse to build documents with more nodes than this.
    pub max_nodes: Option<usize>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            strip_whitespace: true,
            intern_limit: 32,
            max_nodes: None,
        }
    }
}

/// An attribute as passed along with a start-element event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Namespace URI, empty for no namespace.
    pub namespace_uri: &'a str,
    /// Local name.
    pub local_name: &'a str,
    /// Qualified name as written, `prefix:local` or `local`.
    pub qname: &'a str,
    /// Attribute value.
    pub value: &'a str,
}

impl<'a> Attribute<'a> {
    /// Attribute with a namespace.
    pub fn new(namespace_uri: &'a str, local_name: &'a str, qname: &'a str, value: &'a str) -> Self {
        Attribute {
            namespace_uri,
            local_name,
            qname,
            value,
        }
    }

    /// Attribute without a namespace.
    pub fn local(name: &'a str, value: &'a str) -> Self {
        Attribute::new("", name, name, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Open,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct PendingText {
    start: usize,
    ignorable: bool,
}

// the element whose attribute list is still open
#[derive(Debug, Clone, Copy)]
struct StartTag {
    element: u32,
    last_attribute: Link,
}

/// Incremental document builder.
///
/// Consumes a stream of parse events and produces a sealed [`Document`].
/// Events must arrive in document order: `start_document`, then balanced
/// element events with their content, then [`Builder::end_document`].
///
/// ```rust
/// use xdtm::{Attribute, Builder, Axis};
///
/// let mut builder = Builder::new();
/// builder.start_document()?;
/// builder.start_element("", "doc", "doc", &[Attribute::local("a", "A")])?;
/// builder.characters("Hello")?;
/// builder.end_element()?;
/// let document = builder.end_document()?;
///
/// let doc = document.document_element().unwrap();
/// assert_eq!(document.node_name(doc), "doc");
/// assert_eq!(document.string_value(doc), "Hello");
/// # Ok::<(), xdtm::Error>(())
/// ```
///
/// Any error aborts the build: further events give [`Error::Aborted`] and no
/// document is produced.
#[derive(Debug)]
pub struct Builder {
    options: BuilderOptions,
    names: Names,
    store: NodeStore,
    staged: StagedAttributes,
    open: Vec<u32>,
    previous: Vec<Link>,
    text: Option<PendingText>,
    space: Vec<(u32, bool)>,
    interned: HashMap<String, Span>,
    pending_namespaces: Vec<(PrefixId, NamespaceId)>,
    start_tag: Option<StartTag>,
    state: State,
}

impl Builder {
    /// Create a builder with default options and a fresh registry.
    pub fn new() -> Self {
        Self::with_names(Names::new(), BuilderOptions::default())
    }

    /// Create a builder with the given options.
    pub fn with_options(options: BuilderOptions) -> Self {
        Self::with_names(Names::new(), options)
    }

    /// Create a builder that continues an existing registry. Names already
    /// present keep their codes in the new document.
    pub fn with_names(names: Names, options: BuilderOptions) -> Self {
        Builder {
            options,
            names,
            store: NodeStore::new(),
            staged: StagedAttributes::default(),
            open: Vec::new(),
            previous: Vec::new(),
            text: None,
            space: Vec::new(),
            interned: HashMap::default(),
            pending_namespaces: Vec::new(),
            start_tag: None,
            state: State::Initial,
        }
    }

    /// The registry being filled.
    pub fn names(&self) -> &Names {
        &self.names
    }

    /// Intern an expanded name and return its type code.
    pub fn generalized_type(&mut self, namespace_uri: &str, local_name: &str) -> TypeCode {
        self.names.intern(namespace_uri, local_name)
    }

    /// Number of nodes created so far, attributes included.
    pub fn len(&self) -> usize {
        (self.store.len() + self.staged.len()) as usize
    }

    /// Whether no node has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an earlier error aborted this build.
    pub fn is_aborted(&self) -> bool {
        self.state == State::Failed
    }

    /// The namespace URI currently bound to a prefix.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.names
            .resolve_prefix(prefix)
            .map(|namespace_id| self.names.namespace_str(namespace_id))
    }

    fn run<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.state == State::Failed {
            return Err(Error::Aborted);
        }
        let result = f(self);
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    fn require_open(&self, event: &'static str) -> Result<(), Error> {
        match self.state {
            State::Open => Ok(()),
            _ => Err(Error::UnexpectedEvent(event)),
        }
    }

    fn preserving(&self) -> bool {
        self.space
            .last()
            .map(|(_, preserve)| *preserve)
            .unwrap_or(!self.options.strip_whitespace)
    }

    fn check_capacity(&self) -> Result<(), Error> {
        let limit = self.options.max_nodes.unwrap_or(MAX_NODES).min(MAX_NODES);
        let nodes = self.len() + 1;
        if nodes > limit {
            return Err(Error::Capacity { nodes, limit });
        }
        Ok(())
    }

    /// Store a value in the text buffer, sharing the region of an identical
    /// earlier value when it is short enough.
    fn store_value(&mut self, value: &str) -> Span {
        if value.len() <= self.options.intern_limit {
            if let Some(span) = self.interned.get(value) {
                return *span;
            }
        }
        let start = self.store.text.len();
        self.store.text.push_str(value);
        let span = Span::new(start, self.store.text.len());
        if value.len() <= self.options.intern_limit {
            self.interned.insert(value.to_string(), span);
        }
        span
    }

    // text is already at the end of the buffer; reuse an earlier region if we can
    fn intern_tail(&mut self, start: usize) -> Span {
        let end = self.store.text.len();
        if end - start > self.options.intern_limit {
            return Span::new(start, end);
        }
        if let Some(span) = self.interned.get(&self.store.text[start..end]) {
            let span = *span;
            self.store.text.truncate(start);
            return span;
        }
        let span = Span::new(start, end);
        self.interned
            .insert(self.store.text[start..end].to_string(), span);
        span
    }

    fn allocate(&mut self, type_code: TypeCode, content: Content, prefix: PrefixId) -> Result<u32, Error> {
        self.check_capacity()?;
        let parent = *self.open.last().ok_or(Error::UnexpectedEvent("node"))?;
        let index = self.store.push(type_code, Link::to(parent), content, prefix);
        match self.previous.last().copied().and_then(Link::get) {
            Some(previous) => {
                self.store.next_siblings[previous as usize] = Link::to(index);
            }
            None => {
                if let Content::Branch { first_child, .. } =
                    &mut self.store.contents[parent as usize]
                {
                    *first_child = Link::to(index);
                }
            }
        }
        if let Some(previous) = self.previous.last_mut() {
            *previous = Link::to(index);
        }
        Ok(index)
    }

    // anything but characters ends the pending text run
    fn flush_text(&mut self) -> Result<(), Error> {
        self.start_tag = None;
        let Some(pending) = self.text.take() else {
            return Ok(());
        };
        if pending.start == self.store.text.len() {
            return Ok(());
        }
        let whitespace = pending.ignorable
            || (!self.preserving() && is_xml_whitespace(&self.store.text[pending.start..]));
        let span = self.intern_tail(pending.start);
        let index = self.allocate(TypeCode::TEXT, Content::Value(span), PrefixId::EMPTY)?;
        if whitespace {
            self.store.whitespace.insert(index);
        }
        Ok(())
    }

    /// Start the document. Must be the first event.
    pub fn start_document(&mut self) -> Result<(), Error> {
        self.run(|builder| {
            if builder.state != State::Initial {
                return Err(Error::UnexpectedEvent("start-document"));
            }
            builder.check_capacity()?;
            let root = builder.store.push(
                TypeCode::ROOT,
                Link::NONE,
                Content::Branch {
                    first_child: Link::NONE,
                    first_attribute: Link::NONE,
                },
                PrefixId::EMPTY,
            );
            builder.open.push(root);
            builder.previous.push(Link::NONE);
            builder.space.push((root, !builder.options.strip_whitespace));
            builder.state = State::Open;
            Ok(())
        })
    }

    pub(crate) fn ensure_started(&mut self) -> Result<(), Error> {
        if self.state == State::Initial {
            self.start_document()?;
        }
        Ok(())
    }

    /// Bind a prefix for the element that follows, and its descendants.
    ///
    /// The binding is recorded as a namespace node on the next element.
    pub fn start_prefix_mapping(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), Error> {
        self.run(|builder| {
            builder.require_open("start-prefix-mapping")?;
            builder.flush_text()?;
            if prefix == "xml" {
                return Ok(());
            }
            let prefix_id = builder.names.add_prefix(prefix);
            let namespace_id = builder.names.add_namespace(namespace_uri);
            builder.names.push_prefix(prefix_id, namespace_id);
            builder.pending_namespaces.push((prefix_id, namespace_id));
            Ok(())
        })
    }

    /// Drop the innermost binding of a prefix.
    pub fn end_prefix_mapping(&mut self, prefix: &str) -> Result<(), Error> {
        self.run(|builder| {
            builder.require_open("end-prefix-mapping")?;
            if prefix == "xml" {
                return Ok(());
            }
            builder
                .names
                .prefix(prefix)
                .and_then(|prefix_id| builder.names.pop_prefix(prefix_id))
                .map(|_| ())
                .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))
        })
    }

    /// Start an element.
    ///
    /// `xmlns` attributes are skipped; namespace declarations arrive through
    /// [`Builder::start_prefix_mapping`].
    pub fn start_element(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qname: &str,
        attributes: &[Attribute],
    ) -> Result<(), Error> {
        self.run(|builder| {
            builder.open_element(namespace_uri, local_name, qname)?;
            for (prefix_id, namespace_id) in std::mem::take(&mut builder.pending_namespaces) {
                builder.namespace_node(prefix_id, namespace_id)?;
            }
            for attribute in attributes {
                if attribute.qname == "xmlns" || attribute.qname.starts_with("xmlns:") {
                    continue;
                }
                builder.attribute_node(attribute)?;
            }
            Ok(())
        })
    }

    fn open_element(&mut self, namespace_uri: &str, local_name: &str, qname: &str) -> Result<(), Error> {
        self.require_open("start-element")?;
        self.flush_text()?;
        let type_code = self.names.intern(namespace_uri, local_name);
        let prefix_id = self.names.add_prefix(split_qname(qname).0);
        let element = self.allocate(
            type_code,
            Content::Branch {
                first_child: Link::NONE,
                first_attribute: Link::NONE,
            },
            prefix_id,
        )?;
        self.open.push(element);
        self.previous.push(Link::NONE);
        self.start_tag = Some(StartTag {
            element,
            last_attribute: Link::NONE,
        });
        Ok(())
    }

    /// Add an attribute to the element just started.
    ///
    /// Only valid directly after [`Builder::start_element`], before any
    /// content of the element.
    pub fn add_attribute(&mut self, attribute: &Attribute) -> Result<(), Error> {
        self.run(|builder| builder.attribute_node(attribute))
    }

    /// Add a namespace declaration to the element just started.
    ///
    /// Only valid directly after [`Builder::start_element`], before any
    /// content of the element.
    pub fn add_namespace(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), Error> {
        self.run(|builder| {
            let prefix_id = builder.names.add_prefix(prefix);
            let namespace_id = builder.names.add_namespace(namespace_uri);
            builder.namespace_node(prefix_id, namespace_id)
        })
    }

    fn stage(&mut self, type_code: TypeCode, value: &str, prefix_id: PrefixId) -> Result<u32, Error> {
        let start_tag = self
            .start_tag
            .ok_or(Error::UnexpectedEvent("attribute outside of start tag"))?;
        self.check_capacity()?;
        let span = self.store_value(value);
        let index = self
            .staged
            .push(type_code, start_tag.element, span, prefix_id);
        match start_tag.last_attribute.get() {
            Some(last) => self.staged.next_siblings[last as usize] = Link::to(index),
            None => {
                if let Content::Branch {
                    first_attribute, ..
                } = &mut self.store.contents[start_tag.element as usize]
                {
                    *first_attribute = Link::to(index);
                }
            }
        }
        self.start_tag = Some(StartTag {
            last_attribute: Link::to(index),
            ..start_tag
        });
        Ok(start_tag.element)
    }

    fn namespace_node(&mut self, prefix_id: PrefixId, namespace_id: NamespaceId) -> Result<(), Error> {
        let namespace_uri = self.names.namespace_str(namespace_id).to_string();
        self.stage(TypeCode::NAMESPACE, &namespace_uri, prefix_id)?;
        Ok(())
    }

    fn attribute_node(&mut self, attribute: &Attribute) -> Result<(), Error> {
        let (prefix, _) = split_qname(attribute.qname);
        // xml: names are in the XML namespace whatever the producer says
        let namespace_uri = if prefix == "xml" {
            XML_NAMESPACE
        } else {
            attribute.namespace_uri
        };
        let type_code = self.names.intern(namespace_uri, attribute.local_name);
        let prefix_id = self.names.add_prefix(prefix);
        let element = self.stage(type_code, attribute.value, prefix_id)?;
        if namespace_uri == XML_NAMESPACE && attribute.local_name == "space" {
            let preserve = match attribute.value {
                "preserve" => Some(true),
                "default" => Some(!self.options.strip_whitespace),
                _ => None,
            };
            if let Some(preserve) = preserve {
                if preserve != self.preserving() {
                    self.space.push((element, preserve));
                }
            }
        }
        Ok(())
    }

    /// End the innermost open element.
    pub fn end_element(&mut self) -> Result<(), Error> {
        self.run(|builder| {
            builder.require_open("end-element")?;
            builder.flush_text()?;
            if builder.open.len() <= 1 {
                return Err(Error::UnbalancedEndElement);
            }
            let element = builder.open.pop();
            builder.previous.pop();
            if builder.space.last().map(|(node, _)| *node) == element {
                builder.space.pop();
            }
            Ok(())
        })
    }

    /// Character data. Consecutive calls form one text node.
    pub fn characters(&mut self, text: &str) -> Result<(), Error> {
        self.run(|builder| builder.buffer_text(text, false))
    }

    /// Whitespace the producer marked as not significant. It is flagged as
    /// strippable without looking at `xml:space`.
    pub fn ignorable_whitespace(&mut self, text: &str) -> Result<(), Error> {
        self.run(|builder| builder.buffer_text(text, true))
    }

    fn buffer_text(&mut self, text: &str, ignorable: bool) -> Result<(), Error> {
        self.require_open("characters")?;
        if text.is_empty() {
            return Ok(());
        }
        self.start_tag = None;
        match &mut self.text {
            Some(pending) => pending.ignorable &= ignorable,
            None => {
                self.text = Some(PendingText {
                    start: self.store.text.len(),
                    ignorable,
                })
            }
        }
        self.store.text.push_str(text);
        Ok(())
    }

    /// A comment.
    pub fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.run(|builder| {
            builder.require_open("comment")?;
            builder.flush_text()?;
            let span = builder.store_value(text);
            builder.allocate(TypeCode::COMMENT, Content::Value(span), PrefixId::EMPTY)?;
            Ok(())
        })
    }

    /// A processing instruction.
    pub fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), Error> {
        self.run(|builder| {
            builder.require_open("processing-instruction")?;
            builder.flush_text()?;
            let target = builder.store_value(target);
            let data = builder.store_value(data);
            builder.allocate(
                TypeCode::PROCESSING_INSTRUCTION,
                Content::Instruction { target, data },
                PrefixId::EMPTY,
            )?;
            Ok(())
        })
    }

    /// End the document and seal it.
    ///
    /// Staged attribute nodes are moved behind the last structural node and
    /// all links to them are renumbered.
    pub fn end_document(mut self) -> Result<Document, Error> {
        self.run(|builder| {
            builder.require_open("end-document")?;
            builder.flush_text()?;
            if builder.open.len() > 1 {
                return Err(Error::UnclosedElements(builder.open.len() - 1));
            }
            Ok(())
        })?;
        let Builder {
            mut names,
            mut store,
            staged,
            interned,
            ..
        } = self;
        store.append_attributes(staged);
        store.shrink_to_fit();
        names.clear_scopes();
        tracing::debug!(
            nodes = store.first_attribute,
            attributes = store.len() - store.first_attribute,
            interned = interned.len(),
            text_bytes = store.text.len(),
            "sealed document"
        );
        Ok(Document::new(store, names))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}
