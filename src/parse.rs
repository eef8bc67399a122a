use std::borrow::Cow;
use std::io::Read;

use xmlparser::{ElementEnd, Token, Tokenizer};

use crate::builder::{Attribute, Builder, BuilderOptions};
use crate::document::Document;
use crate::encoding::decode;
use crate::entity::parse_entities;
use crate::error::Error;

// a start tag whose attributes are still arriving
struct StartTag<'a> {
    prefix: &'a str,
    local: &'a str,
    attributes: Vec<(&'a str, &'a str, Cow<'a, str>)>,
    declarations: Vec<(&'a str, Cow<'a, str>)>,
}

struct OpenTag<'a> {
    prefix: &'a str,
    local: &'a str,
    declared: Vec<&'a str>,
}

fn qname(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

/// Turns tokens into builder events.
///
/// Namespace declarations become prefix mapping events and names are
/// resolved against the builder's bindings, so the builder sees what a
/// namespace-aware streaming parser reports.
pub(crate) struct Reader<'a> {
    tokenizer: Tokenizer<'a>,
    start_tag: Option<StartTag<'a>>,
    open: Vec<OpenTag<'a>>,
    started: bool,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(xml: &'a str) -> Self {
        Reader {
            tokenizer: Tokenizer::from(xml),
            start_tag: None,
            open: Vec::new(),
            started: false,
        }
    }

    /// Handle the next token. Returns `false` once the input is exhausted.
    pub(crate) fn step(&mut self, builder: &mut Builder) -> Result<bool, Error> {
        if !self.started {
            builder.start_document()?;
            self.started = true;
        }
        let token = match self.tokenizer.next() {
            Some(token) => token?,
            None => return Ok(false),
        };
        match token {
            Token::ElementStart { prefix, local, .. } => {
                self.start_tag = Some(StartTag {
                    prefix: prefix.as_str(),
                    local: local.as_str(),
                    attributes: Vec::new(),
                    declarations: Vec::new(),
                });
            }
            Token::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                let start_tag = self
                    .start_tag
                    .as_mut()
                    .ok_or(Error::UnexpectedEvent("attribute outside of start tag"))?;
                let value = parse_entities(value.as_str())?;
                match (prefix.as_str(), local.as_str()) {
                    ("", "xmlns") => start_tag.declarations.push(("", value)),
                    ("xmlns", prefix) => start_tag.declarations.push((prefix, value)),
                    (prefix, local) => start_tag.attributes.push((prefix, local, value)),
                }
            }
            Token::ElementEnd { end, .. } => match end {
                ElementEnd::Open => self.open_element(builder)?,
                ElementEnd::Empty => {
                    self.open_element(builder)?;
                    self.close_element(builder)?;
                }
                ElementEnd::Close(prefix, local) => {
                    let top = self.open.last().ok_or(Error::UnbalancedEndElement)?;
                    if top.prefix != prefix.as_str() || top.local != local.as_str() {
                        return Err(Error::MismatchedEndTag {
                            expected: qname(top.prefix, top.local),
                            found: qname(prefix.as_str(), local.as_str()),
                        });
                    }
                    self.close_element(builder)?;
                }
            },
            Token::Text { text } => {
                // whitespace around the document element is not content
                if !self.open.is_empty() {
                    builder.characters(&parse_entities(text.as_str())?)?;
                }
            }
            Token::Cdata { text, .. } => builder.characters(text.as_str())?,
            Token::Comment { text, .. } => builder.comment(text.as_str())?,
            Token::ProcessingInstruction {
                target, content, ..
            } => builder.processing_instruction(
                target.as_str(),
                content.map(|content| content.as_str()).unwrap_or_default(),
            )?,
            // declaration and DTD
            _ => {}
        }
        Ok(true)
    }

    fn resolve(builder: &Builder, prefix: &str) -> Result<String, Error> {
        builder
            .resolve_prefix(prefix)
            .map(|namespace_uri| namespace_uri.to_string())
            .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))
    }

    fn open_element(&mut self, builder: &mut Builder) -> Result<(), Error> {
        let start_tag = self
            .start_tag
            .take()
            .ok_or(Error::UnexpectedEvent("end of start tag"))?;
        for (prefix, namespace_uri) in &start_tag.declarations {
            builder.start_prefix_mapping(prefix, namespace_uri)?;
        }
        let namespace_uri = Self::resolve(builder, start_tag.prefix)?;
        let mut resolved = Vec::with_capacity(start_tag.attributes.len());
        for (prefix, local, _) in &start_tag.attributes {
            // unprefixed attributes are in no namespace
            let namespace_uri = if prefix.is_empty() {
                String::new()
            } else {
                Self::resolve(builder, prefix)?
            };
            resolved.push((namespace_uri, qname(prefix, local)));
        }
        let attributes = start_tag
            .attributes
            .iter()
            .zip(resolved.iter())
            .map(|((_, local, value), (namespace_uri, qname))| {
                Attribute::new(namespace_uri, local, qname, value)
            })
            .collect::<Vec<_>>();
        builder.start_element(
            &namespace_uri,
            start_tag.local,
            &qname(start_tag.prefix, start_tag.local),
            &attributes,
        )?;
        self.open.push(OpenTag {
            prefix: start_tag.prefix,
            local: start_tag.local,
            declared: start_tag
                .declarations
                .iter()
                .map(|(prefix, _)| *prefix)
                .collect(),
        });
        Ok(())
    }

    fn close_element(&mut self, builder: &mut Builder) -> Result<(), Error> {
        let open = self.open.pop().ok_or(Error::UnbalancedEndElement)?;
        builder.end_element()?;
        for prefix in open.declared.iter().rev() {
            builder.end_prefix_mapping(prefix)?;
        }
        Ok(())
    }
}

/// ## Parsing
impl Document {
    /// Parse XML text with default options.
    ///
    /// ```rust
    /// let document = xdtm::Document::parse("<p>Example</p>").unwrap();
    /// let p = document.document_element().unwrap();
    /// assert_eq!(document.string_value(p), "Example");
    /// ```
    pub fn parse(xml: &str) -> Result<Document, Error> {
        Self::parse_with_builder(xml, Builder::new())
    }

    /// Parse XML text with the given builder options.
    pub fn parse_with_options(xml: &str, options: BuilderOptions) -> Result<Document, Error> {
        Self::parse_with_builder(xml, Builder::with_options(options))
    }

    /// Parse XML text into a prepared builder, for instance one seeded with
    /// an existing registry.
    pub fn parse_with_builder(xml: &str, mut builder: Builder) -> Result<Document, Error> {
        let mut reader = Reader::new(xml);
        while reader.step(&mut builder)? {}
        let document = builder.end_document()?;
        tracing::debug!(bytes = xml.len(), nodes = document.len(), "parsed document");
        Ok(document)
    }

    /// Parse XML bytes. The encoding is taken from the byte order mark or the
    /// encoding declaration; UTF-8 if there is neither.
    ///
    /// ```rust
    /// let data = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>\xe9</a>";
    /// let document = xdtm::Document::parse_bytes(data).unwrap();
    /// let a = document.document_element().unwrap();
    /// assert_eq!(document.string_value(a), "\u{e9}");
    /// ```
    pub fn parse_bytes(data: &[u8]) -> Result<Document, Error> {
        Self::parse(&decode(data)?)
    }

    /// Read all of a reader and parse it as XML bytes.
    pub fn parse_reader<R: Read>(mut reader: R) -> Result<Document, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse_bytes(&data)
    }
}
