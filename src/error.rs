use thiserror::Error;

/// Errors raised while building a document.
#[derive(Debug, Error)]
pub enum Error {
    /// An end-element event arrived with no element open.
    #[error("end element without matching start element")]
    UnbalancedEndElement,
    /// An end tag in the input doesn't match the open start tag.
    #[error("end tag </{found}> does not match start tag <{expected}>")]
    MismatchedEndTag { expected: String, found: String },
    /// An event arrived in a state where it is not allowed.
    #[error("unexpected {0} event")]
    UnexpectedEvent(&'static str),
    /// The document ended with elements still open.
    #[error("{0} element(s) still open at end of document")]
    UnclosedElements(usize),
    /// A prefix was used or ended without being declared.
    #[error("unknown namespace prefix: {0:?}")]
    UnknownPrefix(String),
    /// An entity reference without closing `;`.
    #[error("unclosed entity: {0}")]
    UnclosedEntity(String),
    /// An entity reference that isn't predefined, or a bad character reference.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),
    /// The input bytes are in an encoding we cannot decode.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    /// The tokenizer rejected the input.
    #[error("xml parse error: {0}")]
    Parser(#[from] xmlparser::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A document grew beyond its node limit.
    #[error("document has {nodes} nodes, the limit is {limit}")]
    Capacity { nodes: usize, limit: usize },
    /// No document identifiers are left to register a document.
    #[error("document identifiers exhausted: {needed} needed, {available} free")]
    IdentifiersExhausted { needed: usize, available: usize },
    /// A cooperative build was cancelled before it completed.
    #[error("build cancelled")]
    Cancelled,
    /// An earlier error already aborted this build.
    #[error("build aborted by an earlier error")]
    Aborted,
}
