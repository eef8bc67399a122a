#![forbid(unsafe_code)]

//! A compact, index-addressed XML document model.
//!
//! Documents are built once from a stream of parse events and are then
//! sealed: read-only, shareable between threads, and navigated through
//! [`Node`] handles that are plain 32 bit integers. On top of that sits a
//! family of XPath axis iterators that support node tests, whitespace
//! stripping, marks and restarts.
//!
//! ```rust
//! use xdtm::{Axis, Document};
//!
//! let document = Document::parse("<r><x/><y/><z/></r>")?;
//! let r = document.document_element().unwrap();
//! let y = document.axis(Axis::Child, r).nth(1).unwrap();
//! let preceding = document
//!     .axis(Axis::PrecedingSibling, y)
//!     .map(|node| document.local_name(node).to_string())
//!     .collect::<Vec<_>>();
//! assert_eq!(preceding, vec!["x"]);
//! # Ok::<(), xdtm::Error>(())
//! ```
//!
//! A [`Builder`] accepts the events directly, a [`DocumentManager`] maps
//! node handles back to the document that owns them, and
//! [`IncrementalBuild`] builds a document a chunk at a time.

mod access;
mod axis;
mod builder;
mod document;
mod encoding;
mod entity;
mod error;
pub mod fixed;
mod id;
mod incremental;
mod iter;
mod manager;
mod names;
mod node;
mod output;
mod parse;
mod store;

#[cfg(feature = "proptest")]
pub mod proptest;

pub use access::NodeEdge;
pub use axis::Axis;
pub use builder::{Attribute, Builder, BuilderOptions};
pub use document::Document;
pub use error::Error;
pub use id::{NamespaceId, PrefixId, TypeCode};
pub use incremental::{IncrementalBuild, Progress};
pub use iter::{AxisIterator, NodeIter, NodeTest, StripFilter, StripSpace};
pub use manager::{DocumentManager, ManagerOptions};
pub use names::{Names, XML_NAMESPACE};
pub use node::{DocumentId, Node, NodeKind, LOCAL_BITS, LOCAL_SPACE, MAX_DOCUMENT_IDS};
pub use output::{Output, OutputSink};
