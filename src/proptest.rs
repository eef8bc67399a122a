//! Proptest support
//!
//! Proptests allow you to test for *properties* of your code that must hold
//! for arbitrary data. This module helps you write a proptest by letting you
//! generate an arbitrary XML document as a [`fixed::Document`](crate::fixed::Document).
//!
//! This can be enabled by adding the `proptest` feature to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! xdtm = { version = "0.1", features = ["proptest"] }
//! ```
//!
//! See the [`proptest`](https://docs.rs/proptest/latest/proptest/)
//! documentation for more information.

use ahash::HashSet;
use proptest::prelude::*;

use crate::fixed::{Content, Document, DocumentContent, Element, Name, Prefix, ProcessingInstruction};

const NAMESPACES: &[(&str, &str)] = &[
    ("", ""),
    ("x", "http://example.com/x"),
    ("y", "http://example.com/y"),
];
const ELEMENT_NAMES: &[&str] = &["a", "b", "c", "d", "e"];
const ATTRIBUTE_NAMES: &[&str] = &["q", "r", "s"];
const PI_NAMES: &[&str] = &["pi1", "pi2", "pi3", "pi4", "pi5"];
const XML_STRING: &str = "[\u{000a}\u{0009}\u{0020}-\u{D7FF}\u{E000}-\u{FFFD}]*";
const XML_WHITESPACE: &str = "[ \t\n]{1,4}";

// names use a fixed prefix per namespace; the document element declares
// them all, so every name is resolvable
fn arb_name(names: &'static [&'static str]) -> impl Strategy<Value = Name> {
    (prop::sample::select(names), prop::sample::select(NAMESPACES)).prop_map(
        |(localname, (prefix, namespace))| Name {
            namespace: namespace.to_string(),
            prefix: prefix.to_string(),
            localname: localname.to_string(),
        },
    )
}

fn arb_attribute() -> impl Strategy<Value = (Name, String)> {
    (arb_name(ATTRIBUTE_NAMES), XML_STRING.prop_map(String::from))
}

fn arb_comment() -> impl Strategy<Value = String> {
    XML_STRING.prop_filter("comment", |s| !s.contains('-'))
}

fn arb_processing_instruction() -> impl Strategy<Value = ProcessingInstruction> {
    (prop::sample::select(PI_NAMES), "[a-z ]*").prop_map(|(target, content)| ProcessingInstruction {
        target: target.to_string(),
        content,
    })
}

fn arb_content() -> impl Strategy<Value = Content> {
    let leaf = prop_oneof![
        XML_STRING
            .prop_filter("non-empty text", |s| !s.is_empty())
            .prop_map(Content::Text),
        XML_WHITESPACE.prop_map(Content::Text),
        arb_comment().prop_map(Content::Comment),
        arb_processing_instruction().prop_map(Content::ProcessingInstruction),
    ];

    leaf.prop_recursive(
        8,   // levels deep
        256, // maximum size of 256 nodes
        10,  // up to 10 items per collection
        |inner| {
            (
                arb_name(ELEMENT_NAMES),
                prop::collection::vec(inner, 0..10),
                prop::collection::vec(arb_attribute(), 0..4),
            )
                .prop_map(|(name, children, attributes)| {
                    Content::Element(Element {
                        name,
                        attributes: unduplicate_attributes(attributes),
                        prefixes: vec![],
                        children: merge_text(children),
                    })
                })
        },
    )
}

prop_compose! {
    fn arb_element()(name in arb_name(ELEMENT_NAMES),
                     children in prop::collection::vec(arb_content(), 0..10),
                     attributes in prop::collection::vec(arb_attribute(), 0..4)) -> Element {
        Element {
            name,
            attributes: unduplicate_attributes(attributes),
            prefixes: NAMESPACES
                .iter()
                .filter(|(prefix, _)| !prefix.is_empty())
                .map(|(prefix, namespace)| Prefix {
                    name: prefix.to_string(),
                    namespace: namespace.to_string(),
                })
                .collect(),
            children: merge_text(children),
        }
    }
}

fn unduplicate_attributes(attributes: Vec<(Name, String)>) -> Vec<(Name, String)> {
    let mut seen = HashSet::default();
    attributes
        .into_iter()
        .filter(|(name, _)| seen.insert((name.namespace.clone(), name.localname.clone())))
        .collect()
}

// adjacent text becomes one node when built; generate it that way
fn merge_text(children: Vec<Content>) -> Vec<Content> {
    let mut merged: Vec<Content> = Vec::with_capacity(children.len());
    for child in children {
        match (merged.last_mut(), child) {
            (Some(Content::Text(previous)), Content::Text(text)) => previous.push_str(&text),
            (_, child) => merged.push(child),
        }
    }
    merged
}

/// Generate a random XML document.
///
/// Turn the value into a document with its `build` method.
///
/// Example:
///
/// ```notrust
/// use xdtm::proptest::arb_document;
///
/// proptest! {
///   #[test]
///   fn test_builds(fixed in arb_document()) {
///     prop_assert!(fixed.build().is_ok());
///   }
/// }
/// ```
pub fn arb_document() -> impl Strategy<Value = Document> {
    arb_document_with_config(Config {
        comments_and_pi_outside_document_element: true,
    })
}

/// Configure proptest
#[derive(Default)]
pub struct Config {
    /// Can generate comments and pi outside the document element
    pub comments_and_pi_outside_document_element: bool,
}

/// Generate a random XML document, with configuration.
pub fn arb_document_with_config(config: Config) -> BoxedStrategy<Document> {
    if config.comments_and_pi_outside_document_element {
        let before = prop::collection::vec(
            prop_oneof![
                arb_comment().prop_map(DocumentContent::Comment),
                arb_processing_instruction().prop_map(DocumentContent::ProcessingInstruction),
            ],
            0..10,
        );
        let after = before.clone();
        (before, arb_element(), after)
            .prop_map(|(before, document_element, after)| Document {
                before,
                document_element,
                after,
            })
            .boxed()
    } else {
        arb_element()
            .prop_map(|document_element| Document {
                before: vec![],
                document_element,
                after: vec![],
            })
            .boxed()
    }
}
