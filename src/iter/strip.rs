use crate::document::Document;
use crate::names::XML_NAMESPACE;
use crate::node::Node;

/// Decides whether whitespace-only text children of an element are
/// stripped.
///
/// Used by the stripping wrapper, see [`NodeIter::stripping`](crate::NodeIter::stripping).
/// A filter may be shared by iterators running on several threads.
pub trait StripFilter: Sync {
    /// Whether whitespace-only text directly inside `element` is stripped.
    fn strip_space(&self, document: &Document, element: Node) -> bool;
}

impl<F> StripFilter for F
where
    F: Fn(&Document, Node) -> bool + Sync,
{
    fn strip_space(&self, document: &Document, element: Node) -> bool {
        self(document, element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Namespace(String),
    Name { namespace_uri: String, local: String },
}

impl NameTest {
    fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return NameTest::Any;
        }
        let (namespace_uri, local) = match pattern.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            Some((namespace_uri, local)) => (namespace_uri, local),
            None => ("", pattern),
        };
        if local == "*" {
            NameTest::Namespace(namespace_uri.to_string())
        } else {
            NameTest::Name {
                namespace_uri: namespace_uri.to_string(),
                local: local.to_string(),
            }
        }
    }

    // higher is more specific; None if it doesn't match
    fn specificity(&self, namespace_uri: &str, local: &str) -> Option<u8> {
        match self {
            NameTest::Any => Some(0),
            NameTest::Namespace(uri) if uri == namespace_uri => Some(1),
            NameTest::Name {
                namespace_uri: uri,
                local: name,
            } if uri == namespace_uri && name == local => Some(2),
            _ => None,
        }
    }
}

/// A whitespace stripping policy in the manner of `xsl:strip-space` and
/// `xsl:preserve-space`.
///
/// Patterns are `*`, `{uri}*` or an element name in Clark notation. The
/// most specific matching pattern decides; between equally specific
/// patterns, preserve wins. Elements matched by no pattern use the default.
/// An `xml:space` attribute on the element or its nearest ancestor that has
/// one overrides the policy: `preserve` keeps whitespace, `default` defers
/// to the patterns.
///
/// ```rust
/// use xdtm::{Axis, Document, StripSpace};
///
/// let document = Document::parse("<a><b> </b><c> </c></a>").unwrap();
/// let policy = StripSpace::new().strip("*").preserve("c");
/// let a = document.document_element().unwrap();
/// let mut count = 0;
/// for element in document.axis(Axis::Child, a) {
///     count += document
///         .axis_iter(Axis::Child)
///         .stripping(Some(&policy))
///         .start_at(element)
///         .count();
/// }
/// assert_eq!(count, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StripSpace {
    strip: Vec<NameTest>,
    preserve: Vec<NameTest>,
    default_strip: bool,
}

impl StripSpace {
    /// A policy that strips nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip whitespace in elements matching `pattern`.
    pub fn strip(mut self, pattern: &str) -> Self {
        self.strip.push(NameTest::parse(pattern));
        self
    }

    /// Preserve whitespace in elements matching `pattern`.
    pub fn preserve(mut self, pattern: &str) -> Self {
        self.preserve.push(NameTest::parse(pattern));
        self
    }

    /// What to do for elements no pattern matches.
    pub fn default_strip(mut self, strip: bool) -> Self {
        self.default_strip = strip;
        self
    }

    fn best(tests: &[NameTest], namespace_uri: &str, local: &str) -> Option<u8> {
        tests
            .iter()
            .filter_map(|test| test.specificity(namespace_uri, local))
            .max()
    }

    fn matches(&self, namespace_uri: &str, local: &str) -> bool {
        let strip = Self::best(&self.strip, namespace_uri, local);
        let preserve = Self::best(&self.preserve, namespace_uri, local);
        match (strip, preserve) {
            (None, None) => self.default_strip,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(strip), Some(preserve)) => strip > preserve,
        }
    }
}

impl StripFilter for StripSpace {
    fn strip_space(&self, document: &Document, element: Node) -> bool {
        if let Some(space) = xml_space(document, element) {
            if space == "preserve" {
                return false;
            }
        }
        self.matches(document.namespace_uri(element), document.local_name(element))
    }
}

/// The value of the nearest `xml:space` attribute on an element or its
/// ancestors.
pub(crate) fn xml_space(document: &Document, element: Node) -> Option<&str> {
    let code = document.generalized_type(XML_NAMESPACE, "space")?;
    let mut current = Some(element);
    while let Some(node) = current {
        if let Some(value) = document.attribute_value(code, node) {
            return Some(value);
        }
        current = document.parent(node);
    }
    None
}
