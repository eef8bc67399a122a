use std::fmt::{Display, Formatter};

use super::idmap::{IdIndex, IdMap};
use super::namespace::NamespaceId;

/// Node type code.
///
/// Codes below [`TypeCode::NTYPES`] are the fixed structural kinds. Every code
/// at or above it names one expanded name (namespace URI plus local name).
/// The same expanded name has the same code whether it is used for an
/// element or an attribute; which of the two a node is follows from its
/// position in the document, not from the code.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeCode(pub(crate) u32);

impl TypeCode {
    /// The document root.
    pub const ROOT: TypeCode = TypeCode(0);
    /// A text node.
    pub const TEXT: TypeCode = TypeCode(1);
    /// A comment.
    pub const COMMENT: TypeCode = TypeCode(2);
    /// A processing instruction.
    pub const PROCESSING_INSTRUCTION: TypeCode = TypeCode(3);
    /// Generic attribute marker. Stored attributes carry their name code
    /// instead; this code is only used as a filter.
    pub const ATTRIBUTE: TypeCode = TypeCode(4);
    /// A namespace declaration node.
    pub const NAMESPACE: TypeCode = TypeCode(5);
    /// Generic element marker, used as a filter for "any element".
    pub const ELEMENT: TypeCode = TypeCode(6);

    /// Number of fixed structural codes.
    pub const NTYPES: u32 = 7;

    /// Whether this code names an expanded name.
    #[inline]
    pub fn is_name(self) -> bool {
        self.0 >= Self::NTYPES
    }

    /// The raw integer value of the code.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for TypeCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IdIndex<TypeCode> for TypeCode {
    fn to_id(index: usize) -> TypeCode {
        TypeCode(index as u32 + TypeCode::NTYPES)
    }

    fn from_id(id: TypeCode) -> usize {
        debug_assert!(id.is_name(), "structural code {} has no name entry", id);
        (id.0 - TypeCode::NTYPES) as usize
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct Name {
    pub(crate) local: String,
    pub(crate) namespace_id: NamespaceId,
}

impl Name {
    pub(crate) fn new<S: Into<String>>(local: S, namespace_id: NamespaceId) -> Self {
        Self {
            local: local.into(),
            namespace_id,
        }
    }
}

pub(crate) type NameLookup = IdMap<TypeCode, Name>;
