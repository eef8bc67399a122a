// compact ids for expanded names, namespaces and prefixes
mod idmap;
mod name;
mod namespace;
mod prefix;

pub(crate) use name::{Name, NameLookup};
pub use name::TypeCode;
pub use namespace::NamespaceId;
pub(crate) use namespace::NamespaceLookup;
pub use prefix::PrefixId;
pub(crate) use prefix::PrefixLookup;
