use ahash::HashMap;

use crate::id::{Name, NameLookup, NamespaceId, NamespaceLookup, PrefixId, PrefixLookup, TypeCode};

/// The namespace URI bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Name and namespace registry.
///
/// Maps expanded names to stable [`TypeCode`]s, and interns namespace URIs
/// and prefixes to small ids. While a document is being built it also keeps
/// one stack of bound namespaces per prefix, so that a lookup always sees
/// the innermost active binding.
///
/// A registry is owned by whoever builds a tree. Seed a builder with a
/// prepared registry (see [`Builder::with_names`](crate::Builder::with_names))
/// to have known names receive known codes.
#[derive(Debug, Clone)]
pub struct Names {
    name_lookup: NameLookup,
    namespace_lookup: NamespaceLookup,
    prefix_lookup: PrefixLookup,
    scopes: HashMap<PrefixId, Vec<NamespaceId>>,
    no_namespace_id: NamespaceId,
    xml_namespace_id: NamespaceId,
    xml_prefix_id: PrefixId,
}

impl Names {
    /// Create a registry holding only the predeclared entries: the empty
    /// namespace, the empty prefix, and the `xml` prefix with its namespace.
    pub fn new() -> Self {
        let mut namespace_lookup = NamespaceLookup::new();
        let no_namespace_id = namespace_lookup.get_id_mut(String::new());
        let xml_namespace_id = namespace_lookup.get_id_mut(XML_NAMESPACE.to_string());
        let mut prefix_lookup = PrefixLookup::new();
        let empty_prefix_id = prefix_lookup.get_id_mut(String::new());
        debug_assert_eq!(empty_prefix_id, PrefixId::EMPTY);
        let xml_prefix_id = prefix_lookup.get_id_mut("xml".to_string());
        Names {
            name_lookup: NameLookup::new(),
            namespace_lookup,
            prefix_lookup,
            scopes: HashMap::default(),
            no_namespace_id,
            xml_namespace_id,
            xml_prefix_id,
        }
    }

    /// Look up a name without a namespace.
    pub fn name(&self, local: &str) -> Option<TypeCode> {
        self.name_ns(local, self.no_namespace_id)
    }

    /// Add a name without a namespace. Returns the existing code if the
    /// name is already known.
    pub fn add_name(&mut self, local: &str) -> TypeCode {
        self.add_name_ns(local, self.no_namespace_id)
    }

    /// Look up a name in a namespace.
    pub fn name_ns(&self, local: &str, namespace_id: NamespaceId) -> Option<TypeCode> {
        self.name_lookup.get_id(&Name::new(local, namespace_id))
    }

    /// Add a name in a namespace. Returns the existing code if the name is
    /// already known.
    pub fn add_name_ns(&mut self, local: &str, namespace_id: NamespaceId) -> TypeCode {
        self.name_lookup.get_id_mut(Name::new(local, namespace_id))
    }

    /// Intern an expanded name given as namespace URI and local name.
    pub fn intern(&mut self, namespace_uri: &str, local: &str) -> TypeCode {
        let namespace_id = self.add_namespace(namespace_uri);
        self.add_name_ns(local, namespace_id)
    }

    /// Look up an expanded name given as namespace URI and local name.
    pub fn lookup(&self, namespace_uri: &str, local: &str) -> Option<TypeCode> {
        let namespace_id = self.namespace(namespace_uri)?;
        self.name_ns(local, namespace_id)
    }

    /// Look up a name in Clark notation, `{uri}local` or plain `local`.
    pub fn lookup_clark(&self, expanded: &str) -> Option<TypeCode> {
        let (namespace_uri, local) = split_clark(expanded);
        self.lookup(namespace_uri, local)
    }

    /// Intern a name in Clark notation, `{uri}local` or plain `local`.
    pub fn intern_clark(&mut self, expanded: &str) -> TypeCode {
        let (namespace_uri, local) = split_clark(expanded);
        self.intern(namespace_uri, local)
    }

    /// Look up a namespace.
    pub fn namespace(&self, namespace_uri: &str) -> Option<NamespaceId> {
        self.namespace_lookup.get_id(namespace_uri)
    }

    /// Add a namespace. Returns the existing id if already known.
    pub fn add_namespace(&mut self, namespace_uri: &str) -> NamespaceId {
        if let Some(id) = self.namespace(namespace_uri) {
            return id;
        }
        self.namespace_lookup.get_id_mut(namespace_uri.to_string())
    }

    /// Look up a prefix.
    pub fn prefix(&self, prefix: &str) -> Option<PrefixId> {
        self.prefix_lookup.get_id(prefix)
    }

    /// Add a prefix. Returns the existing id if already known.
    pub fn add_prefix(&mut self, prefix: &str) -> PrefixId {
        if let Some(id) = self.prefix(prefix) {
            return id;
        }
        self.prefix_lookup.get_id_mut(prefix.to_string())
    }

    /// The id of the empty namespace.
    pub fn no_namespace(&self) -> NamespaceId {
        self.no_namespace_id
    }

    /// The id of the XML namespace.
    pub fn xml_namespace(&self) -> NamespaceId {
        self.xml_namespace_id
    }

    /// The id of the `xml` prefix.
    pub fn xml_prefix(&self) -> PrefixId {
        self.xml_prefix_id
    }

    /// Local name for a name code.
    ///
    /// Structural codes have no name and give the empty string.
    pub fn local_name(&self, code: TypeCode) -> &str {
        if !code.is_name() {
            return "";
        }
        &self.name_lookup.get_value(code).local
    }

    /// Namespace of a name code. Structural codes are in no namespace.
    pub fn namespace_of(&self, code: TypeCode) -> NamespaceId {
        if !code.is_name() {
            return self.no_namespace_id;
        }
        self.name_lookup.get_value(code).namespace_id
    }

    /// Namespace URI of a name code.
    pub fn namespace_uri(&self, code: TypeCode) -> &str {
        self.namespace_str(self.namespace_of(code))
    }

    /// The URI for a namespace id.
    pub fn namespace_str(&self, namespace_id: NamespaceId) -> &str {
        self.namespace_lookup.get_value(namespace_id)
    }

    /// The string for a prefix id.
    pub fn prefix_str(&self, prefix_id: PrefixId) -> &str {
        self.prefix_lookup.get_value(prefix_id)
    }

    /// Number of distinct expanded names.
    pub fn name_count(&self) -> usize {
        self.name_lookup.len()
    }

    /// All known expanded names with their codes, in code order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeCode, &str, &str)> + '_ {
        self.name_lookup.iter().map(|(code, name)| {
            (
                code,
                self.namespace_str(name.namespace_id),
                name.local.as_str(),
            )
        })
    }

    /// Bind a prefix to a namespace for the scope being entered.
    pub(crate) fn push_prefix(&mut self, prefix_id: PrefixId, namespace_id: NamespaceId) {
        self.scopes.entry(prefix_id).or_default().push(namespace_id);
    }

    /// Drop the innermost binding of a prefix. Returns the binding removed,
    /// or `None` if the prefix wasn't bound.
    pub(crate) fn pop_prefix(&mut self, prefix_id: PrefixId) -> Option<NamespaceId> {
        let stack = self.scopes.get_mut(&prefix_id)?;
        let popped = stack.pop();
        if stack.is_empty() {
            self.scopes.remove(&prefix_id);
        }
        popped
    }

    /// The innermost active binding for a prefix.
    ///
    /// The `xml` prefix is always bound to the XML namespace and cannot be
    /// rebound. The empty prefix is bound to no namespace unless declared.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<NamespaceId> {
        if prefix == "xml" {
            return Some(self.xml_namespace_id);
        }
        let prefix_id = self.prefix(prefix)?;
        let bound = self.scopes.get(&prefix_id).and_then(|stack| stack.last());
        match bound {
            Some(namespace_id) => Some(*namespace_id),
            None if prefix_id == PrefixId::EMPTY => Some(self.no_namespace_id),
            None => None,
        }
    }

    pub(crate) fn clear_scopes(&mut self) {
        self.scopes.clear();
    }
}

impl Default for Names {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a qualified name into prefix and local name.
pub(crate) fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

fn split_clark(expanded: &str) -> (&str, &str) {
    if let Some(rest) = expanded.strip_prefix('{') {
        if let Some((namespace_uri, local)) = rest.split_once('}') {
            return (namespace_uri, local);
        }
    }
    ("", expanded)
}
