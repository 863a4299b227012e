//! Namespace Resolution
//!
//! Stack-based namespace resolver for XML namespace handling. The builder uses
//! it to expand prefixes while parsing; the renderer uses it to decide which
//! declarations an element has to emit.

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI). The default namespace has an empty
/// prefix; an empty URI undeclares it.
#[derive(Debug, Clone)]
struct NsBinding {
    prefix: String,
    uri: String,
    depth: u16,
}

/// Why a declaration was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareError {
    /// `xml` bound to anything else, or another prefix bound to the xml namespace
    ReservedXml,
    /// `xmlns` cannot be declared, nor its namespace bound
    ReservedXmlns,
    /// `xmlns:p=""`
    EmptyPrefixedUri,
}

impl DeclareError {
    pub fn message(self) -> &'static str {
        match self {
            DeclareError::ReservedXml => "the `xml` prefix and namespace are reserved",
            DeclareError::ReservedXmlns => "the `xmlns` prefix and namespace are reserved",
            DeclareError::EmptyPrefixedUri => "a prefix cannot be bound to an empty namespace",
        }
    }
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    /// Stack of namespace bindings
    bindings: Vec<NsBinding>,
    /// Current element depth
    depth: u16,
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceResolver {
    /// Create a new namespace resolver with the `xml` prefix pre-declared
    pub fn new() -> Self {
        let mut bindings = Vec::with_capacity(16);
        bindings.push(NsBinding {
            prefix: "xml".to_string(),
            uri: ns::XML.to_string(),
            depth: 0,
        });
        NamespaceResolver { bindings, depth: 0 }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth || binding.depth == 0 {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a prefixed binding for the current scope
    pub fn declare(&mut self, prefix: &str, uri: &str) -> Result<(), DeclareError> {
        match (prefix, uri) {
            ("xmlns", _) => return Err(DeclareError::ReservedXmlns),
            (_, ns::XMLNS) => return Err(DeclareError::ReservedXmlns),
            // Redeclaring xml to its own namespace is allowed and a no-op
            ("xml", ns::XML) => return Ok(()),
            ("xml", _) | (_, ns::XML) => return Err(DeclareError::ReservedXml),
            (_, "") => return Err(DeclareError::EmptyPrefixedUri),
            _ => {}
        }
        self.push_binding(prefix, uri);
        Ok(())
    }

    /// Declare the default namespace for the current scope; `""` undeclares it
    pub fn declare_default(&mut self, uri: &str) -> Result<(), DeclareError> {
        match uri {
            ns::XML => Err(DeclareError::ReservedXml),
            ns::XMLNS => Err(DeclareError::ReservedXmlns),
            _ => {
                self.push_binding("", uri);
                Ok(())
            }
        }
    }

    fn push_binding(&mut self, prefix: &str, uri: &str) {
        self.bindings.push(NsBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            depth: self.depth,
        });
    }

    /// Resolve a prefix to a namespace URI
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Resolve the default namespace
    pub fn resolve_default(&self) -> Option<&str> {
        self.resolve("")
    }

    /// Find an in-scope, non-default prefix bound to `uri`
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .filter(|b| !b.prefix.is_empty() && b.uri == uri)
            .map(|b| b.prefix.as_str())
            // The binding may be shadowed by a later one for the same prefix
            .find(|prefix| self.resolve(prefix) == Some(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces() {
        let resolver = NamespaceResolver::new();
        assert_eq!(resolver.resolve("xml"), Some(ns::XML));
        assert_eq!(resolver.resolve_default(), None);
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("svg", "http://www.w3.org/2000/svg").unwrap();
        assert_eq!(resolver.resolve("svg"), Some("http://www.w3.org/2000/svg"));
        assert_eq!(resolver.prefix_for("http://www.w3.org/2000/svg"), Some("svg"));
    }

    #[test]
    fn test_scope_pop() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("foo", "http://example.com/foo").unwrap();
        assert!(resolver.resolve("foo").is_some());

        resolver.pop_scope();
        assert_eq!(resolver.resolve("foo"), None);
        assert_eq!(resolver.resolve("xml"), Some(ns::XML));
    }

    #[test]
    fn test_shadow_binding() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare("ns", "http://example.com/ns1").unwrap();

        resolver.push_scope();
        resolver.declare("ns", "http://example.com/ns2").unwrap();
        assert_eq!(resolver.resolve("ns"), Some("http://example.com/ns2"));
        assert_eq!(resolver.prefix_for("http://example.com/ns1"), None);

        resolver.pop_scope();
        assert_eq!(resolver.resolve("ns"), Some("http://example.com/ns1"));
    }

    #[test]
    fn test_undeclare_default() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        resolver.declare_default("urn:a").unwrap();
        resolver.push_scope();
        resolver.declare_default("").unwrap();
        assert_eq!(resolver.resolve_default(), None);
        resolver.pop_scope();
        assert_eq!(resolver.resolve_default(), Some("urn:a"));
    }

    #[test]
    fn test_reserved_bindings() {
        let mut resolver = NamespaceResolver::new();
        resolver.push_scope();
        assert_eq!(resolver.declare("p", ""), Err(DeclareError::EmptyPrefixedUri));
        assert_eq!(resolver.declare("xml", "urn:other"), Err(DeclareError::ReservedXml));
        assert_eq!(resolver.declare("x", ns::XML), Err(DeclareError::ReservedXml));
        assert_eq!(resolver.declare("xmlns", "urn:a"), Err(DeclareError::ReservedXmlns));
        assert!(resolver.declare("xml", ns::XML).is_ok());
    }
}
