//! Qualified Names
//!
//! A [`Name`] is a local name plus an optional namespace URI. The prefix it
//! was written with is kept for rendering but takes no part in comparison:
//! `<a:item xmlns:a="urn:x"/>` and `<b:item xmlns:b="urn:x"/>` have equal names.
//!
//! Names are not validated on construction. To render to re-parseable markup
//! the local part must be an NCName and the namespace must not be the
//! `xmlns` namespace, which only declarations live in.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug)]
pub struct Name {
    local: String,
    namespace: Option<String>,
    prefix: Option<String>,
}

impl Name {
    /// A name with no namespace
    pub fn new(local: impl Into<String>) -> Self {
        Name {
            local: local.into(),
            namespace: None,
            prefix: None,
        }
    }

    pub fn namespaced(local: impl Into<String>, namespace: impl Into<String>) -> Self {
        Name {
            local: local.into(),
            namespace: Some(namespace.into()),
            prefix: None,
        }
    }

    /// Attach the prefix this name should preferably be rendered with
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// `prefix:local`, or just `local` without a prefix
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    fn key(&self) -> (&str, Option<&str>) {
        (&self.local, self.namespace.as_deref())
    }
}

/// Clark notation: `{namespace}local` or plain `local`
///
/// Text that is not well-formed Clark notation (an unclosed brace, or nothing
/// after the closing one) is taken whole as a local name.
impl From<&str> for Name {
    fn from(text: &str) -> Self {
        if let Some((ns, local)) = text.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            // `{}local` is the empty namespace name, i.e. no namespace
            match ns {
                _ if local.is_empty() => {}
                "" => return Name::new(local),
                ns => return Name::namespaced(local, ns),
            }
        }
        Name::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        if text.starts_with('{') {
            return Name::from(text.as_str());
        }
        Name::new(text)
    }
}

impl From<&Name> for Name {
    fn from(name: &Name) -> Self {
        name.clone()
    }
}

/// Renders Clark notation
impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_clark_notation() {
        let name = Name::from("{http://www.w3.org/1999/xhtml}p");
        assert_eq!(name.local_name(), "p");
        assert_eq!(name.namespace(), Some("http://www.w3.org/1999/xhtml"));
        assert_eq!(name.prefix(), None);
        assert_eq!(name.to_string(), "{http://www.w3.org/1999/xhtml}p");
    }

    #[test]
    fn test_plain_name() {
        let name = Name::from("title".to_string());
        assert_eq!(name, Name::new("title"));
        assert_eq!(name.namespace(), None);
        assert_eq!(name.to_string(), "title");
    }

    #[test]
    fn test_empty_namespace_braces() {
        let name = Name::from("{}x");
        assert_eq!(name.namespace(), None);
        assert_eq!(name.local_name(), "x");
    }

    #[test]
    fn test_unclosed_brace_is_local() {
        assert_eq!(Name::from("{oops").local_name(), "{oops");
    }

    #[test]
    fn test_namespace_without_local_is_local() {
        let name = Name::from("{urn:x}");
        assert_eq!(name.local_name(), "{urn:x}");
        assert_eq!(name.namespace(), None);
        assert_eq!(Name::from(name.to_string()), name);
        assert_eq!(Name::from("{}").local_name(), "{}");
    }

    #[test]
    fn test_prefix_ignored_by_eq_hash_ord() {
        let a = Name::namespaced("item", "urn:x").with_prefix("a");
        let b = Name::namespaced("item", "urn:x").with_prefix("b");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let set: HashSet<_> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(a.qualified(), "a:item");
    }

    #[test]
    fn test_namespace_distinguishes() {
        assert_ne!(Name::new("item"), Name::namespaced("item", "urn:x"));
        assert!(Name::new("a") < Name::new("b"));
    }
}
