//! XML Node representation
//!
//! The tree is a plain value: every element owns its children and nothing
//! points back up. Upward navigation is the cursor's job.

use super::name::Name;
use std::collections::BTreeMap;

/// A processing instruction: `<?target data?>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub target: String,
    pub data: String,
}

impl Instruction {
    pub fn new(target: impl Into<String>, data: impl Into<String>) -> Self {
        Instruction {
            target: target.into(),
            data: data.into(),
        }
    }
}

/// A node inside an element
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data with every reference resolved
    Content(String),
    Comment(String),
    Instruction(Instruction),
}

impl Node {
    pub fn content(text: impl Into<String>) -> Self {
        Node::Content(text.into())
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Node::Comment(text.into())
    }

    pub fn instruction(target: impl Into<String>, data: impl Into<String>) -> Self {
        Node::Instruction(Instruction::new(target, data))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&str> {
        match self {
            Node::Content(text) => Some(text),
            _ => None,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Miscellaneous> for Node {
    fn from(misc: Miscellaneous) -> Self {
        match misc {
            Miscellaneous::Comment(text) => Node::Comment(text),
            Miscellaneous::Instruction(pi) => Node::Instruction(pi),
        }
    }
}

/// An element: name, attributes keyed by name, ordered children
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: Name,
    pub attributes: BTreeMap<Name, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<Name>) -> Self {
        Element {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<Name>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append text, merging with a trailing content node
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(&text.into());
        self
    }

    /// Look up an attribute value; `name` accepts Clark notation
    pub fn attribute(&self, name: impl Into<Name>) -> Option<&str> {
        self.attributes.get(&name.into()).map(String::as_str)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements only, in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated content of every descendant, in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    pub(crate) fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Content(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
                Node::Comment(_) | Node::Instruction(_) => {}
            }
        }
    }

    /// Append text to the children, merging with a trailing content node
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Content(existing)) => existing.push_str(text),
            _ => self.children.push(Node::Content(text.to_string())),
        }
    }
}

/// A comment or processing instruction outside the root element
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Miscellaneous {
    Comment(String),
    Instruction(Instruction),
}
