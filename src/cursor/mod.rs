//! Cursor Module - Axis-based navigation over an immutable tree
//!
//! A [`Cursor`] pairs a borrowed node with the chain of cursors above it, so
//! the tree itself never needs parent pointers. Queries are axes: functions
//! from a cursor to an ordered list, composed by flat-mapping.
//!
//! - axes: child, parent, ancestor, descendant, siblings, following, preceding
//! - combinators: the `Axis` trait and sequence composition
//! - predicates: element/attribute filters and terminal text steps

pub mod axes;
pub mod combinators;
pub mod predicates;

pub use axes::{
    ancestor, ancestor_or_self, child, descendant, descendant_or_self, following, following_sibling, parent,
    preceding, preceding_sibling, self_axis,
};
pub use combinators::{or_self, Axis, AxisExt, OrSelf, Then, ThenChild, ThenDescendant};
pub use predicates::{
    any_element, attribute, attribute_is, check, check_element, content, element, has_attribute, lax_element,
};

use crate::dom::{Document, Element, Instruction, Name, Node};
use std::sync::Arc;

/// Borrowed view of the node a cursor stands on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Element(&'a Element),
    Content(&'a str),
    Comment(&'a str),
    Instruction(&'a Instruction),
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Element(element) => NodeRef::Element(element),
            Node::Content(text) => NodeRef::Content(text),
            Node::Comment(text) => NodeRef::Comment(text),
            Node::Instruction(pi) => NodeRef::Instruction(pi),
        }
    }
}

impl<'a> NodeRef<'a> {
    /// Identity, not structural equality: two equal subtrees are different nodes
    fn same_node(self, other: NodeRef<'_>) -> bool {
        match (self, other) {
            (NodeRef::Element(a), NodeRef::Element(b)) => std::ptr::eq(a, b),
            (NodeRef::Instruction(a), NodeRef::Instruction(b)) => std::ptr::eq(a, b),
            (NodeRef::Content(a), NodeRef::Content(b)) | (NodeRef::Comment(a), NodeRef::Comment(b)) => {
                std::ptr::eq(a.as_ptr(), b.as_ptr()) && a.len() == b.len()
            }
            _ => false,
        }
    }
}

/// A position in a tree: the current node plus the cursors of its ancestors
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    node: NodeRef<'a>,
    parent: Option<Arc<Cursor<'a>>>,
    /// Index among the parent's children; 0 for a root
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor on the document's root element
    pub fn from_document(doc: &'a Document) -> Self {
        Self::from_element(&doc.root)
    }

    /// Cursor on an arbitrary node, which becomes its own root
    pub fn from_node(node: &'a Node) -> Self {
        Cursor {
            node: NodeRef::from(node),
            parent: None,
            position: 0,
        }
    }

    pub fn from_element(element: &'a Element) -> Self {
        Cursor {
            node: NodeRef::Element(element),
            parent: None,
            position: 0,
        }
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    pub fn element(&self) -> Option<&'a Element> {
        match self.node {
            NodeRef::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Element name; None for any other node
    pub fn name(&self) -> Option<&'a Name> {
        self.element().map(|element| &element.name)
    }

    /// Text of a content node
    pub fn content(&self) -> Option<&'a str> {
        match self.node {
            NodeRef::Content(text) => Some(text),
            _ => None,
        }
    }

    pub fn parent_cursor(&self) -> Option<&Cursor<'a>> {
        self.parent.as_deref()
    }

    pub(crate) fn parent_arc(&self) -> Option<&Arc<Cursor<'a>>> {
        self.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of ancestors
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_deref();
        while let Some(cursor) = current {
            depth += 1;
            current = cursor.parent.as_deref();
        }
        depth
    }

    /// Whether both cursors stand on the same node of the same tree
    pub fn is_same_node(&self, other: &Cursor<'_>) -> bool {
        self.node.same_node(other.node)
    }

    /// Concatenated descendant content for elements; the text itself otherwise
    pub fn string_value(&self) -> String {
        match self.node {
            NodeRef::Element(element) => element.text(),
            NodeRef::Content(text) | NodeRef::Comment(text) => text.to_string(),
            NodeRef::Instruction(pi) => pi.data.clone(),
        }
    }

    /// Cursors for the children of `parent`, sharing one parent link
    pub(crate) fn children_of(parent: &Arc<Cursor<'a>>) -> Vec<Cursor<'a>> {
        let Some(element) = parent.element() else {
            return Vec::new();
        };
        element
            .children
            .iter()
            .enumerate()
            .map(|(position, node)| Cursor {
                node: NodeRef::from(node),
                parent: Some(Arc::clone(parent)),
                position,
            })
            .collect()
    }

    pub(crate) fn children(&self) -> Vec<Cursor<'a>> {
        match self.node {
            NodeRef::Element(element) if !element.children.is_empty() => {
                Self::children_of(&Arc::new(self.clone()))
            }
            _ => Vec::new(),
        }
    }

    /// Apply an axis to this cursor
    pub fn select<A: Axis<'a>>(&self, axis: &A) -> Vec<A::Item> {
        axis.apply(self)
    }

    /// Apply an axis to each child, concatenating the results
    pub fn select_children<A: Axis<'a>>(&self, axis: &A) -> Vec<A::Item> {
        self.children().iter().flat_map(|c| axis.apply(c)).collect()
    }

    /// Apply an axis to each descendant, concatenating the results
    pub fn select_descendants<A: Axis<'a>>(&self, axis: &A) -> Vec<A::Item> {
        descendant(self).iter().flat_map(|c| axis.apply(c)).collect()
    }
}
