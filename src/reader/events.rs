//! XML Event Types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::{split_qname, Attribute};
use crate::core::dtd::DocTypeDecl;
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags, entities decoded
    Text(Cow<'a, str>),
    /// CDATA section content
    CData(&'a str),
    /// Comment content
    Comment(&'a str),
    /// Processing instruction: <?target data?>
    ProcessingInstruction { target: &'a str, data: &'a str },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration {
        version: Cow<'a, str>,
        encoding: Option<Cow<'a, str>>,
        standalone: Option<bool>,
    },
    /// DOCTYPE declaration
    DocType(DocTypeDecl<'a>),
    /// End of document
    EndDocument,
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a str,
    /// Element attributes, in document order
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a str, attributes: Vec<Attribute<'a>>) -> Self {
        StartElement { name, attributes }
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        split_qname(self.name).0
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &'a str {
        split_qname(self.name).1
    }

    /// Get an attribute value by its name as written
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: &'a str,
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a str) -> Self {
        EndElement { name }
    }

    pub fn local_name(&self) -> &'a str {
        split_qname(self.name).1
    }
}

impl<'a> XmlEvent<'a> {
    /// Check if this is a start element event
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement(_) | XmlEvent::EmptyElement(_))
    }

    /// Get text content if applicable (text or CDATA)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlEvent::Text(t) => Some(t.as_ref()),
            XmlEvent::CData(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element() {
        let elem = StartElement::new("div", vec![]);
        assert_eq!(elem.local_name(), "div");
        assert!(elem.prefix().is_none());
    }

    #[test]
    fn test_namespaced_element() {
        let elem = StartElement::new("svg:rect", vec![]);
        assert_eq!(elem.local_name(), "rect");
        assert_eq!(elem.prefix(), Some("svg"));
        assert_eq!(EndElement::new("svg:rect").local_name(), "rect");
    }

    #[test]
    fn test_as_text() {
        assert_eq!(XmlEvent::CData("<x>").as_text(), Some("<x>"));
        assert_eq!(XmlEvent::Text(Cow::Borrowed("hi")).as_text(), Some("hi"));
        assert!(XmlEvent::EndDocument.as_text().is_none());
        assert!(XmlEvent::EmptyElement(StartElement::new("a", vec![])).is_start_element());
    }
}
