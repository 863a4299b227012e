//! Tree Builder
//!
//! Folds reader events into a [`Document`], enforcing document structure
//! (single root, matching tags, prologue ordering) and namespace rules.

use super::document::{Doctype, Document, ExternalId, Prologue};
use super::name::Name;
use super::namespace::NamespaceResolver;
use super::node::{Element, Instruction, Miscellaneous, Node};
use super::settings::ParseSettings;
use crate::core::attributes::{split_qname, Attribute};
use crate::core::dtd::{DocTypeDecl, ExternalIdDecl};
use crate::core::unicode::{is_valid_ncname, is_xml_whitespace};
use crate::error::{ErrorKind, ParseError, Result};
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;

/// Where document-level comments and PIs currently go
#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    BeforeDoctype,
    AfterDoctype,
    Epilogue,
}

struct Builder<'a> {
    reader: SliceReader<'a>,
    resolver: NamespaceResolver,
    /// Open elements with the name they were written with
    stack: Vec<(Element, &'a str)>,
    root: Option<Element>,
    prologue: Prologue,
    epilogue: Vec<Miscellaneous>,
    stage: Stage,
    strip_whitespace: bool,
}

/// Build a document from decoded, line-normalized text
pub(crate) fn build_document(text: &str, settings: &ParseSettings) -> Result<Document> {
    let builder = Builder {
        reader: SliceReader::with_entities(text, settings.entity_table()),
        resolver: NamespaceResolver::new(),
        stack: Vec::new(),
        root: None,
        prologue: Prologue::default(),
        epilogue: Vec::new(),
        stage: Stage::BeforeDoctype,
        strip_whitespace: !settings.preserve_whitespace_in_misc,
    };
    builder.build()
}

impl<'a> Builder<'a> {
    fn build(mut self) -> Result<Document> {
        loop {
            let event = self.reader.next_event()?;
            match event {
                XmlEvent::StartElement(start) => {
                    let open_name = start.name;
                    let element = self.open_element(start)?;
                    self.stack.push((element, open_name));
                }

                XmlEvent::EmptyElement(start) => {
                    let element = self.open_element(start)?;
                    self.close_element(element);
                }

                XmlEvent::EndElement(end) => {
                    let Some((element, open_name)) = self.stack.pop() else {
                        return Err(self.error(ErrorKind::UnexpectedEndTag(end.name.to_string())));
                    };
                    if open_name != end.name {
                        return Err(self.error(ErrorKind::TagMismatch {
                            open: open_name.to_string(),
                            close: end.name.to_string(),
                        }));
                    }
                    self.close_element(element);
                }

                XmlEvent::Text(text) => match self.stack.last_mut() {
                    Some((parent, _)) => parent.push_text(&text),
                    // A reference is not whitespace, whatever it expands to
                    None if !self.reader.event_source().contains('&') && text.chars().all(is_xml_whitespace) => {}
                    None => return Err(self.error(ErrorKind::TextOutsideRoot)),
                },

                XmlEvent::CData(text) => match self.stack.last_mut() {
                    Some((parent, _)) => parent.push_text(text),
                    None => return Err(self.error(ErrorKind::TextOutsideRoot)),
                },

                XmlEvent::Comment(text) => self.push_misc(Miscellaneous::Comment(text.to_string())),

                XmlEvent::ProcessingInstruction { target, data } => {
                    self.push_misc(Miscellaneous::Instruction(Instruction::new(target, data)))
                }

                XmlEvent::DocType(decl) => self.doctype(decl)?,

                // The tokenizer only recognizes the declaration at offset 0
                XmlEvent::XmlDeclaration { .. } => {}

                XmlEvent::EndDocument => break,
            }
        }

        if let Some((_, open_name)) = self.stack.last() {
            let kind = ErrorKind::UnclosedTag(open_name.to_string());
            return Err(self.reader.error(kind, self.reader.input().len()));
        }
        let root = self.root.ok_or_else(|| self.reader.error(ErrorKind::MissingRoot, 0))?;

        Ok(Document {
            prologue: self.prologue,
            root,
            epilogue: self.epilogue,
        })
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        self.reader.error(kind, self.reader.event_offset())
    }

    /// Resolve names and attributes of a start tag, entering its namespace scope
    fn open_element(&mut self, start: StartElement<'a>) -> Result<Element> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(self.error(ErrorKind::MultipleRoots));
        }
        if self.stack.is_empty() && self.stage == Stage::BeforeDoctype {
            self.stage = Stage::AfterDoctype;
        }

        self.resolver.push_scope();
        for attr in &start.attributes {
            self.declare_namespace(attr)?;
        }

        let name = self.resolve_name(start.name, true, self.reader.event_offset())?;
        let mut element = Element::new(name);

        for (i, attr) in start.attributes.iter().enumerate() {
            if start.attributes[..i].iter().any(|prev| prev.name == attr.name) {
                return Err(self.attr_error(ErrorKind::DuplicateAttribute(attr.name.to_string()), attr));
            }
            if is_namespace_declaration(attr.name) {
                continue;
            }

            let name = self.resolve_name(attr.name, false, attr.offset)?;
            if element.attributes.insert(name, attr.value.to_string()).is_some() {
                // Different prefixes bound to the same namespace
                return Err(self.attr_error(ErrorKind::DuplicateAttribute(attr.name.to_string()), attr));
            }
        }

        tracing::trace!(name = %element.name, attributes = element.attributes.len(), "open element");
        Ok(element)
    }

    fn declare_namespace(&mut self, attr: &Attribute<'a>) -> Result<()> {
        let declared = match split_qname(attr.name) {
            (None, "xmlns") => self.resolver.declare_default(&attr.value),
            (Some("xmlns"), prefix) => {
                if !is_valid_ncname(prefix) {
                    return Err(self.attr_error(ErrorKind::InvalidName(attr.name.to_string()), attr));
                }
                self.resolver.declare(prefix, &attr.value)
            }
            _ => return Ok(()),
        };
        declared.map_err(|e| self.attr_error(ErrorKind::InvalidNamespace(e.message()), attr))
    }

    /// Expand a qualified name; unprefixed attributes never take the default namespace
    fn resolve_name(&self, qname: &str, is_element: bool, offset: usize) -> Result<Name> {
        let invalid = || self.reader.error(ErrorKind::InvalidName(qname.to_string()), offset);

        let (prefix, local) = split_qname(qname);
        if !is_valid_ncname(local) {
            return Err(invalid());
        }

        match prefix {
            Some(prefix) => {
                if !is_valid_ncname(prefix) || prefix == "xmlns" {
                    return Err(invalid());
                }
                let uri = self.resolver.resolve(prefix).ok_or_else(|| {
                    self.reader.error(ErrorKind::UnboundPrefix(prefix.to_string()), offset)
                })?;
                Ok(Name::namespaced(local, uri).with_prefix(prefix))
            }
            None => match self.resolver.resolve_default().filter(|_| is_element) {
                Some(uri) => Ok(Name::namespaced(local, uri)),
                None => Ok(Name::new(local)),
            },
        }
    }

    fn attr_error(&self, kind: ErrorKind, attr: &Attribute<'_>) -> ParseError {
        self.reader.error(kind, attr.offset)
    }

    /// Leave the element's scope and attach it to its parent (or make it the root)
    fn close_element(&mut self, mut element: Element) {
        self.resolver.pop_scope();
        if self.strip_whitespace {
            strip_layout_whitespace(&mut element);
        }

        match self.stack.last_mut() {
            Some((parent, _)) => parent.children.push(Node::Element(element)),
            None => {
                self.root = Some(element);
                self.stage = Stage::Epilogue;
            }
        }
    }

    fn push_misc(&mut self, misc: Miscellaneous) {
        if let Some((parent, _)) = self.stack.last_mut() {
            parent.children.push(Node::from(misc));
            return;
        }
        match self.stage {
            Stage::BeforeDoctype => self.prologue.before.push(misc),
            Stage::AfterDoctype => self.prologue.after.push(misc),
            Stage::Epilogue => self.epilogue.push(misc),
        }
    }

    fn doctype(&mut self, decl: DocTypeDecl<'_>) -> Result<()> {
        if self.prologue.doctype.is_some() {
            return Err(self.error(ErrorKind::MalformedDoctype("only one DOCTYPE is allowed")));
        }
        if self.stage != Stage::BeforeDoctype {
            return Err(self.error(ErrorKind::MalformedDoctype("DOCTYPE must precede the root element")));
        }

        let external_id = decl.external_id.map(|id| match id {
            ExternalIdDecl::System(system) => ExternalId::System(system.to_string()),
            ExternalIdDecl::Public(public, system) => ExternalId::Public(public.to_string(), system.to_string()),
        });
        self.prologue.doctype = Some(Doctype {
            name: decl.name.to_string(),
            external_id,
        });
        self.stage = Stage::AfterDoctype;
        Ok(())
    }
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Drop whitespace-only content from elements that also contain markup
fn strip_layout_whitespace(element: &mut Element) {
    if element.children.iter().all(|child| matches!(child, Node::Content(_))) {
        return;
    }
    element
        .children
        .retain(|child| !matches!(child, Node::Content(text) if text.chars().all(is_xml_whitespace)));
}
