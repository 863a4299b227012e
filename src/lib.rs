//! xmlcursor - Immutable XML documents with axis-based cursor queries
//!
//! Layers:
//! core: Encoding detection, character classes, tokenizer, entities, DTD
//! reader: Zero-copy pull events over decoded text
//! dom: Document model, parser front end and renderer
//! cursor: Cursors, axes, predicates and composition
//! strategy: Parallel evaluation with Rayon
//!
//! ```
//! use xmlcursor::{content, descendant, element, AxisExt, Cursor, Document, ParseSettings};
//!
//! let doc = Document::parse_str(
//!     "<html><head><title>My <b>Title</b></title></head><body/></html>",
//!     &ParseSettings::default(),
//! )?;
//! let title = element("head").then_child(element("title")).then(descendant).then(content);
//! let text = Cursor::from_document(&doc).select_children(&title).concat();
//! assert_eq!(text, "My Title");
//! # Ok::<(), xmlcursor::ParseError>(())
//! ```

pub mod core;
pub mod cursor;
pub mod dom;
pub mod error;
pub mod reader;
pub mod strategy;

pub use cursor::{
    ancestor, ancestor_or_self, any_element, attribute, attribute_is, check, check_element, child, content,
    descendant, descendant_or_self, element, following, following_sibling, has_attribute, lax_element, or_self,
    parent, preceding, preceding_sibling, self_axis, Axis, AxisExt, Cursor, NodeRef,
};
pub use dom::{
    render_element, Doctype, Document, Element, ExternalId, Instruction, Miscellaneous, Name, Node, ParseSettings,
    Prologue, RenderSettings,
};
pub use error::{ErrorKind, ParseError, Pos, Result};
pub use strategy::{select_documents, select_parallel};
