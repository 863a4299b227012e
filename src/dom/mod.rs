//! DOM Module - Immutable XML Document Model
//!
//! The tree is built of plain owned values:
//! - Name: local name + namespace, prefix kept only for rendering
//! - Element / Node: ordered children, attributes keyed by Name
//! - Document: prologue, exactly one root element, epilogue
//! - Namespace resolution stack shared by the builder and the renderer

mod builder;
pub mod document;
pub mod name;
pub mod namespace;
pub mod node;
pub mod render;
pub mod settings;

pub use document::{Doctype, Document, ExternalId, Prologue};
pub use name::Name;
pub use node::{Element, Instruction, Miscellaneous, Node};
pub use render::render_element;
pub use settings::{ParseSettings, RenderSettings};
