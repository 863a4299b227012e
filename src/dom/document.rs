//! XML Document - the immutable tree and its entry points
//!
//! Parsing goes bytes -> decoded text -> reader events -> tree. Rendering
//! always produces UTF-8.

use super::builder::build_document;
use super::node::{Element, Miscellaneous};
use super::render::render_document;
use super::settings::{ParseSettings, RenderSettings};
use crate::core::encoding::{decode, normalize_line_endings};
use crate::error::Result;
use crate::reader::buffered::{read_all, read_path};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, instrument};

/// External identifier of a document type declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalId {
    System(String),
    /// Public identifier, system literal
    Public(String, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub external_id: Option<ExternalId>,
}

/// Everything before the root element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prologue {
    pub before: Vec<Miscellaneous>,
    pub doctype: Option<Doctype>,
    pub after: Vec<Miscellaneous>,
}

/// A complete XML document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub prologue: Prologue,
    pub root: Element,
    pub epilogue: Vec<Miscellaneous>,
}

impl Document {
    /// A document with an empty prologue and epilogue
    pub fn new(root: Element) -> Self {
        Document {
            prologue: Prologue::default(),
            root,
            epilogue: Vec::new(),
        }
    }

    /// Parse raw bytes, detecting UTF-8, UTF-16 or UTF-32
    pub fn parse_bytes(input: &[u8], settings: &ParseSettings) -> Result<Self> {
        let text = normalize_line_endings(decode(input)?);
        let doc = build_document(&text, settings)?;
        debug!(bytes = input.len(), root = %doc.root.name, "parsed document");
        Ok(doc)
    }

    /// Parse text that is already decoded
    pub fn parse_str(input: &str, settings: &ParseSettings) -> Result<Self> {
        let text = normalize_line_endings(input.strip_prefix('\u{FEFF}').unwrap_or(input).to_string());
        let doc = build_document(&text, settings)?;
        debug!(chars = input.len(), root = %doc.root.name, "parsed document");
        Ok(doc)
    }

    /// Parse everything a reader yields
    pub fn parse_reader<R: Read>(reader: R, settings: &ParseSettings) -> Result<Self> {
        let bytes = read_all(reader)?;
        Self::parse_bytes(&bytes, settings)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn parse_file(path: impl AsRef<Path>, settings: &ParseSettings) -> Result<Self> {
        let bytes = read_path(path.as_ref())?;
        Self::parse_bytes(&bytes, settings)
    }

    /// Serialize to UTF-8 bytes
    pub fn render_bytes(&self, settings: &RenderSettings) -> Vec<u8> {
        self.render_string(settings).into_bytes()
    }

    pub fn render_string(&self, settings: &RenderSettings) -> String {
        let mut out = String::with_capacity(256);
        render_document(self, settings, &mut out);
        debug!(bytes = out.len(), pretty = settings.pretty, "rendered document");
        out
    }

    /// Serialize into any writer
    pub fn render_to<W: Write>(&self, mut writer: W, settings: &RenderSettings) -> std::io::Result<()> {
        writer.write_all(self.render_string(settings).as_bytes())?;
        writer.flush()
    }

    /// Serialize to a file, creating or truncating it
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn write_file(&self, path: impl AsRef<Path>, settings: &RenderSettings) -> std::io::Result<()> {
        let file = File::create(path.as_ref())?;
        self.render_to(BufWriter::new(file), settings)
    }
}
