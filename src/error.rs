//! Parse Error Types
//!
//! Every failure of the parse entry points surfaces as a [`ParseError`].
//! Query combinators never fail, so there is no query error type.

use std::fmt;
use thiserror::Error;

/// Position in the decoded (UTF-8) document text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    /// Byte offset into the decoded text
    pub offset: usize,
    /// 1-based line
    pub line: u32,
    /// 1-based column, counted in characters
    pub col: u32,
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }

    /// Compute line/column for a byte offset into `text`
    pub fn locate(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let mut line = 1u32;
        let mut col = 1u32;
        for (i, c) in text.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Self { offset, line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// Well-formedness failures
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid name `{0}`")]
    InvalidName(String),
    #[error("invalid character U+{0:04X}")]
    InvalidChar(u32),
    #[error("malformed tag: {0}")]
    MalformedTag(&'static str),
    #[error("malformed attribute: {0}")]
    MalformedAttribute(&'static str),
    #[error("duplicate attribute `{0}`")]
    DuplicateAttribute(String),
    #[error("`<{open}>` closed by `</{close}>`")]
    TagMismatch { open: String, close: String },
    #[error("end tag `</{0}>` without a matching start tag")]
    UnexpectedEndTag(String),
    #[error("unclosed tag `<{0}>`")]
    UnclosedTag(String),
    #[error("document has no root element")]
    MissingRoot,
    #[error("document has multiple root elements")]
    MultipleRoots,
    #[error("text is not allowed outside the root element")]
    TextOutsideRoot,
    #[error("unbound namespace prefix `{0}`")]
    UnboundPrefix(String),
    #[error("invalid namespace declaration: {0}")]
    InvalidNamespace(&'static str),
    #[error("unknown entity `&{0};`")]
    UnknownEntity(String),
    #[error("entity `&{0};` references itself")]
    RecursiveEntity(String),
    #[error("expansion of `&{0};` exceeds the configured limit")]
    EntityExpansionLimit(String),
    #[error("invalid character reference `&{0};`")]
    InvalidCharRef(String),
    #[error("malformed comment: {0}")]
    MalformedComment(&'static str),
    #[error("malformed processing instruction: {0}")]
    MalformedInstruction(&'static str),
    #[error("malformed XML declaration: {0}")]
    MalformedDeclaration(&'static str),
    #[error("malformed DOCTYPE: {0}")]
    MalformedDoctype(&'static str),
    #[error("`]]>` is not allowed in text")]
    CdataEndInText,
    #[error("unterminated {0}")]
    Unterminated(&'static str),
}

/// Error returned by every parse entry point
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not well-formed XML
    #[error("{kind} at {pos}")]
    Syntax { kind: ErrorKind, pos: Pos },
    /// The byte stream could not be decoded
    #[error("unable to decode input: {0}")]
    Encoding(String),
    /// Reading the input failed
    #[error("unable to read input")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Build a syntax error, resolving the offset against the decoded text
    pub fn syntax(kind: ErrorKind, text: &str, offset: usize) -> Self {
        ParseError::Syntax {
            kind,
            pos: Pos::locate(text, offset),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        ParseError::Encoding(message.into())
    }

    /// The well-formedness failure, if this is a syntax error
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            ParseError::Syntax { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
