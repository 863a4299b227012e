//! XML Attribute Parsing
//!
//! Parses the attribute list of a start tag, decoding entity references and
//! applying attribute-value normalization.

use super::entities::{decode_text, DecodeError, EntityTable};
use super::scanner::Scanner;
use crate::error::ErrorKind;
use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name as written (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (entities decoded, whitespace normalized)
    pub value: Cow<'a, str>,
    /// Offset of the attribute name in the document
    pub offset: usize,
}

impl<'a> Attribute<'a> {
    /// Split the name into (prefix, local name) at the colon
    pub fn split_name(&self) -> (Option<&'a str>, &'a str) {
        split_qname(self.name)
    }
}

/// Split a qualified name into prefix and local name at the colon
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Parse attributes from the scanner position up to `end` (exclusive)
///
/// `end` is the position of the closing `>` or of the `/` in `/>`.
pub fn parse_attributes<'a>(
    scanner: &mut Scanner<'a>,
    end: usize,
    table: &EntityTable,
) -> Result<Vec<Attribute<'a>>, DecodeError> {
    let mut attrs = Vec::new();

    loop {
        let had_space = scanner.skip_whitespace();
        if scanner.position() >= end {
            break;
        }
        if !had_space {
            return Err((
                ErrorKind::MalformedAttribute("whitespace required between attributes"),
                scanner.position(),
            ));
        }

        let offset = scanner.position();
        let name = scanner
            .read_name()
            .ok_or((ErrorKind::MalformedAttribute("expected attribute name"), offset))?;

        scanner.skip_whitespace();
        if scanner.peek() != Some(b'=') {
            return Err((
                ErrorKind::MalformedAttribute("expected `=` after attribute name"),
                scanner.position(),
            ));
        }
        scanner.advance(1);
        scanner.skip_whitespace();

        let quote = match scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err((
                    ErrorKind::MalformedAttribute("attribute value must be quoted"),
                    scanner.position(),
                ))
            }
        };
        scanner.advance(1);
        let value_start = scanner.position();
        let value_end = scanner
            .find_byte(quote)
            .filter(|&p| p < end)
            .ok_or((ErrorKind::MalformedAttribute("unterminated attribute value"), value_start))?;

        let raw = scanner.slice(value_start, value_end);
        if let Some(lt) = memchr(b'<', raw.as_bytes()) {
            return Err((
                ErrorKind::MalformedAttribute("`<` is not allowed in attribute values"),
                value_start + lt,
            ));
        }

        let value = decode_text(&normalize_whitespace(raw), table)
            .map(|decoded| Cow::Owned(decoded.into_owned()))
            .map_err(|(kind, at)| (kind, value_start + at))?;
        // Keep the borrowed form when nothing changed
        let value = if value == raw { Cow::Borrowed(raw) } else { value };

        attrs.push(Attribute { name, value, offset });
        scanner.set_position(value_end + 1);
    }

    Ok(attrs)
}

/// Replace literal tab and newline with a space (line endings are already normalized)
fn normalize_whitespace(raw: &str) -> Cow<'_, str> {
    if memchr2(b'\t', b'\n', raw.as_bytes()).is_none() {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace(['\t', '\n'], " "))
}
