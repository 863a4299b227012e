//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - Named entities supplied by the caller or declared in the internal DTD subset
//!
//! Uses Cow for zero-copy when no entities are present.

use super::unicode::is_valid_xml_codepoint;
use crate::error::ErrorKind;
use memchr::memchr;
use std::borrow::Cow;
use std::collections::HashMap;

/// Failure while decoding, with the byte offset of the offending `&`
pub type DecodeError = (ErrorKind, usize);

/// Maximum nesting of entity references inside entity replacement text
const MAX_ENTITY_DEPTH: usize = 16;

/// Default cap on the expanded size of one DTD-declared entity reference
pub const DEFAULT_EXPANSION_LIMIT: usize = 8192;

#[derive(Debug, Clone)]
enum Replacement {
    /// Caller-supplied text, inserted as-is
    Literal(String),
    /// Declared in the DTD; may itself contain references
    Parsed(String),
}

/// Named entities known beyond the five predefined ones
#[derive(Debug, Clone)]
pub struct EntityTable {
    entities: HashMap<String, Replacement>,
    expansion_limit: usize,
}

impl Default for EntityTable {
    fn default() -> Self {
        EntityTable {
            entities: HashMap::new(),
            expansion_limit: DEFAULT_EXPANSION_LIMIT,
        }
    }
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with caller-supplied replacements
    pub fn with_entities(entities: &HashMap<String, String>) -> Self {
        EntityTable {
            entities: entities
                .iter()
                .map(|(name, text)| (name.clone(), Replacement::Literal(text.clone())))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_expansion_limit(mut self, limit: usize) -> Self {
        self.expansion_limit = limit;
        self
    }

    /// Register a DTD entity unless one with the same name exists (first declaration wins)
    pub fn declare(&mut self, name: &str, replacement_text: String) {
        self.entities
            .entry(name.to_string())
            .or_insert(Replacement::Parsed(replacement_text));
    }

    fn lookup(&self, name: &str) -> Option<&Replacement> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        predefined(name).is_some() || self.entities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn predefined(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    }
}

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text<'a>(input: &'a str, table: &EntityTable) -> Result<Cow<'a, str>, DecodeError> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_entities(input, table, 0).map(Cow::Owned)
}

/// Decode all entity references in the input
fn decode_entities(input: &str, table: &EntityTable, depth: usize) -> Result<String, DecodeError> {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp_offset) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + amp_offset;
        result.push_str(&input[pos..amp]);

        let semi = match memchr(b';', &bytes[amp..]) {
            Some(offset) => amp + offset,
            None => return Err((ErrorKind::Unterminated("entity reference"), amp)),
        };
        let entity = &input[amp + 1..semi];

        if let Some(numeric) = entity.strip_prefix('#') {
            match decode_numeric(numeric) {
                Some(c) => result.push(c),
                None => return Err((ErrorKind::InvalidCharRef(entity.to_string()), amp)),
            }
        } else if let Some(text) = predefined(entity) {
            result.push_str(text);
        } else {
            match table.lookup(entity) {
                Some(Replacement::Literal(text)) => result.push_str(text),
                Some(Replacement::Parsed(text)) => {
                    if depth >= MAX_ENTITY_DEPTH {
                        return Err((ErrorKind::RecursiveEntity(entity.to_string()), amp));
                    }
                    // Offsets inside replacement text are meaningless to the caller
                    let expanded = decode_entities(text, table, depth + 1).map_err(|(kind, _)| (kind, amp))?;
                    if expanded.len() > table.expansion_limit {
                        return Err((ErrorKind::EntityExpansionLimit(entity.to_string()), amp));
                    }
                    result.push_str(&expanded);
                }
                None if super::unicode::is_valid_name(entity) => {
                    return Err((ErrorKind::UnknownEntity(entity.to_string()), amp));
                }
                None => return Err((ErrorKind::Unterminated("entity reference"), amp)),
            }
        }

        pos = semi + 1;
    }

    result.push_str(&input[pos..]);
    Ok(result)
}

/// Decode a numeric character reference body (after `&#`)
fn decode_numeric(entity: &str) -> Option<char> {
    let codepoint = if let Some(hex) = entity.strip_prefix('x') {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()?
    } else {
        if entity.is_empty() || !entity.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        entity.parse::<u32>().ok()?
    };

    if !is_valid_xml_codepoint(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Encode text for XML output
///
/// `\r` is written as a character reference so that it survives line-ending
/// normalization on the way back in.
pub fn encode_text(input: &str) -> Cow<'_, str> {
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'\r')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Encode text for use in a double-quoted attribute value
///
/// Whitespace other than a plain space is written as character references so
/// that attribute-value normalization leaves it untouched.
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    if !input
        .bytes()
        .any(|b| matches!(b, b'<' | b'&' | b'"' | b'\t' | b'\n' | b'\r'))
    {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\t' => result.push_str("&#9;"),
            '\n' => result.push_str("&#10;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> Result<Cow<'_, str>, DecodeError> {
        decode_text(input, &EntityTable::new())
    }

    #[test]
    fn test_no_entities() {
        let result = decode("Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode("&lt;hello&gt; &amp; &quot;world&quot; &apos;").unwrap();
        assert_eq!(result, "<hello> & \"world\" '");
    }

    #[test]
    fn test_numeric_decimal_and_hex() {
        assert_eq!(decode("&#65;&#66;&#x43;").unwrap(), "ABC");
        assert_eq!(decode("&#x1F600;").unwrap(), "😀");
    }

    #[test]
    fn test_invalid_char_ref() {
        let err = decode("ab&#0;").unwrap_err();
        assert_eq!(err, (ErrorKind::InvalidCharRef("#0".to_string()), 2));
        assert!(decode("&#xZZ;").is_err());
        assert!(decode("&#;").is_err());
    }

    #[test]
    fn test_unknown_entity_is_error() {
        let err = decode("&unknown;").unwrap_err();
        assert_eq!(err.0, ErrorKind::UnknownEntity("unknown".to_string()));
    }

    #[test]
    fn test_unterminated_reference() {
        assert!(decode("fish & chips").is_err());
    }

    #[test]
    fn test_custom_entities() {
        let mut extra = HashMap::new();
        extra.insert("nbsp".to_string(), "\u{A0}".to_string());
        let table = EntityTable::with_entities(&extra);
        assert_eq!(decode_text("a&nbsp;b", &table).unwrap(), "a\u{A0}b");
    }

    #[test]
    fn test_first_declaration_wins() {
        let mut table = EntityTable::new();
        table.declare("x", "one".to_string());
        table.declare("x", "two".to_string());
        assert_eq!(decode_text("&x;", &table).unwrap(), "one");
    }

    #[test]
    fn test_nested_declared_entities() {
        let mut table = EntityTable::new();
        table.declare("inner", "&lt;b&gt;".to_string());
        table.declare("outer", "[&inner;]".to_string());
        assert_eq!(decode_text("&outer;", &table).unwrap(), "[<b>]");
    }

    #[test]
    fn test_recursive_entity_is_error() {
        let mut table = EntityTable::new();
        table.declare("a", "&b;".to_string());
        table.declare("b", "&a;".to_string());
        let err = decode_text("x&a;", &table).unwrap_err();
        assert!(matches!(err.0, ErrorKind::RecursiveEntity(_)));
        assert_eq!(err.1, 1);
    }

    #[test]
    fn test_expansion_limit() {
        let mut table = EntityTable::new().with_expansion_limit(8);
        table.declare("big", "0123456789".to_string());
        let err = decode_text("&big;", &table).unwrap_err();
        assert!(matches!(err.0, ErrorKind::EntityExpansionLimit(_)));
    }

    #[test]
    fn test_literal_entities_are_not_reparsed() {
        let mut extra = HashMap::new();
        extra.insert("amp2".to_string(), "&amp;".to_string());
        let table = EntityTable::with_entities(&extra);
        assert_eq!(decode_text("&amp2;", &table).unwrap(), "&amp;");
        assert!(table.contains("amp2"));
        assert!(table.contains("lt"));
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("<hello> & \"world\""), "&lt;hello&gt; &amp; \"world\"");
        assert!(matches!(encode_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_attribute() {
        assert_eq!(encode_attribute("a\"b\tc<"), "a&quot;b&#9;c&lt;");
    }
}
