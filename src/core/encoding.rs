//! XML Encoding Detection and Conversion
//!
//! Detects UTF-8, UTF-16 and UTF-32 (both byte orders) from the byte order
//! mark or, failing that, from the byte pattern of the leading `<`.
//! Everything is converted to UTF-8 before tokenizing.

use crate::error::{ParseError, Result};
use memchr::memchr;
use std::borrow::Cow;

/// Encoding family detected from the first bytes of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        match input {
            // BOMs. UTF-32 LE must be checked before UTF-16 LE (same first two bytes)
            [0xEF, 0xBB, 0xBF, ..] => XmlEncoding::Utf8,
            [0xFF, 0xFE, 0x00, 0x00, ..] => XmlEncoding::Utf32Le,
            [0x00, 0x00, 0xFE, 0xFF, ..] => XmlEncoding::Utf32Be,
            [0xFF, 0xFE, ..] => XmlEncoding::Utf16Le,
            [0xFE, 0xFF, ..] => XmlEncoding::Utf16Be,
            // No BOM - look at how '<' is laid out
            [b'<', 0x00, 0x00, 0x00, ..] => XmlEncoding::Utf32Le,
            [0x00, 0x00, 0x00, b'<', ..] => XmlEncoding::Utf32Be,
            [b'<', 0x00, ..] => XmlEncoding::Utf16Le,
            [0x00, b'<', ..] => XmlEncoding::Utf16Be,
            _ => XmlEncoding::Utf8,
        }
    }

    /// Length of the byte order mark for this encoding, if `input` has one
    fn bom_len(self, input: &[u8]) -> usize {
        let bom: &[u8] = match self {
            XmlEncoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            XmlEncoding::Utf16Le => &[0xFF, 0xFE],
            XmlEncoding::Utf16Be => &[0xFE, 0xFF],
            XmlEncoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            XmlEncoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        };
        if input.starts_with(bom) {
            bom.len()
        } else {
            0
        }
    }
}

/// Decode raw document bytes into UTF-8 text
///
/// The byte order mark, if any, is removed. For 8-bit input without a BOM the
/// `encoding` pseudo-attribute of the XML declaration picks between UTF-8,
/// US-ASCII and ISO-8859-1; anything else is rejected.
pub fn decode(input: &[u8]) -> Result<String> {
    let encoding = XmlEncoding::detect(input);
    let bytes = &input[encoding.bom_len(input)..];

    match encoding {
        XmlEncoding::Utf8 => {
            let declared = if encoding.bom_len(input) > 0 {
                None
            } else {
                declared_encoding(bytes)
            };
            match declared.as_deref() {
                None | Some("utf-8") | Some("utf8") => decode_utf8(bytes),
                Some("us-ascii") | Some("ascii") => decode_ascii(bytes),
                Some("iso-8859-1") | Some("latin1") | Some("latin-1") => Ok(decode_latin1(bytes)),
                // A UTF-16 declaration on 8-bit input without a BOM is undetectable input
                Some(other) => Err(ParseError::encoding(format!("unsupported encoding `{}`", other))),
            }
        }
        XmlEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
        XmlEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        XmlEncoding::Utf32Le => decode_utf32(bytes, u32::from_le_bytes),
        XmlEncoding::Utf32Be => decode_utf32(bytes, u32::from_be_bytes),
    }
}

/// Normalize line endings: `\r\n` and lone `\r` become `\n`
pub fn normalize_line_endings(text: String) -> String {
    if memchr(b'\r', text.as_bytes()).is_none() {
        return text;
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            result.push('\n');
        } else {
            result.push(c);
        }
    }
    result
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ParseError::encoding(format!("invalid UTF-8: {}", e)))
}

fn decode_ascii(bytes: &[u8]) -> Result<String> {
    match bytes.iter().position(|b| !b.is_ascii()) {
        Some(pos) => Err(ParseError::encoding(format!(
            "byte 0x{:02X} at offset {} is not US-ASCII",
            bytes[pos], pos
        ))),
        None => decode_utf8(bytes),
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(ParseError::encoding("invalid UTF-16: odd number of bytes"));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|e| ParseError::encoding(format!("invalid UTF-16: {}", e)))
}

fn decode_utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> Result<String> {
    if bytes.len() % 4 != 0 {
        return Err(ParseError::encoding("invalid UTF-32: length is not a multiple of 4"));
    }

    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let value = unit([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(value).ok_or_else(|| {
                ParseError::encoding(format!("invalid UTF-32: 0x{:08X} is not a scalar value", value))
            })
        })
        .collect()
}

/// Read the `encoding` pseudo-attribute of a leading XML declaration (lowercased)
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = memchr::memmem::find(bytes, b"?>")?;
    let decl = &bytes[5..end];
    let key = memchr::memmem::find(decl, b"encoding")?;
    let rest = &decl[key + b"encoding".len()..];

    let rest = trim_start(rest).strip_prefix(b"=")?;
    let rest = trim_start(rest);
    let quote = *rest.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let close = memchr(quote, &rest[1..])?;
    let value: Cow<'_, str> = String::from_utf8_lossy(&rest[1..1 + close]);
    Some(value.to_ascii_lowercase())
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        .count();
    &bytes[skip..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_le(text: &str, bom: bool) -> Vec<u8> {
        let mut out = if bom { vec![0xFF, 0xFE] } else { vec![] };
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    fn utf32_be(text: &str, bom: bool) -> Vec<u8> {
        let mut out = if bom { vec![0x00, 0x00, 0xFE, 0xFF] } else { vec![] };
        for c in text.chars() {
            out.extend_from_slice(&(c as u32).to_be_bytes());
        }
        out
    }

    #[test]
    fn test_detect_utf8() {
        assert_eq!(XmlEncoding::detect(b"<root/>"), XmlEncoding::Utf8);
        assert_eq!(XmlEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']), XmlEncoding::Utf8);
        assert_eq!(XmlEncoding::detect(b""), XmlEncoding::Utf8);
    }

    #[test]
    fn test_detect_utf16_and_utf32() {
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, b'<', 0x00]), XmlEncoding::Utf16Le);
        assert_eq!(XmlEncoding::detect(&[0xFE, 0xFF, 0x00, b'<']), XmlEncoding::Utf16Be);
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, 0x00, 0x00]), XmlEncoding::Utf32Le);
        assert_eq!(XmlEncoding::detect(&[0x00, 0x00, 0x00, b'<']), XmlEncoding::Utf32Be);
        assert_eq!(XmlEncoding::detect(&[b'<', 0x00, 0x00, 0x00]), XmlEncoding::Utf32Le);
        assert_eq!(XmlEncoding::detect(&[b'<', 0x00, b'r', 0x00]), XmlEncoding::Utf16Le);
    }

    #[test]
    fn test_decode_utf16_le_with_and_without_bom() {
        assert_eq!(decode(&utf16_le("<r>é</r>", true)).unwrap(), "<r>é</r>");
        assert_eq!(decode(&utf16_le("<r>é</r>", false)).unwrap(), "<r>é</r>");
    }

    #[test]
    fn test_decode_utf32_be() {
        assert_eq!(decode(&utf32_be("<r>😀</r>", true)).unwrap(), "<r>😀</r>");
        assert_eq!(decode(&utf32_be("<r/>", false)).unwrap(), "<r/>");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        assert_eq!(decode(&[0xEF, 0xBB, 0xBF, b'<', b'r', b'/', b'>']).unwrap(), "<r/>");
    }

    #[test]
    fn test_odd_utf16_is_error() {
        assert!(matches!(decode(&[0xFF, 0xFE, b'<']), Err(ParseError::Encoding(_))));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        assert!(matches!(decode(&[b'<', b'r', 0xC3, b'>']), Err(ParseError::Encoding(_))));
    }

    #[test]
    fn test_declared_latin1() {
        let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>\xE9</r>";
        let text = decode(input).unwrap();
        assert!(text.ends_with("<r>é</r>"));
    }

    #[test]
    fn test_declared_unsupported_encoding() {
        let input = b"<?xml version='1.0' encoding='Shift_JIS'?><r/>";
        assert!(matches!(decode(input), Err(ParseError::Encoding(_))));
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n".to_string()), "a\nb\nc\n");
        assert_eq!(normalize_line_endings("plain".to_string()), "plain");
    }
}
