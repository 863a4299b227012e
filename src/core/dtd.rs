//! DOCTYPE Declaration and Internal DTD Subset
//!
//! The declaration is split into root name, external identifier and raw
//! internal subset. Within the subset only general entity declarations are
//! interpreted: their replacement text is registered so references in the
//! document body decode. Element, attribute list and notation declarations are
//! skipped. Parameter entities and external entities are never expanded.

use super::entities::{DecodeError, EntityTable};
use super::scanner::Scanner;
use super::unicode::is_valid_name;
use crate::error::ErrorKind;
use memchr::{memchr, memmem};

/// External identifier of a DOCTYPE declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalIdDecl<'a> {
    System(&'a str),
    /// Public identifier, system literal
    Public(&'a str, &'a str),
}

/// A parsed `<!DOCTYPE ...>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTypeDecl<'a> {
    pub name: &'a str,
    pub external_id: Option<ExternalIdDecl<'a>>,
    /// Raw text between `[` and `]`
    pub internal_subset: Option<&'a str>,
    /// Offset of the internal subset in the document
    pub subset_offset: usize,
}

/// Parse the body of a DOCTYPE declaration (the text after `<!DOCTYPE`)
///
/// `base` is the offset of `content` in the document.
pub fn parse_doctype(content: &str, base: usize) -> Result<DocTypeDecl<'_>, DecodeError> {
    let mut scanner = Scanner::new(content);
    let malformed = |msg, at: usize| (ErrorKind::MalformedDoctype(msg), base + at);

    if !scanner.skip_whitespace() {
        return Err(malformed("whitespace required after DOCTYPE", 0));
    }
    let name = scanner
        .read_name()
        .ok_or_else(|| malformed("expected root element name", scanner.position()))?;
    let had_space = scanner.skip_whitespace();

    let external_id = if scanner.starts_with("SYSTEM") || scanner.starts_with("PUBLIC") {
        if !had_space {
            return Err(malformed("whitespace required before external identifier", scanner.position()));
        }
        let public = scanner.starts_with("PUBLIC");
        scanner.advance(6);

        if public {
            let pubid = read_literal(&mut scanner, base)?;
            if let Some(bad) = pubid.find(|c: char| !is_pubid_char(c)) {
                return Err(malformed("invalid character in public identifier", bad));
            }
            let system = read_literal(&mut scanner, base)?;
            scanner.skip_whitespace();
            Some(ExternalIdDecl::Public(pubid, system))
        } else {
            let system = read_literal(&mut scanner, base)?;
            scanner.skip_whitespace();
            Some(ExternalIdDecl::System(system))
        }
    } else {
        None
    };

    let mut internal_subset = None;
    let mut subset_offset = 0;
    if scanner.peek() == Some(b'[') {
        let open = scanner.position() + 1;
        let close = content
            .rfind(']')
            .filter(|&close| close >= open)
            .ok_or_else(|| malformed("unterminated internal subset", open))?;
        internal_subset = Some(&content[open..close]);
        subset_offset = base + open;
        scanner.set_position(close + 1);
        scanner.skip_whitespace();
    }

    if !scanner.is_eof() {
        return Err(malformed("unexpected content in DOCTYPE", scanner.position()));
    }

    Ok(DocTypeDecl {
        name,
        external_id,
        internal_subset,
        subset_offset,
    })
}

/// Read whitespace followed by a quoted literal
fn read_literal<'a>(scanner: &mut Scanner<'a>, base: usize) -> Result<&'a str, DecodeError> {
    if !scanner.skip_whitespace() {
        return Err((
            ErrorKind::MalformedDoctype("whitespace required before literal"),
            base + scanner.position(),
        ));
    }
    let quote = match scanner.peek() {
        Some(q @ (b'"' | b'\'')) => q,
        _ => {
            return Err((
                ErrorKind::MalformedDoctype("expected quoted literal"),
                base + scanner.position(),
            ))
        }
    };
    scanner.advance(1);
    let start = scanner.position();
    let end = scanner
        .find_byte(quote)
        .ok_or((ErrorKind::Unterminated("literal"), base + start))?;
    scanner.set_position(end + 1);
    Ok(scanner.slice(start, end))
}

/// PubidChar production
fn is_pubid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || " \r\n-'()+,./:=?;!*#@$_%".contains(c)
}

/// An entity declaration found in the internal subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDecl<'a> {
    pub name: &'a str,
    /// Literal replacement text; None for external entities
    pub value: Option<&'a str>,
    pub is_parameter: bool,
}

/// Scan the internal subset and register internal general entities
///
/// `base` is the offset of `subset` in the document, used for error positions.
pub fn declare_entities(subset: &str, base: usize, table: &mut EntityTable) -> Result<usize, DecodeError> {
    let mut declared = 0;
    for decl in scan_entity_decls(subset, base)? {
        if let (false, Some(value)) = (decl.is_parameter, decl.value) {
            table.declare(decl.name, value.to_string());
            declared += 1;
        }
    }
    Ok(declared)
}

/// Collect every `<!ENTITY ...>` declaration in the internal subset
pub fn scan_entity_decls(subset: &str, base: usize) -> Result<Vec<EntityDecl<'_>>, DecodeError> {
    let bytes = subset.as_bytes();
    let mut decls = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if matches!(bytes[pos], b' ' | b'\t' | b'\n' | b'\r') {
            pos += 1;
            continue;
        }

        let rest = &subset[pos..];
        if rest.starts_with("<!--") {
            pos = skip_past(subset, pos + 4, "-->")
                .ok_or((ErrorKind::Unterminated("comment"), base + pos))?;
        } else if rest.starts_with("<?") {
            pos = skip_past(subset, pos + 2, "?>")
                .ok_or((ErrorKind::Unterminated("processing instruction"), base + pos))?;
        } else if rest.starts_with("<!ENTITY") {
            let end = find_decl_end(subset, pos)
                .ok_or((ErrorKind::Unterminated("entity declaration"), base + pos))?;
            decls.push(parse_entity_decl(&subset[pos + 8..end], base + pos)?);
            pos = end + 1;
        } else if rest.starts_with("<!") {
            let end = find_decl_end(subset, pos)
                .ok_or((ErrorKind::Unterminated("markup declaration"), base + pos))?;
            pos = end + 1;
        } else if bytes[pos] == b'%' {
            // Parameter entity reference - not expanded
            let semi = memchr(b';', &bytes[pos..])
                .ok_or((ErrorKind::Unterminated("parameter entity reference"), base + pos))?;
            pos += semi + 1;
        } else {
            return Err((
                ErrorKind::MalformedDoctype("unexpected content in internal subset"),
                base + pos,
            ));
        }
    }

    Ok(decls)
}

/// Parse the body of `<!ENTITY body>`
fn parse_entity_decl(body: &str, offset: usize) -> Result<EntityDecl<'_>, DecodeError> {
    let malformed = |msg| (ErrorKind::MalformedDoctype(msg), offset);

    let mut rest = body.trim_start();
    let is_parameter = rest.starts_with('%');
    if is_parameter {
        rest = rest[1..].trim_start();
    }

    let name_end = rest
        .find(|c: char| c.is_ascii_whitespace())
        .ok_or_else(|| malformed("entity declaration needs a value"))?;
    let name = &rest[..name_end];
    if !is_valid_name(name) || name.contains(':') {
        return Err((ErrorKind::InvalidName(name.to_string()), offset));
    }
    rest = rest[name_end..].trim_start();

    if rest.starts_with("SYSTEM") || rest.starts_with("PUBLIC") {
        return Ok(EntityDecl {
            name,
            value: None,
            is_parameter,
        });
    }

    let quote = rest.chars().next().ok_or_else(|| malformed("missing entity value"))?;
    if quote != '"' && quote != '\'' {
        return Err(malformed("entity value must be quoted"));
    }
    let close = rest[1..]
        .find(quote)
        .ok_or_else(|| malformed("unterminated entity value"))?;
    let value = &rest[1..1 + close];
    if value.contains('%') {
        return Err(malformed("parameter entity references are not supported in entity values"));
    }
    if !rest[close + 2..].trim().is_empty() {
        return Err(malformed("unexpected content after entity value"));
    }

    Ok(EntityDecl {
        name,
        value: Some(value),
        is_parameter,
    })
}

fn skip_past(text: &str, from: usize, needle: &str) -> Option<usize> {
    memmem::find(&text.as_bytes()[from..], needle.as_bytes()).map(|i| from + i + needle.len())
}

/// Find the `>` closing a markup declaration, ignoring quoted literals
fn find_decl_end(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (b, quote) {
            (b'"' | b'\'', None) => quote = Some(b),
            (b, Some(q)) if b == q => quote = None,
            (b'>', None) => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entities::decode_text;

    #[test]
    fn test_doctype_name_only() {
        let decl = parse_doctype(" html", 0).unwrap();
        assert_eq!(decl.name, "html");
        assert_eq!(decl.external_id, None);
        assert_eq!(decl.internal_subset, None);
    }

    #[test]
    fn test_doctype_public() {
        let decl = parse_doctype(
            r#" html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" 'xhtml1-strict.dtd'"#,
            0,
        )
        .unwrap();
        assert_eq!(
            decl.external_id,
            Some(ExternalIdDecl::Public("-//W3C//DTD XHTML 1.0 Strict//EN", "xhtml1-strict.dtd"))
        );
    }

    #[test]
    fn test_doctype_system_with_subset() {
        let content = r#" doc SYSTEM "doc.dtd" [<!ENTITY a "]">] "#;
        let decl = parse_doctype(content, 100).unwrap();
        assert_eq!(decl.external_id, Some(ExternalIdDecl::System("doc.dtd")));
        assert_eq!(decl.internal_subset, Some(r#"<!ENTITY a "]">"#));
        assert_eq!(decl.subset_offset, 100 + 23);
    }

    #[test]
    fn test_doctype_errors() {
        assert!(parse_doctype("html", 0).is_err());
        assert!(parse_doctype(" html SYSTEM", 0).is_err());
        assert!(parse_doctype(" html PUBLIC \"{bad}\" \"x\"", 0).is_err());
        assert!(parse_doctype(" html junk", 0).is_err());
    }

    #[test]
    fn test_internal_entities() {
        let subset = r#"
            <!ENTITY title "My Title">
            <!ENTITY copy '&#169; 2024'>
        "#;
        let mut table = EntityTable::new();
        assert_eq!(declare_entities(subset, 0, &mut table).unwrap(), 2);
        assert_eq!(decode_text("&title; &copy;", &table).unwrap(), "My Title © 2024");
    }

    #[test]
    fn test_skips_other_declarations() {
        let subset = r#"<!ELEMENT doc (#PCDATA)>
            <!ATTLIST doc id CDATA "a>b">
            <!-- <!ENTITY hidden "no"> -->
            <?pi data?>
            %pe;
            <!ENTITY % pe "ignored">
            <!ENTITY ext SYSTEM "ext.xml">
            <!ENTITY shown "yes">"#;
        let decls = scan_entity_decls(subset, 0).unwrap();
        let names: Vec<_> = decls.iter().map(|d| d.name).collect();
        assert_eq!(names, ["pe", "ext", "shown"]);
        assert!(decls[0].is_parameter);
        assert_eq!(decls[1].value, None);

        let mut table = EntityTable::new();
        assert_eq!(declare_entities(subset, 0, &mut table).unwrap(), 1);
        assert!(table.contains("shown"));
        assert!(!table.contains("hidden"));
    }

    #[test]
    fn test_unterminated_declaration() {
        let err = scan_entity_decls("<!ENTITY a \"b\"", 10).unwrap_err();
        assert_eq!(err.1, 10);
    }

    #[test]
    fn test_garbage_in_subset() {
        assert!(scan_entity_decls("junk", 0).is_err());
    }
}
