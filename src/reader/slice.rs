//! Zero-Copy Slice Parser
//!
//! Parses XML from decoded text with zero-copy semantics.
//! Input references are maintained directly in the output; only text that
//! needed entity decoding is owned.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::parse_attributes;
use crate::core::dtd::{declare_entities, parse_doctype};
use crate::core::entities::{decode_text, EntityTable};
use crate::core::scanner::Scanner;
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::core::unicode::find_invalid_char;
use crate::error::{ErrorKind, ParseError, Result};
use std::borrow::Cow;

/// Zero-copy XML reader over a string slice
pub struct SliceReader<'a> {
    input: &'a str,
    tokenizer: Tokenizer<'a>,
    entities: EntityTable,
    /// Start offset of the last event returned
    offset: usize,
    /// End offset of the last event returned
    end: usize,
    validated: bool,
    finished: bool,
}

impl<'a> SliceReader<'a> {
    /// Create a new slice reader knowing only the predefined entities
    pub fn new(input: &'a str) -> Self {
        Self::with_entities(input, EntityTable::new())
    }

    /// Create a reader that also resolves the given named entities
    pub fn with_entities(input: &'a str, entities: EntityTable) -> Self {
        SliceReader {
            input,
            tokenizer: Tokenizer::new(input),
            entities,
            offset: 0,
            end: 0,
            validated: false,
            finished: false,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Byte offset where the most recent event started
    pub fn event_offset(&self) -> usize {
        self.offset
    }

    /// Raw markup of the most recent event, before entity decoding
    pub fn event_source(&self) -> &'a str {
        &self.input[self.offset..self.end]
    }

    /// Build a syntax error located in this reader's input
    pub fn error(&self, kind: ErrorKind, offset: usize) -> ParseError {
        ParseError::syntax(kind, self.input, offset)
    }

    /// Get the next XML event
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>> {
        let input = self.input;
        let located = |(kind, at): (ErrorKind, usize)| ParseError::syntax(kind, input, at);

        if !self.validated {
            self.validated = true;
            if let Some((at, c)) = find_invalid_char(input) {
                return Err(located((ErrorKind::InvalidChar(c as u32), at)));
            }
        }

        loop {
            let token = self.tokenizer.next_token().map_err(located)?;
            self.offset = token.span.0;
            self.end = token.span.1;

            match token.kind {
                TokenKind::Eof => return Ok(XmlEvent::EndDocument),

                TokenKind::StartTag => {
                    return self.start_element(&token).map(XmlEvent::StartElement);
                }

                TokenKind::EmptyTag => {
                    return self.start_element(&token).map(XmlEvent::EmptyElement);
                }

                TokenKind::EndTag => {
                    return Ok(XmlEvent::EndElement(EndElement::new(token.name.unwrap_or_default())));
                }

                TokenKind::Text => {
                    let raw = token.content.unwrap_or_default();
                    if raw.is_empty() {
                        continue;
                    }
                    let text = decode_text(raw, &self.entities)
                        .map_err(|(kind, at)| located((kind, token.span.0 + at)))?;
                    return Ok(XmlEvent::Text(text));
                }

                TokenKind::CData => return Ok(XmlEvent::CData(token.content.unwrap_or_default())),

                TokenKind::Comment => return Ok(XmlEvent::Comment(token.content.unwrap_or_default())),

                TokenKind::ProcessingInstruction => {
                    return Ok(XmlEvent::ProcessingInstruction {
                        target: token.name.unwrap_or_default(),
                        data: token.content.unwrap_or_default(),
                    });
                }

                TokenKind::XmlDeclaration => return self.declaration(&token),

                TokenKind::DocType => {
                    let content = token.content.unwrap_or_default();
                    let decl = parse_doctype(content, token.content_offset(input)).map_err(located)?;
                    if let Some(subset) = decl.internal_subset {
                        let declared =
                            declare_entities(subset, decl.subset_offset, &mut self.entities).map_err(located)?;
                        tracing::trace!(declared, "internal subset entities");
                    }
                    return Ok(XmlEvent::DocType(decl));
                }
            }
        }
    }

    /// Parse the attributes of a start or empty tag token
    fn start_element(&self, token: &Token<'a>) -> Result<StartElement<'a>> {
        let content = token.content.unwrap_or_default();
        let begin = token.content_offset(self.input);

        let mut scanner = Scanner::new(self.input);
        scanner.set_position(begin);
        let attributes = parse_attributes(&mut scanner, begin + content.len(), &self.entities)
            .map_err(|(kind, at)| self.error(kind, at))?;

        Ok(StartElement::new(token.name.unwrap_or_default(), attributes))
    }

    /// Parse `version`, `encoding` and `standalone`, in that order
    fn declaration(&self, token: &Token<'a>) -> Result<XmlEvent<'a>> {
        let content = token.content.unwrap_or_default();
        let begin = token.content_offset(self.input);
        let malformed = |msg, at| self.error(ErrorKind::MalformedDeclaration(msg), at);

        let mut scanner = Scanner::new(self.input);
        scanner.set_position(begin);
        let attributes = parse_attributes(&mut scanner, begin + content.len(), &EntityTable::new())
            .map_err(|(kind, at)| self.error(kind, at))?;
        let mut attributes = attributes.into_iter().peekable();

        let version = match attributes.next() {
            Some(attr) if attr.name == "version" => {
                if !is_valid_version(&attr.value) {
                    return Err(malformed("unsupported version", attr.offset));
                }
                attr.value
            }
            _ => return Err(malformed("version is required", begin)),
        };

        let encoding = match attributes.next_if(|a| a.name == "encoding") {
            Some(attr) if !is_valid_encoding_name(&attr.value) => {
                return Err(malformed("invalid encoding name", attr.offset));
            }
            attr => attr.map(|a| a.value),
        };

        let standalone = match attributes.next_if(|a| a.name == "standalone") {
            Some(attr) => match attr.value.as_ref() {
                "yes" => Some(true),
                "no" => Some(false),
                _ => return Err(malformed("standalone must be `yes` or `no`", attr.offset)),
            },
            None => None,
        };

        if let Some(extra) = attributes.next() {
            return Err(malformed("unexpected pseudo-attribute", extra.offset));
        }

        Ok(XmlEvent::XmlDeclaration {
            version,
            encoding,
            standalone,
        })
    }
}

/// VersionNum ::= '1.' [0-9]+
fn is_valid_version(version: &Cow<'_, str>) -> bool {
    version
        .strip_prefix("1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*
fn is_valid_encoding_name(name: &Cow<'_, str>) -> bool {
    let mut bytes = name.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<XmlEvent<'a>>;

    /// Yields events up to (not including) `EndDocument`, stopping after the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_event() {
            Ok(XmlEvent::EndDocument) => {
                self.finished = true;
                None
            }
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse XML text and return all events
pub fn parse_events(input: &str) -> Result<Vec<XmlEvent<'_>>> {
    SliceReader::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dtd::ExternalIdDecl;

    #[test]
    fn test_simple_element() {
        let events = parse_events("<root>hello</root>").unwrap();
        assert_eq!(events.len(), 3);

        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name == "root"));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t == "hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name == "root"));
    }

    #[test]
    fn test_empty_element() {
        let events = parse_events("<br/>").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], XmlEvent::EmptyElement(e) if e.name == "br"));
    }

    #[test]
    fn test_attributes() {
        let events = parse_events(r#"<div id="main" class="a &amp; b"/>"#).unwrap();
        let XmlEvent::EmptyElement(e) = &events[0] else {
            panic!("Expected EmptyElement");
        };
        assert_eq!(e.attribute_value("id"), Some("main"));
        assert_eq!(e.attribute_value("class"), Some("a & b"));
    }

    #[test]
    fn test_cdata() {
        let events = parse_events("<script><![CDATA[alert('<hi>')]]></script>").unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], XmlEvent::CData("alert('<hi>')"));
    }

    #[test]
    fn test_comment_and_pi() {
        let events = parse_events("<root><!-- note --><?php echo 1; ?></root>").unwrap();
        assert_eq!(events[1], XmlEvent::Comment(" note "));
        assert_eq!(
            events[2],
            XmlEvent::ProcessingInstruction {
                target: "php",
                data: "echo 1; "
            }
        );
    }

    #[test]
    fn test_declaration() {
        let events = parse_events("<?xml version=\"1.0\" encoding='utf-8' standalone=\"yes\"?><r/>").unwrap();
        assert_eq!(
            events[0],
            XmlEvent::XmlDeclaration {
                version: Cow::Borrowed("1.0"),
                encoding: Some(Cow::Borrowed("utf-8")),
                standalone: Some(true),
            }
        );
    }

    #[test]
    fn test_bad_declarations() {
        assert!(parse_events("<?xml?><r/>").is_err());
        assert!(parse_events("<?xml encoding='utf-8'?><r/>").is_err());
        assert!(parse_events("<?xml version='2.0'?><r/>").is_err());
        assert!(parse_events("<?xml version='1.0' standalone='maybe'?><r/>").is_err());
        assert!(parse_events("<?xml version='1.0' standalone='no' encoding='utf-8'?><r/>").is_err());
    }

    #[test]
    fn test_doctype_entities() {
        let input = r#"<!DOCTYPE r SYSTEM "r.dtd" [<!ENTITY who "world">]><r>hello &who;</r>"#;
        let events = parse_events(input).unwrap();
        let XmlEvent::DocType(decl) = &events[0] else {
            panic!("Expected DocType");
        };
        assert_eq!(decl.name, "r");
        assert_eq!(decl.external_id, Some(ExternalIdDecl::System("r.dtd")));
        assert!(matches!(&events[2], XmlEvent::Text(t) if t == "hello world"));
    }

    #[test]
    fn test_unknown_entity_position() {
        let err = parse_events("<r>\n  &nope;</r>").unwrap_err();
        match err {
            ParseError::Syntax { kind, pos } => {
                assert_eq!(kind, ErrorKind::UnknownEntity("nope".to_string()));
                assert_eq!((pos.line, pos.col), (2, 3));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_char() {
        let err = parse_events("<r>\u{7}</r>").unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::InvalidChar(7)));
    }

    #[test]
    fn test_event_source_is_raw() {
        let mut reader = SliceReader::new("<a>x&amp;y</a>");
        reader.next_event().unwrap();
        assert_eq!(reader.next_event().unwrap(), XmlEvent::Text(Cow::Owned("x&y".into())));
        assert_eq!(reader.event_source(), "x&amp;y");
    }

    #[test]
    fn test_event_offset() {
        let mut reader = SliceReader::new("<a><b/></a>");
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        assert_eq!(reader.event_offset(), 3);
    }
}
