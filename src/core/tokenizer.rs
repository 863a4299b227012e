//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end tags
//! - Text content
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations
//!
//! Tokens borrow from the input. Text is returned raw; entity decoding and
//! attribute parsing happen one layer up in the reader.

use super::scanner::Scanner;
use super::unicode::is_xml_whitespace;
use crate::error::ErrorKind;

/// Failure while tokenizing, with the byte offset where it was detected
pub type TokenError = (ErrorKind, usize);

/// Current parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Initial state before parsing starts
    Init,
    /// Inside text content between tags
    InsideText,
    /// Inside a markup construct (<...>)
    InsideMarkup,
    /// End of input reached
    Done,
}

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of file
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags: the element name. For PIs: the target
    pub name: Option<&'a str>,
    /// Raw content: text, CDATA body, comment body, PI data, declaration body.
    /// For start tags: the attribute region after the name
    pub content: Option<&'a str>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: &'a str) -> Self {
        self.content = Some(content);
        self
    }

    /// Offset where the token's content starts
    pub fn content_offset(&self, input: &str) -> usize {
        match self.content {
            Some(content) => content.as_ptr() as usize - input.as_ptr() as usize,
            None => self.span.0,
        }
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    state: ParseState,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            state: ParseState::Init,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Get the current position in the input
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    pub fn input(&self) -> &'a str {
        self.scanner.input()
    }

    /// Get the next token. Returns `Eof` at end of input, repeatedly
    pub fn next_token(&mut self) -> Result<Token<'a>, TokenError> {
        if self.state == ParseState::Init {
            self.state = ParseState::InsideText;
        }

        if self.state == ParseState::Done || self.scanner.is_eof() {
            self.state = ParseState::Done;
            let end = self.scanner.input().len();
            return Ok(Token::new(TokenKind::Eof, (end, end)));
        }

        match self.scanner.peek() {
            Some(b'<') => self.parse_markup(),
            _ => self.parse_text(),
        }
    }

    /// Parse text up to the next '<'
    fn parse_text(&mut self) -> Result<Token<'a>, TokenError> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_byte(b'<')
            .unwrap_or(self.scanner.input().len());
        let content = self.scanner.slice(start, end);

        if let Some(i) = content.find("]]>") {
            return Err((ErrorKind::CdataEndInText, start + i));
        }

        self.scanner.set_position(end);
        Ok(Token::new(TokenKind::Text, (start, end)).with_content(content))
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> Result<Token<'a>, TokenError> {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'
        self.state = ParseState::InsideMarkup;

        let token = match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => Err((ErrorKind::UnexpectedEof, start)),
        }?;

        self.state = ParseState::InsideText;
        Ok(token)
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        let name = self.read_name(start + 1, "expected element name after `<`")?;
        let name_end = self.scanner.position();

        let end = self
            .scanner
            .find_tag_end_quoted()
            .ok_or((ErrorKind::Unterminated("start tag"), start))?;

        let is_empty = end > name_end && self.scanner.slice(end - 1, end) == "/";
        let attrs_end = if is_empty { end - 1 } else { end };

        self.scanner.set_position(end + 1);

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, end + 1))
            .with_name(name)
            .with_content(self.scanner.slice(name_end, attrs_end)))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        self.scanner.advance(1); // Skip '/'

        let name = self.read_name(start + 2, "expected element name after `</`")?;
        self.scanner.skip_whitespace();

        match self.scanner.peek() {
            Some(b'>') => {}
            Some(_) => {
                return Err((
                    ErrorKind::MalformedTag("end tag cannot have attributes or other content"),
                    self.scanner.position(),
                ))
            }
            None => return Err((ErrorKind::Unterminated("end tag"), start)),
        }

        self.scanner.advance(1);
        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        self.scanner.advance(1); // Skip '!'

        if self.scanner.starts_with("--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with("[CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with("DOCTYPE") {
            self.parse_doctype(start)
        } else {
            Err((
                ErrorKind::MalformedTag("expected comment, CDATA section, or DOCTYPE after `<!`"),
                start,
            ))
        }
    }

    /// Parse a comment <!--...-->
    fn parse_comment(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        self.scanner.advance(2); // Skip '--'
        let content_start = self.scanner.position();

        let pos = self
            .scanner
            .find_str("--")
            .ok_or((ErrorKind::Unterminated("comment"), start))?;

        // The first "--" must be the start of "-->"
        self.scanner.set_position(pos);
        if !self.scanner.starts_with("-->") {
            return Err((ErrorKind::MalformedComment("`--` is not allowed inside a comment"), pos));
        }

        let content = self.scanner.slice(content_start, pos);
        self.scanner.advance(3); // Skip '-->'
        Ok(Token::new(TokenKind::Comment, (start, self.scanner.position())).with_content(content))
    }

    /// Parse a CDATA section <![CDATA[...]]>
    fn parse_cdata(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        self.scanner.advance(7); // Skip '[CDATA['
        let content_start = self.scanner.position();

        let pos = self
            .scanner
            .find_str("]]>")
            .ok_or((ErrorKind::Unterminated("CDATA section"), start))?;

        let content = self.scanner.slice(content_start, pos);
        self.scanner.set_position(pos + 3);
        Ok(Token::new(TokenKind::CData, (start, self.scanner.position())).with_content(content))
    }

    /// Parse a DOCTYPE declaration, including any internal subset
    ///
    /// The token content is everything between `<!DOCTYPE` and the closing `>`.
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        self.scanner.advance(7); // Skip 'DOCTYPE'
        let content_start = self.scanner.position();

        let mut in_subset = false;
        let mut quote: Option<u8> = None;

        while let Some(b) = self.scanner.peek() {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                self.scanner.advance(1);
                continue;
            }

            match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' if !in_subset => in_subset = true,
                b']' if in_subset => in_subset = false,
                b'<' if in_subset && self.scanner.starts_with("<!--") => {
                    let end = self
                        .scanner
                        .find_str("-->")
                        .ok_or((ErrorKind::Unterminated("comment"), self.scanner.position()))?;
                    self.scanner.set_position(end + 3);
                    continue;
                }
                b'<' if in_subset && self.scanner.starts_with("<?") => {
                    let end = self
                        .scanner
                        .find_str("?>")
                        .ok_or((ErrorKind::Unterminated("processing instruction"), self.scanner.position()))?;
                    self.scanner.set_position(end + 2);
                    continue;
                }
                b'>' if !in_subset => {
                    let content = self.scanner.slice(content_start, self.scanner.position());
                    self.scanner.advance(1);
                    return Ok(Token::new(TokenKind::DocType, (start, self.scanner.position()))
                        .with_content(content));
                }
                _ => {}
            }
            self.scanner.advance(1);
        }

        Err((ErrorKind::Unterminated("DOCTYPE declaration"), start))
    }

    /// Parse a processing instruction or the XML declaration
    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, TokenError> {
        self.scanner.advance(1); // Skip '?'

        let target = self.read_name(start + 2, "expected processing instruction target")?;
        let target_end = self.scanner.position();

        let end = self
            .scanner
            .find_str("?>")
            .ok_or((ErrorKind::Unterminated("processing instruction"), start))?;

        // Target must be followed by whitespace or the closing "?>"
        if end > target_end && !self.scanner.peek_char().is_some_and(is_xml_whitespace) {
            return Err((
                ErrorKind::MalformedInstruction("whitespace required after target"),
                target_end,
            ));
        }

        let raw = self.scanner.slice(target_end, end);
        self.scanner.set_position(end + 2);

        if target.eq_ignore_ascii_case("xml") {
            if start != 0 || target != "xml" {
                return Err((
                    ErrorKind::MalformedInstruction("target `xml` is reserved for the XML declaration at the start of the document"),
                    start,
                ));
            }
            // Pseudo-attributes are parsed like tag attributes, leading whitespace included
            return Ok(Token::new(TokenKind::XmlDeclaration, (start, end + 2))
                .with_name(target)
                .with_content(raw));
        }

        Ok(Token::new(TokenKind::ProcessingInstruction, (start, end + 2))
            .with_name(target)
            .with_content(raw.trim_start_matches(is_xml_whitespace)))
    }

    fn read_name(&mut self, at: usize, message: &'static str) -> Result<&'a str, TokenError> {
        self.scanner.set_position(at);
        match self.scanner.read_name() {
            Some(name) => Ok(name),
            None if self.scanner.is_eof() => Err((ErrorKind::UnexpectedEof, at)),
            None => Err((ErrorKind::MalformedTag(message), at)),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, TokenError>;

    /// Yields tokens up to (not including) `Eof`, stopping after the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ParseState::Done {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.state = ParseState::Done;
                Some(Err(e))
            }
        }
    }
}
