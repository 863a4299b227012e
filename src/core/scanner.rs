//! SIMD-accelerated XML scanning using memchr
//!
//! The scanner works on decoded UTF-8 text. Every delimiter it searches for is
//! ASCII, so positions it returns are always character boundaries.

use super::unicode::{is_name_char, is_name_start_char};
use memchr::{memchr, memmem};

/// Scanner for XML delimiter detection
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// The whole input
    #[inline]
    pub fn input(&self) -> &'a str {
        self.input
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get remaining text
    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Get a slice from start to end positions
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Peek at the current character
    #[inline]
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace, returning whether any was skipped
    #[inline]
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
        self.pos > start
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input.as_bytes()[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the next occurrence of a multi-byte delimiter such as `-->`
    #[inline]
    pub fn find_str(&self, needle: &str) -> Option<usize> {
        memmem::find(&self.input.as_bytes()[self.pos..], needle.as_bytes()).map(|i| self.pos + i)
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside quotes
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut pos = self.pos;
        let mut quote: Option<u8> = None;

        while pos < bytes.len() {
            match (bytes[pos], quote) {
                (b'"', None) | (b'\'', None) => quote = Some(bytes[pos]),
                (b, Some(q)) if b == q => quote = None,
                (b'>', None) => return Some(pos),
                _ => {}
            }
            pos += 1;
        }
        None
    }

    /// Check if input starts with a string at current position
    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Read an XML name at the current position, advancing past it
    pub fn read_name(&mut self) -> Option<&'a str> {
        let rest = self.remaining();
        let mut chars = rest.char_indices();

        match chars.next() {
            Some((_, c)) if is_name_start_char(c) => {}
            _ => return None,
        }

        let end = chars
            .find(|&(_, c)| !is_name_char(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        self.pos += end;
        Some(&rest[..end])
    }
}
