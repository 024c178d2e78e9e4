//! Byte cursor with checkpoint/restore backtracking
//!
//! The cursor is the only component that moves through the input. It works
//! on bytes, returns a `0` sentinel instead of failing at end of input, and
//! keeps an explicit stack of saved offsets for speculative lookahead.

use crate::error::Position;
use crate::lexer::CHARACTER_TABLE;
use smallvec::SmallVec;

/// Positional scanner over immutable configuration text
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Input text being scanned
    input: &'a str,
    /// Current byte offset into `input`
    offset: usize,
    /// Saved offsets, innermost last
    checkpoints: SmallVec<[usize; 4]>,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            checkpoints: SmallVec::new(),
        }
    }

    /// Returns the underlying source text
    #[inline(always)]
    pub fn source(&self) -> &'a str {
        self.input
    }

    /// Returns the current byte offset
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the line/column position of the current offset
    pub fn position(&self) -> Position {
        Position::locate(self.input, self.offset)
    }

    /// Returns the line/column position of an arbitrary offset
    pub fn position_of(&self, offset: usize) -> Position {
        Position::locate(self.input, offset)
    }

    /// Saves the current offset
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(self.offset);
    }

    /// Rewinds to the most recently saved offset and drops it.
    ///
    /// # Panics
    ///
    /// Panics when no checkpoint is saved.
    pub fn restore(&mut self) {
        match self.checkpoints.pop() {
            Some(offset) => self.offset = offset,
            None => panic!("Cursor::restore called without a matching checkpoint"),
        }
    }

    /// Returns the number of saved checkpoints
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Returns true once every byte has been consumed
    #[inline(always)]
    pub fn at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    #[inline(always)]
    fn remaining(&self) -> &'a [u8] {
        self.input.as_bytes().get(self.offset..).unwrap_or_default()
    }

    /// Returns true if the remaining input starts with `pattern`
    pub fn matches(&self, pattern: &str) -> bool {
        self.remaining().starts_with(pattern.as_bytes())
    }

    /// Returns true if any pattern matches.
    ///
    /// A pattern that would consume exactly the rest of the input does not
    /// count, so a lone trailing `#` or `=` is never matched here.
    pub fn matches_any(&self, patterns: &[&str]) -> bool {
        let remaining = self.remaining();
        patterns.iter().any(|pattern| {
            pattern.len() < remaining.len() && remaining.starts_with(pattern.as_bytes())
        })
    }

    /// Consumes and returns `length` bytes, or nothing if fewer remain
    pub fn take(&mut self, length: usize) -> &'a [u8] {
        let remaining = self.remaining();
        if length > remaining.len() {
            return &[];
        }
        self.offset += length;
        &remaining[..length]
    }

    /// Returns the current byte, or `0` at end of input
    #[inline(always)]
    pub fn peek(&self) -> u8 {
        self.remaining().first().copied().unwrap_or(0)
    }

    /// Consumes the current byte, or returns `0` at end of input
    #[inline(always)]
    pub fn take_one(&mut self) -> u8 {
        let byte = self.peek();
        if !self.at_end() {
            self.offset += 1;
        }
        byte
    }

    /// Consumes a run of space, tab, CR and LF
    pub fn skip_whitespace(&mut self) {
        while !self.at_end() && CHARACTER_TABLE.is_whitespace(self.peek()) {
            self.offset += 1;
        }
    }

    /// Decodes the character starting at the current offset
    pub fn current_char(&self) -> Option<char> {
        self.input
            .get(self.offset..)
            .and_then(|rest| rest.chars().next())
    }

    /// Returns the text between `start` and the current offset.
    ///
    /// `None` when either end does not fall on a character boundary.
    pub fn slice_from(&self, start: usize) -> Option<&'a str> {
        self.input.get(start..self.offset)
    }
}
