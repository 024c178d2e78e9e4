//! HOCON lexical analyzer
//!
//! This module turns configuration text into tokens. Every position is
//! classified by trying a fixed, ordered list of rules: one list for key and
//! structural context ([`HoconLexer::next_token`]) and another for value
//! context ([`HoconLexer::pull_value`]). The first rule that matches wins.

use crate::cursor::Cursor;
use crate::error::{LexError, Position};
use std::borrow::Cow;
use tracing::trace;

/// Characters that may not appear in an unquoted value
const NOT_IN_UNQUOTED_TEXT: &[u8] = b"$\"{}[]:=,#`^?!@*&\\";

/// Directive keyword recognized by the include probe
const INCLUDE_KEYWORD: &str = "include";

const TRIPLE_QUOTE: &str = "\"\"\"";

const HIGH_SURROGATES: std::ops::Range<u32> = 0xD800..0xDC00;
const LOW_SURROGATES: std::ops::Range<u32> = 0xDC00..0xE000;

/// Length of a `\uXXXX` escape
const LOW_SURROGATE_ESCAPE_LEN: usize = 6;

/// Bitfield flags for character classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterFlags(u8);

impl CharacterFlags {
    /// Whitespace characters (space, tab, CR, LF)
    pub const WHITESPACE: Self = Self(1 << 0);
    /// Inline whitespace (space, tab)
    pub const SPACE_OR_TAB: Self = Self(1 << 1);
    /// Characters that end an unquoted key
    pub const NOT_IN_UNQUOTED_KEY: Self = Self(1 << 2);
    /// Characters that end an unquoted value
    pub const NOT_IN_UNQUOTED_TEXT: Self = Self(1 << 3);
    /// Hexadecimal digits
    pub const HEX_DIGIT: Self = Self(1 << 4);

    /// Creates empty flags
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Checks if any of the given flags are set
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Returns the union of two flag sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Character lookup table for O(1) byte classification
#[derive(Debug, Clone)]
pub struct CharacterTable([CharacterFlags; 256]);

impl CharacterTable {
    /// Creates the table at compile time
    pub const fn new() -> Self {
        let mut table = [CharacterFlags::empty(); 256];
        let mut i = 0;

        while i < 256 {
            let ch = i as u8;
            let mut flags = CharacterFlags::empty();

            match ch {
                b' ' | b'\t' => {
                    flags = flags.union(CharacterFlags::WHITESPACE);
                    flags = flags.union(CharacterFlags::SPACE_OR_TAB);
                }
                b'\r' | b'\n' => flags = flags.union(CharacterFlags::WHITESPACE),
                _ => {}
            }

            if ch.is_ascii_hexdigit() {
                flags = flags.union(CharacterFlags::HEX_DIGIT);
            }

            let mut j = 0;
            while j < NOT_IN_UNQUOTED_TEXT.len() {
                if NOT_IN_UNQUOTED_TEXT[j] == ch {
                    flags = flags.union(CharacterFlags::NOT_IN_UNQUOTED_TEXT);
                    flags = flags.union(CharacterFlags::NOT_IN_UNQUOTED_KEY);
                }
                j += 1;
            }

            // Dots split key paths but are ordinary text inside values
            if ch == b'.' {
                flags = flags.union(CharacterFlags::NOT_IN_UNQUOTED_KEY);
            }

            table[i] = flags;
            i += 1;
        }

        Self(table)
    }

    /// Tests if a byte has any of the given flags
    #[inline(always)]
    pub const fn test_character(&self, ch: u8, flags: CharacterFlags) -> bool {
        self.0[ch as usize].intersects(flags)
    }

    #[inline(always)]
    pub const fn is_whitespace(&self, ch: u8) -> bool {
        self.test_character(ch, CharacterFlags::WHITESPACE)
    }

    #[inline(always)]
    pub const fn is_space_or_tab(&self, ch: u8) -> bool {
        self.test_character(ch, CharacterFlags::SPACE_OR_TAB)
    }

    #[inline(always)]
    pub const fn is_forbidden_in_key(&self, ch: u8) -> bool {
        self.test_character(ch, CharacterFlags::NOT_IN_UNQUOTED_KEY)
    }

    #[inline(always)]
    pub const fn is_forbidden_in_text(&self, ch: u8) -> bool {
        self.test_character(ch, CharacterFlags::NOT_IN_UNQUOTED_TEXT)
    }

    #[inline(always)]
    pub const fn is_hex_digit(&self, ch: u8) -> bool {
        self.test_character(ch, CharacterFlags::HEX_DIGIT)
    }
}

impl Default for CharacterTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Global character table instance
pub static CHARACTER_TABLE: CharacterTable = CharacterTable::new();

/// Parses exactly four hex digits as a UTF-16 code unit
fn parse_code_unit(digits: &[u8]) -> Option<u32> {
    if digits.len() != 4 || !digits.iter().all(|&b| CHARACTER_TABLE.is_hex_digit(b)) {
        return None;
    }
    let hex = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(hex, 16).ok()
}

/// Configuration options for the lexer
#[derive(Debug, Clone)]
pub struct LexerConfig {
    /// Maximum quoted string payload in bytes
    pub max_string_length: usize,
    /// Maximum number of tokens to prevent runaway input
    pub max_tokens: usize,
}

impl LexerConfig {
    /// Creates a lexer configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum string length
    pub fn with_max_string_length(mut self, max_string_length: usize) -> Self {
        self.max_string_length = max_string_length;
        self
    }

    /// Sets the maximum token count
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            max_string_length: 1024 * 1024, // 1MB default
            max_tokens: 1_000_000,
        }
    }
}

/// HOCON token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    EndOfInput,
    Dot,         // .
    ObjectStart, // {
    ObjectEnd,   // }
    Assign,      // = or :
    Comma,       // ,
    ArrayStart,  // [
    ArrayEnd,    // ]
    /// `include "path"` directive with the unquoted path
    Include(Cow<'a, str>),
    Key(Cow<'a, str>),
    LiteralValue(Cow<'a, str>),
    /// `${path}` placeholder with the path between the braces
    Substitution(Cow<'a, str>),
    Comment(Cow<'a, str>),
}

impl<'a> Token<'a> {
    /// Returns a string representation of the token type for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Token::EndOfInput => "end of input",
            Token::Dot => "'.'",
            Token::ObjectStart => "'{'",
            Token::ObjectEnd => "'}'",
            Token::Assign => "assignment",
            Token::Comma => "','",
            Token::ArrayStart => "'['",
            Token::ArrayEnd => "']'",
            Token::Include(_) => "include",
            Token::Key(_) => "key",
            Token::LiteralValue(_) => "literal value",
            Token::Substitution(_) => "substitution",
            Token::Comment(_) => "comment",
        }
    }
}

/// HOCON lexer over a [`Cursor`]
#[derive(Debug, Clone)]
pub struct HoconLexer<'a> {
    cursor: Cursor<'a>,
    config: LexerConfig,
    /// Token count for resource limiting
    token_count: usize,
}

impl<'a> HoconLexer<'a> {
    /// Creates a new lexer with default configuration
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, LexerConfig::default())
    }

    /// Creates a new lexer with custom configuration
    pub fn with_config(input: &'a str, config: LexerConfig) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            token_count: 0,
        }
    }

    /// Returns the lexer configuration
    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Returns the current byte offset
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    /// Returns the current line/column position
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// Returns the underlying source text
    pub fn source(&self) -> &'a str {
        self.cursor.source()
    }

    /// Returns the number of tokens produced so far
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Returns true once every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.cursor.at_end()
    }

    fn check_token_limit(&mut self) -> Result<(), LexError> {
        self.token_count += 1;
        if self.token_count > self.config.max_tokens {
            return Err(LexError::TokenLimitExceeded {
                limit: self.config.max_tokens,
                position: self.position(),
            });
        }
        Ok(())
    }

    fn check_string_length(&self, length: usize, start: usize) -> Result<(), LexError> {
        if length > self.config.max_string_length {
            return Err(LexError::StringTooLong {
                limit: self.config.max_string_length,
                position: self.cursor.position_of(start),
            });
        }
        Ok(())
    }

    fn unexpected_character(&self) -> LexError {
        LexError::UnexpectedCharacter {
            character: self.cursor.current_char().unwrap_or(char::REPLACEMENT_CHARACTER),
            position: self.position(),
        }
    }

    /// Returns the text consumed since `start`
    fn text_from(&self, start: usize) -> Result<&'a str, LexError> {
        self.cursor
            .slice_from(start)
            .ok_or_else(|| LexError::InvalidUtf8 {
                position: self.cursor.position_of(start),
            })
    }

    /// Produces the next token in key/structural context.
    ///
    /// Whitespace and comments are skipped first. Rules are tried in this
    /// order: dot, `{`, `}`, assignment, include directive, quoted key,
    /// unquoted key, `[`, `]`, end of input.
    pub fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        self.check_token_limit()?;
        self.skip_whitespace_and_comments();

        if self.cursor.matches(".") {
            return Ok(self.pull_single(Token::Dot));
        }
        if self.is_object_start() {
            return Ok(self.pull_single(Token::ObjectStart));
        }
        if self.cursor.matches("}") {
            return Ok(self.pull_single(Token::ObjectEnd));
        }
        if self.is_assignment() {
            return Ok(self.pull_single(Token::Assign));
        }
        if self.probe_include() {
            return self.pull_include();
        }
        if self.is_start_of_quoted_text() {
            return Ok(Token::Key(self.pull_quoted_text()?));
        }
        if self.is_unquoted_key_start() {
            return self.pull_unquoted_key();
        }
        if self.is_array_start() {
            return Ok(self.pull_single(Token::ArrayStart));
        }
        if self.is_array_end() {
            return Ok(self.pull_single(Token::ArrayEnd));
        }
        if self.cursor.at_end() {
            return Ok(Token::EndOfInput);
        }

        Err(self.unexpected_character())
    }

    /// Produces the next token in value context.
    ///
    /// Leading whitespace is not skipped. Rules are tried in this order:
    /// `{`, triple-quoted text, quoted text, unquoted text, `[`, `]`,
    /// substitution.
    pub fn pull_value(&mut self) -> Result<Token<'a>, LexError> {
        self.check_token_limit()?;

        if self.is_object_start() {
            return Ok(self.pull_single(Token::ObjectStart));
        }
        if self.is_start_of_triple_quoted_text() {
            return Ok(Token::LiteralValue(self.pull_triple_quoted_text()?));
        }
        if self.is_start_of_quoted_text() {
            return Ok(Token::LiteralValue(self.pull_quoted_text()?));
        }
        if self.is_unquoted_text() {
            return self.pull_unquoted_text();
        }
        if self.is_array_start() {
            return Ok(self.pull_single(Token::ArrayStart));
        }
        if self.is_array_end() {
            return Ok(self.pull_single(Token::ArrayEnd));
        }
        if self.is_substitution_start() {
            return self.pull_substitution();
        }

        let found = match self.cursor.current_char() {
            Some(ch) => format!("'{}'", ch),
            None if self.cursor.at_end() => "end of input".to_string(),
            None => "invalid UTF-8".to_string(),
        };
        Err(LexError::ExpectedValue {
            found,
            position: self.position(),
        })
    }

    /// Consumes one structural byte and returns its token
    fn pull_single(&mut self, token: Token<'a>) -> Token<'a> {
        self.cursor.take_one();
        token
    }

    /// Skips whitespace and `#` / `//` comments until neither remains
    pub fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.cursor.skip_whitespace();
            while self.is_start_of_comment() {
                self.pull_comment();
            }
            if !self.is_whitespace() {
                break;
            }
        }
    }

    fn pull_comment(&mut self) -> Token<'a> {
        let marker = if self.cursor.matches("//") { 2 } else { 1 };
        self.cursor.take(marker);
        Token::Comment(self.pull_rest_of_line())
    }

    /// Consumes through the next `\n`, returning the trimmed line without
    /// carriage returns
    fn pull_rest_of_line(&mut self) -> Cow<'a, str> {
        let start = self.cursor.offset();
        let mut end = start;
        while !self.cursor.at_end() {
            if self.cursor.take_one() == b'\n' {
                break;
            }
            end = self.cursor.offset();
        }

        let line = self.cursor.source().get(start..end).unwrap_or_default();
        if line.contains('\r') {
            Cow::Owned(line.replace('\r', "").trim().to_string())
        } else {
            Cow::Borrowed(line.trim())
        }
    }

    fn is_whitespace(&self) -> bool {
        !self.cursor.at_end() && CHARACTER_TABLE.is_whitespace(self.cursor.peek())
    }

    fn is_whitespace_or_comment(&self) -> bool {
        self.is_whitespace() || self.is_start_of_comment()
    }

    pub fn is_start_of_comment(&self) -> bool {
        self.cursor.matches_any(&["#", "//"])
    }

    fn is_assignment(&self) -> bool {
        self.cursor.matches_any(&["=", ":"])
    }

    pub fn is_object_start(&self) -> bool {
        self.cursor.matches("{")
    }

    pub fn is_array_start(&self) -> bool {
        self.cursor.matches("[")
    }

    pub fn is_array_end(&self) -> bool {
        self.cursor.matches("]")
    }

    pub fn pull_array_end(&mut self) -> Token<'a> {
        self.pull_single(Token::ArrayEnd)
    }

    pub fn is_comma(&self) -> bool {
        self.cursor.matches(",")
    }

    pub fn pull_comma(&mut self) -> Token<'a> {
        self.pull_single(Token::Comma)
    }

    fn is_start_of_quoted_text(&self) -> bool {
        self.cursor.matches("\"")
    }

    fn is_start_of_triple_quoted_text(&self) -> bool {
        self.cursor.matches(TRIPLE_QUOTE)
    }

    fn is_substitution_start(&self) -> bool {
        self.cursor.matches("${")
    }

    fn is_unquoted_key(&self) -> bool {
        !self.cursor.at_end()
            && !self.is_start_of_comment()
            && !CHARACTER_TABLE.is_forbidden_in_key(self.cursor.peek())
    }

    fn is_unquoted_key_start(&self) -> bool {
        !self.is_whitespace() && self.is_unquoted_key()
    }

    fn is_unquoted_text(&self) -> bool {
        !self.cursor.at_end()
            && !self.is_whitespace()
            && !self.is_start_of_comment()
            && !CHARACTER_TABLE.is_forbidden_in_text(self.cursor.peek())
    }

    /// Returns true if a value token starts at the current position
    pub fn is_value(&self) -> bool {
        self.is_array_start()
            || self.is_object_start()
            || self.is_start_of_triple_quoted_text()
            || self.is_substitution_start()
            || self.is_start_of_quoted_text()
            || self.is_unquoted_text()
    }

    /// Returns true if a space or tab starts the rest of the input
    pub fn is_space_or_tab(&self) -> bool {
        self.cursor.matches_any(&[" ", "\t"])
    }

    /// Consumes a run of spaces and tabs as literal text
    pub fn pull_space_or_tab(&mut self) -> Token<'a> {
        let start = self.cursor.offset();
        while self.is_space_or_tab() {
            self.cursor.take_one();
        }
        Token::LiteralValue(Cow::Borrowed(
            self.cursor.slice_from(start).unwrap_or_default(),
        ))
    }

    fn pull_unquoted_key(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.cursor.offset();
        while self.is_unquoted_key() {
            self.cursor.take_one();
        }
        Ok(Token::Key(Cow::Borrowed(self.text_from(start)?.trim())))
    }

    fn pull_unquoted_text(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.cursor.offset();
        while self.is_unquoted_text() {
            self.cursor.take_one();
        }
        Ok(Token::LiteralValue(Cow::Borrowed(self.text_from(start)?)))
    }

    /// Speculatively checks for an include directive without consuming input.
    ///
    /// Lexical errors raised while looking ahead only mean the rule does not
    /// match; they never reach the caller.
    pub fn probe_include(&mut self) -> bool {
        self.cursor.checkpoint();
        let matched = match self.scan_include() {
            Ok(matched) => matched,
            Err(error) => {
                trace!(%error, "include probe rejected");
                false
            }
        };
        self.cursor.restore();
        matched
    }

    fn scan_include(&mut self) -> Result<bool, LexError> {
        if !self.cursor.matches(INCLUDE_KEYWORD) {
            return Ok(false);
        }
        self.cursor.take(INCLUDE_KEYWORD.len());
        if !self.is_whitespace_or_comment() {
            return Ok(false);
        }
        self.skip_whitespace_and_comments();
        if !self.is_start_of_quoted_text() {
            return Ok(false);
        }
        self.pull_quoted_text()?;
        Ok(true)
    }

    fn pull_include(&mut self) -> Result<Token<'a>, LexError> {
        self.cursor.take(INCLUDE_KEYWORD.len());
        self.skip_whitespace_and_comments();
        Ok(Token::Include(self.pull_quoted_text()?))
    }

    /// Lexes `"..."` text, borrowing from the input when no escapes occur
    fn pull_quoted_text(&mut self) -> Result<Cow<'a, str>, LexError> {
        let start = self.cursor.offset();
        self.cursor.take_one();

        let content_start = self.cursor.offset();
        let mut run_start = content_start;
        let mut owned: Option<String> = None;

        loop {
            if self.cursor.at_end() {
                return Err(LexError::UnterminatedString {
                    position: self.cursor.position_of(start),
                });
            }
            match self.cursor.peek() {
                b'"' => break,
                b'\\' => {
                    let run = self.text_from(run_start)?;
                    let buffer = owned.get_or_insert_with(String::new);
                    buffer.push_str(run);
                    self.pull_escape_sequence(buffer, start)?;
                    run_start = self.cursor.offset();
                }
                _ => {
                    self.cursor.take_one();
                }
            }
        }

        self.check_string_length(self.cursor.offset() - content_start, start)?;
        let tail = self.text_from(run_start)?;
        self.cursor.take_one();

        Ok(match owned {
            Some(mut buffer) => {
                buffer.push_str(tail);
                Cow::Owned(buffer)
            }
            None => Cow::Borrowed(tail),
        })
    }

    /// Decodes one backslash escape into `buffer`
    fn pull_escape_sequence(
        &mut self,
        buffer: &mut String,
        string_start: usize,
    ) -> Result<(), LexError> {
        let escape_start = self.cursor.offset();
        self.cursor.take_one();
        if self.cursor.at_end() {
            return Err(LexError::UnterminatedString {
                position: self.cursor.position_of(string_start),
            });
        }

        let escaped = self.cursor.current_char();
        let decoded = match self.cursor.take_one() {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{0008}',
            b'f' => '\u{000C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.pull_unicode_escape(escape_start)?,
            _ => {
                return Err(LexError::InvalidEscape {
                    sequence: escaped
                        .unwrap_or(char::REPLACEMENT_CHARACTER)
                        .to_string(),
                    position: self.cursor.position_of(escape_start),
                });
            }
        };
        buffer.push(decoded);
        Ok(())
    }

    /// Decodes the four hex digits following `\u`.
    ///
    /// A high surrogate directly followed by a `\uXXXX` low surrogate is
    /// joined into one character; any other surrogate is rejected.
    fn pull_unicode_escape(&mut self, escape_start: usize) -> Result<char, LexError> {
        let digits = self.cursor.take(4);
        let unit = parse_code_unit(digits)
            .ok_or_else(|| self.invalid_unicode_escape(digits, escape_start))?;

        if HIGH_SURROGATES.contains(&unit) {
            if let Some(low) = self.peek_low_surrogate() {
                self.cursor.take(LOW_SURROGATE_ESCAPE_LEN);
                let code_point = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code_point)
                    .ok_or_else(|| self.invalid_unicode_escape(digits, escape_start));
            }
        }

        char::from_u32(unit).ok_or_else(|| self.invalid_unicode_escape(digits, escape_start))
    }

    /// Returns the low surrogate written as `\uXXXX` at the cursor, if any
    fn peek_low_surrogate(&self) -> Option<u32> {
        let offset = self.cursor.offset();
        let escape = self
            .cursor
            .source()
            .as_bytes()
            .get(offset..offset + LOW_SURROGATE_ESCAPE_LEN)?;
        let unit = parse_code_unit(escape.strip_prefix(b"\\u")?)?;
        LOW_SURROGATES.contains(&unit).then_some(unit)
    }

    fn invalid_unicode_escape(&self, digits: &[u8], escape_start: usize) -> LexError {
        LexError::InvalidUnicodeEscape {
            sequence: format!("u{}", String::from_utf8_lossy(digits)),
            position: self.cursor.position_of(escape_start),
        }
    }

    /// Lexes `"""..."""` text verbatim
    fn pull_triple_quoted_text(&mut self) -> Result<Cow<'a, str>, LexError> {
        let start = self.cursor.offset();
        self.cursor.take(TRIPLE_QUOTE.len());

        let content_start = self.cursor.offset();
        while !self.cursor.matches(TRIPLE_QUOTE) {
            if self.cursor.at_end() {
                return Err(LexError::UnterminatedString {
                    position: self.cursor.position_of(start),
                });
            }
            self.cursor.take_one();
        }

        self.check_string_length(self.cursor.offset() - content_start, start)?;
        let text = self.text_from(content_start)?;
        self.cursor.take(TRIPLE_QUOTE.len());
        Ok(Cow::Borrowed(text))
    }

    /// Lexes `${path}`; the closing brace is required
    fn pull_substitution(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.cursor.offset();
        self.cursor.take(2);

        let path_start = self.cursor.offset();
        while self.is_unquoted_text() {
            self.cursor.take_one();
        }
        let path = self.text_from(path_start)?;

        if self.cursor.peek() != b'}' || self.cursor.at_end() {
            return Err(LexError::UnterminatedSubstitution {
                position: self.cursor.position_of(start),
            });
        }
        self.cursor.take_one();
        Ok(Token::Substitution(Cow::Borrowed(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> Token<'_> {
        Token::Key(Cow::Borrowed(text))
    }

    fn literal(text: &str) -> Token<'_> {
        Token::LiteralValue(Cow::Borrowed(text))
    }

    #[test]
    fn test_lexer_creation() {
        let lexer = HoconLexer::new("a = 1");
        assert_eq!(lexer.offset(), 0);
        assert_eq!(lexer.token_count(), 0);
        assert_eq!(lexer.source(), "a = 1");
    }

    #[test]
    fn test_structural_tokens() {
        let mut lexer = HoconLexer::new("{ } [ ] . = :x");
        assert_eq!(lexer.next_token().unwrap(), Token::ObjectStart);
        assert_eq!(lexer.next_token().unwrap(), Token::ObjectEnd);
        assert_eq!(lexer.next_token().unwrap(), Token::ArrayStart);
        assert_eq!(lexer.next_token().unwrap(), Token::ArrayEnd);
        assert_eq!(lexer.next_token().unwrap(), Token::Dot);
        assert_eq!(lexer.next_token().unwrap(), Token::Assign);
        assert_eq!(lexer.next_token().unwrap(), Token::Assign);
        assert_eq!(lexer.next_token().unwrap(), key("x"));
        assert_eq!(lexer.next_token().unwrap(), Token::EndOfInput);
        assert_eq!(lexer.next_token().unwrap(), Token::EndOfInput);
    }

    #[test]
    fn test_token_type_names() {
        assert_eq!(Token::EndOfInput.type_name(), "end of input");
        assert_eq!(Token::ObjectStart.type_name(), "'{'");
        assert_eq!(Token::Assign.type_name(), "assignment");
        assert_eq!(key("a").type_name(), "key");
        assert_eq!(literal("a").type_name(), "literal value");
        assert_eq!(
            Token::Substitution(Cow::Borrowed("a")).type_name(),
            "substitution"
        );
    }

    #[test]
    fn test_unquoted_key_is_maximal_and_trimmed() {
        let mut lexer = HoconLexer::new("  server name  = x");
        assert_eq!(lexer.next_token().unwrap(), key("server name"));
        assert_eq!(lexer.next_token().unwrap(), Token::Assign);
    }

    #[test]
    fn test_unquoted_key_stops_at_dot() {
        let mut lexer = HoconLexer::new("a.b.c");
        assert_eq!(lexer.next_token().unwrap(), key("a"));
        assert_eq!(lexer.next_token().unwrap(), Token::Dot);
        assert_eq!(lexer.next_token().unwrap(), key("b"));
        assert_eq!(lexer.next_token().unwrap(), Token::Dot);
        assert_eq!(lexer.next_token().unwrap(), key("c"));
        assert_eq!(lexer.next_token().unwrap(), Token::EndOfInput);
    }

    #[test]
    fn test_unquoted_key_stops_at_comment() {
        let mut lexer = HoconLexer::new("key// note\n");
        assert_eq!(lexer.next_token().unwrap(), key("key"));
        assert_eq!(lexer.next_token().unwrap(), Token::EndOfInput);
    }

    #[test]
    fn test_quoted_key_keeps_dots_and_spaces() {
        let mut lexer = HoconLexer::new(r#""a.b c" : 1"#);
        assert_eq!(lexer.next_token().unwrap(), key("a.b c"));
        assert_eq!(lexer.next_token().unwrap(), Token::Assign);
    }

    #[test]
    fn test_quoted_key_borrows_without_escapes() {
        let mut lexer = HoconLexer::new(r#""plain""#);
        match lexer.next_token().unwrap() {
            Token::Key(Cow::Borrowed(text)) => assert_eq!(text, "plain"),
            other => panic!("Expected borrowed key, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_text_with_escapes_is_owned() {
        let mut lexer = HoconLexer::new(r#""a\tb""#);
        match lexer.pull_value().unwrap() {
            Token::LiteralValue(Cow::Owned(text)) => assert_eq!(text, "a\tb"),
            other => panic!("Expected owned literal, got {:?}", other),
        }
    }

    #[test]
    fn test_each_escape_decodes_to_one_character() {
        let cases = [
            (r#""\n""#, "\n"),
            (r#""\t""#, "\t"),
            (r#""\"""#, "\""),
            (r#""\\""#, "\\"),
            (r#""\/""#, "/"),
            (r#""\b""#, "\u{0008}"),
            (r#""\f""#, "\u{000C}"),
            (r#""\r""#, "\r"),
            (r#""é""#, "é"),
            (r#""中""#, "中"),
        ];
        for (input, expected) in cases {
            let mut lexer = HoconLexer::new(input);
            assert_eq!(
                lexer.pull_value().unwrap(),
                literal(expected),
                "input {}",
                input
            );
            assert!(lexer.is_at_end());
        }
    }

    #[test]
    fn test_invalid_escape() {
        let mut lexer = HoconLexer::new(r#""bad\q""#);
        match lexer.pull_value() {
            Err(LexError::InvalidEscape { sequence, position }) => {
                assert_eq!(sequence, "q");
                assert_eq!(position.column, 5);
            }
            other => panic!("Expected invalid escape, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_unicode_escapes() {
        for input in [r#""\u12""#, r#""\uZZZZ""#, r#""\uD800""#, r#""\u12"#] {
            let mut lexer = HoconLexer::new(input);
            assert!(
                matches!(
                    lexer.pull_value(),
                    Err(LexError::InvalidUnicodeEscape { .. })
                ),
                "input {}",
                input
            );
        }
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let mut lexer = HoconLexer::new(r#""\ud83d\ude00!""#);
        assert_eq!(
            lexer.pull_value().unwrap(),
            Token::LiteralValue(Cow::Owned("😀!".to_string()))
        );
        assert!(lexer.is_at_end());

        let mut lexer = HoconLexer::new(r#""\ud83dA""#);
        match lexer.pull_value() {
            Err(LexError::InvalidUnicodeEscape { sequence, position }) => {
                assert_eq!(sequence, "ud83d");
                assert_eq!(position.column, 2);
            }
            other => panic!("Expected invalid unicode escape, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_quoted_text() {
        let mut lexer = HoconLexer::new("\"never closed");
        match lexer.pull_value() {
            Err(LexError::UnterminatedString { position }) => assert_eq!(position.offset, 0),
            other => panic!("Expected unterminated string, got {:?}", other),
        }

        let mut lexer = HoconLexer::new("\"trailing\\");
        assert!(matches!(
            lexer.pull_value(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_triple_quoted_text_is_verbatim() {
        let mut lexer = HoconLexer::new("\"\"\"line \\n one\n\"quoted\"\"\" rest");
        assert_eq!(
            lexer.pull_value().unwrap(),
            literal("line \\n one\n\"quoted")
        );
        assert!(lexer.is_space_or_tab());
    }

    #[test]
    fn test_unterminated_triple_quoted_text() {
        let mut lexer = HoconLexer::new("\"\"\"open ended\"\"");
        assert!(matches!(
            lexer.pull_value(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_unquoted_text_keeps_dots() {
        let mut lexer = HoconLexer::new("example.com:8080");
        assert_eq!(lexer.pull_value().unwrap(), literal("example.com"));
        assert!(!lexer.is_value());
    }

    #[test]
    fn test_unquoted_text_stops_at_whitespace_and_comment() {
        let mut lexer = HoconLexer::new("hello world");
        assert_eq!(lexer.pull_value().unwrap(), literal("hello"));
        assert!(lexer.is_space_or_tab());
        assert_eq!(lexer.pull_space_or_tab(), literal(" "));
        assert_eq!(lexer.pull_value().unwrap(), literal("world"));

        let mut lexer = HoconLexer::new("value#comment");
        assert_eq!(lexer.pull_value().unwrap(), literal("value"));
    }

    #[test]
    fn test_substitution() {
        let mut lexer = HoconLexer::new("${server.host}:${port}");
        assert_eq!(
            lexer.pull_value().unwrap(),
            Token::Substitution(Cow::Borrowed("server.host"))
        );
        assert!(!lexer.is_value());
    }

    #[test]
    fn test_unterminated_substitution() {
        for input in ["${a", "${a b}", "${"] {
            let mut lexer = HoconLexer::new(input);
            assert!(
                matches!(
                    lexer.pull_value(),
                    Err(LexError::UnterminatedSubstitution { .. })
                ),
                "input {}",
                input
            );
        }
    }

    #[test]
    fn test_expected_value_error() {
        let mut lexer = HoconLexer::new("= 1");
        match lexer.pull_value() {
            Err(LexError::ExpectedValue { found, .. }) => assert_eq!(found, "'='"),
            other => panic!("Expected missing value error, got {:?}", other),
        }

        let mut lexer = HoconLexer::new("");
        match lexer.pull_value() {
            Err(error @ LexError::ExpectedValue { .. }) => {
                let message = error.to_string();
                assert!(message.contains("end of input"));
                assert!(message.contains("object"));
                assert!(message.contains("substitution"));
            }
            other => panic!("Expected missing value error, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_and_slash_comments_before_key() {
        for input in ["# c\nkey=1", "// c\nkey=1"] {
            let mut lexer = HoconLexer::new(input);
            assert_eq!(lexer.next_token().unwrap(), key("key"), "input {:?}", input);
        }
    }

    #[test]
    fn test_comment_carriage_return_is_discarded() {
        let mut lexer = HoconLexer::new("# one\r\n# two\r\n\r\n  a");
        assert_eq!(lexer.next_token().unwrap(), key("a"));
    }

    #[test]
    fn test_comment_text() {
        let mut lexer = HoconLexer::new("#  note\r here \nrest");
        assert_eq!(
            lexer.pull_comment(),
            Token::Comment(Cow::Owned("note here".to_string()))
        );
        assert_eq!(lexer.offset(), 15);
    }

    #[test]
    fn test_trailing_lone_comment_marker_is_not_a_comment() {
        let mut lexer = HoconLexer::new("a #");
        assert_eq!(lexer.next_token().unwrap(), key("a"));
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnexpectedCharacter { character: '#', .. })
        ));
    }

    #[test]
    fn test_include_directive() {
        let mut lexer = HoconLexer::new("include \"common.conf\"\na = 1");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Include(Cow::Borrowed("common.conf"))
        );
        assert_eq!(lexer.next_token().unwrap(), key("a"));
    }

    #[test]
    fn test_include_after_comment() {
        let mut lexer = HoconLexer::new("include # why\n \"x\"");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Include(Cow::Borrowed("x"))
        );
    }

    #[test]
    fn test_include_word_as_key() {
        let mut lexer = HoconLexer::new("include = 5");
        assert_eq!(lexer.next_token().unwrap(), key("include"));

        let mut lexer = HoconLexer::new("includes = 5");
        assert_eq!(lexer.next_token().unwrap(), key("includes"));
    }

    #[test]
    fn test_include_probe_does_not_consume() {
        for input in ["include = 5", "includes", "include \"unterminated", "key = 1"] {
            let mut lexer = HoconLexer::new(input);
            assert!(!lexer.probe_include(), "input {:?}", input);
            assert_eq!(lexer.offset(), 0);
            assert_eq!(lexer.cursor.checkpoint_depth(), 0);
        }

        let mut lexer = HoconLexer::new("include \"x\"");
        assert!(lexer.probe_include());
        assert_eq!(lexer.offset(), 0);
    }

    #[test]
    fn test_include_probe_swallows_bad_escape() {
        let mut lexer = HoconLexer::new("include \"bad\\q\"");
        assert!(!lexer.probe_include());
        assert_eq!(lexer.next_token().unwrap(), key("include"));
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = HoconLexer::new("a\n  ,");
        assert_eq!(lexer.next_token().unwrap(), key("a"));
        match lexer.next_token() {
            Err(LexError::UnexpectedCharacter {
                character,
                position,
            }) => {
                assert_eq!(character, ',');
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 3);
            }
            other => panic!("Expected unexpected character, got {:?}", other),
        }
    }

    #[test]
    fn test_comma_and_array_end_helpers() {
        let mut lexer = HoconLexer::new(",]");
        assert!(lexer.is_comma());
        assert_eq!(lexer.pull_comma(), Token::Comma);
        assert!(lexer.is_array_end());
        assert_eq!(lexer.pull_array_end(), Token::ArrayEnd);
        assert!(lexer.is_at_end());
    }

    #[test]
    fn test_value_rule_order() {
        let mut lexer = HoconLexer::new("{[]");
        assert_eq!(lexer.pull_value().unwrap(), Token::ObjectStart);
        assert_eq!(lexer.pull_value().unwrap(), Token::ArrayStart);
        assert_eq!(lexer.pull_value().unwrap(), Token::ArrayEnd);
    }

    #[test]
    fn test_is_value() {
        for input in ["{", "[", "\"x\"", "\"\"\"x\"\"\"", "${x}", "text", "42"] {
            assert!(HoconLexer::new(input).is_value(), "input {:?}", input);
        }
        for input in ["", " x", "]", ",", "# c", "}"] {
            assert!(!HoconLexer::new(input).is_value(), "input {:?}", input);
        }
    }

    #[test]
    fn test_non_ascii_unquoted_text() {
        let mut lexer = HoconLexer::new("ключ = значение");
        assert_eq!(lexer.next_token().unwrap(), key("ключ"));
        assert_eq!(lexer.next_token().unwrap(), Token::Assign);
        lexer.skip_whitespace_and_comments();
        assert_eq!(lexer.pull_value().unwrap(), literal("значение"));
    }

    #[test]
    fn test_token_limit() {
        let config = LexerConfig::new().with_max_tokens(2);
        let mut lexer = HoconLexer::with_config("a b c", config);
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::TokenLimitExceeded { limit: 2, .. })
        ));
    }

    #[test]
    fn test_string_length_limit() {
        let config = LexerConfig::new().with_max_string_length(4);
        let mut lexer = HoconLexer::with_config("\"12345\"", config.clone());
        assert!(matches!(
            lexer.pull_value(),
            Err(LexError::StringTooLong { limit: 4, .. })
        ));

        let mut lexer = HoconLexer::with_config("\"1234\"", config);
        assert_eq!(lexer.pull_value().unwrap(), literal("1234"));
    }

    #[test]
    fn test_character_table_key_characters() {
        let table = &CHARACTER_TABLE;
        for &ch in b"$\"{}[]:=,#`^?!@*&\\." {
            assert!(table.is_forbidden_in_key(ch), "{:?}", ch as char);
        }
        for &ch in b"azAZ09_-+/%~' " {
            assert!(!table.is_forbidden_in_key(ch), "{:?}", ch as char);
        }
    }

    #[test]
    fn test_character_table_text_allows_dot() {
        let table = &CHARACTER_TABLE;
        assert!(!table.is_forbidden_in_text(b'.'));
        assert!(table.is_forbidden_in_key(b'.'));
        for &ch in b"$\"{}[]:=,#`^?!@*&\\" {
            assert!(table.is_forbidden_in_text(ch), "{:?}", ch as char);
        }
    }

    #[test]
    fn test_character_table_whitespace() {
        let table = &CHARACTER_TABLE;
        for &ch in b" \t\r\n" {
            assert!(table.is_whitespace(ch));
        }
        assert!(table.is_space_or_tab(b' '));
        assert!(table.is_space_or_tab(b'\t'));
        assert!(!table.is_space_or_tab(b'\n'));
        assert!(!table.is_whitespace(0));
        assert!(!table.is_whitespace(0xA0));
    }

    #[test]
    fn test_character_flags() {
        let flags = CharacterFlags::WHITESPACE.union(CharacterFlags::SPACE_OR_TAB);
        assert!(flags.intersects(CharacterFlags::SPACE_OR_TAB));
        assert!(!flags.intersects(CharacterFlags::HEX_DIGIT));
        assert!(!CharacterFlags::empty().intersects(flags));
        assert!(CHARACTER_TABLE.test_character(b' ', flags));
        assert!(CHARACTER_TABLE.test_character(b'.', CharacterFlags::NOT_IN_UNQUOTED_KEY));
        assert!(!CHARACTER_TABLE.test_character(b'.', CharacterFlags::NOT_IN_UNQUOTED_TEXT));
    }
}
