//! Error types and position tracking for HOCON lexing and parsing
//!
//! Malformed input is reported through these types. Caller misuse of the
//! cursor or the object model (restoring an empty checkpoint stack, reading
//! a scalar as an object) is not an input error and panics instead.

use std::fmt;
use thiserror::Error;

/// Represents a position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Byte offset from start of input (0-based)
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of input
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Computes the position of a byte offset within `source`.
    ///
    /// The lexer only tracks byte offsets; line and column are derived on
    /// demand when a diagnostic is built.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut position = Self::new();
        for (index, ch) in source.char_indices() {
            if index >= offset {
                break;
            }
            position.advance(ch);
        }
        position
    }

    /// Advances the position by one character
    pub fn advance(&mut self, c: char) {
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        self.offset += c.len_utf8();
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Main error type for HOCON processing
#[derive(Debug, Error)]
pub enum HoconError {
    /// Lexical analysis error
    #[error("Lexical error: {0}")]
    Lex(#[from] LexError),

    /// Structural parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error raised while parsing an included resource
    #[error("In included resource '{path}': {error}")]
    Include {
        path: String,
        #[source]
        error: Box<HoconError>,
    },
}

/// Lexical analysis errors
#[derive(Debug, Error)]
pub enum LexError {
    /// No token rule matched the input at this position
    #[error("Unexpected character '{character}' at {position}")]
    UnexpectedCharacter { character: char, position: Position },

    /// Quoted or triple-quoted text ran into the end of input
    #[error("Unterminated string at {position}")]
    UnterminatedString { position: Position },

    /// Escape character outside the supported set
    #[error("Invalid escape sequence '\\{sequence}' at {position}")]
    InvalidEscape {
        sequence: String,
        position: Position,
    },

    /// `\u` not followed by four hex digits naming a valid code point
    #[error("Invalid unicode escape '\\{sequence}' at {position}")]
    InvalidUnicodeEscape {
        sequence: String,
        position: Position,
    },

    /// `${` placeholder without a closing brace
    #[error("Unterminated substitution at {position}")]
    UnterminatedSubstitution { position: Position },

    /// A value was required but none of the value rules matched
    #[error(
        "Expected value (object, array, quoted text, unquoted text, triple quoted text or substitution) at {position}, found {found}"
    )]
    ExpectedValue { found: String, position: Position },

    /// Token text did not fall on UTF-8 character boundaries
    #[error("Invalid UTF-8 sequence at {position}")]
    InvalidUtf8 { position: Position },

    /// String payload longer than the configured maximum
    #[error("String longer than {limit} bytes at {position}")]
    StringTooLong { limit: usize, position: Position },

    /// More tokens requested than the configured maximum
    #[error("Token limit of {limit} exceeded at {position}")]
    TokenLimitExceeded { limit: usize, position: Position },
}

impl LexError {
    /// Returns the position the error refers to
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidUnicodeEscape { position, .. }
            | LexError::UnterminatedSubstitution { position }
            | LexError::ExpectedValue { position, .. }
            | LexError::InvalidUtf8 { position }
            | LexError::StringTooLong { position, .. }
            | LexError::TokenLimitExceeded { position, .. } => *position,
        }
    }
}

/// Structural parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// Unexpected token encountered
    #[error("Unexpected token {token} at {position}, expected {expected}")]
    UnexpectedToken {
        token: String,
        position: Position,
        expected: String,
    },

    /// Input ended inside an unfinished construct
    #[error("Unexpected end of input at {position} while reading {context}")]
    UnexpectedEndOfInput { context: String, position: Position },

    /// Maximum nesting depth exceeded
    #[error("Maximum nesting depth exceeded at {position}")]
    MaxDepthExceeded { position: Position },
}
