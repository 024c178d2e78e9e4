//! # HOCON Rust Lexer
//!
//! A HOCON (Human-Optimized Config Object Notation) lexer and object model
//! with layered configuration merging.
//!
//! ## Overview
//!
//! Configuration text flows through three layers:
//!
//! - [`Cursor`]: a byte scanner with checkpoint/restore backtracking
//! - [`HoconLexer`]: classifies input into [`Token`]s, with separate rule
//!   sets for key context and value context
//! - [`HoconParser`]: builds a [`HoconObject`] tree from the token stream
//!
//! Objects produced from separate sources (one per configuration layer) are
//! then combined with [`HoconObject::merge`] or [`HoconObject::combine`].
//! Substitutions such as `${host}` are kept as placeholders; resolving them
//! against the final tree is left to the caller.
//!
//! ## Basic Usage
//!
//! ```rust
//! use hocon_lexer::parse_str;
//!
//! let config = parse_str(r#"
//!     server {
//!         host = localhost
//!         port = 8080
//!     }
//!     name = "my service"
//! "#)?;
//!
//! let server = config.get_key("server").unwrap().object();
//! assert_eq!(server.get_key("port").unwrap().as_string().as_deref(), Some("8080"));
//! # Ok::<(), hocon_lexer::HoconError>(())
//! ```
//!
//! ## Layering Configuration
//!
//! ```rust
//! use hocon_lexer::parse_str;
//!
//! let defaults = parse_str("port = 80\ntls { enabled = false }")?;
//! let overrides = parse_str("port = 8443\ntls { cert = server.pem }")?;
//!
//! // Last write wins for scalars, nested objects are merged
//! let combined = defaults.combine_immutable(&overrides);
//! assert_eq!(combined.get_key("port").unwrap().as_string().as_deref(), Some("8443"));
//!
//! // Deep merge never overrides an existing scalar
//! let merged = defaults.merge_immutable(&overrides);
//! assert_eq!(merged.get_key("port").unwrap().as_string().as_deref(), Some("80"));
//! # Ok::<(), hocon_lexer::HoconError>(())
//! ```
//!
//! ## Includes
//!
//! ```rust
//! use hocon_lexer::{MapIncludeHandler, parse_str_with_includes};
//!
//! let mut handler = MapIncludeHandler::new();
//! handler.insert("base.conf", "timeout = 30s");
//!
//! let config = parse_str_with_includes("include \"base.conf\"\nretries = 3", &handler)?;
//! assert_eq!(config.keys().collect::<Vec<_>>(), vec!["timeout", "retries"]);
//! # Ok::<(), hocon_lexer::HoconError>(())
//! ```
//!
//! ## Token Stream
//!
//! ```rust
//! use hocon_lexer::{HoconLexer, Token};
//!
//! let mut lexer = HoconLexer::new("a.b = 1");
//! assert!(matches!(lexer.next_token()?, Token::Key(key) if key == "a"));
//! assert!(matches!(lexer.next_token()?, Token::Dot));
//! # Ok::<(), hocon_lexer::LexError>(())
//! ```

pub mod cursor;
pub mod error;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod value;


// Re-export main types
pub use cursor::Cursor;
pub use error::{HoconError, LexError, ParseError, Position};
pub use lexer::{HoconLexer, LexerConfig, Token};
pub use object::HoconObject;
pub use parser::{HoconParser, IncludeHandler, MapIncludeHandler, ParserConfig};
pub use value::{HoconValue, UnwrappedValue, ValueChunk};

/// Parses HOCON text into an object. Include directives are skipped.
pub fn parse_str(input: &str) -> Result<HoconObject, HoconError> {
    HoconParser::new(input).parse()
}

/// Parses HOCON text, loading `include` directives through `handler`
pub fn parse_str_with_includes(
    input: &str,
    handler: &dyn IncludeHandler,
) -> Result<HoconObject, HoconError> {
    HoconParser::new(input).with_include_handler(handler).parse()
}
