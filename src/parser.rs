//! HOCON parser building configuration objects from lexer tokens
//!
//! The parser drives [`HoconLexer`] in key context for object fields and in
//! value context after an assignment. Every field is written through
//! [`HoconObject::get_or_create_key`], so re-assigned keys keep their
//! history. Substitutions are recorded but not resolved.

use crate::error::{HoconError, ParseError};
use crate::lexer::{HoconLexer, LexerConfig, Token};
use crate::object::HoconObject;
use crate::value::{HoconValue, ValueChunk};
use std::collections::HashMap;
use tracing::debug;

/// Configuration options for the parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum nesting depth of objects, arrays, dotted paths and includes
    pub max_depth: usize,
}

impl ParserConfig {
    /// Creates a new parser configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

/// Supplies the text of `include "path"` directives
pub trait IncludeHandler {
    /// Returns the configuration text for `path`, or `None` to skip the
    /// include
    fn load(&self, path: &str) -> Option<String>;
}

/// Include handler serving documents from memory
#[derive(Debug, Clone, Default)]
pub struct MapIncludeHandler {
    documents: HashMap<String, String>,
}

impl MapIncludeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler from an existing map
    pub fn from_map(documents: HashMap<String, String>) -> Self {
        Self { documents }
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }
}

impl IncludeHandler for MapIncludeHandler {
    fn load(&self, path: &str) -> Option<String> {
        self.documents.get(path).cloned()
    }
}

/// How an object being filled is terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectScope {
    /// Top level without braces, ends at end of input
    Document,
    /// Ends at the matching `}`
    Braced,
    /// Holds exactly one field, the rest of an `a.b.c` key path
    DottedPath,
}

/// Recursive-descent HOCON parser
pub struct HoconParser<'a> {
    lexer: HoconLexer<'a>,
    config: ParserConfig,
    include_handler: Option<&'a dyn IncludeHandler>,
    substitutions: Vec<String>,
    depth: usize,
}

impl<'a> HoconParser<'a> {
    /// Creates a parser with default configuration
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, LexerConfig::default(), ParserConfig::default())
    }

    /// Creates a parser with custom lexer and parser configuration
    pub fn with_config(input: &'a str, lexer_config: LexerConfig, config: ParserConfig) -> Self {
        Self {
            lexer: HoconLexer::with_config(input, lexer_config),
            config,
            include_handler: None,
            substitutions: Vec::new(),
            depth: 0,
        }
    }

    /// Sets the handler used to load included documents.
    ///
    /// Without a handler, include directives are skipped.
    pub fn with_include_handler(mut self, handler: &'a dyn IncludeHandler) -> Self {
        self.include_handler = Some(handler);
        self
    }

    /// Returns the parser configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns every `${path}` seen so far, in document order
    pub fn substitutions(&self) -> &[String] {
        &self.substitutions
    }

    /// Parses the whole input into an object.
    ///
    /// The document may be wrapped in a single pair of braces.
    pub fn parse(&mut self) -> Result<HoconObject, HoconError> {
        let mut root = HoconValue::new();
        root.ensure_object();

        self.lexer.skip_whitespace_and_comments();
        if self.lexer.is_object_start() {
            self.lexer.next_token()?;
            self.parse_object(&mut root, ObjectScope::Braced)?;
            match self.lexer.next_token()? {
                Token::EndOfInput => {}
                other => return Err(self.unexpected(&other, "end of input")),
            }
        } else {
            self.parse_object(&mut root, ObjectScope::Document)?;
        }

        Ok(root.into_object().unwrap_or_default())
    }

    fn enter(&mut self) -> Result<(), HoconError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(ParseError::MaxDepthExceeded {
                position: self.lexer.position(),
            }
            .into());
        }
        Ok(())
    }

    fn parse_object(
        &mut self,
        owner: &mut HoconValue,
        scope: ObjectScope,
    ) -> Result<(), HoconError> {
        self.enter()?;
        let result = self.parse_fields(owner, scope);
        self.depth -= 1;
        result
    }

    fn parse_fields(
        &mut self,
        owner: &mut HoconValue,
        scope: ObjectScope,
    ) -> Result<(), HoconError> {
        owner.ensure_object();

        loop {
            match self.lexer.next_token()? {
                Token::Include(path) => self.include(owner.ensure_object(), &path)?,
                Token::Key(key) => {
                    let value = owner.ensure_object().get_or_create_key(&key);
                    self.parse_key_content(value)?;
                    if scope == ObjectScope::DottedPath {
                        return Ok(());
                    }
                }
                Token::ObjectEnd if scope == ObjectScope::Braced => return Ok(()),
                Token::EndOfInput if scope == ObjectScope::Document => return Ok(()),
                Token::EndOfInput => {
                    return Err(ParseError::UnexpectedEndOfInput {
                        context: match scope {
                            ObjectScope::DottedPath => "key path".to_string(),
                            _ => "object".to_string(),
                        },
                        position: self.lexer.position(),
                    }
                    .into());
                }
                other => return Err(self.unexpected(&other, "key, include or '}'")),
            }

            self.lexer.skip_whitespace_and_comments();
            if self.lexer.is_comma() {
                self.lexer.pull_comma();
            }
        }
    }

    /// Parses what follows a key: a dotted continuation, an assignment or
    /// an object
    fn parse_key_content(&mut self, value: &mut HoconValue) -> Result<(), HoconError> {
        match self.lexer.next_token()? {
            Token::Dot => self.parse_object(value, ObjectScope::DottedPath),
            Token::Assign => self.parse_value(value),
            Token::ObjectStart => self.parse_object(value, ObjectScope::Braced),
            Token::EndOfInput => Err(ParseError::UnexpectedEndOfInput {
                context: "key".to_string(),
                position: self.lexer.position(),
            }
            .into()),
            other => Err(self.unexpected(&other, "'.', '=', ':' or '{'")),
        }
    }

    /// Parses a value and any fragments concatenated to it on the same line
    fn parse_value(&mut self, owner: &mut HoconValue) -> Result<(), HoconError> {
        self.lexer.skip_whitespace_and_comments();

        loop {
            match self.lexer.pull_value()? {
                Token::LiteralValue(text) => {
                    if owner.is_object() {
                        owner.clear();
                    }
                    owner.append(ValueChunk::Literal(text.into_owned()));
                }
                Token::ObjectStart => self.parse_object(owner, ObjectScope::Braced)?,
                Token::ArrayStart => {
                    let elements = self.parse_array()?;
                    if owner.is_object() {
                        owner.clear();
                    }
                    owner.append(ValueChunk::Array(elements));
                }
                Token::Substitution(path) => {
                    self.substitutions.push(path.to_string());
                    if owner.is_object() {
                        owner.clear();
                    }
                    owner.append(ValueChunk::Substitution(path.into_owned()));
                }
                other => return Err(self.unexpected(&other, "value")),
            }

            if self.lexer.is_space_or_tab() {
                let whitespace = self.lexer.pull_space_or_tab();
                if self.continues_text(owner) {
                    if let Token::LiteralValue(text) = whitespace {
                        owner.append(ValueChunk::Literal(text.into_owned()));
                    }
                }
            }
            if !self.lexer.is_value() {
                return Ok(());
            }
        }
    }

    /// Returns true if whitespace just read sits between two text fragments
    fn continues_text(&self, owner: &HoconValue) -> bool {
        self.lexer.is_value()
            && !self.lexer.is_object_start()
            && !self.lexer.is_array_start()
            && matches!(
                owner.chunks().last(),
                Some(ValueChunk::Literal(_) | ValueChunk::Substitution(_))
            )
    }

    fn parse_array(&mut self) -> Result<Vec<HoconValue>, HoconError> {
        self.enter()?;
        let result = self.parse_elements();
        self.depth -= 1;
        result
    }

    fn parse_elements(&mut self) -> Result<Vec<HoconValue>, HoconError> {
        let mut elements = Vec::new();

        loop {
            self.lexer.skip_whitespace_and_comments();
            if self.lexer.is_array_end() {
                self.lexer.pull_array_end();
                return Ok(elements);
            }
            if self.lexer.is_at_end() {
                return Err(ParseError::UnexpectedEndOfInput {
                    context: "array".to_string(),
                    position: self.lexer.position(),
                }
                .into());
            }

            let mut element = HoconValue::new();
            self.parse_value(&mut element)?;
            elements.push(element);

            self.lexer.skip_whitespace_and_comments();
            if self.lexer.is_comma() {
                self.lexer.pull_comma();
            }
        }
    }

    /// Parses an included document and layers it over `target`
    fn include(&mut self, target: &mut HoconObject, path: &str) -> Result<(), HoconError> {
        let Some(handler) = self.include_handler else {
            debug!(path, "no include handler configured, skipping include");
            return Ok(());
        };
        let Some(text) = handler.load(path) else {
            debug!(path, "included resource not found, skipping include");
            return Ok(());
        };

        let mut nested = HoconParser {
            lexer: HoconLexer::with_config(&text, self.lexer.config().clone()),
            config: self.config.clone(),
            include_handler: Some(handler),
            substitutions: Vec::new(),
            depth: self.depth + 1,
        };
        let included = nested.parse().map_err(|error| HoconError::Include {
            path: path.to_string(),
            error: Box::new(error),
        })?;

        self.substitutions.append(&mut nested.substitutions);
        target.combine(&included);
        Ok(())
    }

    fn unexpected(&self, token: &Token<'_>, expected: &str) -> HoconError {
        ParseError::UnexpectedToken {
            token: token.type_name().to_string(),
            position: self.lexer.position(),
            expected: expected.to_string(),
        }
        .into()
    }
}
