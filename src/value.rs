//! Value nodes of the configuration tree
//!
//! A [`HoconValue`] collects the fragments written for one key. When a key
//! is assigned again, the new node owns the node it replaced, so the whole
//! fallback chain of earlier assignments stays reachable.

use crate::lexer::CHARACTER_TABLE;
use crate::object::HoconObject;
use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

/// One fragment of a value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueChunk {
    /// Quoted, triple-quoted or unquoted text, including inline whitespace
    Literal(String),
    /// Unresolved `${path}` placeholder
    Substitution(String),
    Array(Vec<HoconValue>),
    Object(HoconObject),
}

impl ValueChunk {
    fn render(&self, indent: usize, out: &mut String) {
        match self {
            ValueChunk::Literal(text) => out.push_str(text),
            ValueChunk::Substitution(path) => {
                out.push_str("${");
                out.push_str(path);
                out.push('}');
            }
            ValueChunk::Array(elements) => {
                out.push('[');
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    out.push_str(&element.to_string_indented(indent + 1));
                }
                out.push(']');
            }
            ValueChunk::Object(object) => {
                out.push_str("{\n");
                out.push_str(&object.to_string_indented(indent + 1));
                out.push_str(&"  ".repeat(indent));
                out.push('}');
            }
        }
    }
}

/// Plain data produced by unwrapping a configuration tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UnwrappedValue {
    Null,
    String(String),
    Array(Vec<UnwrappedValue>),
    Object(IndexMap<String, UnwrappedValue>),
}

/// Content written for one key, plus the value it superseded.
///
/// History chains grow by one link per reassignment, so cloning, comparing
/// and dropping walk the chain in a loop rather than recursing.
#[derive(Default)]
pub struct HoconValue {
    chunks: SmallVec<[ValueChunk; 1]>,
    previous: Option<Box<HoconValue>>,
}

impl Clone for HoconValue {
    fn clone(&self) -> Self {
        let layers: Vec<&HoconValue> = self.history().collect();
        let mut rebuilt: Option<Box<HoconValue>> = None;
        for layer in layers.into_iter().rev() {
            rebuilt = Some(Box::new(HoconValue {
                chunks: layer.chunks.clone(),
                previous: rebuilt,
            }));
        }
        rebuilt.map(|value| *value).unwrap_or_default()
    }
}

impl PartialEq for HoconValue {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.history();
        let mut right = other.history();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.chunks == b.chunks => {}
                _ => return false,
            }
        }
    }
}

impl Drop for HoconValue {
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(mut value) = next {
            next = value.previous.take();
        }
    }
}

impl fmt::Debug for HoconValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let history: Vec<&[ValueChunk]> = self.history().skip(1).map(|v| v.chunks()).collect();
        f.debug_struct("HoconValue")
            .field("chunks", &self.chunks)
            .field("history", &history)
            .finish()
    }
}

impl HoconValue {
    /// Creates an empty value with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty value that replaces `previous`
    pub fn superseding(previous: HoconValue) -> Self {
        Self {
            chunks: SmallVec::new(),
            previous: Some(Box::new(previous)),
        }
    }

    /// Creates a value holding a single literal
    pub fn literal(text: impl Into<String>) -> Self {
        let mut value = Self::new();
        value.append(ValueChunk::Literal(text.into()));
        value
    }

    /// Creates a value holding an object
    pub fn from_object(object: HoconObject) -> Self {
        let mut value = Self::new();
        value.append(ValueChunk::Object(object));
        value
    }

    /// Adds a fragment at the end of the value
    pub fn append(&mut self, chunk: ValueChunk) {
        self.chunks.push(chunk);
    }

    /// Drops every fragment; history is kept
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Returns the fragments in the order they were written
    pub fn chunks(&self) -> &[ValueChunk] {
        &self.chunks
    }

    /// Returns true if no content has been written
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the value this one replaced, if any
    pub fn previous(&self) -> Option<&HoconValue> {
        self.previous.as_deref()
    }

    /// Iterates over this value and every value it replaced, newest first
    pub fn history(&self) -> impl Iterator<Item = &HoconValue> {
        std::iter::successors(Some(self), |value| value.previous())
    }

    /// Replaces the content with `other`'s, keeping the current value as
    /// history
    pub(crate) fn override_with(&mut self, other: &HoconValue) {
        let previous = std::mem::take(self);
        self.chunks = other.chunks.clone();
        self.previous = Some(Box::new(previous));
    }

    /// Returns true if the value is exactly one object
    pub fn is_object(&self) -> bool {
        self.as_object().is_some()
    }

    /// Returns true if every fragment is an array
    pub fn is_array(&self) -> bool {
        !self.chunks.is_empty()
            && self
                .chunks
                .iter()
                .all(|chunk| matches!(chunk, ValueChunk::Array(_)))
    }

    /// Returns true if every fragment is literal text
    pub fn is_string(&self) -> bool {
        !self.chunks.is_empty()
            && self
                .chunks
                .iter()
                .all(|chunk| matches!(chunk, ValueChunk::Literal(_)))
    }

    /// Returns true if any fragment is an unresolved placeholder
    pub fn has_substitutions(&self) -> bool {
        self.chunks
            .iter()
            .any(|chunk| matches!(chunk, ValueChunk::Substitution(_)))
    }

    /// Returns a reference to the object if this value is one
    pub fn as_object(&self) -> Option<&HoconObject> {
        match self.chunks.as_slice() {
            [ValueChunk::Object(object)] => Some(object),
            _ => None,
        }
    }

    /// Returns a mutable reference to the object if this value is one
    pub fn as_object_mut(&mut self) -> Option<&mut HoconObject> {
        match self.chunks.as_mut_slice() {
            [ValueChunk::Object(object)] => Some(object),
            _ => None,
        }
    }

    /// Returns the object held by this value.
    ///
    /// # Panics
    ///
    /// Panics if the value is not an object. Use [`HoconValue::as_object`]
    /// when the kind is not known.
    pub fn object(&self) -> &HoconObject {
        match self.as_object() {
            Some(object) => object,
            None => panic!("This element is not an object: {}", self.kind_name()),
        }
    }

    /// Mutable counterpart of [`HoconValue::object`].
    ///
    /// # Panics
    ///
    /// Panics if the value is not an object.
    pub fn object_mut(&mut self) -> &mut HoconObject {
        let kind = self.kind_name();
        match self.as_object_mut() {
            Some(object) => object,
            None => panic!("This element is not an object: {}", kind),
        }
    }

    /// Makes this value an object and returns it.
    ///
    /// A value that does not hold an object yet starts from a copy of the
    /// object it superseded, so repeated assignments to the same object key
    /// accumulate fields.
    pub fn ensure_object(&mut self) -> &mut HoconObject {
        if !self.is_object() {
            let seed = self
                .previous()
                .and_then(HoconValue::as_object)
                .cloned()
                .unwrap_or_default();
            self.chunks.clear();
            self.chunks.push(ValueChunk::Object(seed));
        }
        self.object_mut()
    }

    /// Consumes the value, returning its object if it holds one
    pub fn into_object(mut self) -> Option<HoconObject> {
        match self.chunks.pop() {
            Some(ValueChunk::Object(object)) if self.chunks.is_empty() => Some(object),
            _ => None,
        }
    }

    /// Returns the concatenated elements if every fragment is an array
    pub fn as_array(&self) -> Option<Vec<&HoconValue>> {
        if !self.is_array() {
            return None;
        }
        let mut elements = Vec::new();
        for chunk in &self.chunks {
            if let ValueChunk::Array(items) = chunk {
                elements.extend(items.iter());
            }
        }
        Some(elements)
    }

    /// Returns the concatenated text if every fragment is literal text
    pub fn as_string(&self) -> Option<String> {
        if !self.is_string() {
            return None;
        }
        Some(self.concatenated())
    }

    fn concatenated(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            chunk.render(0, &mut out);
        }
        out
    }

    fn kind_name(&self) -> &'static str {
        if self.is_empty() {
            "empty value"
        } else if self.is_array() {
            "array"
        } else if self.is_string() {
            "string"
        } else if self.has_substitutions() {
            "unresolved substitution"
        } else {
            "concatenation"
        }
    }

    /// Converts the value to plain data.
    ///
    /// Empty values and empty objects become [`UnwrappedValue::Null`];
    /// unresolved placeholders keep their `${path}` text.
    pub fn unwrapped(&self) -> UnwrappedValue {
        if let Some(object) = self.as_object() {
            return object
                .unwrapped()
                .map(UnwrappedValue::Object)
                .unwrap_or(UnwrappedValue::Null);
        }
        if let Some(elements) = self.as_array() {
            return UnwrappedValue::Array(elements.into_iter().map(HoconValue::unwrapped).collect());
        }
        if self.is_empty() {
            return UnwrappedValue::Null;
        }
        UnwrappedValue::String(self.concatenated())
    }

    /// Renders the value as HOCON text at the given indent level
    pub fn to_string_indented(&self, indent: usize) -> String {
        if let Some(text) = self.as_string() {
            return quote_text(&text);
        }
        let mut out = String::new();
        for chunk in &self.chunks {
            match chunk {
                ValueChunk::Literal(text) if !text.trim_matches([' ', '\t']).is_empty() => {
                    out.push_str(&quote_text(text));
                }
                chunk => chunk.render(indent, &mut out),
            }
        }
        out
    }
}

impl fmt::Display for HoconValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_indented(0))
    }
}

/// Renders a key so the lexer reads it back as one path segment
pub(crate) fn quote_key(key: &str) -> String {
    quote_when(key, |byte| CHARACTER_TABLE.is_forbidden_in_key(byte))
}

/// Renders value text so the lexer reads it back unchanged
pub(crate) fn quote_text(text: &str) -> String {
    quote_when(text, |byte| CHARACTER_TABLE.is_forbidden_in_text(byte))
}

fn quote_when(text: &str, forbidden: impl Fn(u8) -> bool) -> String {
    let needs_quotes = text.is_empty()
        || text.contains("//")
        || text
            .bytes()
            .any(|byte| CHARACTER_TABLE.is_whitespace(byte) || forbidden(byte));
    if !needs_quotes {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
