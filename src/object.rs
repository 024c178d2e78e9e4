//! Ordered configuration objects and layer merging
//!
//! Objects are combined in two ways. [`HoconObject::merge`] recurses into
//! nested objects and never lets the other side override a scalar or array;
//! [`HoconObject::combine`] recurses the same way but lets the other side win
//! for scalars and arrays. Each has an immutable variant that leaves both
//! inputs untouched.

use crate::value::{quote_key, HoconValue, UnwrappedValue};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::fmt;

/// Ordered mapping from key to value node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoconObject {
    items: IndexMap<String, HoconValue>,
}

impl HoconObject {
    /// Creates an empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`
    pub fn get_key(&self, key: &str) -> Option<&HoconValue> {
        self.items.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`
    pub fn get_key_mut(&mut self, key: &str) -> Option<&mut HoconValue> {
        self.items.get_mut(key)
    }

    /// Returns a fresh node for `key`.
    ///
    /// If the key already exists the new node supersedes the old one, which
    /// stays reachable through [`HoconValue::previous`]. The key keeps its
    /// original position.
    pub fn get_or_create_key(&mut self, key: &str) -> &mut HoconValue {
        match self.items.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                let previous = std::mem::take(slot);
                *slot = HoconValue::superseding(previous);
                slot
            }
            Entry::Vacant(entry) => entry.insert(HoconValue::new()),
        }
    }

    /// Iterates over keys in first-insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Iterates over entries in first-insertion order
    pub fn items(&self) -> impl Iterator<Item = (&str, &HoconValue)> {
        self.items.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Deep-merges `other` into this object.
    ///
    /// Keys missing here are adopted at the end. Keys holding objects on
    /// both sides are merged recursively. Any other shared key keeps the
    /// value already present.
    pub fn merge(&mut self, other: &HoconObject) {
        self.layer(other, false);
        tracing::trace!(keys = self.len(), incoming = other.len(), "merged objects");
    }

    /// Returns the result of [`HoconObject::merge`] without touching either
    /// input
    pub fn merge_immutable(&self, other: &HoconObject) -> HoconObject {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Layers `other` over this object, last write wins.
    ///
    /// Like [`HoconObject::merge`], except that a shared key which is not an
    /// object on both sides takes `other`'s content when that content is not
    /// empty. The replaced value is kept as history of the new one.
    pub fn combine(&mut self, other: &HoconObject) {
        self.layer(other, true);
        tracing::trace!(keys = self.len(), incoming = other.len(), "combined objects");
    }

    /// Returns the result of [`HoconObject::combine`] without touching
    /// either input
    pub fn combine_immutable(&self, other: &HoconObject) -> HoconObject {
        let mut combined = self.clone();
        combined.combine(other);
        combined
    }

    fn layer(&mut self, other: &HoconObject, last_wins: bool) {
        for (key, incoming) in &other.items {
            let Some(existing) = self.items.get_mut(key) else {
                self.items.insert(key.clone(), incoming.clone());
                continue;
            };
            if existing.is_object() && incoming.is_object() {
                existing
                    .object_mut()
                    .layer(incoming.object(), last_wins);
            } else if last_wins && !incoming.is_empty() {
                existing.override_with(incoming);
            }
        }
    }

    /// Converts the object to plain nested data.
    ///
    /// An empty object yields `None` rather than an empty map.
    pub fn unwrapped(&self) -> Option<IndexMap<String, UnwrappedValue>> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.items
                .iter()
                .map(|(key, value)| (key.clone(), value.unwrapped()))
                .collect(),
        )
    }

    /// Renders the object as `key : value` lines, two spaces per indent level
    pub fn to_string_indented(&self, indent: usize) -> String {
        let padding = "  ".repeat(indent);
        let mut out = String::new();
        for (key, value) in &self.items {
            out.push_str(&padding);
            out.push_str(&quote_key(key));
            out.push_str(" : ");
            out.push_str(&value.to_string_indented(indent));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for HoconObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_indented(0))
    }
}
