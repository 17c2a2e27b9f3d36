//! Core data types for Reel.
//!
//! This module defines the fundamental data structures passed between the
//! item source, the index and the live filter. These types are designed to be:
//!
//! - **Serializable**: Catalogs and delta scripts are plain JSON
//! - **Source-agnostic**: No feed or database details leak into these types
//! - **Cheap to compare**: Identifiers are `Copy` and hashed by value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Field name under which an item's title is stored.
pub const TITLE: &str = "title";

/// Field name under which an item's description is stored.
pub const DESCRIPTION: &str = "description";

/// Unique identifier for a media item.
///
/// Identifiers are assigned by the item source and are stable for the
/// lifetime of the item. The core only compares and hashes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: u64) -> Self {
        ItemId(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId(id)
    }
}

/// The set of index tokens derived from an item's searchable text.
///
/// The set remembers the gram length it was computed with so that a cache
/// built for one index configuration is never reused by another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NGramSet {
    gram_len: usize,
    grams: HashSet<String>,
}

impl NGramSet {
    /// Create a set from already-normalized grams.
    pub fn new(gram_len: usize, grams: HashSet<String>) -> Self {
        NGramSet { gram_len, grams }
    }

    /// The gram length this set was computed with
    pub fn gram_len(&self) -> usize {
        self.gram_len
    }

    pub fn contains(&self, gram: &str) -> bool {
        self.grams.contains(gram)
    }

    pub fn len(&self) -> usize {
        self.grams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.grams.iter().map(String::as_str)
    }
}

impl IntoIterator for NGramSet {
    type Item = String;
    type IntoIter = std::collections::hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.grams.into_iter()
    }
}

/// A point-in-time snapshot of a media item's searchable state.
///
/// This is the unit exchanged between the item source, the index and the
/// live filter. It contains all information needed for matching and for
/// displaying results.
///
/// ## Design Notes
///
/// - `fields` maps a field name (`title`, `description`, `artist`, ...) to
///   its text; every field is searchable. Writes go through
///   [`ItemInfo::set_field`] so the cache can never outlive the text
/// - `search_ngrams` is a cache filled by [`ItemInfo::refresh_ngrams`] and is
///   never serialized
/// - Equality compares identity and content, never the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Stable identifier assigned by the item source
    pub id: ItemId,

    /// Searchable text fields, keyed by field name
    #[serde(default)]
    fields: BTreeMap<String, String>,

    /// Release date, shown in listings but never searched
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,

    /// Pre-computed index tokens for this snapshot
    #[serde(skip)]
    search_ngrams: Option<NGramSet>,
}

impl ItemInfo {
    /// Create a new item with the given title.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(TITLE.to_string(), title.into());
        ItemInfo {
            id: ItemId(id),
            fields,
            release_date: None,
            search_ngrams: None,
        }
    }

    /// Set an arbitrary searchable field
    pub fn with_field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.set_field(name, text);
        self
    }

    /// Set the description
    pub fn with_description(self, text: impl Into<String>) -> Self {
        self.with_field(DESCRIPTION, text)
    }

    /// Set the release date
    pub fn with_release_date(mut self, date: DateTime<Utc>) -> Self {
        self.release_date = Some(date);
        self
    }

    /// The item's title, or an empty string if it has none
    pub fn title(&self) -> &str {
        self.field(TITLE).unwrap_or("")
    }

    /// Every searchable field, keyed by name
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Replace a field's text, invalidating any cached n-grams.
    pub fn set_field(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.fields.insert(name.into(), text.into());
        self.search_ngrams = None;
    }

    /// Replace the title, invalidating any cached n-grams.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.set_field(TITLE, title);
    }

    /// Iterate over the text of every searchable field
    pub fn searchable_text(&self) -> impl Iterator<Item = &str> {
        self.fields.values().map(String::as_str)
    }

    /// Recompute the cached n-gram set with the default gram length.
    pub fn refresh_ngrams(&mut self) {
        self.search_ngrams = Some(crate::search::calc_ngrams(self));
    }

    /// Return the cached n-grams if they were built with `gram_len`.
    pub fn cached_ngrams(&self, gram_len: usize) -> Option<&NGramSet> {
        self.search_ngrams
            .as_ref()
            .filter(|set| set.gram_len() == gram_len)
    }
}

impl PartialEq for ItemInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.fields == other.fields
            && self.release_date == other.release_date
    }
}

impl Eq for ItemInfo {}
