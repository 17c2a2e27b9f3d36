//! Query normalization, index tokens and the matching predicate.
//!
//! This module is the bridge between free text and index tokens:
//! - [`ngrams_for_term`] turns one term into the tokens stored in the index
//! - [`calc_ngrams`] derives the full token set of an item snapshot
//! - [`item_matches`] is the ground-truth predicate every search path agrees with
//!
//! The same term normalization is applied to item text and to queries, so
//! query tokens and index entries are always commensurable.

use crate::ngrams;
use crate::types::{ItemInfo, NGramSet};
use std::borrow::Borrow;
use std::collections::HashSet;

/// Length of the index tokens produced for long terms.
pub const DEFAULT_GRAM_LEN: usize = 5;

/// A normalized search string.
///
/// Normalization lowercases the text once so that repeated matching against
/// many items does not redo it.
///
/// # Example
/// ```
/// use reel_core::Query;
/// let query = Query::new("My FIRST");
/// assert_eq!(query.as_str(), "my first");
/// assert_eq!(query.terms().collect::<Vec<_>>(), vec!["my", "first"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    text: String,
}

impl Query {
    pub fn new(text: &str) -> Self {
        Query {
            text: text.to_lowercase(),
        }
    }

    /// The lowercased query text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True for the empty string, which matches every item
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True if the query has no terms (empty or whitespace only)
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whitespace-separated terms, as used by the indexed search path
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }

    /// Index tokens for each term, in term order.
    pub fn term_grams(&self, gram_len: usize) -> Vec<Vec<String>> {
        self.terms()
            .map(|term| ngrams_for_term_with(term, gram_len))
            .collect()
    }

    /// Check whether an item matches this query.
    ///
    /// The whole query must be a substring of a single searchable field.
    pub fn matches(&self, item: &ItemInfo) -> bool {
        if self.text.is_empty() {
            return true;
        }
        item.searchable_text()
            .any(|text| text.to_lowercase().contains(&self.text))
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::new(text)
    }
}

/// Index tokens for a single term using [`DEFAULT_GRAM_LEN`].
///
/// Terms shorter than the gram length are kept whole so that short words
/// stay searchable; longer terms become their overlapping windows, left to
/// right.
///
/// # Example
/// ```
/// use reel_core::search::ngrams_for_term;
/// assert_eq!(ngrams_for_term("five"), vec!["five"]);
/// assert_eq!(ngrams_for_term("verybig"), vec!["veryb", "erybi", "rybig"]);
/// ```
pub fn ngrams_for_term(term: &str) -> Vec<String> {
    ngrams_for_term_with(term, DEFAULT_GRAM_LEN)
}

/// Index tokens for a single term with an explicit gram length.
///
/// `gram_len` must be at least 1; callers validate it through the config
/// or [`ItemSearcher::with_gram_len`](crate::index::ItemSearcher::with_gram_len).
pub fn ngrams_for_term_with(term: &str, gram_len: usize) -> Vec<String> {
    debug_assert!(gram_len > 0, "gram length must be at least 1");
    let term = term.to_lowercase();
    if term.chars().count() < gram_len {
        return vec![term];
    }
    ngrams::windows(&term, gram_len)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Derive the index tokens of an item using [`DEFAULT_GRAM_LEN`].
pub fn calc_ngrams(item: &ItemInfo) -> NGramSet {
    calc_ngrams_with(item, DEFAULT_GRAM_LEN)
}

/// Derive the index tokens of an item with an explicit gram length.
pub fn calc_ngrams_with(item: &ItemInfo, gram_len: usize) -> NGramSet {
    let text = item.searchable_text().collect::<Vec<_>>().join(" ");
    let grams: HashSet<String> = text
        .to_lowercase()
        .split_whitespace()
        .flat_map(|term| ngrams_for_term_with(term, gram_len))
        .collect();
    NGramSet::new(gram_len, grams)
}

/// Check if a single item matches a search string (case-insensitive).
pub fn item_matches(item: &ItemInfo, query: &str) -> bool {
    Query::new(query).matches(item)
}

/// Lazily filter a sequence of items, preserving their order.
///
/// This is the reference implementation the indexed paths are checked
/// against.
pub fn list_matches<I>(items: I, query: &str) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator,
    I::Item: Borrow<ItemInfo>,
{
    let query = Query::new(query);
    items
        .into_iter()
        .filter(move |item| query.matches(item.borrow()))
}
