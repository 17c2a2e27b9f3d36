//! Inverted n-gram index over media items.
//!
//! The `ItemSearcher` maps index tokens to the items whose text produced
//! them. It supports:
//!
//! - Adding items one at a time or in bulk (parallel token derivation)
//! - Incremental updates and removals that never leave stale postings
//! - Token search (AND across every token of every query term)
//! - Verified search that agrees with [`item_matches`](crate::search::item_matches)
//!
//! ## Architecture
//!
//! Two maps are kept consistent by construction:
//! - `postings: HashMap<String, HashSet<ItemId>>` is the inverted index
//! - `entries: HashMap<ItemId, IndexedItem>` records, per item, the exact token
//!   set used to populate `postings`, so removal clears precisely those
//!   buckets
//!
//! Every mutation derives what it needs before touching either map.

use crate::config::IndexConfig;
use crate::error::{ReelError, Result};
use crate::search::{self, Query, DEFAULT_GRAM_LEN};
use crate::types::{ItemId, ItemInfo, NGramSet};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// An `ItemSearcher` shared between threads.
///
/// The searcher itself is not synchronized; callers that need to share one
/// serialize access through this lock.
pub type SharedItemSearcher = Arc<RwLock<ItemSearcher>>;

/// Default batch size above which bulk adds derive tokens in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// The mutable inverted index over item identifiers.
///
/// ## Example
///
/// ```rust
/// use reel_core::{ItemInfo, ItemSearcher, ItemId};
///
/// let mut searcher = ItemSearcher::new();
/// searcher.add_item(&ItemInfo::new(1, "my first item"));
/// searcher.add_item(&ItemInfo::new(2, "my second item"));
///
/// let results = searcher.search("first");
/// assert!(results.contains(&ItemId(1)));
/// assert_eq!(results.len(), 1);
/// ```
pub struct ItemSearcher {
    /// Token to the items indexed under it
    postings: HashMap<String, HashSet<ItemId>>,

    /// What was indexed for each item
    entries: HashMap<ItemId, IndexedItem>,

    /// Window length used for long terms
    gram_len: usize,

    /// Batch size above which bulk adds go parallel
    parallel_threshold: usize,

    /// Modification counter
    generation: u64,
}

/// Per-item record of indexed state.
#[derive(Debug, Clone)]
struct IndexedItem {
    /// Tokens this item is listed under in `postings`
    grams: NGramSet,

    /// Lowercased searchable fields, for confirming candidates
    fields: Vec<String>,
}

impl IndexedItem {
    fn matches(&self, query: &Query) -> bool {
        query.is_empty() || self.fields.iter().any(|f| f.contains(query.as_str()))
    }
}

/// Statistics about the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of indexed items
    pub items: usize,

    /// Number of distinct tokens
    pub grams: usize,

    /// Total number of (token, item) pairs
    pub postings: usize,
}

impl Default for ItemSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemSearcher {
    /// Create an empty searcher with the default gram length.
    pub fn new() -> Self {
        ItemSearcher {
            postings: HashMap::new(),
            entries: HashMap::new(),
            gram_len: DEFAULT_GRAM_LEN,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            generation: 0,
        }
    }

    /// Create an empty searcher with an explicit gram length.
    pub fn with_gram_len(gram_len: usize) -> Result<Self> {
        if gram_len == 0 {
            return Err(ReelError::invalid_argument("gram length must be at least 1"));
        }
        Ok(ItemSearcher {
            gram_len,
            ..Self::new()
        })
    }

    /// Create an empty searcher from the `[index]` configuration section.
    pub fn with_config(config: &IndexConfig) -> Result<Self> {
        let mut searcher = Self::with_gram_len(config.gram_len)?;
        searcher.parallel_threshold = config.parallel_threshold;
        Ok(searcher)
    }

    /// Wrap this searcher for sharing across threads.
    pub fn into_shared(self) -> SharedItemSearcher {
        Arc::new(RwLock::new(self))
    }

    pub fn gram_len(&self) -> usize {
        self.gram_len
    }

    /// Get the number of indexed items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Get the current generation (modification counter).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get current index statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            items: self.entries.len(),
            grams: self.postings.len(),
            postings: self.postings.values().map(HashSet::len).sum(),
        }
    }

    /// Add an item to the index.
    ///
    /// Adding an id that is already indexed replaces its previous entry, the
    /// same as [`update_item`](Self::update_item).
    pub fn add_item(&mut self, item: &ItemInfo) {
        let entry = self.prepare(item);
        if self.unlink(item.id).is_some() {
            debug!(id = %item.id, "Re-adding indexed item as update");
        }
        self.link(item.id, entry);
        self.generation += 1;
    }

    /// Add many items at once.
    ///
    /// Token derivation runs on the rayon pool once the batch is larger than
    /// the configured parallel threshold; the index itself is updated on the
    /// calling thread.
    #[instrument(skip(self, items))]
    pub fn add_items<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a ItemInfo>,
    {
        let items: Vec<&ItemInfo> = items.into_iter().collect();
        let parallel = items.len() > self.parallel_threshold;

        let prepared: Vec<(ItemId, IndexedItem)> = if parallel {
            items
                .par_iter()
                .map(|item| (item.id, self.prepare(item)))
                .collect()
        } else {
            items
                .iter()
                .map(|item| (item.id, self.prepare(item)))
                .collect()
        };

        for (id, entry) in prepared {
            self.unlink(id);
            self.link(id, entry);
        }
        self.generation += 1;

        info!(
            count = items.len(),
            parallel = parallel,
            total = self.entries.len(),
            "Bulk indexing complete"
        );
    }

    /// Re-index an item whose text changed.
    ///
    /// Fails with [`ReelError::NotFound`] if the item was never added, in
    /// which case the index is untouched.
    pub fn update_item(&mut self, item: &ItemInfo) -> Result<()> {
        if !self.entries.contains_key(&item.id) {
            return Err(ReelError::NotFound { id: item.id });
        }
        let entry = self.prepare(item);
        self.unlink(item.id);
        self.link(item.id, entry);
        self.generation += 1;
        debug!(id = %item.id, "Updated indexed item");
        Ok(())
    }

    /// Remove an item and every posting recorded for it.
    ///
    /// Fails with [`ReelError::NotFound`] if the item is not indexed.
    pub fn remove_item(&mut self, id: ItemId) -> Result<()> {
        let entry = self.unlink(id).ok_or(ReelError::NotFound { id })?;
        self.generation += 1;
        debug!(id = %id, grams = entry.grams.len(), "Removed indexed item");
        Ok(())
    }

    /// Clear the entire index.
    pub fn clear(&mut self) {
        self.postings.clear();
        self.entries.clear();
        self.generation += 1;
    }

    /// Token search.
    ///
    /// The query is split into terms exactly as item text is; an item matches
    /// when it is indexed under every token of every term. A query without
    /// terms returns every indexed item.
    ///
    /// A term shorter than the gram length only matches whole indexed words,
    /// so this path can miss items that [`item_matches`](crate::search::item_matches)
    /// accepts (`"eco"` against `"second"`). Use
    /// [`search_matching`](Self::search_matching) when results must agree
    /// with the predicate.
    pub fn search(&self, query: &str) -> HashSet<ItemId> {
        let query = Query::new(query);
        if query.is_blank() {
            return self.entries.keys().copied().collect();
        }

        let grams: Vec<String> = query
            .term_grams(self.gram_len)
            .into_iter()
            .flatten()
            .collect();
        self.ids_with_all(&grams)
    }

    /// Verified search.
    ///
    /// Terms long enough to be fully covered by the index narrow the
    /// candidates; each candidate is then confirmed against the whole query
    /// with the same substring test as `item_matches`. Queries made only of
    /// short terms are confirmed against every item.
    pub fn search_matching(&self, query: &str) -> HashSet<ItemId> {
        let query = Query::new(query);

        let grams: Vec<String> = query
            .terms()
            .filter(|term| term.chars().count() >= self.gram_len)
            .flat_map(|term| search::ngrams_for_term_with(term, self.gram_len))
            .collect();

        if grams.is_empty() {
            return self
                .entries
                .iter()
                .filter(|(_, entry)| entry.matches(&query))
                .map(|(id, _)| *id)
                .collect();
        }

        self.ids_with_all(&grams)
            .into_iter()
            .filter(|id| self.entries.get(id).is_some_and(|e| e.matches(&query)))
            .collect()
    }

    /// Items indexed under every one of `grams`.
    fn ids_with_all(&self, grams: &[String]) -> HashSet<ItemId> {
        let mut lists = Vec::with_capacity(grams.len());
        for gram in grams {
            match self.postings.get(gram) {
                Some(ids) => lists.push(ids),
                None => return HashSet::new(),
            }
        }

        // Walk the smallest posting list, probing the others
        lists.sort_by_key(|ids| ids.len());
        let Some((smallest, rest)) = lists.split_first() else {
            return HashSet::new();
        };
        smallest
            .iter()
            .filter(|id| rest.iter().all(|ids| ids.contains(*id)))
            .copied()
            .collect()
    }

    /// Derive everything needed to index `item` without touching the maps.
    fn prepare(&self, item: &ItemInfo) -> IndexedItem {
        let grams = match item.cached_ngrams(self.gram_len) {
            Some(cached) => cached.clone(),
            None => search::calc_ngrams_with(item, self.gram_len),
        };
        let fields = item.searchable_text().map(str::to_lowercase).collect();
        IndexedItem { grams, fields }
    }

    fn link(&mut self, id: ItemId, entry: IndexedItem) {
        for gram in entry.grams.iter() {
            self.postings.entry(gram.to_string()).or_default().insert(id);
        }
        self.entries.insert(id, entry);
    }

    /// Drop `id` from every bucket recorded for it; empty buckets go too.
    fn unlink(&mut self, id: ItemId) -> Option<IndexedItem> {
        let entry = self.entries.remove(&id)?;
        for gram in entry.grams.iter() {
            if let Some(ids) = self.postings.get_mut(gram) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(gram);
                }
            }
        }
        Some(entry)
    }
}

impl std::fmt::Debug for ItemSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemSearcher")
            .field("items", &self.len())
            .field("gram_len", &self.gram_len)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::list_matches;

    fn ids(values: &[u64]) -> HashSet<ItemId> {
        values.iter().copied().map(ItemId).collect()
    }

    fn make_searcher() -> (ItemSearcher, ItemInfo, ItemInfo) {
        let mut searcher = ItemSearcher::new();
        let item1 = ItemInfo::new(1, "my first item");
        let item2 = ItemInfo::new(2, "my second item");
        searcher.add_item(&item1);
        searcher.add_item(&item2);
        (searcher, item1, item2)
    }

    /// Every posting points at a live entry that recorded the gram, and
    /// every recorded gram has a posting.
    fn assert_consistent(searcher: &ItemSearcher) {
        for (gram, posted) in &searcher.postings {
            assert!(!posted.is_empty(), "empty bucket for {}", gram);
            for id in posted {
                let entry = searcher.entries.get(id).expect("posting for unknown id");
                assert!(entry.grams.contains(gram));
            }
        }
        for (id, entry) in &searcher.entries {
            for gram in entry.grams.iter() {
                assert!(searcher.postings[gram].contains(id));
            }
        }
    }

    #[test]
    fn test_match() {
        let (searcher, _, _) = make_searcher();
        assert_eq!(searcher.search("my"), ids(&[1, 2]));
        assert_eq!(searcher.search("first"), ids(&[1]));
        assert!(searcher.search("miro").is_empty());
    }

    #[test]
    fn test_multi_term_and() {
        let (searcher, _, _) = make_searcher();
        assert_eq!(searcher.search("my item"), ids(&[1, 2]));
        assert_eq!(searcher.search("MY Second"), ids(&[2]));
        assert!(searcher.search("first second").is_empty());
    }

    #[test]
    fn test_update() {
        let (mut searcher, mut item1, _) = make_searcher();
        item1.set_title("my new title");
        searcher.update_item(&item1).unwrap();

        assert_eq!(searcher.search("my"), ids(&[1, 2]));
        assert_eq!(searcher.search("item"), ids(&[2]));
        assert_eq!(searcher.search("title"), ids(&[1]));
        assert!(searcher.search("first").is_empty());
        assert_consistent(&searcher);
    }

    #[test]
    fn test_update_twice_is_idempotent() {
        let (mut searcher, mut item1, _) = make_searcher();
        item1.set_title("my new title");

        searcher.update_item(&item1).unwrap();
        let once: Vec<_> = ["my", "item", "title", "first", ""]
            .iter()
            .map(|q| searcher.search(q))
            .collect();
        let stats_once = searcher.stats();

        searcher.update_item(&item1).unwrap();
        let twice: Vec<_> = ["my", "item", "title", "first", ""]
            .iter()
            .map(|q| searcher.search(q))
            .collect();

        assert_eq!(once, twice);
        assert_eq!(stats_once, searcher.stats());
    }

    #[test]
    fn test_remove() {
        let (mut searcher, _, item2) = make_searcher();
        searcher.remove_item(item2.id).unwrap();

        assert_eq!(searcher.search("my"), ids(&[1]));
        assert!(searcher.search("second").is_empty());
        assert!(!searcher.contains(item2.id));
        assert_consistent(&searcher);
    }

    #[test]
    fn test_remove_leaves_no_postings() {
        let (mut searcher, item1, item2) = make_searcher();
        searcher.remove_item(item1.id).unwrap();
        searcher.remove_item(item2.id).unwrap();

        assert!(searcher.is_empty());
        assert_eq!(searcher.stats(), IndexStats::default());
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let (mut searcher, _, _) = make_searcher();
        let before = searcher.stats();
        let generation = searcher.generation();

        assert!(matches!(
            searcher.remove_item(ItemId(99)),
            Err(ReelError::NotFound { id: ItemId(99) })
        ));
        assert!(matches!(
            searcher.update_item(&ItemInfo::new(99, "ghost")),
            Err(ReelError::NotFound { .. })
        ));

        assert_eq!(searcher.stats(), before);
        assert_eq!(searcher.generation(), generation);
        assert!(searcher.search("ghost").is_empty());
    }

    #[test]
    fn test_duplicate_add_replaces() {
        let (mut searcher, _, _) = make_searcher();
        searcher.add_item(&ItemInfo::new(1, "renamed entry"));

        assert_eq!(searcher.len(), 2);
        assert!(searcher.search("first").is_empty());
        assert_eq!(searcher.search("renamed"), ids(&[1]));
        assert_consistent(&searcher);
    }

    #[test]
    fn test_blank_query_returns_everything() {
        let (searcher, _, _) = make_searcher();
        assert_eq!(searcher.search(""), ids(&[1, 2]));
        assert_eq!(searcher.search("   "), ids(&[1, 2]));
    }

    #[test]
    fn test_empty_index() {
        let searcher = ItemSearcher::new();
        assert!(searcher.search("").is_empty());
        assert!(searcher.search("anything").is_empty());
        assert!(searcher.search_matching("anything").is_empty());
    }

    #[test]
    fn test_uses_cached_ngrams() {
        let mut searcher = ItemSearcher::new();
        let mut item = ItemInfo::new(5, "cached words");
        item.refresh_ngrams();
        searcher.add_item(&item);
        assert_eq!(searcher.search("cached"), ids(&[5]));
    }

    #[test]
    fn test_search_matching_agrees_with_predicate() {
        let items = vec![
            ItemInfo::new(1, "my first item"),
            ItemInfo::new(2, "my second item"),
            ItemInfo::new(3, "Secondhand Stories").with_description("A podcast about thrift"),
            ItemInfo::new(4, "Info Four").with_field("artist", "The Firsts"),
            ItemInfo::new(5, "ÉCOLE du soir"),
        ];
        let mut searcher = ItemSearcher::new();
        searcher.add_items(&items);

        let queries = [
            "", " ", "my", "first", "irst", "eco", "d", "second", "seco", "econd",
            "my second", "y sec", "thrift", "podcast about", "FIRSTS", "the firsts",
            "école", "miro", "item my", "hand stor",
        ];
        for query in queries {
            let expected: HashSet<ItemId> = list_matches(&items, query).map(|i| i.id).collect();
            assert_eq!(searcher.search_matching(query), expected, "query {:?}", query);
        }
    }

    #[test]
    fn test_token_search_misses_short_substrings() {
        let (searcher, _, _) = make_searcher();
        // "eco" is inside "second" but is not a whole word
        assert!(searcher.search("eco").is_empty());
        assert_eq!(searcher.search_matching("eco"), ids(&[2]));
    }

    #[test]
    fn test_add_items_parallel() {
        let config = IndexConfig {
            gram_len: DEFAULT_GRAM_LEN,
            parallel_threshold: 4,
        };
        let mut searcher = ItemSearcher::with_config(&config).unwrap();
        let items: Vec<ItemInfo> = (0..50)
            .map(|i| ItemInfo::new(i, format!("episode {} of season", i)))
            .collect();
        searcher.add_items(&items);

        assert_eq!(searcher.len(), 50);
        assert_eq!(searcher.search("season").len(), 50);
        assert_eq!(searcher.search("episode 42"), ids(&[42]));
        assert_consistent(&searcher);
    }

    #[test]
    fn test_gram_len() {
        assert!(ItemSearcher::with_gram_len(0).is_err());

        let mut searcher = ItemSearcher::with_gram_len(3).unwrap();
        let mut item = ItemInfo::new(1, "second");
        // a cache built for another gram length must not be reused
        item.refresh_ngrams();
        searcher.add_item(&item);

        assert_eq!(searcher.gram_len(), 3);
        assert_eq!(searcher.search("eco"), ids(&[1]));
        assert!(searcher.search("seconds").is_empty());
    }

    #[test]
    fn test_shared_searcher() {
        let shared = ItemSearcher::new().into_shared();
        let writer = Arc::clone(&shared);

        std::thread::spawn(move || {
            writer.write().add_item(&ItemInfo::new(1, "threaded title"));
        })
        .join()
        .unwrap();

        assert_eq!(shared.read().search("threaded"), ids(&[1]));
    }

    #[test]
    fn test_generation() {
        let mut searcher = ItemSearcher::new();
        let gen1 = searcher.generation();

        searcher.add_item(&ItemInfo::new(1, "anything"));
        let gen2 = searcher.generation();
        assert!(gen2 > gen1);

        searcher.clear();
        assert!(searcher.generation() > gen2);
        assert!(searcher.is_empty());
    }
}
