//! Live filtering of an item collection.
//!
//! An [`IncrementalFilter`] sits between an item source and a view. It keeps
//! the subset of items matching one mutable query and tells its listeners
//! only what changed:
//!
//! - `on_initial_list` once, when the first full list arrives
//! - `on_items_changed` with `added`, `changed` and `removed` after every
//!   query change or delta that affects the subset
//!
//! The subset is always exactly the items for which
//! [`item_matches`](crate::search::item_matches) holds under the current
//! query. Query changes are answered through an internal [`ItemSearcher`];
//! deltas are checked item by item.

use crate::config::Config;
use crate::error::Result;
use crate::index::ItemSearcher;
use crate::search::Query;
use crate::source::{ItemList, ItemSource, ItemsChanged};
use crate::types::{ItemId, ItemInfo};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// The diff delivered to listeners after the initial list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChanges {
    /// Items that started matching
    pub added: Vec<ItemInfo>,

    /// Items that matched before and after a content change
    pub changed: Vec<ItemInfo>,

    /// Items that stopped matching or left the collection
    pub removed: Vec<ItemId>,
}

impl FilterChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Receiver of filter notifications.
///
/// Callbacks run synchronously on the thread that drives the filter.
pub trait FilterListener {
    /// Called exactly once, with the matching items in source order
    fn on_initial_list(&self, items: &[ItemInfo]);

    /// Called whenever the matching subset changes
    fn on_items_changed(&self, changes: &FilterChanges);
}

/// Messages sent by [`ChannelListener`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    /// The initial matching list
    InitialList(Vec<ItemInfo>),
    /// A diff of the matching subset
    ItemsChanged(FilterChanges),
}

/// A channel-based listener implementation
pub struct ChannelListener {
    sender: crossbeam_channel::Sender<FilterEvent>,
}

impl ChannelListener {
    /// Create a new channel-based listener
    pub fn new() -> (Self, crossbeam_channel::Receiver<FilterEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelListener { sender }, receiver)
    }
}

impl FilterListener for ChannelListener {
    fn on_initial_list(&self, items: &[ItemInfo]) {
        let _ = self.sender.send(FilterEvent::InitialList(items.to_vec()));
    }

    fn on_items_changed(&self, changes: &FilterChanges) {
        let _ = self.sender.send(FilterEvent::ItemsChanged(changes.clone()));
    }
}

/// Lifecycle of a filter
#[derive(Debug)]
enum FilterState {
    /// No item list received yet; only the query can be set
    Uninitialized,
    /// Tracking a collection
    Active { matching: HashSet<ItemId> },
}

/// Maintains the matching subset of a collection for a mutable query.
///
/// ## Example
///
/// ```rust
/// use reel_core::{ChannelListener, FilterEvent, IncrementalFilter, ItemInfo, ItemList};
///
/// let mut filter = IncrementalFilter::new();
/// let (listener, events) = ChannelListener::new();
/// filter.connect(listener);
///
/// filter.set_search("two");
/// filter.handle_item_list(ItemList::new(vec![
///     ItemInfo::new(1, "info one"),
///     ItemInfo::new(2, "info two"),
/// ]));
///
/// match events.try_recv().unwrap() {
///     FilterEvent::InitialList(items) => assert_eq!(items[0].title(), "info two"),
///     other => panic!("unexpected event {:?}", other),
/// }
/// ```
pub struct IncrementalFilter {
    /// Current normalized query
    query: Query,

    /// Lifecycle and matching subset
    state: FilterState,

    /// Every known item, by id
    items: HashMap<ItemId, ItemInfo>,

    /// Known ids in source order
    order: Vec<ItemId>,

    /// Index over `items`, used to answer query changes
    searcher: ItemSearcher,

    /// Registered listeners
    listeners: Vec<Box<dyn FilterListener>>,
}

impl Default for IncrementalFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalFilter {
    /// Create an uninitialized filter with an empty query.
    pub fn new() -> Self {
        Self::with_searcher(ItemSearcher::new())
    }

    /// Create an uninitialized filter from configuration.
    pub fn with_config(config: &Config) -> Result<Self> {
        let mut filter = Self::with_searcher(ItemSearcher::with_config(&config.index)?);
        filter.query = Query::new(&config.filter.initial_query);
        Ok(filter)
    }

    fn with_searcher(searcher: ItemSearcher) -> Self {
        IncrementalFilter {
            query: Query::default(),
            state: FilterState::Uninitialized,
            items: HashMap::new(),
            order: Vec::new(),
            searcher,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for this filter's notifications.
    pub fn connect(&mut self, listener: impl FilterListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The current (lowercased) query
    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    /// True once the initial item list has been received
    pub fn is_active(&self) -> bool {
        matches!(self.state, FilterState::Active { .. })
    }

    /// Number of known items, matching or not
    pub fn item_count(&self) -> usize {
        self.order.len()
    }

    /// Number of matching items
    pub fn len(&self) -> usize {
        match &self.state {
            FilterState::Uninitialized => 0,
            FilterState::Active { matching } => matching.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matching ids in source order
    pub fn matching_ids(&self) -> Vec<ItemId> {
        self.matching_items().iter().map(|item| item.id).collect()
    }

    /// Matching items in source order
    pub fn matching_items(&self) -> Vec<&ItemInfo> {
        let FilterState::Active { matching } = &self.state else {
            return Vec::new();
        };
        self.order
            .iter()
            .filter(|id| matching.contains(*id))
            .filter_map(|id| self.items.get(id))
            .collect()
    }

    /// Change the query.
    ///
    /// Before the initial list arrives this only records the query. Once
    /// active, listeners receive the items that started or stopped matching;
    /// `changed` is always empty since no content changed.
    pub fn set_search(&mut self, text: &str) {
        let query = Query::new(text);
        if query == self.query {
            return;
        }
        self.query = query;

        let FilterState::Active { matching } = &mut self.state else {
            debug!(query = %self.query.as_str(), "Query set before initial list");
            return;
        };

        let now = self.searcher.search_matching(self.query.as_str());
        let mut changes = FilterChanges::default();
        for id in &self.order {
            match (matching.contains(id), now.contains(id)) {
                (false, true) => {
                    if let Some(item) = self.items.get(id) {
                        changes.added.push(item.clone());
                    }
                }
                (true, false) => changes.removed.push(*id),
                _ => {}
            }
        }
        *matching = now;

        debug!(
            query = %self.query.as_str(),
            matching = matching.len(),
            "Search changed"
        );
        self.emit(changes);
    }

    /// Accept a full item list from the source.
    ///
    /// The first list activates the filter and is delivered to listeners as
    /// the initial list. Any later list is treated as a reset: the known
    /// items are replaced and listeners get a diff against the previous
    /// subset.
    #[instrument(skip(self, list), fields(items = list.len()))]
    pub fn handle_item_list(&mut self, list: ItemList) {
        let previous_order = self.replace_items(list.items);
        let now = self.searcher.search_matching(self.query.as_str());

        match std::mem::replace(&mut self.state, FilterState::Uninitialized) {
            FilterState::Uninitialized => {
                let initial: Vec<ItemInfo> = self
                    .order
                    .iter()
                    .filter(|id| now.contains(*id))
                    .filter_map(|id| self.items.get(id).cloned())
                    .collect();
                self.state = FilterState::Active { matching: now };

                info!(
                    items = self.order.len(),
                    matching = initial.len(),
                    "Filter active"
                );
                for listener in &self.listeners {
                    listener.on_initial_list(&initial);
                }
            }
            FilterState::Active { matching: before } => {
                let mut changes = FilterChanges::default();
                for id in &self.order {
                    let Some(item) = self.items.get(id) else {
                        continue;
                    };
                    match (before.contains(id), now.contains(id)) {
                        (false, true) => changes.added.push(item.clone()),
                        (true, true) => changes.changed.push(item.clone()),
                        _ => {}
                    }
                }
                changes.removed = previous_order
                    .into_iter()
                    .filter(|id| before.contains(id) && !now.contains(id))
                    .collect();
                self.state = FilterState::Active { matching: now };

                info!(items = self.order.len(), "Filter reset from new item list");
                self.emit(changes);
            }
        }
    }

    /// Apply a delta from the source.
    ///
    /// Added and changed items are tested against the current query; removed
    /// ids are dropped. Removals apply last, so an id listed as both added
    /// and removed ends up absent and is reported at most once. Deltas
    /// received before the initial list are ignored.
    pub fn handle_items_changed(&mut self, delta: ItemsChanged) {
        let FilterState::Active { matching } = &mut self.state else {
            warn!(size = delta.len(), "Ignoring item delta before initial list");
            return;
        };

        let mut changes = FilterChanges::default();

        for item in delta.added.into_iter().chain(delta.changed) {
            let id = item.id;
            let was_matching = matching.contains(&id);
            let now_matching = self.query.matches(&item);

            self.searcher.add_item(&item);
            if self.items.insert(id, item.clone()).is_none() {
                self.order.push(id);
            }

            match (was_matching, now_matching) {
                (false, true) => {
                    matching.insert(id);
                    changes.added.push(item);
                }
                (true, true) => changes.changed.push(item),
                (true, false) => {
                    matching.remove(&id);
                    changes.removed.push(id);
                }
                (false, false) => {}
            }
        }

        let mut dropped = HashSet::new();
        for id in delta.removed {
            if self.items.remove(&id).is_some() {
                let _ = self.searcher.remove_item(id);
                dropped.insert(id);
            }
            if !matching.remove(&id) {
                continue;
            }
            // Added and removed in one delta cancel out
            if let Some(pos) = changes.added.iter().position(|item| item.id == id) {
                changes.added.remove(pos);
            } else {
                changes.changed.retain(|item| item.id != id);
                changes.removed.push(id);
            }
        }
        if !dropped.is_empty() {
            self.order.retain(|known| !dropped.contains(known));
        }

        self.emit(changes);
    }

    /// Feed a source's initial list (if not yet active) and every pending
    /// delta through the filter. Returns the number of deltas applied.
    #[instrument(skip_all, fields(source = source.name()))]
    pub fn drive(&mut self, source: &mut dyn ItemSource) -> Result<usize> {
        if !self.is_active() {
            let list = source.initial_list()?;
            self.handle_item_list(list);
        }

        let mut applied = 0;
        while let Some(delta) = source.poll_changes()? {
            self.handle_items_changed(delta);
            applied += 1;
        }
        Ok(applied)
    }

    /// Replace all known items, rebuilding the index. Returns the old order.
    fn replace_items(&mut self, items: Vec<ItemInfo>) -> Vec<ItemId> {
        self.searcher.clear();
        self.searcher.add_items(&items);
        self.items.clear();
        let previous = std::mem::take(&mut self.order);

        for item in items {
            let id = item.id;
            if self.items.insert(id, item).is_none() {
                self.order.push(id);
            }
        }
        previous
    }

    fn emit(&self, changes: FilterChanges) {
        if changes.is_empty() {
            return;
        }
        debug!(
            added = changes.added.len(),
            changed = changes.changed.len(),
            removed = changes.removed.len(),
            "Emitting filter changes"
        );
        for listener in &self.listeners {
            listener.on_items_changed(&changes);
        }
    }
}

impl std::fmt::Debug for IncrementalFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalFilter")
            .field("query", &self.query.as_str())
            .field("state", &self.state)
            .field("items", &self.order.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
