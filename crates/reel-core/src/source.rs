//! Item source boundary.
//!
//! The media library that owns the items is outside this crate. It talks to
//! the core through the message types defined here: one full [`ItemList`]
//! when a view opens, then an [`ItemsChanged`] delta whenever the collection
//! mutates.
//!
//! ## Implementing a New Source
//!
//! 1. Implement [`ItemSource`] for the collection (database view, feed, ...)
//! 2. Hand it to [`IncrementalFilter::drive`](crate::filter::IncrementalFilter::drive),
//!    or forward its messages to the filter yourself

use crate::error::Result;
use crate::types::{ItemId, ItemInfo};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tracing::info;

/// The full contents of a collection at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemList {
    pub items: Vec<ItemInfo>,
}

impl ItemList {
    pub fn new(items: Vec<ItemInfo>) -> Self {
        ItemList { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A delta notification from the item source.
///
/// Removed items are identified by id only; by the time the delta is
/// delivered their snapshots may no longer exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsChanged {
    /// Items that are new to the collection
    pub added: Vec<ItemInfo>,

    /// Items whose content changed
    pub changed: Vec<ItemInfo>,

    /// Items that left the collection
    pub removed: Vec<ItemId>,
}

impl ItemsChanged {
    /// Create a delta with only added items
    pub fn added(items: Vec<ItemInfo>) -> Self {
        ItemsChanged {
            added: items,
            ..Default::default()
        }
    }

    /// Create a delta with only changed items
    pub fn changed(items: Vec<ItemInfo>) -> Self {
        ItemsChanged {
            changed: items,
            ..Default::default()
        }
    }

    /// Create a delta with only removed ids
    pub fn removed(ids: Vec<ItemId>) -> Self {
        ItemsChanged {
            removed: ids,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    /// Total number of items mentioned by this delta
    pub fn len(&self) -> usize {
        self.added.len() + self.changed.len() + self.removed.len()
    }
}

/// A producer of item snapshots.
///
/// The core pulls from a source; it never writes back. Implementations own
/// their storage and decide what "changed" means.
pub trait ItemSource {
    /// Snapshot of every current item, delivered once when a view opens
    fn initial_list(&mut self) -> Result<ItemList>;

    /// Next pending delta, or `None` when the source is caught up
    fn poll_changes(&mut self) -> Result<Option<ItemsChanged>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// An in-memory source replaying a fixed list and a queue of deltas.
///
/// Used for catalogs loaded from JSON and in tests.
#[derive(Debug, Clone, Default)]
pub struct VecItemSource {
    name: String,
    items: Vec<ItemInfo>,
    pending: VecDeque<ItemsChanged>,
}

impl VecItemSource {
    pub fn new(name: impl Into<String>, items: Vec<ItemInfo>) -> Self {
        VecItemSource {
            name: name.into(),
            items,
            pending: VecDeque::new(),
        }
    }

    /// Queue a delta to be returned by `poll_changes`
    pub fn push_changes(&mut self, changes: ItemsChanged) {
        self.pending.push_back(changes);
    }

    /// Build a source from a JSON catalog and an optional JSON delta script.
    ///
    /// The catalog is an array of items; the script is an array of deltas.
    pub fn from_json(name: impl Into<String>, catalog: &str, deltas: Option<&str>) -> Result<Self> {
        let list: ItemList = serde_json::from_str(catalog)?;
        let mut source = VecItemSource::new(name, list.items);
        if let Some(deltas) = deltas {
            let script: Vec<ItemsChanged> = serde_json::from_str(deltas)?;
            source.pending.extend(script);
        }
        Ok(source)
    }

    /// Load a catalog file and an optional delta script file.
    pub fn load(catalog: &Path, deltas: Option<&Path>) -> Result<Self> {
        let catalog_text = fs::read_to_string(catalog)?;
        let deltas_text = deltas.map(fs::read_to_string).transpose()?;
        let source = Self::from_json(
            catalog.display().to_string(),
            &catalog_text,
            deltas_text.as_deref(),
        )?;

        info!(
            source = %source.name,
            items = source.items.len(),
            deltas = source.pending.len(),
            "Loaded item catalog"
        );
        Ok(source)
    }

    /// Items currently in the catalog
    pub fn items(&self) -> &[ItemInfo] {
        &self.items
    }

    /// Number of deltas not yet polled
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl ItemSource for VecItemSource {
    fn initial_list(&mut self) -> Result<ItemList> {
        Ok(ItemList::new(self.items.clone()))
    }

    fn poll_changes(&mut self) -> Result<Option<ItemsChanged>> {
        let Some(changes) = self.pending.pop_front() else {
            return Ok(None);
        };

        // Keep the catalog in step so a later initial_list is current
        self.items.retain(|item| !changes.removed.contains(&item.id));
        for item in changes.changed.iter().chain(&changes.added) {
            match self.items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => self.items.push(item.clone()),
            }
        }

        Ok(Some(changes))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
