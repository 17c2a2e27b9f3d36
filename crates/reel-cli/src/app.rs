//! Application state management.

use reel_core::{Config, ItemId, ItemInfo, ItemSearcher, VecItemSource};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// A loaded catalog and the index built over it.
pub struct App {
    /// Configuration
    pub config: Config,

    /// The catalog and its pending deltas
    pub source: VecItemSource,

    /// The item index
    pub searcher: ItemSearcher,
}

impl App {
    /// Load a catalog (and optional delta script) and index it.
    pub fn open(config: Config, catalog: &Path, deltas: Option<&Path>) -> anyhow::Result<Self> {
        let source = VecItemSource::load(catalog, deltas)?;
        let mut searcher = ItemSearcher::with_config(&config.index)?;
        searcher.add_items(source.items());

        info!(
            catalog = %catalog.display(),
            items = searcher.len(),
            "Application initialized"
        );

        Ok(App {
            config,
            source,
            searcher,
        })
    }

    /// Resolve ids to items in catalog order
    pub fn in_catalog_order<'a>(&'a self, ids: &HashSet<ItemId>) -> Vec<&'a ItemInfo> {
        self.source
            .items()
            .iter()
            .filter(|item| ids.contains(&item.id))
            .collect()
    }
}
