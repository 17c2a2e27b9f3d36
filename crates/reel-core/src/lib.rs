//! # Reel Core Library
//!
//! This crate provides the n-gram indexing and live filtering used to search
//! a local media library. It is purely in-process: item records come in from
//! an external source and match results go out to listeners.
//!
//! ## Architecture
//!
//! - **Tokenizer** (`ngrams`): Overlapping substrings of a word or word list
//! - **Codec** (`search`): Index tokens for terms and items, and the
//!   ground-truth `item_matches` predicate
//! - **Index** (`index`): `ItemSearcher`, the incremental inverted index
//! - **Source** (`source`): Messages and trait for the item producer
//! - **Filter** (`filter`): `IncrementalFilter`, minimal diffs for a live query
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust
//! use reel_core::{ItemInfo, ItemSearcher, ItemId};
//!
//! let mut searcher = ItemSearcher::new();
//! searcher.add_item(&ItemInfo::new(1, "my first item"));
//! searcher.add_item(&ItemInfo::new(2, "my second item"));
//!
//! assert_eq!(searcher.search("my").len(), 2);
//! assert!(searcher.search("second").contains(&ItemId(2)));
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod ngrams;
pub mod search;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ReelError, Result};
pub use filter::{ChannelListener, FilterChanges, FilterEvent, FilterListener, IncrementalFilter};
pub use index::{IndexStats, ItemSearcher, SharedItemSearcher};
pub use ngrams::{breakup_list, breakup_word};
pub use search::{calc_ngrams, item_matches, list_matches, ngrams_for_term, Query};
pub use source::{ItemList, ItemSource, ItemsChanged, VecItemSource};
pub use types::{ItemId, ItemInfo, NGramSet};
