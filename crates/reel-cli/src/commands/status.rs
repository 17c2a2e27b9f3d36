//! Status command - show index statistics for a catalog.

use crate::app::App;
use chrono::{DateTime, Utc};
use reel_core::Config;
use std::path::Path;

/// Run the status command.
pub fn run(config: Config, catalog: &Path) -> anyhow::Result<()> {
    let app = App::open(config, catalog, None)?;
    let stats = app.searcher.stats();

    println!("Reel Index Status");
    println!("=================");
    println!();

    if app.searcher.is_empty() {
        println!("Catalog {} has no items.", catalog.display());
        return Ok(());
    }

    println!("Summary:");
    println!("  Items:           {}", stats.items);
    println!("  Distinct grams:  {}", stats.grams);
    println!("  Postings:        {}", stats.postings);
    println!(
        "  Grams per item:  {:.1}",
        stats.postings as f64 / stats.items as f64
    );
    println!("  Gram length:     {}", app.searcher.gram_len());
    println!("  Generation:      {}", app.searcher.generation());

    let dates: Vec<DateTime<Utc>> = app
        .source
        .items()
        .iter()
        .filter_map(|item| item.release_date)
        .collect();

    if let (Some(oldest), Some(newest)) = (dates.iter().min(), dates.iter().max()) {
        println!();
        println!("Releases:");
        println!("  Dated items:     {}", dates.len());
        println!("  Oldest:          {}", oldest.format("%Y-%m-%d"));
        println!("  Newest:          {}", newest.format("%Y-%m-%d"));
    }

    println!();
    println!("Catalog: {}", catalog.display());

    Ok(())
}
