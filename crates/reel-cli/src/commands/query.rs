//! Query command - search a catalog.

use crate::app::App;
use crate::{OutputFormat, SearchMode};
use reel_core::{list_matches, Config, ItemInfo};
use std::path::Path;
use std::time::Instant;

/// Run the query command.
pub fn run(
    config: Config,
    catalog: &Path,
    text: &str,
    mode: SearchMode,
    limit: Option<usize>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::open(config, catalog, None)?;
    let limit = limit.unwrap_or(app.config.general.max_results);

    if app.searcher.is_empty() {
        eprintln!("Catalog {} has no items.", catalog.display());
        return Ok(());
    }

    let start = Instant::now();
    let results: Vec<&ItemInfo> = match mode {
        SearchMode::Index => app.in_catalog_order(&app.searcher.search(text)),
        SearchMode::Verified => app.in_catalog_order(&app.searcher.search_matching(text)),
        SearchMode::Scan => list_matches(app.source.items(), text).collect(),
    };
    let elapsed = start.elapsed();
    let total = results.len();

    match output {
        OutputFormat::Text => {
            for item in results.iter().take(limit) {
                let id = item.id.as_u64();
                match item.release_date {
                    Some(date) => println!("{:>6}  {} ({})", id, item.title(), date.format("%Y-%m-%d")),
                    None => println!("{:>6}  {}", id, item.title()),
                }
            }

            eprintln!();
            if total > limit {
                eprintln!("Showing {} of {} results", limit, total);
            }
            eprintln!(
                "Found {} results in {:.3}ms",
                total,
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = results
                .iter()
                .take(limit)
                .map(|item| {
                    serde_json::json!({
                        "id": item.id,
                        "fields": item.fields(),
                        "release_date": item.release_date.map(|d| d.to_rfc3339()),
                    })
                })
                .collect();

            println!("{}", serde_json::to_string_pretty(&json_results)?);
        }
    }

    Ok(())
}
