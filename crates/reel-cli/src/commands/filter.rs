//! Filter command - replay a catalog through a live filter.

use crate::OutputFormat;
use reel_core::{Config, FilterChanges, FilterListener, IncrementalFilter, ItemInfo, VecItemSource};
use std::path::Path;
use tracing::info;

/// Prints every filter notification as it arrives.
struct PrintListener {
    output: OutputFormat,
}

impl FilterListener for PrintListener {
    fn on_initial_list(&self, items: &[ItemInfo]) {
        for line in render_initial(items, self.output) {
            println!("{}", line);
        }
    }

    fn on_items_changed(&self, changes: &FilterChanges) {
        for line in render_changes(changes, self.output) {
            println!("{}", line);
        }
    }
}

fn render_initial(items: &[ItemInfo], output: OutputFormat) -> Vec<String> {
    match output {
        OutputFormat::Text => {
            let mut lines = vec![format!("initial list: {} items", items.len())];
            lines.extend(items.iter().map(|item| format!("  + {} {}", item.id, item.title())));
            lines
        }
        OutputFormat::Json => {
            let ids: Vec<u64> = items.iter().map(|item| item.id.as_u64()).collect();
            vec![serde_json::json!({ "event": "initial_list", "items": ids }).to_string()]
        }
    }
}

fn render_changes(changes: &FilterChanges, output: OutputFormat) -> Vec<String> {
    match output {
        OutputFormat::Text => {
            let mut lines = vec![format!(
                "changes: +{} ~{} -{}",
                changes.added.len(),
                changes.changed.len(),
                changes.removed.len()
            )];
            lines.extend(changes.added.iter().map(|item| format!("  + {} {}", item.id, item.title())));
            lines.extend(changes.changed.iter().map(|item| format!("  ~ {} {}", item.id, item.title())));
            lines.extend(changes.removed.iter().map(|id| format!("  - {}", id)));
            lines
        }
        OutputFormat::Json => {
            let added: Vec<u64> = changes.added.iter().map(|item| item.id.as_u64()).collect();
            let changed: Vec<u64> = changes.changed.iter().map(|item| item.id.as_u64()).collect();
            let removed: Vec<u64> = changes.removed.iter().map(|id| id.as_u64()).collect();
            vec![serde_json::json!({
                "event": "items_changed",
                "added": added,
                "changed": changed,
                "removed": removed,
            })
            .to_string()]
        }
    }
}

/// Run the filter command.
pub fn run(
    config: Config,
    catalog: &Path,
    deltas: Option<&Path>,
    query: Option<&str>,
    searches: &[String],
    output: OutputFormat,
) -> anyhow::Result<()> {
    let mut source = VecItemSource::load(catalog, deltas)?;

    let mut filter = IncrementalFilter::with_config(&config)?;
    if let Some(query) = query {
        filter.set_search(query);
    }
    filter.connect(PrintListener { output });

    let applied = filter.drive(&mut source)?;

    for text in searches {
        info!(query = %text, "Switching search");
        filter.set_search(text);
    }

    eprintln!();
    eprintln!(
        "Applied {} deltas; {} of {} items match {:?}",
        applied,
        filter.len(),
        filter.item_count(),
        filter.query()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_core::ItemId;

    #[test]
    fn test_render_initial_text() {
        let items = vec![ItemInfo::new(1, "info one"), ItemInfo::new(2, "info two")];
        let lines = render_initial(&items, OutputFormat::Text);
        assert_eq!(lines, vec!["initial list: 2 items", "  + 1 info one", "  + 2 info two"]);
    }

    #[test]
    fn test_render_changes_json() {
        let changes = FilterChanges {
            added: vec![ItemInfo::new(3, "info three")],
            changed: Vec::new(),
            removed: vec![ItemId(2)],
        };
        let lines = render_changes(&changes, OutputFormat::Json);
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["event"], "items_changed");
        assert_eq!(value["added"], serde_json::json!([3]));
        assert_eq!(value["changed"], serde_json::json!([]));
        assert_eq!(value["removed"], serde_json::json!([2]));
    }

    #[test]
    fn test_run_with_deltas() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = dir.path().join("catalog.json");
        let deltas = dir.path().join("deltas.json");
        std::fs::write(
            &catalog,
            r#"[{"id": 1, "fields": {"title": "info one"}}, {"id": 2, "fields": {"title": "info two"}}]"#,
        )
        .unwrap();
        std::fs::write(&deltas, r#"[{"added": [{"id": 3, "fields": {"title": "info three"}}]}]"#).unwrap();

        let searches = vec!["three".to_string()];
        run(
            Config::default(),
            &catalog,
            Some(&deltas),
            Some("t"),
            &searches,
            OutputFormat::Json,
        )
        .unwrap();
    }
}
