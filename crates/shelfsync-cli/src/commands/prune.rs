use super::{load_settings, notion_store};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;

pub async fn run_prune(property: &str, output: &Output) -> Result<()> {
    let (config, credentials) = load_settings()?;
    let store = notion_store(&config, &credentials)?;

    let report = store
        .prune_multi_select_options(property)
        .await
        .map_err(|e| eyre!("Failed to prune options of {}: {}", property, e))?;

    if output.is_human() {
        output.success(format!(
            "{}: kept {} options, removed {}",
            property, report.kept, report.removed
        ));
    } else {
        output.json(&json!({
            "property": property,
            "kept": report.kept,
            "removed": report.removed,
        }));
    }
    Ok(())
}
