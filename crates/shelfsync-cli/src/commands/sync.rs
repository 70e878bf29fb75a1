use super::{load_settings, notion_store};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{presets, Cell, Table};
use shelf_sync_config::{Config, CredentialStore};
use shelf_sync_core::{EngineOptions, SyncOrchestrator, SyncResult};
use shelf_sync_sources::{ContentSource, SourceFactoryRegistry};
use shelf_sync_store::RecordStore;
use std::sync::Arc;

/// Validate settings and wire sources and store into an orchestrator
pub async fn build_orchestrator(
    config: &Config,
    credentials: &CredentialStore,
    only: Option<&str>,
) -> Result<SyncOrchestrator> {
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let registry = SourceFactoryRegistry::new();
    registry
        .validate_all_configs(config, credentials)
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let sources: Vec<Box<dyn ContentSource>> = match only {
        Some(name) => {
            if !registry.is_registered(name) {
                return Err(eyre!(
                    "Unknown source '{}' (available: {})",
                    name,
                    registry.registered_sources().join(", ")
                ));
            }
            let source = registry
                .create_source_by_name(name, config, credentials)
                .await
                .map_err(|e| eyre!("Failed to create source {}: {}", name, e))?
                .ok_or_else(|| eyre!("Source '{}' is not enabled", name))?;
            vec![source]
        }
        None => registry
            .create_all_sources(config, credentials)
            .await
            .map_err(|e| eyre!("Failed to create sources: {}", e))?,
    };

    let store: Arc<dyn RecordStore> = Arc::new(notion_store(config, credentials)?);
    Ok(SyncOrchestrator::new(sources, store, EngineOptions::from_config(config)))
}

pub async fn run_sync(source: Option<String>, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");
    let (config, credentials) = load_settings()?;
    let orchestrator = build_orchestrator(&config, &credentials, source.as_deref()).await?;

    let result = orchestrator
        .sync()
        .await
        .map_err(|e| eyre!("Sync failed: {}", e))?;
    report(&result, output);

    if result.has_source_failures() {
        let names: Vec<&str> = result.failed_sources.iter().map(|f| f.source.as_str()).collect();
        return Err(eyre!("Could not fetch the collection from: {}", names.join(", ")));
    }
    Ok(())
}

pub fn report(result: &SyncResult, output: &Output) {
    if !output.is_human() {
        output.json(&serde_json::to_value(result).unwrap_or_default());
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(vec![Cell::new("Result"), Cell::new("Count")]);
    for (label, count) in [
        ("Created", result.created),
        ("Updated", result.updated),
        ("Locked (unchanged)", result.locked),
        ("Blocked", result.blocked),
        ("Failed", result.failed),
        ("Highlights appended", result.annotations_appended),
        ("Chapters deferred", result.deferred_chapters),
    ] {
        table.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    output.info(table.to_string());

    for failure in &result.failures {
        output.warn(format!(
            "{} {} ({}): {}",
            failure.source,
            failure.item_id,
            failure.title.as_deref().unwrap_or("untitled"),
            failure.error
        ));
    }
    for failure in &result.failed_sources {
        output.error(format!("{}: {}", failure.source, failure.error));
    }
    output.success(format!(
        "Synced {} items in {:.1}s",
        result.items_synced(),
        result.duration.as_secs_f64()
    ));
}
