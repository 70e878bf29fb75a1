//! Create-or-update of the top-level record, keyed by external identifier.

use shelf_sync_models::{ItemKind, MappedRecord, RecordStatus, TargetRecord};
use shelf_sync_store::{PropertyValue, RecordField, RecordPatch, RecordStore, StoreError};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
    /// The record is locked; nothing was written
    SkippedLocked,
}

#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub handle: String,
    /// The record as it was before this call, if one existed
    pub existing: Option<TargetRecord>,
    /// The lock still has to be written once the item's other writes succeed
    pub lock_pending: bool,
}

/// Fields written on every update. The payload is computed fresh from the
/// source, so list fields are replaced wholesale.
fn update_patch(mapped: &MappedRecord, existing: &TargetRecord) -> RecordPatch {
    let mut patch = RecordPatch::new();
    patch
        .set(RecordField::Rating, PropertyValue::Number(mapped.rating))
        .set(RecordField::Source, PropertyValue::Tags(mapped.sources.clone()));

    if mapped.kind == ItemKind::Book {
        patch
            .set(RecordField::Categories, PropertyValue::Tags(mapped.categories.clone()))
            .set(RecordField::Authors, PropertyValue::Tags(mapped.authors.clone()));
    }
    if let Some(progress) = mapped.progress {
        patch.set(RecordField::Progress, PropertyValue::Number(f64::from(progress)));
    }
    // Watch-list items keep whatever status the user curated until they are done
    if mapped.kind == ItemKind::Book || mapped.status == RecordStatus::Done {
        patch.set(RecordField::Status, PropertyValue::Choice(mapped.status.as_str().to_string()));
    }
    if existing.completed.is_none() {
        if let Some(completed) = mapped.completed {
            patch.set(RecordField::Completed, PropertyValue::Date(completed));
        }
    }
    patch
}

/// Every field for a new record
fn create_patch(mapped: &MappedRecord) -> RecordPatch {
    let mut patch = RecordPatch::new()
        .with(RecordField::Name, PropertyValue::Text(mapped.title.clone()))
        .with(RecordField::Uid, PropertyValue::Text(mapped.uid.clone()))
        .with(RecordField::Status, PropertyValue::Choice(mapped.status.as_str().to_string()))
        .with(RecordField::Rating, PropertyValue::Number(mapped.rating))
        .with(RecordField::Categories, PropertyValue::Tags(mapped.categories.clone()))
        .with(RecordField::Authors, PropertyValue::Tags(mapped.authors.clone()))
        .with(RecordField::Source, PropertyValue::Tags(mapped.sources.clone()))
        .with(RecordField::Intro, PropertyValue::Text(mapped.intro.clone()))
        .with(RecordField::Type, PropertyValue::Choice(mapped.kind.label().to_string()))
        .with(RecordField::Link, PropertyValue::Url(mapped.link.clone()));

    if let Some(cover) = &mapped.cover {
        patch.set(RecordField::Cover, PropertyValue::Url(cover.clone()));
    }
    if let Some(progress) = mapped.progress {
        patch.set(RecordField::Progress, PropertyValue::Number(f64::from(progress)));
    }
    if let Some(completed) = mapped.completed {
        patch.set(RecordField::Completed, PropertyValue::Date(completed));
    }
    patch
}

/// Patch that freezes a record
pub fn lock_patch() -> RecordPatch {
    RecordPatch::new().with(RecordField::Locked, PropertyValue::Flag(true))
}

/// Make the store hold exactly one record for `mapped.uid` reflecting the
/// source. Locked records are left alone. The lock flag itself is not part
/// of the write: when `lock_pending` is set the caller applies
/// [`lock_patch`] after its remaining writes for the item.
pub async fn reconcile(store: &dyn RecordStore, mapped: &MappedRecord) -> Result<UpsertOutcome, StoreError> {
    let existing = store.query(&mapped.uid).await?;

    if let Some(record) = existing {
        if record.locked {
            info!(
                operation = "reconcile",
                item_id = %mapped.uid,
                title = %mapped.title,
                "Skipping locked record"
            );
            return Ok(UpsertOutcome {
                action: UpsertAction::SkippedLocked,
                handle: record.handle.clone(),
                existing: Some(record),
                lock_pending: false,
            });
        }

        let patch = update_patch(mapped, &record);
        store.update(&record.handle, &patch).await?;
        debug!(
            operation = "reconcile",
            item_id = %mapped.uid,
            fields = patch.len(),
            "Updated record"
        );
        return Ok(UpsertOutcome {
            action: UpsertAction::Updated,
            handle: record.handle.clone(),
            existing: Some(record),
            lock_pending: mapped.lock,
        });
    }

    let handle = store.create(&create_patch(mapped), mapped.cover.as_deref()).await?;
    info!(
        operation = "reconcile",
        item_id = %mapped.uid,
        title = %mapped.title,
        status = %mapped.status,
        "Created record"
    );
    Ok(UpsertOutcome {
        action: UpsertAction::Created,
        handle,
        existing: None,
        lock_pending: mapped.lock,
    })
}
