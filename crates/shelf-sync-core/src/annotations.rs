//! Incremental sync of highlights into a record's page body.
//!
//! Page layout, top level only:
//!
//! ```text
//! table_of_contents
//! heading_1 "Chapter A"
//! column_list
//!   column: callout, bullet, bullet, ...   <- insertion target
//!   column: divider
//! heading_1 "Chapter B"
//! ...
//! ```
//!
//! The store exposes no ordering key besides block sequence, so highlights
//! are only ever appended to the last section of the page. Highlights for an
//! earlier section wait (unsynced, watermark untouched) until a later run.

use shelf_sync_models::{Annotation, AnnotationSet, Chapter, Watermark};
use shelf_sync_store::{
    Block, PropertyValue, RecordField, RecordPatch, RecordStore, StoreError, StoredBlock,
    APPEND_BATCH_LIMIT,
};
use tracing::{debug, info, warn};

const CALLOUT_ICON: &str = "💡";
const CALLOUT_COLOR: &str = "yellow_background";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationOutcome {
    pub appended: usize,
    pub sections_created: usize,
    /// Chapters whose highlights were held back by the tail rule
    pub deferred_chapters: Vec<String>,
    /// Watermark written to the record, if it moved
    pub watermark: Option<Watermark>,
}

/// Highlights of one chapter, oldest first
struct ChapterGroup<'a> {
    chapter: Chapter,
    annotations: Vec<&'a Annotation>,
}

pub struct AnnotationSyncer<'a> {
    store: &'a dyn RecordStore,
    page_size: usize,
}

impl<'a> AnnotationSyncer<'a> {
    pub fn new(store: &'a dyn RecordStore, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.clamp(1, 100),
        }
    }

    /// Every top-level block of the page, following cursors to the end
    async fn load_blocks(&self, block_id: &str) -> Result<Vec<StoredBlock>, StoreError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .store
                .list_children(block_id, cursor.as_deref(), self.page_size)
                .await?;
            blocks.extend(page.results);
            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(blocks)
    }

    /// First column of a section's column list
    async fn first_column(&self, column_list_id: &str) -> Result<Option<String>, StoreError> {
        let page = self.store.list_children(column_list_id, None, self.page_size).await?;
        Ok(page
            .results
            .into_iter()
            .find(|b| matches!(b.block, Block::Column(_)))
            .map(|b| b.id))
    }

    /// Insertion target of the section that ends the page. Falls back to the
    /// page itself when the section has no column layout.
    async fn tail_target(&self, handle: &str, blocks: &[StoredBlock]) -> Result<String, StoreError> {
        let heading_pos = blocks.iter().rposition(|b| b.block.heading_text().is_some());
        let column_list = heading_pos.and_then(|pos| {
            blocks[pos + 1..]
                .iter()
                .find(|b| matches!(b.block, Block::ColumnList(_)))
        });
        match column_list {
            Some(list) => Ok(self
                .first_column(&list.id)
                .await?
                .unwrap_or_else(|| handle.to_string())),
            None => Ok(handle.to_string()),
        }
    }

    /// Append a new chapter section and return its insertion target
    async fn create_section(&self, handle: &str, title: &str) -> Result<String, StoreError> {
        let section = [
            Block::Heading1(title.to_string()),
            Block::ColumnList(vec![
                Block::Column(vec![Block::Callout {
                    text: String::new(),
                    icon: CALLOUT_ICON.to_string(),
                    color: CALLOUT_COLOR.to_string(),
                }]),
                Block::Column(vec![Block::Divider]),
            ]),
        ];
        let inserted = self.store.append_children(handle, &section).await?;
        let column_list = inserted
            .iter()
            .find(|b| matches!(b.block, Block::ColumnList(_)))
            .ok_or_else(|| StoreError::Malformed(format!("section {} came back without columns", title)))?;

        self.first_column(&column_list.id)
            .await?
            .ok_or_else(|| StoreError::Malformed(format!("section {} has no column", title)))
    }

    async fn append_batched(&self, target: &str, annotations: &[&Annotation]) -> Result<(), StoreError> {
        let items: Vec<Block> = annotations
            .iter()
            .map(|a| Block::BulletedListItem(a.text.clone()))
            .collect();
        for batch in items.chunks(APPEND_BATCH_LIMIT) {
            self.store.append_children(target, batch).await?;
        }
        Ok(())
    }

    /// Bring the page at `handle` up to date with `set`, appending only
    /// highlights newer than `last_synced`.
    pub async fn sync(
        &self,
        handle: &str,
        last_synced: Option<Watermark>,
        set: &AnnotationSet,
    ) -> Result<AnnotationOutcome, StoreError> {
        let mut outcome = AnnotationOutcome::default();
        let blocks = self.load_blocks(handle).await?;

        if !blocks.iter().any(|b| b.block == Block::TableOfContents) {
            self.store
                .append_children(handle, &[Block::TableOfContents])
                .await?;
        }

        let headings: Vec<&str> = blocks.iter().filter_map(|b| b.block.heading_text()).collect();
        let mut tail: Option<String> = headings.last().map(|s| s.to_string());

        let groups = group_new_annotations(set, last_synced);
        if groups.is_empty() {
            debug!(operation = "sync_annotations", handle = %handle, "No new highlights");
            return Ok(outcome);
        }

        let mut newest: Option<Watermark> = None;
        for group in groups {
            let title = group.chapter.title.clone();
            let has_section = headings.iter().any(|h| *h == title) || tail.as_deref() == Some(title.as_str());

            let target = if has_section {
                if tail.as_deref() != Some(title.as_str()) {
                    warn!(
                        operation = "sync_annotations",
                        handle = %handle,
                        chapter = %title,
                        pending = group.annotations.len(),
                        "Chapter is not the last section, deferring its highlights"
                    );
                    outcome.deferred_chapters.push(title);
                    continue;
                }
                // Sections created during this run are reached through a fresh listing
                let current = self.load_blocks(handle).await?;
                self.tail_target(handle, &current).await?
            } else {
                let target = self.create_section(handle, &title).await?;
                outcome.sections_created += 1;
                tail = Some(title.clone());
                target
            };

            self.append_batched(&target, &group.annotations).await?;
            outcome.appended += group.annotations.len();
            for annotation in &group.annotations {
                let mark = Watermark::new(annotation.created_at);
                newest = Some(newest.map_or(mark, |n| n.advance(mark)));
            }
        }

        if let Some(newest) = newest {
            let watermark = last_synced.map_or(newest, |old| old.advance(newest));
            let patch = RecordPatch::new().with(
                RecordField::LastSynced,
                PropertyValue::Number(watermark.unix_seconds() as f64),
            );
            self.store.update(handle, &patch).await?;
            outcome.watermark = Some(watermark);
        }

        info!(
            operation = "sync_annotations",
            handle = %handle,
            appended = outcome.appended,
            sections_created = outcome.sections_created,
            deferred = outcome.deferred_chapters.len(),
            "Synced highlights"
        );
        Ok(outcome)
    }
}

/// Highlights newer than the watermark, oldest first, grouped by chapter in
/// reading order
fn group_new_annotations(set: &AnnotationSet, last_synced: Option<Watermark>) -> Vec<ChapterGroup<'_>> {
    let mut fresh: Vec<&Annotation> = set
        .annotations
        .iter()
        .filter(|a| last_synced.map_or(true, |mark| mark.is_before(a.created_at)))
        .collect();
    fresh.sort_by_key(|a| a.created_at);

    let mut groups: Vec<ChapterGroup<'_>> = Vec::new();
    for annotation in fresh {
        let chapter = set.chapter_for(annotation.chapter_uid);
        match groups.iter_mut().find(|g| g.chapter.title == chapter.title) {
            Some(group) => group.annotations.push(annotation),
            None => groups.push(ChapterGroup {
                chapter,
                annotations: vec![annotation],
            }),
        }
    }
    groups.sort_by_key(|g| (g.chapter.index, g.chapter.uid));
    groups
}
