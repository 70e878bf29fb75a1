use std::collections::BTreeMap;

use serde_json::{Map, Value};
use shelf_sync_models::{RecordStatus, TargetRecord, Watermark};

use crate::error::StoreError;
use crate::property::{PropertyKind, PropertyValue};

/// Columns of the record database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordField {
    Name,
    Uid,
    Status,
    Progress,
    Rating,
    Categories,
    Authors,
    Source,
    Cover,
    Intro,
    Type,
    Link,
    Completed,
    Locked,
    LastSynced,
}

impl RecordField {
    pub fn property_name(&self) -> &'static str {
        match self {
            RecordField::Name => "Name",
            RecordField::Uid => "UID",
            RecordField::Status => "Status",
            RecordField::Progress => "Progress",
            RecordField::Rating => "Rating",
            RecordField::Categories => "Categories",
            RecordField::Authors => "Authors",
            RecordField::Source => "Source",
            RecordField::Cover => "Cover",
            RecordField::Intro => "Intro",
            RecordField::Type => "Type",
            RecordField::Link => "Link",
            RecordField::Completed => "Completed",
            RecordField::Locked => "Locked",
            RecordField::LastSynced => "Last Synced",
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            RecordField::Name => PropertyKind::Title,
            RecordField::Uid | RecordField::Intro => PropertyKind::RichText,
            RecordField::Status => PropertyKind::Status,
            RecordField::Progress | RecordField::Rating | RecordField::LastSynced => PropertyKind::Number,
            RecordField::Categories | RecordField::Authors | RecordField::Source => PropertyKind::MultiSelect,
            RecordField::Cover => PropertyKind::Files,
            RecordField::Type => PropertyKind::Select,
            RecordField::Link => PropertyKind::Url,
            RecordField::Completed => PropertyKind::Date,
            RecordField::Locked => PropertyKind::Checkbox,
        }
    }
}

/// A set of field values to write. Fields not present are left untouched by
/// an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    values: BTreeMap<RecordField, PropertyValue>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: RecordField, value: PropertyValue) -> &mut Self {
        self.values.insert(field, value);
        self
    }

    pub fn with(mut self, field: RecordField, value: PropertyValue) -> Self {
        self.set(field, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Encode into a Notion `properties` object
    pub fn to_properties(&self) -> Result<Map<String, Value>, StoreError> {
        let mut properties = Map::new();
        for (field, value) in &self.values {
            let payload = field.kind().encode(value).ok_or_else(|| {
                StoreError::Malformed(format!(
                    "{} ({:?}) cannot hold {:?}",
                    field.property_name(),
                    field.kind(),
                    value
                ))
            })?;
            properties.insert(field.property_name().to_string(), payload);
        }
        Ok(properties)
    }
}

fn read(properties: &Map<String, Value>, field: RecordField) -> Option<PropertyValue> {
    properties
        .get(field.property_name())
        .and_then(|payload| field.kind().decode(payload))
}

/// Decode a page's properties into a [`TargetRecord`]. Missing or empty
/// properties fall back to defaults (0, empty, unlocked).
pub fn decode_record(handle: &str, properties: &Map<String, Value>) -> TargetRecord {
    let text = |field| read(properties, field).and_then(|v| v.as_text().map(str::to_string));
    let number = |field| read(properties, field).and_then(|v| v.as_number());
    let tags = |field| {
        read(properties, field)
            .and_then(|v| v.as_tags().map(<[String]>::to_vec))
            .unwrap_or_default()
    };

    TargetRecord {
        handle: handle.to_string(),
        uid: text(RecordField::Uid).unwrap_or_default(),
        title: text(RecordField::Name).unwrap_or_default(),
        status: text(RecordField::Status).and_then(|s| s.parse::<RecordStatus>().ok()),
        progress: number(RecordField::Progress).unwrap_or(0.0),
        rating: number(RecordField::Rating).unwrap_or(0.0),
        categories: tags(RecordField::Categories),
        authors: tags(RecordField::Authors),
        completed: read(properties, RecordField::Completed).and_then(|v| v.as_date()),
        locked: read(properties, RecordField::Locked)
            .and_then(|v| v.as_flag())
            .unwrap_or(false),
        last_synced: number(RecordField::LastSynced)
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Watermark::from_unix_seconds(secs as i64)),
    }
}
