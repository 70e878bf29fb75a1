//! Nested page content: the subset of block types the annotation layout uses.

use serde_json::{json, Value};

use crate::error::StoreError;
use crate::property::{plain_text, rich_text};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    TableOfContents,
    Heading1(String),
    ColumnList(Vec<Block>),
    Column(Vec<Block>),
    Callout {
        text: String,
        icon: String,
        color: String,
    },
    BulletedListItem(String),
    Divider,
    /// Any block type not listed above, kept by name only
    Unsupported(String),
}

impl Block {
    pub fn type_name(&self) -> &str {
        match self {
            Block::TableOfContents => "table_of_contents",
            Block::Heading1(_) => "heading_1",
            Block::ColumnList(_) => "column_list",
            Block::Column(_) => "column",
            Block::Callout { .. } => "callout",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::Divider => "divider",
            Block::Unsupported(kind) => kind,
        }
    }

    pub fn heading_text(&self) -> Option<&str> {
        match self {
            Block::Heading1(text) => Some(text),
            _ => None,
        }
    }

    /// Nested children carried in the request body
    pub fn children(&self) -> &[Block] {
        match self {
            Block::ColumnList(children) | Block::Column(children) => children,
            _ => &[],
        }
    }

    /// The same block with nested children dropped, as the API returns it
    pub fn shallow(&self) -> Block {
        match self {
            Block::ColumnList(_) => Block::ColumnList(Vec::new()),
            Block::Column(_) => Block::Column(Vec::new()),
            other => other.clone(),
        }
    }

    pub fn to_json(&self) -> Result<Value, StoreError> {
        let body = match self {
            Block::TableOfContents => json!({ "color": "default" }),
            Block::Heading1(text) => json!({ "rich_text": rich_text(text) }),
            Block::ColumnList(columns) | Block::Column(columns) => {
                let children = columns
                    .iter()
                    .map(Block::to_json)
                    .collect::<Result<Vec<_>, _>>()?;
                json!({ "children": children })
            }
            Block::Callout { text, icon, color } => json!({
                "rich_text": rich_text(text),
                "icon": { "type": "emoji", "emoji": icon },
                "color": color,
            }),
            Block::BulletedListItem(text) => json!({ "rich_text": rich_text(text) }),
            Block::Divider => json!({}),
            Block::Unsupported(kind) => {
                return Err(StoreError::Malformed(format!("cannot write block type {}", kind)))
            }
        };

        let kind = self.type_name();
        Ok(json!({ "object": "block", "type": kind, kind: body }))
    }

    pub fn from_json(value: &Value) -> Result<Block, StoreError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Malformed("block without a type".to_string()))?;
        let body = value.get(kind).cloned().unwrap_or(Value::Null);
        let text = || plain_text(body.get("rich_text").unwrap_or(&Value::Null));

        let block = match kind {
            "table_of_contents" => Block::TableOfContents,
            "heading_1" => Block::Heading1(text()),
            "column_list" => Block::ColumnList(Vec::new()),
            "column" => Block::Column(Vec::new()),
            "callout" => Block::Callout {
                text: text(),
                icon: body
                    .pointer("/icon/emoji")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                color: body
                    .get("color")
                    .and_then(Value::as_str)
                    .unwrap_or("default")
                    .to_string(),
            },
            "bulleted_list_item" => Block::BulletedListItem(text()),
            "divider" => Block::Divider,
            other => Block::Unsupported(other.to_string()),
        };
        Ok(block)
    }
}

/// A block as it exists in the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlock {
    pub id: String,
    pub block: Block,
    pub has_children: bool,
}

impl StoredBlock {
    pub fn from_json(value: &Value) -> Result<StoredBlock, StoreError> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Malformed("block without an id".to_string()))?
            .to_string();
        Ok(StoredBlock {
            id,
            block: Block::from_json(value)?,
            has_children: value
                .get("has_children")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

/// One page of `list_children`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildPage {
    pub results: Vec<StoredBlock>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}
