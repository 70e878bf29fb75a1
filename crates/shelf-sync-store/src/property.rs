//! Conversion between record values and Notion property payloads.
//!
//! Every property kind the record schema uses maps to one [`Codec`]: a pair of
//! plain functions, one building the request payload and one reading a value
//! back out of a page. The key set is closed so the table is a `match`.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

/// Notion caps a single rich text object at 2000 characters
const RICH_TEXT_CHUNK: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    Checkbox,
    Url,
    Files,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Choice(String),
    Tags(Vec<String>),
    Date(DateTime<Utc>),
    Flag(bool),
    Url(String),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) | PropertyValue::Choice(s) | PropertyValue::Url(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> Option<&[String]> {
        match self {
            PropertyValue::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PropertyValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Codec {
    /// None when the value does not fit the kind
    pub encode: fn(&PropertyValue) -> Option<Value>,
    /// None when the property is absent or empty
    pub decode: fn(&Value) -> Option<PropertyValue>,
}

impl PropertyKind {
    pub fn codec(self) -> Codec {
        match self {
            PropertyKind::Title => Codec { encode: encode_title, decode: decode_title },
            PropertyKind::RichText => Codec { encode: encode_rich_text, decode: decode_rich_text },
            PropertyKind::Number => Codec { encode: encode_number, decode: decode_number },
            PropertyKind::Select => Codec { encode: encode_select, decode: decode_select },
            PropertyKind::MultiSelect => Codec { encode: encode_multi_select, decode: decode_multi_select },
            PropertyKind::Status => Codec { encode: encode_status, decode: decode_status },
            PropertyKind::Date => Codec { encode: encode_date, decode: decode_date },
            PropertyKind::Checkbox => Codec { encode: encode_checkbox, decode: decode_checkbox },
            PropertyKind::Url => Codec { encode: encode_url, decode: decode_url },
            PropertyKind::Files => Codec { encode: encode_files, decode: decode_files },
        }
    }

    pub fn encode(self, value: &PropertyValue) -> Option<Value> {
        (self.codec().encode)(value)
    }

    pub fn decode(self, payload: &Value) -> Option<PropertyValue> {
        (self.codec().decode)(payload)
    }
}

/// Rich text array for a string, split into API-sized chunks
pub fn rich_text(content: &str) -> Value {
    if content.is_empty() {
        return json!([]);
    }
    let chars: Vec<char> = content.chars().collect();
    let parts: Vec<Value> = chars
        .chunks(RICH_TEXT_CHUNK)
        .map(|chunk| {
            let text: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": text } })
        })
        .collect();
    Value::Array(parts)
}

/// Plain text of a rich text array, from either a response or a request payload
pub fn plain_text(parts: &Value) -> String {
    parts
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|part| {
                    part.get("plain_text")
                        .and_then(Value::as_str)
                        .or_else(|| part.pointer("/text/content").and_then(Value::as_str))
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

// Multi-select option names may not contain commas
fn option_name(name: &str) -> String {
    name.replace(',', " ").trim().to_string()
}

fn encode_title(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "title": rich_text(value.as_text()?) }))
}

fn decode_title(payload: &Value) -> Option<PropertyValue> {
    let text = plain_text(payload.get("title")?);
    (!text.is_empty()).then_some(PropertyValue::Text(text))
}

fn encode_rich_text(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "rich_text": rich_text(value.as_text()?) }))
}

fn decode_rich_text(payload: &Value) -> Option<PropertyValue> {
    let text = plain_text(payload.get("rich_text")?);
    (!text.is_empty()).then_some(PropertyValue::Text(text))
}

fn encode_number(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "number": value.as_number()? }))
}

fn decode_number(payload: &Value) -> Option<PropertyValue> {
    payload.get("number")?.as_f64().map(PropertyValue::Number)
}

fn encode_select(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "select": { "name": option_name(value.as_text()?) } }))
}

fn decode_select(payload: &Value) -> Option<PropertyValue> {
    payload
        .pointer("/select/name")?
        .as_str()
        .map(|s| PropertyValue::Choice(s.to_string()))
}

fn encode_multi_select(value: &PropertyValue) -> Option<Value> {
    let options: Vec<Value> = value
        .as_tags()?
        .iter()
        .map(|name| option_name(name))
        .filter(|name| !name.is_empty())
        .map(|name| json!({ "name": name }))
        .collect();
    Some(json!({ "multi_select": options }))
}

fn decode_multi_select(payload: &Value) -> Option<PropertyValue> {
    let tags = payload
        .get("multi_select")?
        .as_array()?
        .iter()
        .filter_map(|option| option.get("name").and_then(Value::as_str))
        .map(|name| name.to_string())
        .collect();
    Some(PropertyValue::Tags(tags))
}

fn encode_status(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "status": { "name": value.as_text()? } }))
}

fn decode_status(payload: &Value) -> Option<PropertyValue> {
    payload
        .pointer("/status/name")?
        .as_str()
        .map(|s| PropertyValue::Choice(s.to_string()))
}

fn encode_date(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "date": { "start": value.as_date()?.to_rfc3339() } }))
}

fn decode_date(payload: &Value) -> Option<PropertyValue> {
    let start = payload.pointer("/date/start")?.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return Some(PropertyValue::Date(dt.with_timezone(&Utc)));
    }
    // Date-only values ("2024-05-01") are midnight UTC
    NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| PropertyValue::Date(naive.and_utc()))
}

fn encode_checkbox(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "checkbox": value.as_flag()? }))
}

fn decode_checkbox(payload: &Value) -> Option<PropertyValue> {
    payload.get("checkbox")?.as_bool().map(PropertyValue::Flag)
}

fn encode_url(value: &PropertyValue) -> Option<Value> {
    Some(json!({ "url": value.as_text()? }))
}

fn decode_url(payload: &Value) -> Option<PropertyValue> {
    payload
        .get("url")?
        .as_str()
        .map(|s| PropertyValue::Url(s.to_string()))
}

fn encode_files(value: &PropertyValue) -> Option<Value> {
    Some(json!({
        "files": [{ "type": "external", "name": "Cover", "external": { "url": value.as_text()? } }]
    }))
}

fn decode_files(payload: &Value) -> Option<PropertyValue> {
    let first = payload.get("files")?.as_array()?.first()?;
    first
        .pointer("/external/url")
        .or_else(|| first.pointer("/file/url"))
        .and_then(Value::as_str)
        .map(|s| PropertyValue::Url(s.to_string()))
}
