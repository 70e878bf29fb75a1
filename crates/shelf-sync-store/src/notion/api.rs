use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::blocks::{Block, ChildPage, StoredBlock};
use crate::error::StoreError;

pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// A page as returned by query and create
#[derive(Debug, Deserialize)]
pub struct PageObject {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<PageObject>,
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
struct BlockList {
    #[serde(default)]
    results: Vec<Value>,
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", token))
        .header("Notion-Version", NOTION_VERSION)
        .header("Content-Type", "application/json")
}

/// Turn a non-success response into `StoreError::Api`
async fn check(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or(ApiErrorBody {
        code: String::new(),
        message: text,
    });
    Err(StoreError::Api {
        status,
        code: body.code,
        message: body.message,
    })
}

pub async fn query_database(
    client: &Client,
    base_url: &str,
    token: &str,
    database_id: &str,
    filter: Option<Value>,
    cursor: Option<&str>,
    page_size: usize,
) -> Result<QueryPage, StoreError> {
    let url = format!("{}/databases/{}/query", base_url, database_id);
    let mut body = json!({ "page_size": page_size });
    if let Some(filter) = filter {
        body["filter"] = filter;
    }
    if let Some(cursor) = cursor {
        body["start_cursor"] = json!(cursor);
    }

    debug!(operation = "query_database", database_id = %database_id, "POST {}", url);
    let response = authorized(client.post(&url), token).json(&body).send().await?;
    Ok(check(response).await?.json().await?)
}

pub async fn create_page(
    client: &Client,
    base_url: &str,
    token: &str,
    database_id: &str,
    properties: Map<String, Value>,
    icon: Option<&str>,
) -> Result<PageObject, StoreError> {
    let url = format!("{}/pages", base_url);
    let mut body = json!({
        "parent": { "database_id": database_id },
        "properties": properties,
    });
    if let Some(icon) = icon {
        body["icon"] = json!({ "type": "external", "external": { "url": icon } });
    }

    debug!(operation = "create_page", database_id = %database_id, "POST {}", url);
    let response = authorized(client.post(&url), token).json(&body).send().await?;
    Ok(check(response).await?.json().await?)
}

pub async fn update_page(
    client: &Client,
    base_url: &str,
    token: &str,
    page_id: &str,
    properties: Map<String, Value>,
) -> Result<(), StoreError> {
    let url = format!("{}/pages/{}", base_url, page_id);
    let body = json!({ "properties": properties });

    debug!(operation = "update_page", page_id = %page_id, "PATCH {}", url);
    let response = authorized(client.patch(&url), token).json(&body).send().await?;
    check(response).await?;
    Ok(())
}

pub async fn list_block_children(
    client: &Client,
    base_url: &str,
    token: &str,
    block_id: &str,
    cursor: Option<&str>,
    page_size: usize,
) -> Result<ChildPage, StoreError> {
    let url = format!("{}/blocks/{}/children", base_url, block_id);
    let mut query = vec![("page_size", page_size.to_string())];
    if let Some(cursor) = cursor {
        query.push(("start_cursor", cursor.to_string()));
    }

    debug!(operation = "list_block_children", block_id = %block_id, "GET {}", url);
    let response = authorized(client.get(&url), token).query(&query).send().await?;
    let list: BlockList = check(response).await?.json().await?;

    let results = list
        .results
        .iter()
        .map(StoredBlock::from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChildPage {
        results,
        next_cursor: list.next_cursor,
        has_more: list.has_more,
    })
}

pub async fn append_block_children(
    client: &Client,
    base_url: &str,
    token: &str,
    block_id: &str,
    children: &[Block],
) -> Result<Vec<StoredBlock>, StoreError> {
    let url = format!("{}/blocks/{}/children", base_url, block_id);
    let children = children
        .iter()
        .map(Block::to_json)
        .collect::<Result<Vec<_>, _>>()?;
    let body = json!({ "children": children });

    debug!(
        operation = "append_block_children",
        block_id = %block_id,
        count = children.len(),
        "PATCH {}",
        url
    );
    let response = authorized(client.patch(&url), token).json(&body).send().await?;
    let list: BlockList = check(response).await?.json().await?;
    list.results.iter().map(StoredBlock::from_json).collect()
}

pub async fn retrieve_database(
    client: &Client,
    base_url: &str,
    token: &str,
    database_id: &str,
) -> Result<Value, StoreError> {
    let url = format!("{}/databases/{}", base_url, database_id);
    let response = authorized(client.get(&url), token).send().await?;
    Ok(check(response).await?.json().await?)
}

pub async fn update_database(
    client: &Client,
    base_url: &str,
    token: &str,
    database_id: &str,
    properties: Value,
) -> Result<(), StoreError> {
    let url = format!("{}/databases/{}", base_url, database_id);
    let body = json!({ "properties": properties });

    debug!(operation = "update_database", database_id = %database_id, "PATCH {}", url);
    let response = authorized(client.patch(&url), token).json(&body).send().await?;
    check(response).await?;
    Ok(())
}
