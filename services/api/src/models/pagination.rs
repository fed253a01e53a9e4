//! Paginated collections
//!
//! Listing endpoints answer in one of three shapes:
//! `{data: {data: [...], pagination: {...}}}`, the flat paginator
//! `{data: [...], current_page: ..}` (or with a `meta` block) and a bare
//! array. Every missing count falls back to a locally computed value.

use serde::Serialize;
use serde_json::Value;

use common::error::{ClientError, ClientResult};

use super::payload::lenient_u64;

/// Page the caller asked for, used for defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// A page of items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Paginated<T> {
    /// Normalize a listing response, mapping each item with `item`
    pub fn from_value<F>(raw: &Value, request: PageRequest, item: F) -> ClientResult<Self>
    where
        F: Fn(&Value) -> ClientResult<T>,
    {
        let (items, meta) = locate(raw)?;
        let items = items
            .map(|values| values.iter().map(&item).collect::<ClientResult<Vec<T>>>())
            .transpose()?
            .unwrap_or_default();

        let count = items.len() as u64;
        let field = |key: &str| meta.and_then(|meta| meta.get(key)).and_then(lenient_u64);

        Ok(Paginated {
            current_page: field("current_page").or(request.page).unwrap_or(1),
            last_page: field("last_page").unwrap_or(1),
            per_page: field("per_page").or(request.per_page).unwrap_or(count),
            total: field("total").unwrap_or(count),
            items,
        })
    }

    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// Find the item array and the object holding the pagination counts
fn locate(raw: &Value) -> ClientResult<(Option<&Vec<Value>>, Option<&Value>)> {
    match raw {
        Value::Array(items) => Ok((Some(items), None)),
        Value::Object(_) => {
            let data = raw.get("data");
            match data {
                // {data: {data: [...], pagination: {...}}}
                Some(inner) if inner.is_object() => {
                    let items = inner.get("data").and_then(Value::as_array);
                    let meta = inner
                        .get("pagination")
                        .or_else(|| inner.get("meta"))
                        .or(Some(inner));
                    Ok((items, meta))
                }
                // {data: [...], current_page, ...} or {data: [...], meta: {...}}
                Some(Value::Array(items)) => {
                    let meta = raw
                        .get("pagination")
                        .or_else(|| raw.get("meta"))
                        .or(Some(raw));
                    Ok((Some(items), meta))
                }
                _ => Ok((None, None)),
            }
        }
        other => Err(ClientError::MalformedResponse(format!(
            "Expected a listing, got {}",
            other
        ))),
    }
}
