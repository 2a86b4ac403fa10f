//! pagination merge helpers
//!
//! fetch-more pages are folded into accumulated data by a caller-supplied
//! merge function. the helpers here cover relay-style connections, where a
//! connection object carries `edges` and `pageInfo`.
//!
//! connections are addressed with json pointers into the response data,
//! e.g. `/organization/repository/issues`.

use crate::query::{QueryMerge, QueryState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// relay `pageInfo` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// cursor of the last edge in the page
    #[serde(default)]
    pub end_cursor: Option<String>,
    /// whether the server has more edges after `end_cursor`
    #[serde(default)]
    pub has_next_page: bool,
}

/// read the `pageInfo` of the connection at `connection`
pub fn page_info(data: &Value, connection: &str) -> Option<PageInfo> {
    let info = data.pointer(connection)?.get("pageInfo")?;
    serde_json::from_value(info.clone()).ok()
}

/// merge a new page into previously accumulated data
///
/// the result is the new page with its connection's `edges` replaced by the
/// previous edges followed by the new ones. every other field, including
/// `pageInfo` and counts, comes from the new page. edges are not deduplicated.
///
/// a page without the connection (e.g. `null` data next to errors) leaves
/// the previous data in place; with no previous data the page is returned.
pub fn concat_edges(previous: Option<&Value>, page: &Value, connection: &str) -> Value {
    let mut merged = page.clone();
    let Some(target) = merged.pointer_mut(connection).and_then(Value::as_object_mut) else {
        warn!(connection, "connection missing from fetched page, keeping previous data");
        return previous.cloned().unwrap_or_else(|| page.clone());
    };

    let mut edges = previous
        .and_then(|data| data.pointer(connection))
        .and_then(|conn| conn.get("edges"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if let Some(Value::Array(new_edges)) = target.get("edges") {
        edges.extend(new_edges.iter().cloned());
    }
    target.insert("edges".to_string(), Value::Array(edges));

    merged
}

/// query merge function appending edges of the connection at `connection`
pub fn append_edges(connection: impl Into<String>) -> QueryMerge {
    let connection = connection.into();
    Arc::new(move |page: &Value, state: &QueryState| {
        concat_edges(state.data.as_ref(), page, &connection)
    })
}
