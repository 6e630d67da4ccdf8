//! Cursor pagination shared by list queries.
//!
//! Cursors are opaque to clients: URL-safe base64 (no padding) of a small
//! JSON object holding the keyset position of the last row returned.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Encodes a keyset position as an opaque cursor.
pub fn encode_cursor<T: Serialize>(position: &T) -> AppResult<String> {
    let bytes = serde_json::to_vec(position).map_err(AppError::internal)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decodes a cursor produced by [`encode_cursor`].
pub fn decode_cursor<T: DeserializeOwned>(cursor: &str) -> AppResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.as_bytes())
        .map_err(|_| AppError::bad_request("Invalid cursor"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid cursor"))
}

/// Window requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub first: i64,
    pub after: Option<String>,
}

impl PageRequest {
    /// Builds a request, defaulting `first` and rejecting sizes outside 1..=50.
    pub fn new(first: Option<i64>, after: Option<String>) -> AppResult<Self> {
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&first) {
            return Err(AppError::bad_request(format!(
                "first must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let after = after.filter(|cursor| !cursor.is_empty());
        Ok(Self { first, after })
    }

    /// Rows to fetch so that `has_next_page` can be answered.
    pub fn fetch_limit(&self) -> i64 {
        self.first + 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            first: DEFAULT_PAGE_SIZE,
            after: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    pub total_count: i64,
}

impl<T> Page<T> {
    /// Builds a page from up to `request.fetch_limit()` rows in keyset order.
    pub fn from_rows<F>(
        mut rows: Vec<T>,
        request: &PageRequest,
        total_count: i64,
        cursor_of: F,
    ) -> AppResult<Self>
    where
        F: Fn(&T) -> AppResult<String>,
    {
        let limit = usize::try_from(request.first).unwrap_or(0);
        let has_next_page = rows.len() > limit;
        rows.truncate(limit);

        let edges = rows
            .into_iter()
            .map(|node| {
                let cursor = cursor_of(&node)?;
                Ok(Edge { node, cursor })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let page_info = PageInfo {
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
            has_next_page,
            has_previous_page: request.after.is_some(),
        };

        Ok(Self {
            edges,
            page_info,
            total_count,
        })
    }

    pub fn map<U, F>(self, mut f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            edges: self
                .edges
                .into_iter()
                .map(|edge| Edge {
                    node: f(edge.node),
                    cursor: edge.cursor,
                })
                .collect(),
            page_info: self.page_info,
            total_count: self.total_count,
        }
    }
}
