//! Keyset pagination results

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cursor state returned with every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Id of the last row in this page; pass it back as `last_seen`
    pub last_seen: Uuid,
    /// More rows exist after this page
    pub next: bool,
    /// Number of rows in this page
    pub response_length: usize,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub metadata: Metadata,
}

impl<T> Page<T> {
    /// Build a page from a look-ahead fetch of up to `page_size + 1` rows.
    ///
    /// The extra row, when present, is dropped and only sets `next`. An
    /// empty page keeps the incoming cursor.
    pub fn from_rows(
        mut rows: Vec<T>,
        page_size: u32,
        cursor: Uuid,
        id: impl Fn(&T) -> Uuid,
    ) -> Self {
        let page_size = page_size as usize;
        let next = rows.len() > page_size;
        rows.truncate(page_size);

        let metadata = Metadata {
            last_seen: rows.last().map(&id).unwrap_or(cursor),
            next,
            response_length: rows.len(),
        };

        Self {
            data: rows,
            metadata,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }
}
