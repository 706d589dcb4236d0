//! Pagination envelope.
//!
//! [`Paginated::assemble`] is a pure function from one page of rows, the
//! unpaginated total and the originating [`PageRequest`] to the wire-ready
//! envelope the API layer serializes.

use crate::options::PageRequest;
use serde::Serialize;

/// Navigation metadata for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of results plus its navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    /// Assemble the envelope for one fetched page.
    ///
    /// `total` is the filter-matching row count across all pages; a zero
    /// total means zero pages, so an empty first page reports neither a
    /// next nor a previous page.
    pub fn assemble(data: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let total = total.max(0);
        let per_page = request.per_page();
        let page = request.page();
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            data,
            pagination: PageMeta {
                page,
                per_page,
                total,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }
    }

    /// Map the rows while keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
