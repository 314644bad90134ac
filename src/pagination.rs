//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 25,
            max_page_size: 100,
        }
    }
}

/// Points to another page of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// The page number, starting at one.
    pub page: u64,
    /// The page size.
    pub limit: u64,
}

/// The neighbours of the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// The next page, if any items come after the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    /// The previous page, if the current page is not the first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

/// Work out the links around `page` for a list of `total` items split into
/// pages of `limit` items.
pub fn create_pagination(page: u64, limit: u64, total: u64) -> Pagination {
    let start_index = page.saturating_sub(1).saturating_mul(limit);
    let end_index = page.saturating_mul(limit);

    Pagination {
        next: (end_index < total && page < u64::MAX).then_some(PageLink {
            page: page + 1,
            limit,
        }),
        prev: (start_index > 0).then_some(PageLink {
            page: page - 1,
            limit,
        }),
    }
}
