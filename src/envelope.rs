//! The JSON shapes shared by every response.

use serde::Serialize;

use crate::pagination::Pagination;

/// A successful response carrying a single item.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always `true`.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` in a successful response.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// The `{}` payload returned after deleting a resource or logging out.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Empty {}

/// A successful response carrying a list of items.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    /// Always `true`.
    pub success: bool,
    /// The number of items in `data`.
    pub count: usize,
    /// Links to the neighbouring pages, only set for paginated lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// The items.
    pub data: Vec<T>,
}

impl<T> ListEnvelope<T> {
    /// Wrap an unpaginated list.
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination: None,
            data,
        }
    }

    /// Wrap one page of a list.
    pub fn paginated(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination: Some(pagination),
            data,
        }
    }
}

/// The body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    success: bool,
    error: String,
}

impl ErrorBody {
    pub(crate) fn new(error: String) -> Self {
        Self {
            success: false,
            error,
        }
    }
}
