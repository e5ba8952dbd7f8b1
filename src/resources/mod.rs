use serde::Deserialize;

use crate::error::ApiError;

pub mod bookings;
pub mod reviews;
pub mod workers;

/// Represents a paginated list returned by the API.
///
/// # Type Parameters
/// - `T`: The type of the entries in `items`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Entries of the current page.
    pub items: Vec<T>,
    /// The page (aka. offset) of the paginated list *(default to 1)*.
    #[serde(default = "first_page")]
    pub page: u32,
    /// The max returned entries per page.
    #[serde(default)]
    pub per_page: u32,
    /// The total amount of entries matching the query.
    #[serde(default)]
    pub total_items: u32,
    /// The total amount of pages matching the query.
    #[serde(default)]
    pub total_pages: u32,
}

const fn first_page() -> u32 {
    1
}

/// Rejects identifiers that would not stay a single path segment.
pub(crate) fn require_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, ApiError> {
    let id = id.trim();

    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(ApiError::Validation(format!("Invalid {kind} id: {id:?}")));
    }

    Ok(id)
}
