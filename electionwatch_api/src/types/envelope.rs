use serde::{Deserialize, Serialize};

/// Envelope returned by every list endpoint.
///
/// Pagination fields sit flat next to `data` rather than under a nested
/// `meta` object. The backend omits `total_count` for queries it does not
/// paginate, so all three are optional.
#[derive(Serialize, Deserialize, Debug)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total_count: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl<T> PaginatedResponse<T> {
    /// True when the backend reported more rows than this page holds.
    pub fn has_more(&self) -> bool {
        match self.total_count {
            Some(total) => self.offset.unwrap_or(0) + (self.data.len() as i64) < total,
            None => false,
        }
    }
}
