//! Shared query infrastructure: the [`Query`] trait and [`QueryCommon`] fields.

use url::Url;

/// Trait implemented by all query builders. Provides URL serialization and
/// shared builder methods for the election id and result paging.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Scopes the query to one election (e.g. `id-20221108`).
    fn with_election_id(mut self, election_id: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common().election_id = Some(election_id.to_string());
        self
    }

    /// Caps the number of rows returned. The backend caps result sets at
    /// 400 rows regardless.
    fn with_limit(mut self, limit: i64) -> Self
    where
        Self: Sized,
    {
        self.get_common().limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows (0-indexed, for paging).
    fn with_offset(mut self, offset: i64) -> Self
    where
        Self: Sized,
    {
        self.get_common().offset = Some(offset);
        self
    }
}

/// Fields shared by all query types: election scoping and paging.
#[derive(Clone, Default)]
pub struct QueryCommon {
    /// Election the query runs against. `None` lets the backend pick its
    /// current election.
    pub election_id: Option<String>,
    /// Rows per page. `None` uses the API default.
    pub limit: Option<i64>,
    /// Row offset for paging. `None` starts at the first row.
    pub offset: Option<i64>,
}

impl QueryCommon {
    /// Appends the election id and paging parameters to the URL. Endpoint
    /// queries call this after their own filters, matching the parameter
    /// order the backend's own clients produce.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(election_id) = &self.election_id {
            url.query_pairs_mut()
                .append_pair("election_id", election_id.as_str());
        };
        if let Some(limit) = self.limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        };
        if let Some(offset) = self.offset {
            url.query_pairs_mut()
                .append_pair("offset", &offset.to_string());
        };
        url
    }
}
