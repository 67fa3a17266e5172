use url::Url;

use crate::types::ContestID;

use super::common::{Query, QueryCommon};

/// Filters for the `contests` and `contests-with-results` endpoints.
///
/// Filters are additive; the backend treats them as conjunctive. The
/// dashboard's own routes use exactly one filter per request, but nothing
/// stops combining them.
#[derive(Default)]
pub struct ContestQuery {
    pub common: QueryCommon,
    /// Substring match against contest titles.
    pub title: Option<String>,
    /// Geographic scope (e.g. `state_senate`). See the scope vocabulary in
    /// the library's validation module.
    pub scope: Option<String>,
    /// Scrape group (e.g. `state_house_results`).
    pub results_group: Option<String>,
    /// Exact contest ids. A single id serializes as `contest_id`; two or
    /// more join into one comma-separated `contest_ids` value, which is how
    /// the backend expects id lists.
    pub contest_ids: Vec<ContestID>,
    /// Street address to geocode into overlapping contests.
    pub address: Option<String>,
    /// `(latitude, longitude)` point lookup.
    pub coordinates: Option<(f64, f64)>,
    /// Boundary slug match.
    pub boundary: Option<String>,
}

impl Query for ContestQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(title) = &self.title {
            url.query_pairs_mut().append_pair("title", title.as_str());
        }
        if let Some(scope) = &self.scope {
            url.query_pairs_mut().append_pair("scope", scope.as_str());
        }
        if let Some(results_group) = &self.results_group {
            url.query_pairs_mut()
                .append_pair("results_group", results_group.as_str());
        }
        match self.contest_ids.as_slice() {
            [] => {}
            [id] => {
                url.query_pairs_mut().append_pair("contest_id", id.as_str());
            }
            ids => {
                url.query_pairs_mut()
                    .append_pair("contest_ids", ids.join(",").as_str());
            }
        }
        if let Some(address) = &self.address {
            url.query_pairs_mut()
                .append_pair("address", address.as_str());
        }
        if let Some((lat, lon)) = self.coordinates {
            url.query_pairs_mut()
                .append_pair("coordinates", format!("{},{}", lat, lon).as_str());
        }
        if let Some(boundary) = &self.boundary {
            url.query_pairs_mut()
                .append_pair("boundary", boundary.as_str());
        }
        self.common.add_to_url(&url)
    }
}

impl ContestQuery {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    pub fn with_results_group(mut self, results_group: &str) -> Self {
        self.results_group = Some(results_group.to_string());
        self
    }

    pub fn with_contest_id(mut self, contest_id: &str) -> Self {
        self.contest_ids.push(contest_id.to_string());
        self
    }

    pub fn with_contest_ids(mut self, contest_ids: &[ContestID]) -> Self {
        self.contest_ids.extend_from_slice(contest_ids);
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some((latitude, longitude));
        self
    }

    pub fn with_boundary(mut self, boundary: &str) -> Self {
        self.boundary = Some(boundary.to_string());
        self
    }
}
