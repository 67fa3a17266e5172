use url::Url;

use super::common::{Query, QueryCommon};

/// Query for the `elections` metadata endpoint. Only the common election
/// id and paging parameters apply.
#[derive(Default)]
pub struct ElectionQuery {
    pub common: QueryCommon,
}

impl Query for ElectionQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        self.common.add_to_url(url)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::query::{ElectionQuery, Query};

    #[test]
    fn test_election_query() {
        let url = Url::parse("https://example.com").unwrap();

        insta::assert_snapshot!(
            ElectionQuery::default().add_to_url(&url).to_string(),
            @"https://example.com/"
        );

        insta::assert_snapshot!(
            ElectionQuery::default()
                .with_election_id("id-20221108")
                .add_to_url(&url)
                .to_string(),
            @"https://example.com/?election_id=id-20221108"
        );
    }
}
