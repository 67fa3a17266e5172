use std::time::Duration;

use electionwatch_api::Error as ApiError;
use electionwatch_api::{ContestQuery, ElectionQuery, Query};
use electionwatch_lib::cache::MemoryCache;
use electionwatch_lib::{CachedClient, ElectionwatchError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contests_body() -> serde_json::Value {
    json!({
        "data": [
            {
                "contest_id": "id-MN---34-0134",
                "scope": "state_senate",
                "title": "State Senator District 34",
                "precincts_reporting": 19,
                "total_effected_precincts": 24,
                "seats": 1
            }
        ],
        "total_count": 1,
        "limit": 400,
        "offset": 0
    })
}

fn elections_body() -> serde_json::Value {
    json!({
        "data": [
            {
                "election_id": "id-20220809",
                "election_date": "2022-08-09",
                "primary": true,
                "updated": 1660172400
            },
            {
                "election_id": "id-20221108",
                "election_date": "2022-11-08",
                "primary": false,
                "updated": 1668006000
            }
        ],
        "total_count": 2,
        "limit": 400,
        "offset": 0
    })
}

// ============================================================================
// Caching Tests
// ============================================================================

#[tokio::test]
async fn contests_are_cached_between_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contests/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contests_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);
    let query = ContestQuery::default().with_scope("state_senate");

    let first = client.get_contests(&query).await.unwrap();
    let second = client.get_contests(&query).await.unwrap();

    assert_eq!(first.data.len(), 1);
    assert_eq!(second.data.len(), 1);
    assert_eq!(
        second.data[0].title.as_deref(),
        Some("State Senator District 34")
    );
}

#[tokio::test]
async fn distinct_queries_do_not_share_cache_entries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contests/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contests_body()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);

    client
        .get_contests(&ContestQuery::default().with_scope("state_senate"))
        .await
        .unwrap();
    client
        .get_contests(&ContestQuery::default().with_scope("state_house"))
        .await
        .unwrap();
}

#[tokio::test]
async fn clear_cache_forces_a_refetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contests/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contests_body()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);
    let query = ContestQuery::default().with_scope("state_senate");

    client.get_contests(&query).await.unwrap();
    client.clear_cache();
    client.get_contests(&query).await.unwrap();
}

#[tokio::test]
async fn results_are_always_fetched_fresh() {
    let mock_server = MockServer::start().await;
    let fixture = include_str!("../../electionwatch_api/tests/fixtures/contests_with_results.json");

    Mock::given(method("GET"))
        .and(path("/contests-with-results/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture))
        .expect(2)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);
    let query = ContestQuery::default().with_contest_id("id-MN---34-0134");

    let first = client.get_contests_with_results(&query).await.unwrap();
    let second = client.get_contests_with_results(&query).await.unwrap();

    assert_eq!(first.data.len(), 4);
    assert_eq!(second.data.len(), 4);
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test]
async fn transient_errors_are_retried() {
    std::env::set_var("ELECTIONWATCH_RETRY_BASE_MS", "1");
    std::env::set_var("ELECTIONWATCH_RETRY_MAX_MS", "5");

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contests-with-results/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contests-with-results/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "total_count": 0,
            "limit": 400,
            "offset": 0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);
    let query = ContestQuery::default().with_scope("state");

    let resp = client.get_contests_with_results(&query).await.unwrap();
    assert!(resp.data.is_empty());
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contests/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);
    let query = ContestQuery::default().with_scope("state");

    let err = client.get_contests(&query).await.unwrap_err();
    assert!(matches!(
        err,
        ElectionwatchError::Api(ApiError::HttpStatus { status: 404, .. })
    ));
}

// ============================================================================
// Election Lookup Tests
// ============================================================================

#[tokio::test]
async fn current_election_picks_the_newest() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elections/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elections_body()))
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);

    let election = client.current_election().await.unwrap();
    assert_eq!(election.election_id.as_deref(), Some("id-20221108"));
    assert_eq!(election.primary, Some(false));
}

#[tokio::test]
async fn find_election_filters_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elections/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elections_body()))
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);

    let election = client.find_election("id-20220809").await.unwrap();
    assert_eq!(election.primary, Some(true));

    let err = client.find_election("id-19990101").await.unwrap_err();
    assert!(matches!(err, ElectionwatchError::NotFound(_)));
    assert!(err.to_string().contains("id-19990101"));
}

#[tokio::test]
async fn election_queries_pass_their_filters_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elections/"))
        .and(query_param("election_id", "id-20221108"))
        .respond_with(ResponseTemplate::new(200).set_body_json(elections_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = MemoryCache::new(Duration::from_secs(60));
    let client = CachedClient::with_base_url(&mock_server.uri(), cache);
    let query = ElectionQuery::default().with_election_id("id-20221108");

    let resp = client.get_elections(&query).await.unwrap();
    assert_eq!(resp.data.len(), 2);
}
