//! HTTP seed source against a local mock server.

use std::time::Duration;

use pocket_todo::{HttpSeedSource, SeedError, SeedSource, TodoId};
use pocket_todo_runtime::retry::RetryPolicy;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer) -> HttpSeedSource {
    HttpSeedSource::new(format!("{}/todos", server.uri()), Duration::from_secs(2)).unwrap()
}

fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries)
        .with_initial_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

#[tokio::test]
async fn fetches_with_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(query_param("_limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"userId": 1, "id": 1, "title": "delectus aut autem", "completed": false},
            {"userId": 1, "id": 2, "title": "quis ut nam facilis", "completed": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let items = source(&server).with_limit(Some(2)).fetch_seed().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, TodoId::from(1));
    assert!(items[1].completed);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "after retry", "completed": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let items = source(&server)
        .with_retry_policy(fast_retries(2))
        .fetch_seed()
        .await
        .unwrap();

    assert_eq!(items[0].title, "after retry");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = source(&server)
        .with_retry_policy(fast_retries(3))
        .fetch_seed()
        .await;

    assert_eq!(result, Err(SeedError::HttpStatus { status: 404 }));
}

#[tokio::test]
async fn retries_give_up_after_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let result = source(&server)
        .with_retry_policy(fast_retries(2))
        .fetch_seed()
        .await;

    assert_eq!(result, Err(SeedError::HttpStatus { status: 500 }));
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"todos": []})))
        .mount(&server)
        .await;

    let result = source(&server).fetch_seed().await;

    assert!(matches!(result, Err(SeedError::ResponseParseFailed(_))));
}
