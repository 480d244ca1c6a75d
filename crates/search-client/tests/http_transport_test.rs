//! HttpTransport against a local mock homeserver.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use search_client::{ClientError, HttpTransportConfig, MatrixClient};
use search_types::EventTuple;

fn event_json(event_id: &str) -> serde_json::Value {
    json!({
        "sender": "@alice:example.org",
        "event_id": event_id,
        "type": "m.room.message",
        "content": {"body": "hello"},
        "origin_server_ts": 1_700_000_000_000i64
    })
}

fn client_for(server: &MockServer) -> MatrixClient {
    let config = HttpTransportConfig::new(server.uri())
        .with_access_token("syt_token")
        .with_timeout(Duration::from_secs(5));
    MatrixClient::from_config(config).unwrap()
}

#[tokio::test]
async fn test_whoami_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/account/whoami"))
        .and(header("authorization", "Bearer syt_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user_id": "@search:example.org"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.whoami().await.unwrap(), "@search:example.org");
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/rooms/!a:x/event/$gone"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"errcode": "M_NOT_FOUND", "error": "Event not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/rooms/!a:x/event/$hidden"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"errcode": "M_FORBIDDEN", "error": "not in room"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/joined_rooms"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"errcode": "M_LIMIT_EXCEEDED", "error": "slow down"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.resolve_event("!a:x", "$gone").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(ref m) if m == "Event not found"));

    let err = client.resolve_event("!a:x", "$hidden").await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)));

    match client.joined_rooms().await.unwrap_err() {
        ClientError::Status { status, errcode, .. } => {
            assert_eq!(status, 429);
            assert_eq!(errcode, "M_LIMIT_EXCEEDED");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_context_requests_over_fetched_limit() {
    let server = MockServer::start().await;
    let before: Vec<_> = (0..4).map(|i| event_json(&format!("$b{i}"))).collect();
    let after: Vec<_> = (0..4).map(|i| event_json(&format!("$a{i}"))).collect();

    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/rooms/!a:x/context/$target"))
        .and(query_param("limit", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "start": "s",
            "end": "e",
            "event": event_json("$target"),
            "events_before": before,
            "events_after": after,
            "state": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let resolved = client.resolve_event_context("!a:x", "$target", 1, 3).await.unwrap();
    let context = resolved.context.unwrap();

    assert_eq!(context.events_before.len(), 1);
    assert_eq!(context.events_after.len(), 3);
    assert_eq!(context.events_after[2].event_id, "$a2");
    assert_eq!(resolved.event.room_id, "!a:x");
}

#[tokio::test]
async fn test_mass_resolve_fail_fast_and_settled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/rooms/!a:x/event/$1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("$1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/rooms/!a:x/event/$2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/rooms/!a:x/event/$3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("$3")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tuples = vec![
        EventTuple::new("!a:x", "$1"),
        EventTuple::new("!a:x", "$2"),
        EventTuple::new("!a:x", "$3"),
    ];

    assert!(client.mass_resolve_event(&tuples).await.is_err());

    let outcomes = client.mass_resolve_event_settled(&tuples).await;
    let ok: Vec<bool> = outcomes.iter().map(|o| o.is_ok()).collect();
    assert_eq!(ok, vec![true, false, true]);
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_matrix/client/r0/account/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(client.whoami().await.unwrap_err(), ClientError::Decode(_)));
}
