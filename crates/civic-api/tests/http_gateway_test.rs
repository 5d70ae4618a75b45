#![allow(clippy::unwrap_used)]
// Integration tests for `HttpGateway` using wiremock.

use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use civic_api::{
    Error, FormPart, Gateway, HttpGateway, Query, TransportConfig, WriteVerb, fetch_data,
    fetch_list, send_data, send_delete,
};

#[derive(Debug, Deserialize, PartialEq)]
struct Party {
    id: String,
    name: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpGateway) {
    let server = MockServer::start().await;
    let gateway = HttpGateway::from_reqwest(&format!("{}/api", server.uri()), reqwest::Client::new())
        .unwrap();
    (server, gateway)
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_paginated_list_drops_pagination() {
    let (server, gateway) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/parties"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "data": [
                    { "id": "p1", "name": "Civic Front" },
                    { "id": "p2", "name": "People's Alliance" }
                ],
                "pagination": { "page": 1, "limit": 20, "total": 2, "total_pages": 1 }
            }
        })))
        .mount(&server)
        .await;

    let parties: Vec<Party> = fetch_list(&gateway, "/parties", &Query::new().push("page", 1))
        .await
        .unwrap();

    assert_eq!(parties.len(), 2);
    assert_eq!(parties[1].name, "People's Alliance");
}

#[tokio::test]
async fn test_fetch_single_record() {
    let (server, gateway) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/parties/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": "p1", "name": "Civic Front" }
        })))
        .mount(&server)
        .await;

    let party: Party = fetch_data(&gateway, "parties/p1", &Query::new()).await.unwrap();
    assert_eq!(
        party,
        Party {
            id: "p1".into(),
            name: "Civic Front".into()
        }
    );
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_post_sends_json_and_decodes_echo() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/parties"))
        .and(body_json(json!({ "name": "Green Wave" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "id": "p9", "name": "Green Wave" }
        })))
        .mount(&server)
        .await;

    let created: Party = send_data(
        &gateway,
        WriteVerb::Post,
        "/parties",
        &json!({ "name": "Green Wave" }),
    )
    .await
    .unwrap();
    assert_eq!(created.id, "p9");
}

#[tokio::test]
async fn test_delete_with_empty_body_succeeds() {
    let (server, gateway) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/parties/p1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    tokio_test::assert_ok!(send_delete(&gateway, "/parties/p1").await);
}

#[tokio::test]
async fn test_multipart_upload() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/mlas/m1/photo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "url": "/uploads/m1.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = gateway
        .post_multipart(
            "/mlas/m1/photo",
            vec![
                FormPart::Text {
                    name: "caption".into(),
                    value: "Official portrait".into(),
                },
                FormPart::File {
                    name: "photo".into(),
                    file_name: "m1.png".into(),
                    mime: "image/png".into(),
                    bytes: bytes::Bytes::from_static(b"\x89PNG"),
                },
            ],
        )
        .await
        .unwrap();
    assert!(resp.success);
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_header_is_sent() {
    let server = MockServer::start().await;
    let transport =
        TransportConfig::default().with_bearer_token("s3cret".to_string().into());
    let gateway = HttpGateway::new(&server.uri(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/dashboard/stats"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = gateway.get("/dashboard/stats", &Query::new()).await.unwrap();
    assert!(resp.success);
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_success_false_is_a_logical_failure() {
    let (server, gateway) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/mlas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Database unavailable"
        })))
        .mount(&server)
        .await;

    let result = fetch_list::<Party>(&gateway, "/mlas", &Query::new()).await;
    match result {
        Err(Error::Rejected { message }) => assert_eq!(message, "Database unavailable"),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, gateway) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = gateway.get("/parties", &Query::new()).await;
    assert!(
        matches!(result, Err(Error::Unauthorized)),
        "expected Unauthorized, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_error_uses_body_message() {
    let (server, gateway) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/parties/p1"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "message": "abbreviation already taken"
        })))
        .mount(&server)
        .await;

    let err = gateway
        .put("/parties/p1", &json!({ "abbreviation": "CF" }))
        .await
        .unwrap_err();

    match err {
        Error::Http { status, ref message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "abbreviation already taken");
        }
        ref other => panic!("expected Http error, got: {other:?}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_not_found_and_transient_classification() {
    let (server, gateway) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/parties/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/parties/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let missing = gateway
        .get("/parties/missing", &Query::new())
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
    assert_eq!(missing.status(), Some(404));

    let flaky = gateway.get("/parties/flaky", &Query::new()).await.unwrap_err();
    assert!(flaky.is_transient());
    assert_eq!(flaky.to_string(), "HTTP 503: upstream down");
}
