#![allow(clippy::unwrap_used)]
// Integration tests for `DocumentsClient` and the collection poller using wiremock.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopkeep_api::firestore::{Fields, Value};
use shopkeep_api::{DocumentsClient, Error, IdentityClient, poll_collection};

// ── Helpers ─────────────────────────────────────────────────────────

const COLLECTION: &str = "companies/acme/products";

fn token() -> SecretString {
    SecretString::from("id-u1".to_string())
}

fn documents(server: &MockServer) -> DocumentsClient {
    DocumentsClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        "demo-shop".into(),
        Duration::from_secs(5),
    )
}

fn collection_path() -> String {
    format!("/v1/projects/demo-shop/databases/(default)/documents/{COLLECTION}")
}

fn doc(id: &str, name: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/demo-shop/databases/(default)/documents/{COLLECTION}/{id}"),
        "fields": {
            "name": { "stringValue": name },
            "buyingPrice": { "doubleValue": 4.5 },
            "sellingPrice": { "integerValue": "10" }
        },
        "createTime": "2026-01-01T00:00:00Z",
        "updateTime": "2026-01-01T00:00:00Z"
    })
}

async fn signed_in_identity(server: &MockServer) -> IdentityClient {
    signed_in_identity_expiring(server, "3600").await
}

/// Sign in with a token lifetime of `expires_in` seconds. Anything under
/// a minute makes the first token use go through a refresh.
async fn signed_in_identity_expiring(server: &MockServer, expires_in: &str) -> IdentityClient {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "u1",
            "idToken": "id-u1",
            "refreshToken": "refresh-u1",
            "expiresIn": expires_in
        })))
        .mount(server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let identity = IdentityClient::with_client(
        reqwest::Client::new(),
        base.clone(),
        base,
        SecretString::from("test-key".to_string()),
        Duration::from_secs(5),
    );
    identity
        .sign_in_with_password("owner@shop.test", &SecretString::from("pw1234".to_string()))
        .await
        .unwrap();
    identity
}

// ── List tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_documents_keeps_service_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .and(header("authorization", "Bearer id-u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p2", "Nail"), doc("p1", "Hammer")]
        })))
        .mount(&server)
        .await;

    let docs = documents(&server).list_documents(COLLECTION, &token()).await.unwrap();

    let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["p2", "p1"]);
    assert_eq!(docs[1].field("name").and_then(Value::as_str), Some("Hammer"));
    assert_eq!(docs[0].field("sellingPrice").and_then(Value::as_f64), Some(10.0));
}

#[tokio::test]
async fn test_list_documents_follows_page_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .and(query_param("pageToken", "next-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p2", "Nail")]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p1", "Hammer")],
            "nextPageToken": "next-1"
        })))
        .mount(&server)
        .await;

    let docs = documents(&server).list_documents(COLLECTION, &token()).await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_empty_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let docs = documents(&server).list_documents(COLLECTION, &token()).await.unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_permission_denied() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "Missing or insufficient permissions.",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&server)
        .await;

    let err = documents(&server)
        .list_documents(COLLECTION, &token())
        .await
        .unwrap_err();

    assert!(err.is_permission_denied());
    assert!(!err.is_transient());
    assert_eq!(err.api_error_code(), Some("PERMISSION_DENIED"));
}

// ── Create tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_document_returns_assigned_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(collection_path()))
        .and(body_partial_json(json!({
            "fields": { "name": { "stringValue": "Hammer" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc("generated-7", "Hammer")))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("name".into(), Value::string("Hammer"));
    fields.insert("buyingPrice".into(), Value::double(4.5));

    let created = documents(&server)
        .create_document(COLLECTION, fields, &token())
        .await
        .unwrap();
    assert_eq!(created.id(), "generated-7");
}

#[tokio::test]
async fn test_create_document_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "bad field", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = documents(&server)
        .create_document(COLLECTION, Fields::new(), &token())
        .await
        .unwrap_err();

    match err {
        Error::Documents {
            message,
            status,
            http_status,
        } => {
            assert_eq!(message, "bad field");
            assert_eq!(status.as_deref(), Some("INVALID_ARGUMENT"));
            assert_eq!(http_status, 400);
        }
        other => panic!("expected Documents error, got: {other:?}"),
    }
}

// ── Poller tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_poller_emits_first_list_and_changes_only() {
    let server = MockServer::start().await;
    let identity = Arc::new(signed_in_identity(&server).await);

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p1", "Hammer")]
        })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p1", "Hammer"), doc("p2", "Nail")]
        })))
        .mount(&server)
        .await;

    let stream = poll_collection(
        identity,
        Arc::new(documents(&server)),
        COLLECTION.into(),
        Duration::from_millis(20),
    );
    futures_util::pin_mut!(stream);

    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);

    // The second identical listing is swallowed; the next emission is the change.
    let second = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let ids: Vec<&str> = second.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_poller_ends_after_fault() {
    let server = MockServer::start().await;
    let identity = Arc::new(signed_in_identity(&server).await);

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "denied", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let stream = poll_collection(
        identity,
        Arc::new(documents(&server)),
        COLLECTION.into(),
        Duration::from_millis(20),
    );
    futures_util::pin_mut!(stream);

    let item = stream.next().await.unwrap();
    assert!(matches!(item, Err(Error::Documents { http_status: 403, .. })));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_poller_retries_unavailable_listing() {
    let server = MockServer::start().await;
    let identity = Arc::new(signed_in_identity(&server).await);

    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "backend busy", "status": "UNAVAILABLE" }
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(collection_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p1", "Hammer")]
        })))
        .mount(&server)
        .await;

    let stream = poll_collection(
        identity,
        Arc::new(documents(&server)),
        COLLECTION.into(),
        Duration::from_millis(20),
    );
    futures_util::pin_mut!(stream);

    // The 503 is swallowed; the first item is the listing that followed it.
    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let ids: Vec<&str> = first.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["p1"]);
}

#[tokio::test]
async fn test_poller_retries_token_outage() {
    let server = MockServer::start().await;
    let identity = Arc::new(signed_in_identity_expiring(&server, "10").await);

    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "id-refreshed",
            "refresh_token": "refresh-2",
            "expires_in": "3600",
            "user_id": "u1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(collection_path()))
        .and(header("authorization", "Bearer id-refreshed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("p1", "Hammer")]
        })))
        .mount(&server)
        .await;

    let stream = poll_collection(
        Arc::clone(&identity),
        Arc::new(documents(&server)),
        COLLECTION.into(),
        Duration::from_millis(20),
    );
    futures_util::pin_mut!(stream);

    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(identity.current_session().unwrap().local_id, "u1");
}

#[tokio::test]
async fn test_poller_requires_session() {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let identity = Arc::new(IdentityClient::with_client(
        reqwest::Client::new(),
        base.clone(),
        base,
        SecretString::from("test-key".to_string()),
        Duration::from_secs(5),
    ));

    let stream = poll_collection(
        identity,
        Arc::new(documents(&server)),
        COLLECTION.into(),
        Duration::from_millis(20),
    );
    futures_util::pin_mut!(stream);

    assert!(matches!(stream.next().await, Some(Err(Error::NotSignedIn))));
    assert!(stream.next().await.is_none());
}
