//! Delegated operations against a mock slave node.

use std::sync::Arc;
use std::time::Duration;

use futures_util::TryStreamExt;
use relay_auth::{check_request, check_uri, Auth, HmacAuth};
use relay_models::Policy;
use relay_remote::{
    RemoteError, RemoteHandler, SettingsProvider, SiteSettings, SourceOptions, StorageHandler,
};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

const SECRET: &str = "slave-shared-secret";

fn auth() -> Arc<dyn Auth> {
    Arc::new(HmacAuth::new(SECRET).unwrap())
}

fn settings() -> SiteSettings {
    SiteSettings::new(Url::parse("https://site.example.com/").unwrap())
}

fn handler<'a>(policy: &'a Policy, settings: SiteSettings) -> RemoteHandler<'a> {
    let settings: Arc<dyn SettingsProvider> = Arc::new(settings);
    RemoteHandler::new(reqwest::Client::new(), policy, auth(), settings)
}

fn files() -> Vec<String> {
    vec!["a.txt".to_string(), "b.txt".to_string()]
}

/// Rebuild what the slave received so the signature can be checked.
async fn received(server: &MockServer) -> Vec<reqwest::Request> {
    server
        .received_requests()
        .await
        .expect("request recording should be enabled")
        .into_iter()
        .map(|req| {
            let method = reqwest::Method::from_bytes(req.method.as_str().as_bytes()).unwrap();
            let mut request = reqwest::Request::new(method, Url::parse(req.url.as_str()).unwrap());
            for (name, value) in req.headers.iter() {
                request.headers_mut().append(
                    HeaderName::from_bytes(name.as_str().as_bytes()).unwrap(),
                    HeaderValue::from_bytes(value.as_bytes()).unwrap(),
                );
            }
            if !req.body.is_empty() {
                *request.body_mut() = Some(req.body.clone().into());
            }
            request
        })
        .collect()
}

async fn mount_delete(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/v3/slave/delete"))
        .and(header_exists("authorization"))
        .and(body_json(json!({ "files": ["a.txt", "b.txt"] })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_success() {
    let server = MockServer::start().await;
    mount_delete(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "data": null, "msg": "" })),
    )
    .await;

    let policy = Policy::new(server.uri());
    let report = handler(&policy, settings()).delete(&files()).await;

    assert!(report.is_complete());
    assert!(report.failed.is_empty());

    let requests = received(&server).await;
    check_request(auth().as_ref(), &requests[0]).expect("slave should accept the signature");
}

#[tokio::test]
async fn test_delete_partial_failure() {
    let server = MockServer::start().await;
    mount_delete(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "code": 1,
            "data": "{\"files\":[\"b.txt\"]}",
            "error": "disk busy"
        })),
    )
    .await;

    let policy = Policy::new(server.uri());
    let (failed, error) = handler(&policy, settings())
        .delete(&files())
        .await
        .into_parts();

    assert_eq!(failed, vec!["b.txt".to_string()]);
    assert_eq!(error.unwrap().to_string(), "disk busy");
}

#[tokio::test]
async fn test_delete_undecodable_payload_reports_all_files() {
    let server = MockServer::start().await;
    mount_delete(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "code": 1,
            "data": "{\"files\":",
            "error": "disk busy"
        })),
    )
    .await;

    let policy = Policy::new(server.uri());
    let report = handler(&policy, settings()).delete(&files()).await;

    assert_eq!(report.failed, files());
    assert!(matches!(report.error, Some(RemoteError::ResponseFormat(_))));
}

#[tokio::test]
async fn test_delete_http_error_reports_all_files() {
    let server = MockServer::start().await;
    mount_delete(&server, ResponseTemplate::new(500)).await;

    let policy = Policy::new(server.uri());
    let report = handler(&policy, settings()).delete(&files()).await;

    assert_eq!(report.failed, files());
    assert!(matches!(report.error, Some(RemoteError::HttpStatus(500))));
}

#[tokio::test]
async fn test_delete_unreachable_slave() {
    // Nothing listens on port 1.
    let policy = Policy::new("http://127.0.0.1:1");
    let report = handler(&policy, settings()).delete(&files()).await;

    assert_eq!(report.failed, files());
    assert!(report.error.expect("should fail").is_transport());
}

#[tokio::test]
async fn test_delete_uses_configured_ttl() {
    let server = MockServer::start().await;
    mount_delete(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "code": 0 })),
    )
    .await;

    let policy = Policy::new(server.uri());
    let settings = settings().with_int("slave_api_timeout", 300);
    let before = unix_now();
    handler(&policy, settings).delete(&files()).await;

    let requests = received(&server).await;
    let header = requests[0]
        .headers()
        .get(AUTHORIZATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let expires: i64 = header.rsplit_once(':').unwrap().1.parse().unwrap();
    assert!(expires >= before + 300 && expires <= before + 302);
}

#[tokio::test]
async fn test_delete_empty_list_sends_nothing() {
    let server = MockServer::start().await;
    let policy = Policy::new(server.uri());

    let report = handler(&policy, settings()).delete(&[]).await;

    assert!(report.is_complete());
    assert!(received(&server).await.is_empty());
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

// =============================================================================
// Get
// =============================================================================

#[tokio::test]
async fn test_get_streams_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v3/slave/download/0/[A-Za-z0-9_-]+/a\.txt$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello slave"))
        .expect(1)
        .mount(&server)
        .await;

    let policy = Policy::new(server.uri());
    let options = SourceOptions::default().with_file_name("a.txt");
    let body = handler(&policy, settings())
        .get("/docs/a.txt", &options)
        .await
        .expect("should open body");

    assert_eq!(body.content_length(), Some(11));
    assert!(body
        .content_type()
        .is_some_and(|content_type| content_type.starts_with("text/plain")));
    let chunks: Vec<_> = body.into_stream().try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"hello slave");

    let requests = received(&server).await;
    check_uri(auth().as_ref(), requests[0].url()).expect("slave should accept the signed URL");
}

#[tokio::test]
async fn test_get_applies_speed_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v3/slave/download/1024/[A-Za-z0-9_-]+/file$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x"))
        .expect(1)
        .mount(&server)
        .await;

    let policy = Policy::new(server.uri());
    let options = SourceOptions::default().with_speed_limit(1024);
    let body = handler(&policy, settings())
        .get("/a.bin", &options)
        .await
        .unwrap();

    assert_eq!(body.bytes().await.unwrap().as_ref(), b"x");
}

#[tokio::test]
async fn test_get_non_200_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let policy = Policy::new(server.uri());
    let result = handler(&policy, settings())
        .get("/missing.txt", &SourceOptions::default())
        .await;

    match result {
        Err(RemoteError::HttpStatus(status)) => assert_eq!(status, 404),
        other => panic!("expected HTTP status error, got {:?}", other.map(|b| b.status())),
    }
}

#[tokio::test]
async fn test_get_cancelled_by_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let policy = Policy::new(server.uri());
    let handler = handler(&policy, settings());
    let result = tokio::time::timeout(
        Duration::from_millis(200),
        handler.get("/slow.bin", &SourceOptions::default()),
    )
    .await;

    assert!(result.is_err(), "dropping the future should abandon the request");
}

// =============================================================================
// Thumb / Source / Token
// =============================================================================

#[tokio::test]
async fn test_thumb_never_contacts_slave() {
    let server = MockServer::start().await;
    let policy = Policy::new(server.uri());

    let response = handler(&policy, settings()).thumb("/img/cat.png").await.unwrap();

    assert!(response.redirect);
    assert!(response.url.as_str().starts_with(&server.uri()));
    assert!(received(&server).await.is_empty());
}

#[tokio::test]
async fn test_source_is_absolute_and_signed() {
    let policy = Policy::new("https://slave.example.com:8443");
    let url = handler(&policy, settings())
        .source("/a b.txt", 3600, false, &SourceOptions::default().with_file_name("a b.txt"))
        .await
        .unwrap();

    assert_eq!(url.host_str(), Some("slave.example.com"));
    assert_eq!(url.port(), Some(8443));
    assert!(url.path().ends_with("/a%20b.txt"));
    check_uri(auth().as_ref(), &url).expect("should verify");
}

#[tokio::test]
async fn test_token_differs_per_key() {
    let policy = Policy::new("https://slave.example.com");
    let handler = handler(&policy, settings());

    let first = handler.token(600, "key-a").await.unwrap();
    let second = handler.token(600, "key-b").await.unwrap();

    assert_ne!(first.policy, second.policy);
    assert_ne!(first.token, second.token);
}
