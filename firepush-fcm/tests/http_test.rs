//! End-to-end tests over real HTTP against a local mock server.

use firepush_fcm::*;
use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fcm-admin-sdk.json");

/// Fixture key whose `token_uri` points at `server`.
fn credential_for(server: &MockServer) -> NamedTempFile {
    let mut key: Value = serde_json::from_str(&std::fs::read_to_string(FIXTURE).unwrap()).unwrap();
    key["token_uri"] = json!(format!("{}/token", server.uri()));

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", key).unwrap();
    file
}

fn client_for(server: &MockServer, credential: &NamedTempFile) -> FcmHttpV1 {
    let mut fcm = FcmHttpV1::new(FcmConfig::new("firepush-test", credential.path())).unwrap();
    fcm.set_url(format!(
        "{}/v1/projects/firepush-test/messages:send",
        server.uri()
    ));
    fcm.set_topic_info_url(format!("{}/iid/info", server.uri()));
    fcm
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.local",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_with_service_account_exchange() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/firepush-test/messages:send"))
        .and(header("authorization", "Bearer ya29.local"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/firepush-test/messages/0:1"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let credential = credential_for(&server);
    let mut fcm = client_for(&server, &credential);

    let feedback = fcm
        .send_push_notification(
            &["tokA".to_string(), "tokB".to_string()],
            &NotificationPayload::new("Hello", "World"),
            &DataPayload::defaults(),
        )
        .await;

    let bundle = feedback.as_bundle().unwrap();
    assert_eq!(bundle.len(), 2);
    for result in bundle.iter() {
        assert!(result.success);
        assert_eq!(result.code, 200);
        assert_eq!(result.message["name"], "projects/firepush-test/messages/0:1");
    }
    assert!(fcm.failed_device_tokens().is_empty());
}

#[tokio::test]
async fn test_unregistered_token_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/firepush-test/messages:send"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let credential = credential_for(&server);
    let mut fcm = client_for(&server, &credential);

    let feedback = fcm
        .send_push_notification(
            &["stale".to_string()],
            &NotificationPayload::default(),
            &DataPayload::defaults(),
        )
        .await;

    let result = feedback.as_bundle().unwrap().get(0).unwrap();
    assert!(result.success);
    assert_eq!(result.code, 404);
    assert_eq!(result.message["error"]["status"], "NOT_FOUND");
    assert_eq!(fcm.failed_device_tokens(), ["stale".to_string()]);
}

#[tokio::test]
async fn test_rejected_token_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let credential = credential_for(&server);
    let mut fcm = client_for(&server, &credential);

    let feedback = fcm
        .send_push_notification(
            &["tokA".to_string()],
            &NotificationPayload::default(),
            &DataPayload::defaults(),
        )
        .await;

    let result = feedback.as_bundle().unwrap().get(0).unwrap();
    assert!(!result.success);
    assert_eq!(result.code, 400);
    assert!(result.message.as_str().unwrap().contains("invalid_grant"));
    assert!(fcm.failed_device_tokens().is_empty());
}

#[tokio::test]
async fn test_topic_info_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/iid/info/tokA"))
        .and(query_param("details", "true"))
        .and(header("authorization", "Bearer ya29.local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "application": "com.example.app",
            "rel": {"topics": {"news": {"addDate": "2024-05-01"}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credential = credential_for(&server);
    let mut fcm = client_for(&server, &credential);

    let info = fcm.topic_info("tokA").await;
    assert!(info.success);
    assert_eq!(info.message["application"], "com.example.app");
}

#[tokio::test]
async fn test_http_transport_returns_error_statuses() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&HttpOptions::default()).unwrap();
    let response = transport
        .post_json(&format!("{}/echo", server.uri()), "t", &json!({}))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.json(), json!("unavailable"));
}
