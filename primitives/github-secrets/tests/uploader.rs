//! Pipeline tests against a mock GitHub API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use crypto_box::SecretKey;
use github_secrets::{
    AuthToken, Error, GitHubClient, SecretRecord, SecretUploader, UploaderConfig, UpsertOutcome,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const KEY_ID: &str = "3380204578043523366";
const PUBLIC_KEY_PATH: &str = "/repos/org/repo/actions/secrets/public-key";
const SECRET_PATH: &str = "/repos/org/repo/actions/secrets/TEST_SECRET";

fn reference_secret_key() -> SecretKey {
    SecretKey::from([42u8; 32])
}

fn reference_public_key() -> String {
    STANDARD.encode(reference_secret_key().public_key().as_bytes())
}

fn config(server: &ServerGuard) -> UploaderConfig {
    UploaderConfig::new("org/repo".parse().unwrap(), AuthToken::new("test-token"))
        .with_api_url(server.url())
}

fn uploader(server: &ServerGuard) -> SecretUploader {
    SecretUploader::from_config(&config(server)).unwrap()
}

fn record(value: &str) -> SecretRecord {
    SecretRecord::new("TEST_SECRET".parse().unwrap(), value)
}

async fn mock_public_key(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", PUBLIC_KEY_PATH)
        .match_header("authorization", "token test-token")
        .match_header("accept", "application/vnd.github.v3+json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "key": reference_public_key(), "key_id": KEY_ID }).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn fetches_public_key_material() {
    let mut server = Server::new_async().await;
    let key_mock = mock_public_key(&mut server).await;

    let client = GitHubClient::new(&config(&server)).unwrap();
    let material = client
        .fetch_public_key(&"org/repo".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(material.key, reference_public_key());
    assert_eq!(material.key_id, KEY_ID);
    key_mock.assert_async().await;
}

#[tokio::test]
async fn uploads_value_sealed_to_the_fetched_key() {
    let mut server = Server::new_async().await;
    let key_mock = mock_public_key(&mut server).await;

    let captured: Arc<Mutex<Option<Vec<u8>>>> = Arc::default();
    let sink = Arc::clone(&captured);
    let put_mock = server
        .mock("PUT", SECRET_PATH)
        .match_header("authorization", "token test-token")
        .match_body(Matcher::PartialJson(json!({ "key_id": KEY_ID })))
        .with_status(201)
        .with_body_from_request(move |request| {
            *sink.lock().unwrap() = Some(request.body().unwrap().clone());
            Vec::new()
        })
        .create_async()
        .await;

    let outcome = uploader(&server).upload(&record("hello")).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);
    key_mock.assert_async().await;
    put_mock.assert_async().await;

    let body: Value = serde_json::from_slice(&captured.lock().unwrap().take().unwrap()).unwrap();
    let sealed = STANDARD
        .decode(body["encrypted_value"].as_str().unwrap())
        .unwrap();
    let opened = reference_secret_key().unseal(&sealed).unwrap();
    assert_eq!(opened, b"hello");
}

#[tokio::test]
async fn treats_no_content_as_update() {
    let mut server = Server::new_async().await;
    let _key_mock = mock_public_key(&mut server).await;
    let put_mock = server
        .mock("PUT", SECRET_PATH)
        .with_status(204)
        .create_async()
        .await;

    let outcome = uploader(&server).upload(&record("hello")).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    put_mock.assert_async().await;
}

#[tokio::test]
async fn rejected_token_short_circuits_before_upload() {
    let mut server = Server::new_async().await;
    let key_mock = server
        .mock("GET", PUBLIC_KEY_PATH)
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", SECRET_PATH)
        .expect(0)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    match err {
        Error::Auth { status, body } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, r#"{"message":"Bad credentials"}"#);
        }
        other => panic!("expected auth error, got {other:?}"),
    }
    key_mock.assert_async().await;
    put_mock.assert_async().await;
}

#[tokio::test]
async fn forbidden_is_an_auth_error() {
    let mut server = Server::new_async().await;
    let _key_mock = server
        .mock("GET", PUBLIC_KEY_PATH)
        .with_status(403)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    assert!(matches!(err, Error::Auth { status, .. } if status.as_u16() == 403));
}

#[tokio::test]
async fn missing_repository_is_not_found() {
    let mut server = Server::new_async().await;
    let _key_mock = server
        .mock("GET", PUBLIC_KEY_PATH)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", SECRET_PATH)
        .expect(0)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { ref body } if body.contains("Not Found")));
    put_mock.assert_async().await;
}

#[tokio::test]
async fn other_key_fetch_failures_keep_status() {
    let mut server = Server::new_async().await;
    let _key_mock = server
        .mock("GET", PUBLIC_KEY_PATH)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    match err {
        Error::Api { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_key_response_is_rejected() {
    let mut server = Server::new_async().await;
    let _key_mock = server
        .mock("GET", PUBLIC_KEY_PATH)
        .with_status(200)
        .with_body(r#"{"unexpected":true}"#)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn malformed_key_material_is_an_encoding_error() {
    let mut server = Server::new_async().await;
    let _key_mock = server
        .mock("GET", PUBLIC_KEY_PATH)
        .with_status(200)
        .with_body(json!({ "key": "%%%", "key_id": KEY_ID }).to_string())
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", SECRET_PATH)
        .expect(0)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
    put_mock.assert_async().await;
}

#[tokio::test]
async fn unprocessable_upload_preserves_body_verbatim() {
    let mut server = Server::new_async().await;
    let _key_mock = mock_public_key(&mut server).await;
    let body = json!({
        "message": "Bad request - key_id is invalid",
        "documentation_url": "https://docs.github.com",
    })
    .to_string();
    let _put_mock = server
        .mock("PUT", SECRET_PATH)
        .with_status(422)
        .with_body(&body)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    match err {
        Error::Upload { status, body: got } => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(got, body);
        }
        other => panic!("expected upload error, got {other:?}"),
    }
}

#[tokio::test]
async fn ok_is_not_an_accepted_upload_status() {
    let mut server = Server::new_async().await;
    let _key_mock = mock_public_key(&mut server).await;
    let _put_mock = server
        .mock("PUT", SECRET_PATH)
        .with_status(200)
        .create_async()
        .await;

    let err = uploader(&server).upload(&record("hello")).await.unwrap_err();
    assert!(matches!(err, Error::Upload { status, .. } if status.as_u16() == 200));
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let config = UploaderConfig::new("org/repo".parse().unwrap(), AuthToken::new("t"))
        .with_api_url("http://127.0.0.1:1");

    let err = SecretUploader::from_config(&config)
        .unwrap()
        .upload(&record("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn stalled_api_times_out_as_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = UploaderConfig::new("org/repo".parse().unwrap(), AuthToken::new("t"))
        .with_api_url(format!("http://{addr}"))
        .with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let err = SecretUploader::from_config(&config)
        .unwrap()
        .upload(&record("hello"))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(err, Error::Transport(ref e) if e.is_timeout()));
}
