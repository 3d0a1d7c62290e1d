mod support;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use creativa::types::content::Content;
use creativa::Error;

use support::{build_client, build_client_with_version};

#[tokio::test]
async fn api_key_is_sent_as_goog_header() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "ok"}]}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let response = client
        .models()
        .generate_content("gemini-2.5-flash-lite", vec![Content::user("hi")])
        .await
        .unwrap();
    assert_eq!(response.text(), Some("ok".to_string()));
}

#[tokio::test]
async fn non_success_status_maps_to_api_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let result = client
        .models()
        .generate_content("gemini-2.5-flash-lite", vec![Content::user("hi")])
        .await;

    match result {
        Err(Error::ApiError { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn api_version_override_changes_the_path() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/models/gemini-2.5-flash-lite:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "versioned"}]}}]
        })))
        .mount(&mock_server)
        .await;

    let client = build_client_with_version(&mock_server.uri(), "v1");
    let response = client
        .models()
        .generate_content("gemini-2.5-flash-lite", vec![Content::user("hi")])
        .await
        .unwrap();
    assert_eq!(response.text(), Some("versioned".to_string()));
}
