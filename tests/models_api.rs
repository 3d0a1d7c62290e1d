mod support;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use creativa::types::content::{Content, GenerationConfig};
use creativa::types::models::{
    GenerateContentConfig, GenerateImagesConfig, GenerateVideosConfig, GenerateVideosSource, Image,
};
use creativa::Error;

use support::build_client;

#[tokio::test]
async fn generate_content_sends_generation_config() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
        .and(body_string_contains("generationConfig"))
        .and(body_string_contains("maxOutputTokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "configured"}]}}]
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let config = GenerateContentConfig {
        generation_config: Some(GenerationConfig {
            temperature: Some(0.4),
            top_p: Some(0.9),
            max_output_tokens: Some(512),
        }),
        ..Default::default()
    };
    let response = client
        .models()
        .generate_content_with_config("gemini-2.5-flash-lite", vec![Content::user("hi")], config)
        .await
        .unwrap();
    assert_eq!(response.text(), Some("configured".to_string()));
}

#[tokio::test]
async fn generate_images_decodes_predictions() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-3.0-generate-001:predict"))
        .and(body_string_contains("\"sampleCount\":1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                {"bytesBase64Encoded": "AQID", "mimeType": "image/png"},
                {"raiFilteredReason": "blocked"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let config = GenerateImagesConfig {
        number_of_images: Some(1),
        aspect_ratio: Some("4:5".into()),
        ..Default::default()
    };
    let response = client
        .models()
        .generate_images("imagen-3.0-generate-001", "studio packshot", config)
        .await
        .unwrap();

    assert_eq!(response.generated_images.len(), 2);
    let first = response.generated_images[0].image.as_ref().unwrap();
    assert_eq!(first.image_bytes.as_deref(), Some(&[1u8, 2, 3][..]));
    assert!(response.generated_images[1].image.is_none());
    assert_eq!(
        response.generated_images[1].rai_filtered_reason.as_deref(),
        Some("blocked")
    );
}

#[tokio::test]
async fn generate_images_rejects_vertex_only_knobs_before_sending() {
    let mock_server = MockServer::start().await;

    let client = build_client(&mock_server.uri());
    let config = GenerateImagesConfig {
        seed: Some(7),
        ..Default::default()
    };
    let result = client
        .models()
        .generate_images("imagen-3.0-generate-001", "p", config)
        .await;

    assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn generate_videos_starts_a_long_running_operation() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/v1beta/models/veo-2.0-generate-001:predictLongRunning",
        ))
        .and(body_string_contains("bytesBase64Encoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-2.0-generate-001/operations/op-42"
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let source = GenerateVideosSource {
        prompt: Some("rotate the bottle slowly".into()),
        image: Some(Image {
            image_bytes: Some(vec![0x89, 0x50]),
            mime_type: Some("image/png".into()),
            ..Default::default()
        }),
    };
    let config = GenerateVideosConfig {
        duration_seconds: Some(8),
        aspect_ratio: Some("16:9".into()),
        ..Default::default()
    };
    let operation = client
        .models()
        .generate_videos("veo-2.0-generate-001", source, config)
        .await
        .unwrap();

    assert_eq!(
        operation.name.as_deref(),
        Some("models/veo-2.0-generate-001/operations/op-42")
    );
    assert!(!operation.is_done());
}

#[tokio::test]
async fn finished_video_operation_unwraps_inner_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/v1beta/models/veo-3.0-fast-generate-001:predictLongRunning",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-3.0-fast-generate-001/operations/op-7",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "gs://bucket/clip.mp4"}}]
                }
            }
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let operation = client
        .models()
        .generate_videos_with_prompt(
            "veo-3.0-fast-generate-001",
            "hero shot",
            GenerateVideosConfig::default(),
        )
        .await
        .unwrap();

    assert!(operation.is_done());
    let response = operation.response.unwrap();
    assert!(response.get("generatedSamples").is_some());
}

#[tokio::test]
async fn list_models_hits_the_collection_path() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "models/gemini-2.5-flash-lite"}]
        })))
        .mount(&mock_server)
        .await;

    let client = build_client(&mock_server.uri());
    let listing = client.models().list().await.unwrap();
    assert_eq!(
        listing.models.unwrap()[0].name.as_deref(),
        Some("models/gemini-2.5-flash-lite")
    );
}
