mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use creativa::server::{self, AppState};
use creativa::ResolvedMode;

use support::build_client;

const TEXT_MODEL: &str = "gemini-2.5-flash-lite";
const IMAGE_MODEL: &str = "imagen-3.0-generate-001";

fn app(base_url: &str) -> Router {
    let state = Arc::new(AppState {
        client: build_client(base_url),
        mode: ResolvedMode::Public,
        text_model: TEXT_MODEL.to_string(),
        image_model: IMAGE_MODEL.to_string(),
    });
    server::router(state)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}

fn multipart_body(boundary: &str, request_json: Option<&str>, packshot: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(json) = request_json {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"request\"\r\n\r\n{json}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = packshot {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"packshot\"; \
                 filename=\"packshot.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_reports_the_resolved_mode() {
    let mock_server = MockServer::start().await;
    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "public");
}

#[tokio::test]
async fn descriptions_round_trip_sends_inline_photos() {
    let mock_server = MockServer::start().await;
    let model_output = json!({
        "short": "Taza artesanal",
        "long": "Taza de cerámica esmaltada a mano.",
        "bullets": ["Cerámica esmaltada", "Apta para microondas"],
        "hashtags": ["#taza", "#hogar"]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{TEXT_MODEL}:generateContent")))
        .and(body_string_contains("inlineData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": model_output}]}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "name": "Taza artesanal",
        "attributes": "cerámica, 350 ml",
        "images": [STANDARD.encode(png_bytes(8, 8))]
    });
    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/descriptions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["short"], "Taza artesanal");
    assert_eq!(body["hashtags"][0], "#taza");
}

#[tokio::test]
async fn creatives_multipart_round_trip() {
    let mock_server = MockServer::start().await;
    let background = STANDARD.encode(png_bytes(64, 80));
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{IMAGE_MODEL}:predict")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": background, "mimeType": "image/png"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request_json = json!({
        "headline": "Nueva edición",
        "cta": "Compra ahora",
        "width": 160,
        "height": 200
    })
    .to_string();
    let boundary = "creativa-test-boundary";
    let body = multipart_body(boundary, Some(&request_json), Some(&png_bytes(20, 30)));

    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/creatives")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let encoded = body["images"][0].as_str().unwrap();
    let png = STANDARD.decode(encoded).unwrap();
    let creative = image::load_from_memory(&png).unwrap();
    assert_eq!((creative.width(), creative.height()), (160, 200));
}

#[tokio::test]
async fn creatives_without_packshot_is_bad_request() {
    let mock_server = MockServer::start().await;
    let boundary = "creativa-test-boundary";
    let body = multipart_body(boundary, Some(r#"{"headline": "Hola"}"#), None);

    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/creatives")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_request_field_is_bad_request() {
    let mock_server = MockServer::start().await;
    let boundary = "creativa-test-boundary";
    let body = multipart_body(boundary, Some("not json"), Some(&png_bytes(4, 4)));

    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/creatives")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_error_status_is_propagated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{TEXT_MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&mock_server)
        .await;

    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feedback/reply")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"comment": "llegó roto"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn empty_reviews_are_rejected_before_any_model_call() {
    let mock_server = MockServer::start().await;
    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feedback/summary")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"reviews": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn feedback_summary_round_trip() {
    let mock_server = MockServer::start().await;
    let model_output = json!({
        "bullets": ["Entrega lenta", "Buen empaque"],
        "recommendation": "Priorizar logística.",
        "sentiment_ratio": {"positive": 0.5, "neutral": 0.2, "negative": 0.3},
        "action_plan": ["Auditar courier; Ops; 2 semanas"],
        "customer_reply": "Gracias por su comentario.",
        "sample_size": 2
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{TEXT_MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": model_output}]}}]
        })))
        .mount(&mock_server)
        .await;

    let response = app(&mock_server.uri())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feedback/summary")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"reviews": ["Llegó tarde", "Empaque impecable"]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["bullets"][0], "Entrega lenta");
    assert_eq!(body["sample_size"], 2);
    let ratio = &body["sentiment_ratio"];
    let total = ratio["positive"].as_f64().unwrap()
        + ratio["neutral"].as_f64().unwrap()
        + ratio["negative"].as_f64().unwrap();
    assert!((total - 1.0).abs() < 1e-9);
}
