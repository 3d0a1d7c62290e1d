//! Promotional video generation through Veo long-running operations.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Backend, Client};
use crate::error::{Error, Result};
use crate::operations::WaitConfig;
use crate::prompt;
use crate::types::models::{GenerateVideosConfig, GenerateVideosSource, Image};
use crate::types::operations::Operation;

/// Inputs for one video batch. A packshot switches the request from
/// text-to-video to image-to-video and changes the default model.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub style_hint: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_duration")]
    pub duration_seconds: i32,
    #[serde(default = "default_video_count")]
    pub number_of_videos: i32,
    #[serde(default)]
    pub generate_audio: bool,
    #[serde(default)]
    pub seed: Option<i32>,
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}
const fn default_duration() -> i32 {
    8
}
const fn default_video_count() -> i32 {
    1
}

/// One finished video: inline bytes, a storage locator, or both.
#[derive(Debug, Clone, Serialize)]
pub struct PromoVideo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_base64: Option<String>,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_uri: Option<String>,
    pub model: String,
    pub duration_seconds: i32,
    pub aspect_ratio: String,
}

/// Kick off generation, poll to completion, and collect the results.
///
/// # Errors
/// Fails when the start call fails, polling exhausts its budget, the
/// operation reports an error, or it finishes with no videos.
pub async fn generate_promo_videos(
    client: &Client,
    request: &VideoRequest,
    packshot: Option<&[u8]>,
    wait: WaitConfig,
) -> Result<Vec<PromoVideo>> {
    let model = request.model.clone().unwrap_or_else(|| {
        if packshot.is_some() {
            std::env::var("VEO_IMAGE_MODEL")
                .unwrap_or_else(|_| prompt::DEFAULT_VIDEO_IMAGE_MODEL.to_string())
        } else {
            std::env::var("VEO_TEXT_MODEL")
                .unwrap_or_else(|_| prompt::DEFAULT_VIDEO_TEXT_MODEL.to_string())
        }
    });

    let full_prompt = prompt::promo_video(
        &request.prompt,
        &request.brand,
        &request.product_name,
        &request.style_hint,
    );

    let source = GenerateVideosSource {
        prompt: Some(full_prompt),
        image: packshot.map(|bytes| Image {
            image_bytes: Some(bytes.to_vec()),
            mime_type: Some(sniff_mime(bytes).to_string()),
            ..Default::default()
        }),
    };

    let vertex = client.backend() == Backend::VertexAi;
    let output_gcs_uri = std::env::var("OUTPUT_GCS_URI")
        .ok()
        .map(|uri| uri.trim().trim_end_matches('/').to_string())
        .filter(|uri| vertex && !uri.is_empty());

    let config = GenerateVideosConfig {
        number_of_videos: Some(request.number_of_videos.max(1)),
        duration_seconds: Some(request.duration_seconds),
        fps: vertex.then_some(24),
        aspect_ratio: Some(request.aspect_ratio.clone()),
        negative_prompt: Some(request.negative_prompt.clone())
            .filter(|text| !text.trim().is_empty()),
        enhance_prompt: Some(true),
        generate_audio: (vertex && request.generate_audio).then_some(true),
        seed: request.seed.filter(|_| vertex),
        output_gcs_uri,
        ..Default::default()
    };

    tracing::info!(model, "starting video generation");
    let operation = client.models().generate_videos(&model, source, config).await?;
    let operation = client.operations().wait_with_config(operation, wait).await?;

    collect_videos(&operation, request, &model)
}

fn collect_videos(
    operation: &Operation,
    request: &VideoRequest,
    model: &str,
) -> Result<Vec<PromoVideo>> {
    if let Some(error) = &operation.error {
        return Err(Error::ApiError {
            status: error.code.and_then(|code| u16::try_from(code).ok()).unwrap_or(500),
            message: error
                .message
                .clone()
                .unwrap_or_else(|| "Video operation failed".to_string()),
        });
    }
    let response = operation.response.as_ref().ok_or_else(|| Error::Parse {
        message: "Video operation finished without a response".into(),
    })?;

    let mut videos = Vec::new();
    for item in video_records(response) {
        let video = item.get("video").unwrap_or(item);
        let gcs_uri = video
            .get("uri")
            .or_else(|| video.get("gcsUri"))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let video_base64 = video
            .get("bytesBase64Encoded")
            .or_else(|| video.get("videoBytes"))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        if gcs_uri.is_none() && video_base64.is_none() {
            continue;
        }
        // Round-trip to validate the base64 before handing it to callers.
        if let Some(encoded) = &video_base64 {
            STANDARD.decode(encoded).map_err(|err| Error::Parse {
                message: format!("Invalid base64 in video payload: {err}"),
            })?;
        }
        let mime_type = video
            .get("mimeType")
            .and_then(Value::as_str)
            .unwrap_or("video/mp4")
            .to_string();
        videos.push(PromoVideo {
            video_base64,
            mime_type,
            gcs_uri,
            model: model.to_string(),
            duration_seconds: request.duration_seconds,
            aspect_ratio: request.aspect_ratio.clone(),
        });
    }

    if videos.is_empty() {
        return Err(Error::Parse {
            message: "Video operation finished with no generated videos".into(),
        });
    }
    Ok(videos)
}

/// The result list travels under different keys depending on backend and
/// model family.
fn video_records(response: &Value) -> Vec<&Value> {
    for key in ["generatedVideos", "videos", "generatedSamples"] {
        if let Some(items) = response.get(key).and_then(Value::as_array) {
            return items.iter().collect();
        }
    }
    Vec::new()
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "image/jpeg"
    }
}
