use serde::{Deserialize, Serialize};

use crate::types::base64_serde;
use crate::types::content::{Content, GenerationConfig};

/// Request body for `generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Caller-facing config for `generate_content`.
#[derive(Debug, Clone, Default)]
pub struct GenerateContentConfig {
    pub system_instruction: Option<Content>,
    pub generation_config: Option<GenerationConfig>,
}

/// An image payload: inline bytes or a Cloud Storage locator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_uri: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_serde::option"
    )]
    pub image_bytes: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A video payload: inline bytes or a Cloud Storage locator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_serde::option"
    )]
    pub video_bytes: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Config for Imagen `:predict`.
#[derive(Debug, Clone, Default)]
pub struct GenerateImagesConfig {
    pub number_of_images: Option<i32>,
    pub aspect_ratio: Option<String>,
    pub negative_prompt: Option<String>,
    pub safety_filter_level: Option<String>,
    pub seed: Option<i32>,
    pub output_gcs_uri: Option<String>,
}

/// One Imagen prediction.
#[derive(Debug, Clone, Default)]
pub struct GeneratedImage {
    pub image: Option<Image>,
    pub rai_filtered_reason: Option<String>,
    pub enhanced_prompt: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateImagesResponse {
    pub generated_images: Vec<GeneratedImage>,
}

/// Prompt and optional reference media for Veo.
#[derive(Debug, Clone, Default)]
pub struct GenerateVideosSource {
    pub prompt: Option<String>,
    pub image: Option<Image>,
}

/// Config bag for Veo `:predictLongRunning`.
#[derive(Debug, Clone, Default)]
pub struct GenerateVideosConfig {
    pub number_of_videos: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub fps: Option<i32>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub negative_prompt: Option<String>,
    pub enhance_prompt: Option<bool>,
    pub generate_audio: Option<bool>,
    pub seed: Option<i32>,
    pub output_gcs_uri: Option<String>,
}

/// One generated video record from a finished operation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
}

/// Model listing, used by the Vertex reachability probe.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
