//! Models API surface.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Number, Value};

use crate::client::{Backend, ClientInner};
use crate::error::{Error, Result};
use crate::types::content::Content;
use crate::types::models::{
    GenerateContentConfig, GenerateContentRequest, GenerateImagesConfig, GenerateImagesResponse,
    GenerateVideosConfig, GenerateVideosSource, GeneratedImage, Image, ListModelsResponse,
};
use crate::types::operations::Operation;
use crate::types::response::GenerateContentResponse;

#[derive(Clone)]
pub struct Models {
    pub(crate) inner: Arc<ClientInner>,
}

impl Models {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Generate content with default config.
    pub async fn generate_content(
        &self,
        model: impl Into<String>,
        contents: Vec<Content>,
    ) -> Result<GenerateContentResponse> {
        self.generate_content_with_config(model, contents, GenerateContentConfig::default())
            .await
    }

    /// Generate content with custom config.
    pub async fn generate_content_with_config(
        &self,
        model: impl Into<String>,
        contents: Vec<Content>,
        config: GenerateContentConfig,
    ) -> Result<GenerateContentResponse> {
        let model = model.into();
        let request = GenerateContentRequest {
            contents,
            system_instruction: config.system_instruction,
            generation_config: config.generation_config,
        };

        let url = build_model_method_url(&self.inner, &model, "generateContent")?;
        let request = self.inner.http.post(url).json(&request);
        let response = self.inner.send(request).await?;
        if !response.status().is_success() {
            return Err(Error::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<GenerateContentResponse>().await?)
    }

    /// Generate images (Imagen `:predict`).
    pub async fn generate_images(
        &self,
        model: impl Into<String>,
        prompt: impl Into<String>,
        config: GenerateImagesConfig,
    ) -> Result<GenerateImagesResponse> {
        let model = model.into();
        let prompt = prompt.into();
        let body = build_generate_images_body(self.inner.config.backend, &prompt, &config)?;
        let url = build_model_method_url(&self.inner, &model, "predict")?;

        let request = self.inner.http.post(url).json(&body);
        let response = self.inner.send(request).await?;
        if !response.status().is_success() {
            return Err(Error::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let value = response.json::<Value>().await?;
        parse_generate_images_response(&value)
    }

    /// Start video generation (Veo `:predictLongRunning`). Returns the
    /// operation handle to poll.
    pub async fn generate_videos(
        &self,
        model: impl Into<String>,
        source: GenerateVideosSource,
        config: GenerateVideosConfig,
    ) -> Result<Operation> {
        let model = model.into();
        let body = build_generate_videos_body(self.inner.config.backend, &source, &config)?;
        let url = build_model_method_url(&self.inner, &model, "predictLongRunning")?;

        let request = self.inner.http.post(url).json(&body);
        let response = self.inner.send(request).await?;
        if !response.status().is_success() {
            return Err(Error::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let value = response.json::<Value>().await?;
        parse_generate_videos_operation(value, self.inner.config.backend)
    }

    /// Start video generation from a text prompt alone.
    pub async fn generate_videos_with_prompt(
        &self,
        model: impl Into<String>,
        prompt: impl Into<String>,
        config: GenerateVideosConfig,
    ) -> Result<Operation> {
        let source = GenerateVideosSource {
            prompt: Some(prompt.into()),
            ..GenerateVideosSource::default()
        };
        self.generate_videos(model, source, config).await
    }

    /// List models. Doubles as the reachability probe for credential
    /// resolution.
    pub async fn list(&self) -> Result<ListModelsResponse> {
        let url = build_models_list_url(&self.inner)?;
        let request = self.inner.http.get(url);
        let response = self.inner.send(request).await?;
        if !response.status().is_success() {
            return Err(Error::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<ListModelsResponse>().await?)
    }
}

fn transform_model_name(backend: Backend, model: &str) -> String {
    match backend {
        Backend::GeminiApi => {
            if model.starts_with("models/") {
                model.to_string()
            } else {
                format!("models/{model}")
            }
        }
        Backend::VertexAi => {
            if model.starts_with("projects/") || model.starts_with("publishers/") {
                model.to_string()
            } else {
                format!("publishers/google/models/{model}")
            }
        }
    }
}

fn build_model_method_url(inner: &ClientInner, model: &str, method: &str) -> Result<String> {
    let model = transform_model_name(inner.config.backend, model);
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    let url = match inner.config.backend {
        Backend::GeminiApi => format!("{base}{version}/{model}:{method}"),
        Backend::VertexAi => {
            let vertex =
                inner
                    .config
                    .vertex_config
                    .as_ref()
                    .ok_or_else(|| Error::InvalidConfig {
                        message: "Vertex config missing".into(),
                    })?;
            format!(
                "{base}{version}/projects/{}/locations/{}/{}:{method}",
                vertex.project, vertex.location, model
            )
        }
    };
    Ok(url)
}

fn build_models_list_url(inner: &ClientInner) -> Result<String> {
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    let url = match inner.config.backend {
        Backend::GeminiApi => format!("{base}{version}/models"),
        Backend::VertexAi => {
            let vertex =
                inner
                    .config
                    .vertex_config
                    .as_ref()
                    .ok_or_else(|| Error::InvalidConfig {
                        message: "Vertex config missing".into(),
                    })?;
            format!(
                "{base}{version}/projects/{}/locations/{}/publishers/google/models",
                vertex.project, vertex.location
            )
        }
    };
    Ok(url)
}

fn build_generate_images_body(
    backend: Backend,
    prompt: &str,
    config: &GenerateImagesConfig,
) -> Result<Value> {
    let mut instance = Map::new();
    instance.insert("prompt".to_string(), Value::String(prompt.to_string()));

    let mut root = Map::new();
    root.insert(
        "instances".to_string(),
        Value::Array(vec![Value::Object(instance)]),
    );

    let mut parameters = Map::new();
    if let Some(value) = config.number_of_images {
        parameters.insert(
            "sampleCount".to_string(),
            Value::Number(Number::from(value)),
        );
    }
    if let Some(value) = &config.aspect_ratio {
        parameters.insert("aspectRatio".to_string(), Value::String(value.clone()));
    }
    if let Some(value) = &config.negative_prompt {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "negative_prompt is not supported in Gemini API".into(),
            });
        }
        parameters.insert("negativePrompt".to_string(), Value::String(value.clone()));
    }
    if let Some(value) = &config.safety_filter_level {
        parameters.insert("safetySetting".to_string(), Value::String(value.clone()));
    }
    if let Some(value) = config.seed {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "seed is not supported in Gemini API".into(),
            });
        }
        parameters.insert("seed".to_string(), Value::Number(Number::from(value)));
    }
    if let Some(value) = &config.output_gcs_uri {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "output_gcs_uri is not supported in Gemini API".into(),
            });
        }
        parameters.insert("storageUri".to_string(), Value::String(value.clone()));
    }

    if !parameters.is_empty() {
        root.insert("parameters".to_string(), Value::Object(parameters));
    }

    Ok(Value::Object(root))
}

fn build_generate_videos_body(
    backend: Backend,
    source: &GenerateVideosSource,
    config: &GenerateVideosConfig,
) -> Result<Value> {
    let mut instance = Map::new();
    if let Some(prompt) = &source.prompt {
        instance.insert("prompt".to_string(), Value::String(prompt.clone()));
    }
    if let Some(image) = &source.image {
        instance.insert("image".to_string(), image_to_prediction(backend, image)?);
    }

    let mut root = Map::new();
    root.insert(
        "instances".to_string(),
        Value::Array(vec![Value::Object(instance)]),
    );

    let mut parameters = Map::new();
    if let Some(value) = config.number_of_videos {
        parameters.insert(
            "sampleCount".to_string(),
            Value::Number(Number::from(value)),
        );
    }
    if let Some(value) = config.duration_seconds {
        parameters.insert(
            "durationSeconds".to_string(),
            Value::Number(Number::from(value)),
        );
    }
    if let Some(value) = config.fps {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "fps is not supported in Gemini API".into(),
            });
        }
        parameters.insert("fps".to_string(), Value::Number(Number::from(value)));
    }
    if let Some(value) = &config.aspect_ratio {
        parameters.insert("aspectRatio".to_string(), Value::String(value.clone()));
    }
    if let Some(value) = &config.resolution {
        parameters.insert("resolution".to_string(), Value::String(value.clone()));
    }
    if let Some(value) = &config.negative_prompt {
        parameters.insert("negativePrompt".to_string(), Value::String(value.clone()));
    }
    if let Some(value) = config.enhance_prompt {
        parameters.insert("enhancePrompt".to_string(), Value::Bool(value));
    }
    if let Some(value) = config.generate_audio {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "generate_audio is not supported in Gemini API".into(),
            });
        }
        parameters.insert("generateAudio".to_string(), Value::Bool(value));
    }
    if let Some(value) = config.seed {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "seed is not supported in Gemini API".into(),
            });
        }
        parameters.insert("seed".to_string(), Value::Number(Number::from(value)));
    }
    if let Some(value) = &config.output_gcs_uri {
        if backend == Backend::GeminiApi {
            return Err(Error::InvalidConfig {
                message: "output_gcs_uri is not supported in Gemini API".into(),
            });
        }
        parameters.insert("storageUri".to_string(), Value::String(value.clone()));
    }

    if !parameters.is_empty() {
        root.insert("parameters".to_string(), Value::Object(parameters));
    }

    Ok(Value::Object(root))
}

fn image_to_prediction(backend: Backend, image: &Image) -> Result<Value> {
    if backend == Backend::GeminiApi && image.gcs_uri.is_some() {
        return Err(Error::InvalidConfig {
            message: "gcs_uri is not supported in Gemini API".into(),
        });
    }
    let mut map = Map::new();
    if let Some(gcs_uri) = &image.gcs_uri {
        map.insert("gcsUri".to_string(), Value::String(gcs_uri.clone()));
    }
    if let Some(bytes) = &image.image_bytes {
        map.insert(
            "bytesBase64Encoded".to_string(),
            Value::String(STANDARD.encode(bytes)),
        );
    }
    if let Some(mime) = &image.mime_type {
        map.insert("mimeType".to_string(), Value::String(mime.clone()));
    }
    Ok(Value::Object(map))
}

fn parse_generate_images_response(value: &Value) -> Result<GenerateImagesResponse> {
    let predictions = value
        .get("predictions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut generated_images = Vec::new();
    for item in predictions {
        generated_images.push(parse_generated_image(item)?);
    }

    Ok(GenerateImagesResponse { generated_images })
}

fn parse_generated_image(value: &Value) -> Result<GeneratedImage> {
    let image = parse_prediction_image(value)?;
    let rai_filtered_reason = value
        .get("raiFilteredReason")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    let enhanced_prompt = value
        .get("enhancedPrompt")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    Ok(GeneratedImage {
        image,
        rai_filtered_reason,
        enhanced_prompt,
    })
}

/// Predictions carry image bytes as `bytesBase64Encoded`, not the
/// `imageBytes` field the request types use.
pub(crate) fn parse_prediction_image(value: &Value) -> Result<Option<Image>> {
    let gcs_uri = value
        .get("gcsUri")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    let mime_type = value
        .get("mimeType")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    let image_bytes = match value.get("bytesBase64Encoded").and_then(Value::as_str) {
        Some(encoded) => Some(STANDARD.decode(encoded).map_err(|err| Error::Parse {
            message: format!("Invalid base64 in prediction: {err}"),
        })?),
        None => None,
    };

    if gcs_uri.is_none() && image_bytes.is_none() {
        return Ok(None);
    }
    Ok(Some(Image {
        gcs_uri,
        image_bytes,
        mime_type,
    }))
}

fn parse_generate_videos_operation(value: Value, backend: Backend) -> Result<Operation> {
    let mut operation: Operation = serde_json::from_value(value)?;
    if backend == Backend::GeminiApi {
        if let Some(response) = operation.response.take() {
            if let Some(inner) = response.get("generateVideoResponse") {
                operation.response = Some(inner.clone());
            } else {
                operation.response = Some(response);
            }
        }
    }
    Ok(operation)
}
