//! HTTP API handlers.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::compose::CreativeParams;
use crate::error::Error;
use crate::operations::WaitConfig;
use crate::services::creatives::{self, CreativeRequest};
use crate::services::descriptions::{self, DescriptionRequest, ProductDescription};
use crate::services::feedback::{self, ReviewSummary, SentimentRow};
use crate::services::videos::{self, PromoVideo, VideoRequest};

use super::state::AppState;

type ApiError = (StatusCode, String);

fn internal(err: Error) -> ApiError {
    let status = match &err {
        Error::InvalidConfig { .. } | Error::Parse { .. } => StatusCode::BAD_GATEWAY,
        Error::ApiError { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!(error = %err, "request failed");
    (status, err.to_string())
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message.into())
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub mode: String,
}

/// GET /healthz
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        mode: format!("{:?}", state.mode).to_lowercase(),
    })
}

/// POST /api/descriptions
pub async fn descriptions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<ProductDescription>, ApiError> {
    let output = descriptions::generate_description(&state.client, &state.text_model, &request)
        .await
        .map_err(internal)?;
    Ok(Json(output))
}

#[derive(Deserialize)]
pub struct ReviewsBody {
    pub reviews: Vec<String>,
}

/// POST /api/feedback/summary
pub async fn feedback_summary(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReviewsBody>,
) -> Result<Json<ReviewSummary>, ApiError> {
    if body.reviews.is_empty() {
        return Err(bad_request("reviews must not be empty"));
    }
    let summary = feedback::summarize_reviews(&state.client, &state.text_model, &body.reviews)
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}

/// POST /api/feedback/sentiment
pub async fn feedback_sentiment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReviewsBody>,
) -> Result<Json<Vec<SentimentRow>>, ApiError> {
    if body.reviews.is_empty() {
        return Err(bad_request("reviews must not be empty"));
    }
    let rows = feedback::score_sentiment(&state.client, &state.text_model, &body.reviews)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct ReplyBody {
    pub comment: String,
    #[serde(default)]
    pub brand: Option<String>,
}

#[derive(Serialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// POST /api/feedback/reply
pub async fn feedback_reply(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplyBody>,
) -> Result<Json<ReplyResponse>, ApiError> {
    if body.comment.trim().is_empty() {
        return Err(bad_request("comment must not be empty"));
    }
    let reply = feedback::generate_reply(
        &state.client,
        &state.text_model,
        &body.comment,
        body.brand.as_deref(),
    )
    .await
    .map_err(internal)?;
    Ok(Json(ReplyResponse { reply }))
}

#[derive(Serialize)]
pub struct CreativesResponse {
    /// PNG creatives, base64-encoded.
    pub images: Vec<String>,
}

/// POST /api/creatives — multipart with a `packshot` file and a `request`
/// JSON field.
pub async fn creatives(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CreativesResponse>, ApiError> {
    let (packshot, request_json) = read_upload(multipart).await?;
    let packshot = packshot.ok_or_else(|| bad_request("missing packshot field"))?;
    let request: CreativeRequest = parse_request_field(request_json.as_deref())?;

    let params = request.creative_params(CreativeParams::default());
    let images = creatives::generate_creatives(
        &state.client,
        &state.image_model,
        &request,
        &packshot,
        &params,
    )
    .await
    .map_err(internal)?;

    Ok(Json(CreativesResponse {
        images: images.iter().map(|png| STANDARD.encode(png)).collect(),
    }))
}

#[derive(Serialize)]
pub struct VideosResponse {
    pub videos: Vec<PromoVideo>,
}

/// POST /api/videos — multipart with a `request` JSON field and an optional
/// `packshot` file.
pub async fn promo_videos(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<VideosResponse>, ApiError> {
    let (packshot, request_json) = read_upload(multipart).await?;
    let request: VideoRequest = parse_request_field(request_json.as_deref())?;
    if request.prompt.trim().is_empty() {
        return Err(bad_request("prompt must not be empty"));
    }

    let videos = videos::generate_promo_videos(
        &state.client,
        &request,
        packshot.as_deref(),
        WaitConfig::default(),
    )
    .await
    .map_err(internal)?;
    Ok(Json(VideosResponse { videos }))
}

/// Pull the `packshot` file and `request` JSON string out of a multipart
/// body, ignoring unknown fields.
async fn read_upload(mut multipart: Multipart) -> Result<(Option<Vec<u8>>, Option<String>), ApiError> {
    let mut packshot = None;
    let mut request_json = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(format!("Multipart error: {err}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "packshot" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| bad_request(format!("Failed to read packshot: {err}")))?;
                packshot = Some(bytes.to_vec());
            }
            "request" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| bad_request(format!("Failed to read request: {err}")))?;
                request_json = Some(text);
            }
            _ => {}
        }
    }
    Ok((packshot, request_json))
}

fn parse_request_field<T: serde::de::DeserializeOwned>(json: Option<&str>) -> Result<T, ApiError> {
    let json = json.ok_or_else(|| bad_request("missing request field"))?;
    serde_json::from_str(json).map_err(|err| bad_request(format!("Invalid request JSON: {err}")))
}
