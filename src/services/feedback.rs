//! Customer feedback analysis: review summaries, per-review sentiment, and
//! public replies.

use serde::Serialize;
use serde_json::Value;

use crate::client::Client;
use crate::error::Result;
use crate::extract::{self, SentimentRatio, LABEL_NEUTRAL};
use crate::prompt;
use crate::types::content::{Content, GenerationConfig};
use crate::types::models::GenerateContentConfig;

const SUMMARY_MAX_REVIEWS: usize = 300;
const SENTIMENT_MAX_REVIEWS: usize = 200;
const REVIEW_CLIP: usize = 160;
const RATIONALE_CLIP: usize = 240;

const FALLBACK_RECOMMENDATION: &str =
    "Review the negative feedback and prioritize the most repeated issues.";
const FALLBACK_PLAN_STEP: &str = "Review open tickets; CX team; 2 weeks";
const FALLBACK_REPLY: &str = "Thank you for your feedback! We want to help. Please send us a \
direct message with your order number and contact details so we can look into your case and \
offer a solution.";

/// Aggregate summary of a batch of reviews.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub bullets: Vec<String>,
    pub recommendation: String,
    pub sentiment_ratio: RatioOut,
    pub action_plan: Vec<String>,
    pub customer_reply: String,
    pub sample_size: usize,
    pub raw: String,
}

/// Serializable view of a normalized ratio.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatioOut {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl From<SentimentRatio> for RatioOut {
    fn from(ratio: SentimentRatio) -> Self {
        Self {
            positive: ratio.positive,
            neutral: ratio.neutral,
            negative: ratio.negative,
        }
    }
}

/// One classified review.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentRow {
    pub review: String,
    pub sentiment: String,
    pub rationale: String,
}

/// Summarize a batch of reviews.
///
/// # Errors
/// Returns an error when the API call fails; unusable model output degrades
/// to a conservative default summary.
pub async fn summarize_reviews(
    client: &Client,
    model: &str,
    reviews: &[String],
) -> Result<ReviewSummary> {
    let subset: Vec<String> = reviews.iter().take(SUMMARY_MAX_REVIEWS).cloned().collect();
    let prompt = prompt::review_summary(&subset, subset.len());
    let raw = generate_text(client, model, &prompt, 0.4, 0.9, 768).await?;

    let Some(value) = extract::extract_json(&raw).filter(Value::is_object) else {
        return Ok(fallback_summary(&subset, raw));
    };

    let mut bullets: Vec<String> = extract::string_list(&value, "bullets")
        .into_iter()
        .map(|item| item.trim_end_matches('.').to_string())
        .collect();
    bullets.truncate(5);
    if bullets.is_empty() {
        bullets.push("No notable findings".to_string());
    }

    let recommendation = extract::string_field(&value, "recommendation")
        .unwrap_or_else(|| FALLBACK_RECOMMENDATION.to_string());

    let ratio = value
        .get("sentiment_ratio")
        .map_or_else(SentimentRatio::default, SentimentRatio::from_json);

    let mut action_plan: Vec<String> = extract::string_list(&value, "action_plan")
        .into_iter()
        .map(|item| item.trim_end_matches('.').to_string())
        .collect();
    action_plan.truncate(5);
    if action_plan.is_empty() {
        action_plan.push(FALLBACK_PLAN_STEP.to_string());
    }

    let customer_reply = extract::string_field(&value, "customer_reply")
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());

    let sample_size = value
        .get("sample_size")
        .and_then(Value::as_u64)
        .map_or(subset.len(), |size| size as usize);

    Ok(ReviewSummary {
        bullets,
        recommendation,
        sentiment_ratio: ratio.into(),
        action_plan,
        customer_reply,
        sample_size,
        raw,
    })
}

/// Classify each review as positive, neutral or negative.
///
/// # Errors
/// Returns an error when the API call fails; unparseable output degrades to
/// neutral rows.
pub async fn score_sentiment(
    client: &Client,
    model: &str,
    reviews: &[String],
) -> Result<Vec<SentimentRow>> {
    let subset: Vec<String> = reviews
        .iter()
        .take(SENTIMENT_MAX_REVIEWS)
        .cloned()
        .collect();
    let prompt = prompt::sentiment_scoring(&subset);
    let raw = generate_text(client, model, &prompt, 0.2, 0.9, 2048).await?;

    let rows = extract::extract_json(&raw)
        .and_then(|value| value.as_array().cloned())
        .map(|items| {
            items
                .iter()
                .filter_map(parse_sentiment_row)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if rows.is_empty() {
        return Ok(neutral_rows(&subset));
    }
    Ok(rows)
}

/// Draft a public reply to one customer comment.
///
/// # Errors
/// Returns an error when the API call fails; a missing `reply` field
/// degrades to a generic reply.
pub async fn generate_reply(
    client: &Client,
    model: &str,
    comment: &str,
    brand: Option<&str>,
) -> Result<String> {
    let prompt = prompt::customer_reply(comment, brand);
    let raw = generate_text(client, model, &prompt, 0.4, 0.9, 512).await?;
    let reply = extract::extract_json(&raw)
        .and_then(|value| extract::string_field(&value, "reply"))
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
    Ok(reply)
}

async fn generate_text(
    client: &Client,
    model: &str,
    prompt: &str,
    temperature: f32,
    top_p: f32,
    max_output_tokens: i32,
) -> Result<String> {
    let config = GenerateContentConfig {
        generation_config: Some(GenerationConfig {
            temperature: Some(temperature),
            top_p: Some(top_p),
            max_output_tokens: Some(max_output_tokens),
        }),
        ..Default::default()
    };
    let response = client
        .models()
        .generate_content_with_config(model, vec![Content::user(prompt)], config)
        .await?;
    Ok(response.text().unwrap_or_default().trim().to_string())
}

fn parse_sentiment_row(value: &Value) -> Option<SentimentRow> {
    let review = extract::clip(
        value.get("review").and_then(Value::as_str)?.trim(),
        REVIEW_CLIP,
    );
    if review.is_empty() {
        return None;
    }
    let sentiment = value
        .get("sentiment")
        .and_then(Value::as_str)
        .and_then(extract::normalize_label)
        .unwrap_or(LABEL_NEUTRAL);
    let rationale = value
        .get("rationale")
        .and_then(Value::as_str)
        .map(|text| extract::clip(text.trim(), RATIONALE_CLIP))
        .unwrap_or_default();
    Some(SentimentRow {
        review,
        sentiment: sentiment.to_string(),
        rationale,
    })
}

fn neutral_rows(subset: &[String]) -> Vec<SentimentRow> {
    subset
        .iter()
        .take(50)
        .map(|review| SentimentRow {
            review: extract::clip(review.trim(), REVIEW_CLIP),
            sentiment: LABEL_NEUTRAL.to_string(),
            rationale: String::new(),
        })
        .collect()
}

fn fallback_summary(subset: &[String], raw: String) -> ReviewSummary {
    let mut bullets: Vec<String> = subset
        .iter()
        .take(5)
        .map(|review| extract::clip(review.split_whitespace().collect::<Vec<_>>().join(" ").as_str(), 90))
        .filter(|line| !line.is_empty())
        .collect();
    if bullets.is_empty() {
        bullets.push("No data".to_string());
    }
    ReviewSummary {
        bullets,
        recommendation: FALLBACK_RECOMMENDATION.to_string(),
        sentiment_ratio: SentimentRatio::default().into(),
        action_plan: vec![FALLBACK_PLAN_STEP.to_string()],
        customer_reply: FALLBACK_REPLY.to_string(),
        sample_size: subset.len(),
        raw,
    }
}
