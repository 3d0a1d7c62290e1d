//! Product description generation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Client;
use crate::error::Result;
use crate::extract;
use crate::prompt;
use crate::types::content::{Content, GenerationConfig, Part, Role};
use crate::types::models::GenerateContentConfig;

/// Inputs for one description request.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRequest {
    pub name: String,
    #[serde(default)]
    pub attributes: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Optional product photos, base64-encoded, sent inline with the
    /// prompt.
    #[serde(default, deserialize_with = "base64_images")]
    pub images: Vec<Vec<u8>>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_output_tokens: i32,
}

fn default_channel() -> String {
    "web".to_string()
}
const fn default_temperature() -> f32 {
    0.9
}
const fn default_top_p() -> f32 {
    0.95
}
const fn default_max_tokens() -> i32 {
    1024
}

fn base64_images<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let encoded = Vec::<String>::deserialize(deserializer)?;
    encoded
        .iter()
        .map(|item| {
            STANDARD
                .decode(item.trim().as_bytes())
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// Normalized model output. Extraction failure yields the empty shape with
/// the raw text preserved, never an error.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProductDescription {
    pub short: String,
    #[serde(rename = "long")]
    pub long_copy: String,
    pub bullets: Vec<String>,
    pub hashtags: Vec<String>,
    pub raw: String,
}

/// Ask the text model for product copy and normalize the response.
///
/// # Errors
/// Returns an error when the API call itself fails; a malformed model
/// payload degrades to the empty shape instead.
pub async fn generate_description(
    client: &Client,
    model: &str,
    request: &DescriptionRequest,
) -> Result<ProductDescription> {
    let prompt = prompt::product_description(&request.name, &request.attributes, &request.channel);
    let mut parts = vec![Part::text(prompt)];
    for image in &request.images {
        let mime = if image.starts_with(&[0x89, b'P', b'N', b'G']) {
            "image/png"
        } else {
            "image/jpeg"
        };
        parts.push(Part::inline_data(image.clone(), mime));
    }
    let contents = vec![Content::from_parts(parts, Role::User)];

    let config = GenerateContentConfig {
        generation_config: Some(GenerationConfig {
            temperature: Some(request.temperature),
            top_p: Some(request.top_p),
            max_output_tokens: Some(request.max_output_tokens),
        }),
        ..Default::default()
    };

    let response = client
        .models()
        .generate_content_with_config(model, contents, config)
        .await?;
    let raw = response.text().unwrap_or_default().trim().to_string();
    Ok(normalize(&raw))
}

fn normalize(raw: &str) -> ProductDescription {
    let Some(value) = extract::extract_json(raw) else {
        return ProductDescription {
            raw: raw.to_string(),
            ..Default::default()
        };
    };

    ProductDescription {
        short: extract::string_field(&value, "short").unwrap_or_default(),
        long_copy: extract::string_field(&value, "long").unwrap_or_default(),
        bullets: extract::string_list(&value, "bullets"),
        hashtags: hashtags(&value),
        raw: raw.to_string(),
    }
}

/// Hashtags may arrive as an array or a single string; either way only
/// `#`-prefixed tokens survive.
fn hashtags(value: &Value) -> Vec<String> {
    let Some(field) = value.get("hashtags") else {
        return Vec::new();
    };
    match field {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|tag| tag.starts_with('#'))
            .map(ToString::to_string)
            .collect(),
        Value::String(text) => text
            .split([' ', '\n', '\t', ','])
            .map(str::trim)
            .filter(|tag| tag.starts_with('#'))
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn images_deserialize_from_base64() {
        let request: DescriptionRequest =
            serde_json::from_value(json!({"name": "Taza", "images": ["AQID"]})).unwrap();
        assert_eq!(request.images, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn invalid_image_base64_is_rejected() {
        let result = serde_json::from_value::<DescriptionRequest>(
            json!({"name": "Taza", "images": ["not base64!!"]}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn array_hashtags_keep_only_hash_tokens() {
        let raw = r##"{"short":"","long":"","bullets":[],"hashtags":["#uno", "dos", " #tres "]}"##;
        let out = normalize(raw);
        assert_eq!(out.hashtags, vec!["#uno", "#tres"]);
    }

    #[test]
    fn json_response_normalizes_fields() {
        let raw = r##"{"short":"s","long":"l","bullets":["a","b"],"hashtags":["#x","#y"]}"##;
        let out = normalize(raw);
        assert_eq!(out.short, "s");
        assert_eq!(out.long_copy, "l");
        assert_eq!(out.bullets, vec!["a", "b"]);
        assert_eq!(out.hashtags, vec!["#x", "#y"]);
        assert_eq!(out.raw, raw);
    }

    #[test]
    fn stringy_hashtags_keep_only_hash_tokens() {
        let raw = r##"{"short":"","long":"","bullets":[],"hashtags":"#uno, dos #tres"}"##;
        let out = normalize(raw);
        assert_eq!(out.hashtags, vec!["#uno", "#tres"]);
    }

    #[test]
    fn plain_text_falls_back_to_empty_shape_with_raw() {
        let raw = "Sorry, I can only answer in prose.";
        let out = normalize(raw);
        assert!(out.short.is_empty());
        assert!(out.long_copy.is_empty());
        assert!(out.bullets.is_empty());
        assert!(out.hashtags.is_empty());
        assert_eq!(out.raw, raw);
    }
}
