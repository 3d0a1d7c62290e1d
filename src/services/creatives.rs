//! Creative generation: Imagen background plus the local compositor.

use image::ImageFormat;
use serde::Deserialize;

use crate::client::Client;
use crate::compose::{self, CreativeParams};
use crate::error::{Error, Result};
use crate::prompt;
use crate::types::models::GenerateImagesConfig;

const MAX_CREATIVES: u32 = 4;

/// Inputs for one batch of creatives. The packshot arrives out of band
/// (multipart upload or file), everything else is plain data.
#[derive(Debug, Clone, Deserialize)]
pub struct CreativeRequest {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub subheadline: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub background_prompt: String,
    #[serde(default = "default_brand_hex")]
    pub brand_hex: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

const fn default_count() -> u32 {
    1
}
fn default_brand_hex() -> String {
    "#E30613".to_string()
}

impl CreativeRequest {
    /// Fold the request into compositor parameters, keeping defaults for
    /// everything the caller left out.
    #[must_use]
    pub fn creative_params(&self, mut params: CreativeParams) -> CreativeParams {
        params.headline = self.headline.clone();
        params.subheadline = self.subheadline.clone();
        params.cta = self.cta.clone();
        params.cta_hex = self.brand_hex.clone();
        if let Some(width) = self.width {
            params.width = width;
        }
        if let Some(height) = self.height {
            params.height = height;
        }
        params
    }
}

/// Generate `count` creatives, one background call per creative.
///
/// # Errors
/// Fails when background generation fails, returns no image bytes, or the
/// packshot cannot be decoded.
pub async fn generate_creatives(
    client: &Client,
    image_model: &str,
    request: &CreativeRequest,
    packshot: &[u8],
    params: &CreativeParams,
) -> Result<Vec<Vec<u8>>> {
    let background_prompt = prompt::background(&request.background_prompt, &request.brand_hex);
    let count = request.count.clamp(1, MAX_CREATIVES);

    let mut outputs = Vec::with_capacity(count as usize);
    for index in 0..count {
        tracing::debug!(index, model = image_model, "requesting background");
        let response = client
            .models()
            .generate_images(
                image_model,
                &background_prompt,
                GenerateImagesConfig {
                    number_of_images: Some(1),
                    safety_filter_level: Some("block_few".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        let bytes = response
            .generated_images
            .first()
            .and_then(|generated| generated.image.as_ref())
            .and_then(|image| image.image_bytes.as_deref())
            .ok_or_else(|| Error::Parse {
                message: "Image generation returned no inline bytes".into(),
            })?;
        let background = image::load_from_memory(bytes)?;

        let creative = compose::compose(&background, packshot, params)?;
        outputs.push(encode_png(&creative)?);
    }
    Ok(outputs)
}

fn encode_png(image: &image::RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
