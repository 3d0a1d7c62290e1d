//! Prompt builders.
//!
//! Prompts follow the RATOS-D layout (role, audience, task, objective,
//! signals, do/don't) and always demand JSON-only output so the extraction
//! chain in [`crate::extract`] has something to bite on.

use serde_json::json;

/// Default model for text generation.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash-lite";
/// Default model for background generation.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-001";
/// Default model for text-to-video.
pub const DEFAULT_VIDEO_TEXT_MODEL: &str = "veo-3.0-fast-generate-001";
/// Default model for image-to-video.
pub const DEFAULT_VIDEO_IMAGE_MODEL: &str = "veo-2.0-generate-001";

/// Default studio-style background brief for generated creatives.
pub const DEFAULT_BACKGROUND_PROMPT: &str = "Clean photographic studio background with \
soft light and subtle texture, negative space on the left for text.";

/// Product description request. The model must return a single JSON object
/// with `short`, `long`, `bullets` and `hashtags`.
#[must_use]
pub fn product_description(name: &str, attributes: &str, channel: &str) -> String {
    format!(
        "[ROLE] Senior e-commerce copywriter.\n\
         [AUDIENCE] Online shoppers on {channel}.\n\
         [TASK] Write product copy for the product below.\n\
         [DATA]\nProduct: {name}\nAttributes: {attributes}\nChannel: {channel}\n\
         [RULES]\n\
         - Clear, persuasive language; no invented features.\n\
         - Bullets of 8 to 18 words, no trailing period.\n\
         - Hashtags start with '#', lowercase, no spaces.\n\
         [OUTPUT FORMAT - JSON ONLY]\n\
         {{\"short\":\"\",\"long\":\"\",\"bullets\":[],\"hashtags\":[]}}"
    )
}

/// Review summary request. Asks for bullets, a priority recommendation, a
/// sentiment ratio, an action plan and a public reply, as one JSON object.
#[must_use]
pub fn review_summary(reviews: &[String], sample_size: usize) -> String {
    let reviews_json = json!(reviews).to_string();
    format!(
        "[ROLE] Senior customer-experience analyst.\n\
         [AUDIENCE] Product, marketing and support teams.\n\
         [TASK]\n\
         1) Summarize the reviews in 3-5 bullets.\n\
         2) Give one priority recommendation (short paragraph).\n\
         3) Propose a 3-5 step action plan (each step: action; owner; deadline).\n\
         4) Draft a public customer reply (3-6 sentences, empathetic and \
         professional, no admission of legal fault).\n\
         [DATA] REVIEWS_JSON: {reviews_json}\n\
         [RULES]\n\
         - Concise and concrete; only patterns that repeat in the data.\n\
         - In the public reply: thank the customer, acknowledge the \
         experience, offer a contact channel, request order details if relevant.\n\
         [OUTPUT FORMAT - JSON ONLY]\n\
         {{\n\
         \"bullets\": [\"3 to 5 bullets; 8-18 words; no trailing period\"],\n\
         \"recommendation\": \"one paragraph with the priority action\",\n\
         \"sentiment_ratio\": {{\"positive\":0.0,\"neutral\":0.0,\"negative\":0.0}},\n\
         \"action_plan\": [\"Step; Owner; Deadline (e.g. 2 weeks)\"],\n\
         \"customer_reply\": \"short public reply (3-6 sentences)\",\n\
         \"sample_size\": {sample_size}\n\
         }}\n\
         [CHECKLIST] Valid JSON? 3-5 bullets? 3-5 plan steps? Reply 3-6 \
         sentences? No extra text?"
    )
}

/// Per-review sentiment classification. The model must return a JSON array
/// of `{review, sentiment, rationale}` rows.
#[must_use]
pub fn sentiment_scoring(reviews: &[String]) -> String {
    let reviews_json = json!(reviews).to_string();
    format!(
        "[ROLE] Sentiment analyst.\n\
         [TASK] Classify each review as 'positive', 'negative' or 'neutral' \
         and briefly explain why.\n\
         [RULES]\n\
         - One or two sentences of rationale; no invented facts.\n\
         [OUTPUT FORMAT - JSON ONLY]\n\
         Return ONLY a JSON array:\n\
         [{{\"review\":\"original text (clipped to 160 chars)\",\
         \"sentiment\":\"positive|neutral|negative\",\"rationale\":\"short reason\"}}]\n\
         [CHECKLIST] Valid JSON? Labels only positive/neutral/negative? No \
         extra text?\n\
         REVIEWS_JSON:\n{reviews_json}"
    )
}

/// Public reply to a single customer comment. Returns `{"reply": "..."}`.
#[must_use]
pub fn customer_reply(comment: &str, brand: Option<&str>) -> String {
    let brand = brand.filter(|value| !value.trim().is_empty()).unwrap_or("n/a");
    format!(
        "[ROLE] Senior customer-support agent.\n\
         [TASK] Write a short public reply (3-6 sentences) to the customer \
         comment below.\n\
         [DATA] COMMENT: {comment}\n\
         [RULES]\n\
         - Empathetic, professional tone.\n\
         - Thank the customer, acknowledge the experience, offer help.\n\
         - For problems, offer a direct channel and request order details.\n\
         - No admission of legal fault; no promises beyond existing policy.\n\
         - 3-6 sentences; no emojis; no all-caps.\n\
         [BRAND] {brand}\n\
         [OUTPUT FORMAT - JSON ONLY]\n\
         {{\"reply\": \"public reply text (3-6 sentences)\"}}"
    )
}

/// Condensed RATOS-D brief for promotional video generation.
#[must_use]
pub fn promo_video(base_prompt: &str, brand: &str, product: &str, style: &str) -> String {
    let mut blocks = vec![
        "[ROLE] Creative director for commercial video.".to_string(),
        "[AUDIENCE] General social-media audience.".to_string(),
        "[TASK] Produce a short spot showing the product with smooth motion \
         and a focus on benefits."
            .to_string(),
    ];
    if !product.is_empty() || !brand.is_empty() {
        let product = if product.is_empty() { "the product" } else { product };
        let brand = if brand.is_empty() { "the brand" } else { brand };
        blocks.push(format!(
            "[OBJECTIVE] Highlight {product} by {brand} with pleasing framing."
        ));
    }
    if !style.is_empty() {
        blocks.push(format!("[STYLE] {style}."));
    }
    if !base_prompt.is_empty() {
        blocks.push(format!("[VISUAL GUIDE] {base_prompt}"));
    }
    blocks.push(
        "[DO] Gentle camera motion, clean lighting, focus on the packshot, \
         natural pacing."
            .to_string(),
    );
    blocks.push(
        "[DON'T] No on-screen text, no invented logos, no human faces.".to_string(),
    );
    blocks.join("\n")
}

/// Background brief for Imagen, with a brand color hint appended.
#[must_use]
pub fn background(base_prompt: &str, brand_hex: &str) -> String {
    let base = base_prompt.trim();
    let base = if base.is_empty() {
        DEFAULT_BACKGROUND_PROMPT
    } else {
        base
    };
    let hex = brand_hex.trim_start_matches('#');
    format!("{base} Palette matching the color #{hex}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_embeds_product_and_schema() {
        let prompt = product_description("Zapatilla urbana", "cuero, talla 40", "Instagram");
        assert!(prompt.contains("Zapatilla urbana"));
        assert!(prompt.contains("\"bullets\":[]"));
        assert!(prompt.contains("Instagram"));
    }

    #[test]
    fn summary_serializes_reviews_as_json() {
        let reviews = vec!["great \"value\"".to_string()];
        let prompt = review_summary(&reviews, 1);
        assert!(prompt.contains(r#"great \"value\""#));
        assert!(prompt.contains("\"sample_size\": 1"));
    }

    #[test]
    fn video_prompt_skips_empty_blocks() {
        let prompt = promo_video("", "", "", "");
        assert!(!prompt.contains("[OBJECTIVE]"));
        assert!(!prompt.contains("[STYLE]"));
        assert!(prompt.contains("[DON'T]"));
    }

    #[test]
    fn background_appends_color_hint() {
        let prompt = background("", "#E91E63");
        assert!(prompt.starts_with(DEFAULT_BACKGROUND_PROMPT));
        assert!(prompt.ends_with("#E91E63."));
    }
}
