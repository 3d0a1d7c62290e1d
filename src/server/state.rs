//! Shared server state.

use crate::client::{Client, ResolvedMode};
use crate::prompt;

/// Server settings taken from the CLI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Resolved client plus the model names every handler needs.
pub struct AppState {
    pub client: Client,
    pub mode: ResolvedMode,
    pub text_model: String,
    pub image_model: String,
}

impl AppState {
    #[must_use]
    pub fn new(client: Client, mode: ResolvedMode) -> Self {
        Self {
            client,
            mode,
            text_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| prompt::DEFAULT_TEXT_MODEL.to_string()),
            image_model: std::env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| prompt::DEFAULT_IMAGE_MODEL.to_string()),
        }
    }
}
