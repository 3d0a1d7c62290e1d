//! Marketing-content generation toolkit: a Gemini / Vertex AI client for
//! text, image and video generation, plus a deterministic compositor that
//! turns generated backgrounds and uploaded packshots into finished
//! promotional creatives.

pub mod client;
pub mod compose;
pub mod error;
pub mod extract;
pub mod models;
pub mod operations;
pub mod prompt;
pub mod server;
pub mod services;
pub mod types;

pub use client::{Backend, Client, ClientBuilder, Credentials, ResolvedMode};
pub use error::{Error, Result};
