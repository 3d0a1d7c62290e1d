//! Wire types shared by the API surfaces.

pub(crate) mod base64_serde;
pub mod content;
pub mod models;
pub mod operations;
pub mod response;
