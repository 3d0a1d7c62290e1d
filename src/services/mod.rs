//! Business operations layered on top of the API client: product copy,
//! feedback analysis, composited creatives, and promo videos.

pub mod creatives;
pub mod descriptions;
pub mod feedback;
pub mod videos;
