//! Promotional creative compositor.
//!
//! Deterministically layers a generated background, an optional corner
//! plate and ray burst, a drop-shadowed packshot, and the text block with
//! its CTA pill into one flattened raster. All geometry inputs are clamped
//! rather than rejected; the only fatal input is an undecodable packshot.

pub mod color;
pub mod font;
pub mod text;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};

use crate::error::Result;
use color::parse_hex;
use font::Face;

/// Instagram feed preset.
pub const CANVAS_IG_FEED: (u32, u32) = (1080, 1350);
/// Display-ads preset.
pub const CANVAS_ADS: (u32, u32) = (1200, 628);

/// Rays and the plate radiate from the bottom-right corner; 225 degrees
/// points up and to the left in image coordinates.
const RAY_BASE_HEADING_DEG: f32 = 225.0;

const HALO_PAD: u32 = 30;
const HALO_OFFSET: u32 = 15;
const HALO_ALPHA: u8 = 120;
const HALO_BLUR_SIGMA: f32 = 10.0;

/// Quarter-disk plate anchored at the bottom-right corner.
#[derive(Debug, Clone)]
pub struct PlateParams {
    pub enabled: bool,
    /// Fraction of the shorter canvas side, clamped to [0.2, 0.95].
    pub radius_pct: f32,
    pub color_hex: String,
    pub opacity: u8,
}

impl Default for PlateParams {
    fn default() -> Self {
        Self {
            enabled: true,
            radius_pct: 0.55,
            color_hex: "#FFFFFF".into(),
            opacity: 180,
        }
    }
}

impl PlateParams {
    #[must_use]
    pub fn radius_fraction(&self) -> f32 {
        self.radius_pct.clamp(0.2, 0.95)
    }
}

/// Fan of straight rays from the bottom-right corner.
#[derive(Debug, Clone)]
pub struct RayParams {
    pub enabled: bool,
    /// Clamped to at most 40.
    pub count: u32,
    /// Fraction of the shorter canvas side, clamped to [0.05, 1.5].
    pub length_pct: f32,
    pub thickness_px: u32,
    pub color_hex: String,
    pub opacity: u8,
    /// Total fan aperture in degrees, clamped to [0, 180].
    pub spread_deg: f32,
}

impl Default for RayParams {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 12,
            length_pct: 0.6,
            thickness_px: 6,
            color_hex: "#FFD700".into(),
            opacity: 180,
            spread_deg: 80.0,
        }
    }
}

impl RayParams {
    #[must_use]
    pub fn effective_count(&self) -> u32 {
        self.count.min(40)
    }

    #[must_use]
    pub fn length_fraction(&self) -> f32 {
        self.length_pct.clamp(0.05, 1.5)
    }

    #[must_use]
    pub fn spread(&self) -> f32 {
        self.spread_deg.clamp(0.0, 180.0)
    }
}

/// Packshot sizing and corner margins.
#[derive(Debug, Clone)]
pub struct PackshotParams {
    /// Clamped to [0.2, 2.0].
    pub scale_pct: f32,
    /// Fractions of the shorter canvas side, clamped to [0.0, 0.5].
    pub margin_right_pct: f32,
    pub margin_bottom_pct: f32,
}

impl Default for PackshotParams {
    fn default() -> Self {
        Self {
            scale_pct: 0.9,
            margin_right_pct: 0.06,
            margin_bottom_pct: 0.06,
        }
    }
}

impl PackshotParams {
    #[must_use]
    pub fn scale_fraction(&self) -> f32 {
        self.scale_pct.clamp(0.2, 2.0)
    }

    #[must_use]
    pub fn margin_right(&self) -> f32 {
        self.margin_right_pct.clamp(0.0, 0.5)
    }

    #[must_use]
    pub fn margin_bottom(&self) -> f32 {
        self.margin_bottom_pct.clamp(0.0, 0.5)
    }
}

/// Blurred ground-shadow ellipse under the packshot.
#[derive(Debug, Clone)]
pub struct ShadowParams {
    /// Width as a fraction of the packshot block, clamped to [0.3, 2.0].
    pub scale_x: f32,
    /// Height as a fraction of the packshot block, clamped to [0.02, 0.5].
    pub scale_y: f32,
    pub offset_y_px: u32,
    pub opacity: u8,
    pub blur_px: u32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            scale_x: 0.9,
            scale_y: 0.08,
            offset_y_px: 6,
            opacity: 160,
            blur_px: 12,
        }
    }
}

impl ShadowParams {
    #[must_use]
    pub fn width_fraction(&self) -> f32 {
        self.scale_x.clamp(0.3, 2.0)
    }

    #[must_use]
    pub fn height_fraction(&self) -> f32 {
        self.scale_y.clamp(0.02, 0.5)
    }
}

/// Everything one creative needs besides the two input images.
#[derive(Debug, Clone)]
pub struct CreativeParams {
    pub width: u32,
    pub height: u32,
    pub headline: String,
    pub subheadline: String,
    pub cta: String,
    pub headline_hex: String,
    pub subheadline_hex: String,
    pub cta_hex: String,
    pub plate: PlateParams,
    pub rays: RayParams,
    pub packshot: PackshotParams,
    pub shadow: ShadowParams,
}

impl Default for CreativeParams {
    fn default() -> Self {
        Self {
            width: CANVAS_IG_FEED.0,
            height: CANVAS_IG_FEED.1,
            headline: String::new(),
            subheadline: String::new(),
            cta: String::new(),
            headline_hex: "#141414".into(),
            subheadline_hex: "#3C3C3C".into(),
            cta_hex: "#E30613".into(),
            plate: PlateParams::default(),
            rays: RayParams::default(),
            packshot: PackshotParams::default(),
            shadow: ShadowParams::default(),
        }
    }
}

/// Compose one creative. The packshot must decode; everything else is
/// sanitized internally.
///
/// # Errors
/// Returns an error only when the packshot bytes cannot be decoded.
pub fn compose(
    background: &DynamicImage,
    packshot_bytes: &[u8],
    params: &CreativeParams,
) -> Result<RgbImage> {
    let width = params.width.max(1);
    let height = params.height.max(1);
    let min_side = width.min(height) as f32;

    // Decode first so a bad packshot fails before any drawing happens.
    let product = image::load_from_memory(packshot_bytes)?.to_rgba8();

    let mut canvas = imageops::resize(&background.to_rgba8(), width, height, FilterType::Lanczos3);

    let plate_radius = (min_side * params.plate.radius_fraction()).round();
    if params.plate.enabled && params.plate.opacity > 0 {
        paint_plate(
            &mut canvas,
            plate_radius,
            parse_hex(&params.plate.color_hex),
            params.plate.opacity,
        );
    }

    if params.rays.enabled && params.rays.effective_count() > 0 {
        paint_rays(&mut canvas, min_side, &params.rays);
    }

    let box_side = (plate_radius * 0.9 * params.packshot.scale_fraction()).max(1.0);
    let (fit_w, fit_h) = fit_dimensions(product.width(), product.height(), box_side);
    let fitted = imageops::resize(&product, fit_w, fit_h, FilterType::Lanczos3);
    let block = halo_block(&fitted);

    let layout = packshot_layout(
        width,
        height,
        min_side,
        block.width(),
        block.height(),
        &params.packshot,
    );
    paint_ground_shadow(&mut canvas, &layout, &params.shadow);
    imageops::overlay(&mut canvas, &block, layout.x, layout.y);

    let face = Face::load();
    draw_copy(&mut canvas, &face, params);

    Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

/// Longest side fits the square box, aspect ratio preserved.
pub(crate) fn fit_dimensions(width: u32, height: u32, box_side: f32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f32;
    let scale = box_side / longest;
    let fit_w = (width as f32 * scale).round().max(1.0) as u32;
    let fit_h = (height as f32 * scale).round().max(1.0) as u32;
    (fit_w, fit_h)
}

/// Packshot block placement, anchored bottom-right.
pub(crate) struct PackshotLayout {
    pub x: i64,
    pub y: i64,
    pub block_w: u32,
    pub block_h: u32,
}

pub(crate) fn packshot_layout(
    width: u32,
    height: u32,
    min_side: f32,
    block_w: u32,
    block_h: u32,
    params: &PackshotParams,
) -> PackshotLayout {
    let margin_right = (min_side * params.margin_right()).round() as i64;
    let margin_bottom = (min_side * params.margin_bottom()).round() as i64;
    PackshotLayout {
        x: i64::from(width) - margin_right - i64::from(block_w),
        y: i64::from(height) - margin_bottom - i64::from(block_h),
        block_w,
        block_h,
    }
}

/// Soft halo behind the fitted packshot: a translucent rectangle offset
/// into a padded block, blurred, with the product composited on top.
fn halo_block(fitted: &RgbaImage) -> RgbaImage {
    let block_w = fitted.width() + HALO_PAD;
    let block_h = fitted.height() + HALO_PAD;
    let mut shadow = RgbaImage::new(block_w, block_h);
    for y in 0..fitted.height() {
        for x in 0..fitted.width() {
            shadow.put_pixel(x + HALO_OFFSET, y + HALO_OFFSET, Rgba([0, 0, 0, HALO_ALPHA]));
        }
    }
    let mut block = imageops::blur(&shadow, HALO_BLUR_SIGMA);
    imageops::overlay(&mut block, fitted, 0, 0);
    block
}

fn paint_plate(canvas: &mut RgbaImage, radius: f32, rgb: (u8, u8, u8), opacity: u8) {
    let width = canvas.width();
    let height = canvas.height();
    let radius_sq = radius * radius;
    let alpha = f32::from(opacity) / 255.0;
    for y in 0..height {
        let dy = height as f32 - y as f32;
        for x in 0..width {
            let dx = width as f32 - x as f32;
            if dx * dx + dy * dy <= radius_sq {
                let pixel = canvas.get_pixel_mut(x, y);
                pixel[0] = blend_channel(pixel[0], rgb.0, alpha);
                pixel[1] = blend_channel(pixel[1], rgb.1, alpha);
                pixel[2] = blend_channel(pixel[2], rgb.2, alpha);
            }
        }
    }
}

fn blend_channel(dst: u8, src: u8, alpha: f32) -> u8 {
    (f32::from(dst) * (1.0 - alpha) + f32::from(src) * alpha).round() as u8
}

/// Fan headings in degrees: the single-ray case is exactly the base
/// heading, otherwise angles spread linearly across the aperture.
pub(crate) fn ray_angles(count: u32, spread_deg: f32) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![RAY_BASE_HEADING_DEG];
    }
    let start = RAY_BASE_HEADING_DEG - spread_deg / 2.0;
    let step = spread_deg / (count - 1) as f32;
    (0..count).map(|i| start + step * i as f32).collect()
}

fn paint_rays(canvas: &mut RgbaImage, min_side: f32, params: &RayParams) {
    let width = canvas.width();
    let height = canvas.height();
    let mut overlay = RgbaImage::new(width, height);
    let rgb = parse_hex(&params.color_hex);
    let color = Rgba([rgb.0, rgb.1, rgb.2, params.opacity]);
    let origin = (width as f32, height as f32);
    let length = min_side * params.length_fraction();
    let half = params.thickness_px.max(1) as f32 / 2.0;

    for angle in ray_angles(params.effective_count(), params.spread()) {
        let radians = angle.to_radians();
        let tip = (
            origin.0 + length * radians.cos(),
            origin.1 + length * radians.sin(),
        );
        draw_segment(&mut overlay, origin, tip, half, color);
    }
    imageops::overlay(canvas, &overlay, 0, 0);
}

/// Thick line as the set of pixels within `half` of the segment.
fn draw_segment(
    overlay: &mut RgbaImage,
    from: (f32, f32),
    to: (f32, f32),
    half: f32,
    color: Rgba<u8>,
) {
    let min_x = (from.0.min(to.0) - half - 1.0).floor().max(0.0) as u32;
    let max_x = ((from.0.max(to.0) + half + 1.0).ceil() as u32).min(overlay.width());
    let min_y = (from.1.min(to.1) - half - 1.0).floor().max(0.0) as u32;
    let max_y = ((from.1.max(to.1) + half + 1.0).ceil() as u32).min(overlay.height());

    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let length_sq = (dx * dx + dy * dy).max(f32::EPSILON);
    let half_sq = half * half;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let t = (((px - from.0) * dx + (py - from.1) * dy) / length_sq).clamp(0.0, 1.0);
            let cx = from.0 + t * dx;
            let cy = from.1 + t * dy;
            let dist_sq = (px - cx) * (px - cx) + (py - cy) * (py - cy);
            if dist_sq <= half_sq {
                overlay.put_pixel(x, y, color);
            }
        }
    }
}

fn paint_ground_shadow(canvas: &mut RgbaImage, layout: &PackshotLayout, params: &ShadowParams) {
    if params.opacity == 0 {
        return;
    }
    let shadow_w = (layout.block_w as f32 * params.width_fraction()).max(2.0);
    let shadow_h = (layout.block_h as f32 * params.height_fraction()).max(2.0);
    let pad = (params.blur_px * 3).max(2);

    let local_w = shadow_w.ceil() as u32 + 2 * pad;
    let local_h = shadow_h.ceil() as u32 + 2 * pad;
    let mut local = RgbaImage::new(local_w, local_h);

    let a = shadow_w / 2.0;
    let b = shadow_h / 2.0;
    let cx = local_w as f32 / 2.0;
    let cy = local_h as f32 / 2.0;
    for y in 0..local_h {
        for x in 0..local_w {
            let nx = (x as f32 + 0.5 - cx) / a;
            let ny = (y as f32 + 0.5 - cy) / b;
            if nx * nx + ny * ny <= 1.0 {
                local.put_pixel(x, y, Rgba([0, 0, 0, params.opacity]));
            }
        }
    }
    if params.blur_px > 0 {
        local = imageops::blur(&local, params.blur_px as f32);
    }

    // Centered under the block's horizontal midpoint, below its bottom edge.
    let center_x = layout.x + i64::from(layout.block_w) / 2;
    let center_y = layout.y + i64::from(layout.block_h) + i64::from(params.offset_y_px);
    imageops::overlay(
        canvas,
        &local,
        center_x - i64::from(local_w) / 2,
        center_y - i64::from(local_h) / 2,
    );
}

/// Headline, subheadline and the CTA pill in the left text column.
fn draw_copy(canvas: &mut RgbaImage, face: &Face, params: &CreativeParams) {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;

    let column_x = width * 0.07;
    let column_w = width * 0.42;
    let headline_px = height * 0.06;
    let small_px = height * 0.035;

    let mut cursor = height * 0.18;
    cursor = text::draw_wrapped(
        canvas,
        face,
        &params.headline,
        column_x,
        cursor,
        headline_px,
        true,
        column_w,
        parse_hex(&params.headline_hex),
    );
    cursor += height * 0.02;
    cursor = text::draw_wrapped(
        canvas,
        face,
        &params.subheadline,
        column_x,
        cursor,
        small_px,
        false,
        column_w,
        parse_hex(&params.subheadline_hex),
    );
    cursor += height * 0.04;

    let pill_w = column_w * 0.75;
    let pill_h = height * 0.08;
    text::draw_cta_pill(
        canvas,
        face,
        &params.cta,
        column_x,
        cursor,
        pill_w,
        pill_h,
        Rgba([255, 255, 255, 230]),
        small_px,
        parse_hex(&params.cta_hex),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_background(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 210, 220, 255])))
    }

    fn packshot_png() -> Vec<u8> {
        let image = RgbaImage::from_pixel(40, 60, Rgba([10, 120, 240, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[test]
    fn output_matches_requested_canvas() {
        let params = CreativeParams {
            width: 160,
            height: 120,
            headline: "Hola".into(),
            ..Default::default()
        };
        let result = compose(&flat_background(80, 80), &packshot_png(), &params).unwrap();
        assert_eq!(result.dimensions(), (160, 120));
    }

    #[test]
    fn undecodable_packshot_is_fatal() {
        let params = CreativeParams::default();
        let result = compose(&flat_background(64, 64), b"not an image", &params);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_colors_still_compose() {
        let params = CreativeParams {
            width: 120,
            height: 120,
            headline_hex: "#ZZ".into(),
            cta_hex: "oops".into(),
            plate: PlateParams {
                color_hex: "bad".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = compose(&flat_background(64, 64), &packshot_png(), &params).unwrap();
        assert_eq!(result.dimensions(), (120, 120));
    }

    #[test]
    fn clamps_are_idempotent_on_in_range_values() {
        let plate = PlateParams {
            radius_pct: 0.55,
            ..Default::default()
        };
        assert_eq!(plate.radius_fraction(), 0.55);
        let plate = PlateParams {
            radius_pct: 7.0,
            ..Default::default()
        };
        assert_eq!(plate.radius_fraction(), 0.95);
        let plate = PlateParams {
            radius_pct: 0.01,
            ..Default::default()
        };
        assert_eq!(plate.radius_fraction(), 0.2);
    }

    #[test]
    fn packshot_clamps() {
        let packshot = PackshotParams {
            scale_pct: 9.0,
            margin_right_pct: -1.0,
            margin_bottom_pct: 0.9,
        };
        assert_eq!(packshot.scale_fraction(), 2.0);
        assert_eq!(packshot.margin_right(), 0.0);
        assert_eq!(packshot.margin_bottom(), 0.5);
    }

    #[test]
    fn plate_only_touches_pixels_inside_radius() {
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        paint_plate(&mut canvas, 40.0, (255, 255, 255), 255);
        // Far corner untouched.
        assert_eq!(canvas.get_pixel(0, 0)[0], 0);
        // Pixel just inside the disk near (100, 100) is painted.
        assert_eq!(canvas.get_pixel(99, 99)[0], 255);
        // Boundary along the bottom row: dx = 100 - x, dy = 1.
        assert_eq!(canvas.get_pixel(61, 99)[0], 255); // dist^2 = 39^2 + 1 <= 40^2
        assert_eq!(canvas.get_pixel(55, 99)[0], 0); // dist^2 = 45^2 + 1 > 40^2
    }

    #[test]
    fn ray_fan_is_symmetric_around_base_heading() {
        let angles = ray_angles(5, 80.0);
        assert_eq!(angles.len(), 5);
        assert!((angles[0] - 185.0).abs() < 1e-4);
        assert!((angles[4] - 265.0).abs() < 1e-4);
        assert!((angles[2] - 225.0).abs() < 1e-4);

        let single = ray_angles(1, 80.0);
        assert_eq!(single, vec![225.0]);

        assert!(ray_angles(0, 80.0).is_empty());
    }

    #[test]
    fn fitted_box_respects_target_side() {
        let (w, h) = fit_dimensions(400, 600, 300.0);
        assert_eq!(h, 300);
        assert_eq!(w, 200);
        let (w, h) = fit_dimensions(600, 400, 300.0);
        assert_eq!(w, 300);
        assert_eq!(h, 200);
    }

    #[test]
    fn packshot_anchors_to_bottom_right_margins() {
        // 1080x1350 canvas with default 6% margins of the 1080 short side.
        let params = PackshotParams::default();
        let layout = packshot_layout(1080, 1350, 1080.0, 200, 150, &params);
        let margin = (1080.0f32 * 0.06).round() as i64;
        assert_eq!(layout.x + i64::from(layout.block_w), 1080 - margin);
        assert_eq!(layout.y + i64::from(layout.block_h), 1350 - margin);
    }

    #[test]
    fn oversized_packshot_still_fits_the_plate_box() {
        let plate = PlateParams::default();
        let radius = (1080.0f32 * plate.radius_fraction()).round();
        let box_side = radius * 0.9 * 0.9;
        let (w, h) = fit_dimensions(5000, 5000, box_side);
        assert!(w as f32 <= box_side + 1.0);
        assert!(h as f32 <= box_side + 1.0);
    }
}
