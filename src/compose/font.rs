//! Text rasterization for the compositor.
//!
//! Prefers a TTF face rendered with ab_glyph for anti-aliased output. When
//! no TTF can be found on the host, falls back to the embedded Spleen 12x24
//! bitmap font scaled to the requested pixel height.

use ab_glyph::{Font, FontArc, ScaleFont};
use image::{Rgba, RgbaImage};
use spleen_font::{PSF2Font, FONT_12X24};

const BITMAP_CELL_W: f32 = 12.0;
const BITMAP_CELL_H: f32 = 24.0;

/// A loaded type face, either outline or bitmap.
pub enum Face {
    Ttf { regular: FontArc, bold: FontArc },
    Bitmap,
}

impl Face {
    /// Load a face. `CREATIVA_FONT` / `CREATIVA_FONT_BOLD` override the
    /// search; otherwise the DejaVu system fonts are tried, and the bitmap
    /// fallback covers hosts with neither.
    #[must_use]
    pub fn load() -> Self {
        let regular = std::env::var("CREATIVA_FONT")
            .ok()
            .or_else(|| find_system_font(false));
        let bold = std::env::var("CREATIVA_FONT_BOLD")
            .ok()
            .or_else(|| find_system_font(true));

        if let (Some(regular), Some(bold)) = (regular, bold) {
            let regular = std::fs::read(regular)
                .ok()
                .and_then(|bytes| FontArc::try_from_vec(bytes).ok());
            let bold = std::fs::read(bold)
                .ok()
                .and_then(|bytes| FontArc::try_from_vec(bytes).ok());
            if let (Some(regular), Some(bold)) = (regular, bold) {
                return Self::Ttf { regular, bold };
            }
        }
        Self::Bitmap
    }

    /// Rendered width of `text` at `px` height, in pixels.
    #[must_use]
    pub fn text_width(&self, text: &str, px: f32, bold: bool) -> f32 {
        match self {
            Self::Ttf { regular, bold: bold_face } => {
                let font = if bold { bold_face } else { regular };
                let scaled = font.as_scaled(px);
                text.chars()
                    .map(|ch| scaled.h_advance(font.glyph_id(ch)))
                    .sum()
            }
            Self::Bitmap => {
                let scale = px / BITMAP_CELL_H;
                text.chars().count() as f32 * BITMAP_CELL_W * scale
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: f32,
        y: f32,
        text: &str,
        px: f32,
        bold: bool,
        color: (u8, u8, u8),
    ) {
        match self {
            Self::Ttf { regular, bold: bold_face } => {
                let font = if bold { bold_face } else { regular };
                draw_ttf(canvas, font, x, y, text, px, color);
            }
            Self::Bitmap => draw_bitmap(canvas, x, y, text, px, color),
        }
    }
}

fn find_system_font(bold: bool) -> Option<String> {
    let candidates = if bold {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        ]
    } else {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ]
    };
    candidates
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .map(ToString::to_string)
}

fn draw_ttf(
    canvas: &mut RgbaImage,
    font: &FontArc,
    x: f32,
    y: f32,
    text: &str,
    px: f32,
    color: (u8, u8, u8),
) {
    let scaled = font.as_scaled(px);
    let baseline = y + scaled.ascent();
    let mut caret = x;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(px, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px_x = gx as i32 + bounds.min.x as i32;
                let px_y = gy as i32 + bounds.min.y as i32;
                blend_coverage(canvas, px_x, px_y, coverage, color);
            });
        }
    }
}

fn draw_bitmap(canvas: &mut RgbaImage, x: f32, y: f32, text: &str, px: f32, color: (u8, u8, u8)) {
    let scale = px / BITMAP_CELL_H;
    let cell_w = (BITMAP_CELL_W * scale).round().max(1.0) as u32;
    let cell_h = (BITMAP_CELL_H * scale).round().max(1.0) as u32;
    let mut face = match PSF2Font::new(FONT_12X24) {
        Ok(face) => face,
        Err(_) => return,
    };

    let mut caret = x.round() as i64;
    let top = y.round() as i64;
    for ch in text.chars() {
        let utf8 = ch.to_string();
        if let Some(glyph) = face.glyph_for_utf8(utf8.as_bytes()) {
            let mut cell = vec![false; 12 * 24];
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < 24 && col_x < 12 {
                        cell[row_y * 12 + col_x] = on;
                    }
                }
            }
            // Nearest-neighbor scale of the 12x24 cell to the target size.
            for dy in 0..cell_h {
                for dx in 0..cell_w {
                    let sx = (dx as usize * 12) / cell_w as usize;
                    let sy = (dy as usize * 24) / cell_h as usize;
                    if cell[sy * 12 + sx] {
                        blend_coverage(
                            canvas,
                            (caret + i64::from(dx)) as i32,
                            (top + i64::from(dy)) as i32,
                            1.0,
                            color,
                        );
                    }
                }
            }
        }
        caret += i64::from(cell_w);
    }
}

fn blend_coverage(canvas: &mut RgbaImage, x: i32, y: i32, coverage: f32, color: (u8, u8, u8)) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let blend = |dst: u8, src: u8| -> u8 {
        (f32::from(dst) * (1.0 - coverage) + f32::from(src) * coverage).round() as u8
    };
    *pixel = Rgba([
        blend(pixel[0], color.0),
        blend(pixel[1], color.1),
        blend(pixel[2], color.2),
        pixel[3].max((coverage * 255.0).round() as u8),
    ]);
}
