//! Word-wrapped text block and the CTA pill.

use image::{Rgba, RgbaImage};

use super::font::Face;

/// Vertical padding added to the font size to get the line height.
const LINE_GAP: f32 = 6.0;

/// Greedy word wrap: accumulate words while the rendered width fits, commit
/// the line when the next word would overflow.
#[must_use]
pub fn wrap_lines(face: &Face, text: &str, px: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if face.text_width(&candidate, px, bold) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Draw a wrapped block starting at `(x, y)`. Returns the y coordinate just
/// below the last line.
pub fn draw_wrapped(
    canvas: &mut RgbaImage,
    face: &Face,
    text: &str,
    x: f32,
    y: f32,
    px: f32,
    bold: bool,
    max_width: f32,
    color: (u8, u8, u8),
) -> f32 {
    let line_height = px + LINE_GAP;
    let mut cursor = y;
    for line in wrap_lines(face, text, px, bold, max_width) {
        face.draw(canvas, x, cursor, &line, px, bold, color);
        cursor += line_height;
    }
    cursor
}

/// Fully rounded pill with a centered label.
#[allow(clippy::too_many_arguments)]
pub fn draw_cta_pill(
    canvas: &mut RgbaImage,
    face: &Face,
    label: &str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fill: Rgba<u8>,
    label_px: f32,
    label_color: (u8, u8, u8),
) {
    fill_pill(canvas, x, y, width, height, fill);
    let text_width = face.text_width(label, label_px, false);
    let text_x = x + (width - text_width) / 2.0;
    let text_y = y + height / 2.0 - label_px / 2.0;
    face.draw(canvas, text_x, text_y, label, label_px, false, label_color);
}

/// Rounded rectangle with corner radius = height / 2: a straight core plus
/// two semicircular caps.
fn fill_pill(canvas: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, fill: Rgba<u8>) {
    let radius = height / 2.0;
    let left_cap = x + radius;
    let right_cap = x + width - radius;
    let center_y = y + height / 2.0;

    let x0 = x.floor().max(0.0) as u32;
    let y0 = y.floor().max(0.0) as u32;
    let x1 = ((x + width).ceil() as u32).min(canvas.width());
    let y1 = ((y + height).ceil() as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let fx = px as f32 + 0.5;
            let fy = py as f32 + 0.5;
            let inside = if fx >= left_cap && fx <= right_cap {
                fy >= y && fy <= y + height
            } else {
                let cx = if fx < left_cap { left_cap } else { right_cap };
                let dx = fx - cx;
                let dy = fy - center_y;
                dx * dx + dy * dy <= radius * radius
            };
            if inside {
                blend_over(canvas.get_pixel_mut(px, py), fill);
            }
        }
    }
}

fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = f32::from(src[3]) / 255.0;
    for channel in 0..3 {
        dst[channel] = (f32::from(dst[channel]) * (1.0 - alpha)
            + f32::from(src[channel]) * alpha)
            .round() as u8;
    }
    dst[3] = dst[3].max(src[3]);
}
