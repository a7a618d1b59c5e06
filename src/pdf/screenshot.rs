//! Rasterize a page region into a PNG data URI

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, RgbaImage, imageops};

use super::geometry::{PageViewport, ViewportRect};
use crate::error::Result;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Crop `area` (page-relative viewport pixels) out of the page canvas.
///
/// The canvas may be rendered at a higher resolution than the viewport
/// (device pixel ratio), so the area is rescaled to canvas pixels first.
/// An area that falls entirely outside the canvas yields a 1x1 image.
pub fn area_as_png(
    canvas: &RgbaImage,
    viewport: &PageViewport,
    area: &ViewportRect,
) -> Result<String> {
    let ratio_x = if viewport.width > 0.0 {
        f64::from(canvas.width()) / viewport.width
    } else {
        1.0
    };
    let ratio_y = if viewport.height > 0.0 {
        f64::from(canvas.height()) / viewport.height
    } else {
        1.0
    };

    let max_x = canvas.width().saturating_sub(1);
    let max_y = canvas.height().saturating_sub(1);
    let x = ((area.left * ratio_x).max(0.0) as u32).min(max_x);
    let y = ((area.top * ratio_y).max(0.0) as u32).min(max_y);
    let width = ((area.width * ratio_x).round().max(1.0) as u32).min(canvas.width() - x).max(1);
    let height = ((area.height * ratio_y).round().max(1.0) as u32).min(canvas.height() - y).max(1);

    let cropped = imageops::crop_imm(canvas, x, y, width, height).to_image();

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(cropped).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(&bytes)))
}

/// Decode a data URI produced by [`area_as_png`]
pub fn decode_data_uri(uri: &str) -> Option<RgbaImage> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    let bytes = STANDARD.decode(payload).ok()?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .ok()
        .map(|img| img.to_rgba8())
}
