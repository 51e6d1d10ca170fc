use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};

use crate::error::{EnhanceError, Result};

/// PNG bytes plus the pixel dimensions they encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Scales the image to fit a transparent `size`x`size` canvas, keeping the
/// aspect ratio, and centers it. `size` below 1 is treated as 1.
pub fn contain_fit_square(bytes: &[u8], size: u32) -> Result<RenderedImage> {
    let size = size.max(1);
    let source = decode(bytes)?;
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(EnhanceError::ImageDecode("invalid source image size".to_string()));
    }

    let (new_w, new_h) = contain_dims(src_w, src_h, size);
    let (offset_x, offset_y) = centered_offset(new_w, new_h, size);
    let scaled = source
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgba8();

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut canvas, &scaled, i64::from(offset_x), i64::from(offset_y));

    Ok(RenderedImage {
        png: encode_png(&DynamicImage::ImageRgba8(canvas))?,
        width: size,
        height: size,
    })
}

/// Re-encodes to PNG at the natural dimensions; an alpha channel survives.
pub fn reencode_png(bytes: &[u8]) -> Result<RenderedImage> {
    let source = decode(bytes)?;
    let (width, height) = source.dimensions();
    // PNG has no float sample formats.
    let normalized = if matches!(source, DynamicImage::ImageRgba32F(_)) {
        DynamicImage::ImageRgba8(source.to_rgba8())
    } else if matches!(source, DynamicImage::ImageRgb32F(_)) {
        DynamicImage::ImageRgb8(source.to_rgb8())
    } else {
        source
    };
    Ok(RenderedImage {
        png: encode_png(&normalized)?,
        width,
        height,
    })
}

pub(crate) fn contain_dims(src_w: u32, src_h: u32, size: u32) -> (u32, u32) {
    let scale = f64::min(
        f64::from(size) / f64::from(src_w),
        f64::from(size) / f64::from(src_h),
    );
    let fit = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, size);
    (fit(src_w), fit(src_h))
}

pub(crate) fn centered_offset(new_w: u32, new_h: u32, size: u32) -> (u32, u32) {
    (
        size.saturating_sub(new_w) / 2,
        size.saturating_sub(new_h) / 2,
    )
}

fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(EnhanceError::ImageDecode("empty image binary".to_string()));
    }
    image::load_from_memory(bytes).map_err(|err| EnhanceError::ImageDecode(err.to_string()))
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|err| EnhanceError::ImageEncode(err.to_string()))?;
    let png = buffer.into_inner();
    if png.is_empty() {
        return Err(EnhanceError::ImageEncode("encoder produced no bytes".to_string()));
    }
    Ok(png)
}
