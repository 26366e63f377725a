use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode page image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed page: {0}")]
    Encode(String),
}

/// Longest side a page is allowed to keep; larger scans are shrunk.
const MAX_PAGE_SIDE: u32 = 3500;

/// Scanned statements below this width are upscaled so small print survives OCR.
const MIN_PAGE_WIDTH: u32 = 1200;

/// Decode a rendered/scanned page, normalize it and re-encode as PNG.
pub fn prepare_page_image(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img))
}

/// Resize into OCR range, grayscale, then stretch contrast.
fn normalize(img: DynamicImage) -> DynamicImage {
    let img = if img.width() > MAX_PAGE_SIDE || img.height() > MAX_PAGE_SIDE {
        img.resize(MAX_PAGE_SIDE, MAX_PAGE_SIDE, image::imageops::FilterType::Lanczos3)
    } else if img.width() > 0 && img.width() < MIN_PAGE_WIDTH {
        let scale = MIN_PAGE_WIDTH.div_ceil(img.width()).min(4);
        img.resize(
            img.width() * scale,
            img.height() * scale,
            image::imageops::FilterType::CatmullRom,
        )
    } else {
        img
    };

    let gray: GrayImage = img.to_luma8();
    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if hi == lo {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = u32::from(hi - lo);
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([(u32::from(p - lo) * 255 / range) as u8])
    });
    DynamicImage::ImageLuma8(stretched)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
