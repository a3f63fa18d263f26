//! Request-level image pipeline: validate, decode, resize, remove the
//! background, optionally composite over a solid color, and encode to PNG.
use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::session::SessionManager;

/// One uploaded file, as pulled out of the multipart form.
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Final PNG bytes plus the suggested download filename.
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Run the full pipeline for one upload.
///
/// Compositing is best-effort: a present-but-malformed color string is treated
/// as absent, and a compositing failure falls back to the transparent result
/// with a warning rather than failing the request.
pub fn process(
    upload: Upload,
    background_color: Option<&str>,
    config: &Config,
    sessions: &SessionManager,
) -> AppResult<ProcessedImage> {
    if upload.bytes.is_empty() {
        return Err(AppError::MissingImage);
    }
    if upload.filename.is_empty() {
        return Err(AppError::EmptyFilename);
    }
    if !validate_extension(&upload.filename, &config.allowed_extensions) {
        return Err(AppError::InvalidFileType {
            allowed: config.allowed_extensions_display(),
        });
    }

    let decoded = image::load_from_memory(&upload.bytes).map_err(AppError::Decode)?;
    let decoded = resize_within_limit(decoded, config.max_image_dimension);

    let session = sessions.get_session().ok_or(AppError::ModelUnavailable)?;
    let foreground = session.remove(&decoded)?;

    let final_image = match background_color.and_then(parse_hex_color) {
        Some(color) => match composite_over_color(&foreground, color) {
            Ok(flat) => DynamicImage::ImageRgb8(flat),
            Err(e) => {
                tracing::warn!(
                    "Background compositing failed, keeping transparency: {}",
                    e.message()
                );
                DynamicImage::ImageRgba8(foreground)
            }
        },
        None => DynamicImage::ImageRgba8(foreground),
    };

    let bytes = encode_png(&final_image)?;
    Ok(ProcessedImage {
        bytes,
        filename: download_name(&upload.filename),
    })
}

/// Case-insensitive check of the last dot-separated segment of the filename.
pub fn validate_extension(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Strict `#RRGGBB` parse; anything else is `None`.
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb([r, g, b]))
}

/// Cap the longer side at `max_dimension`, scaling both dimensions uniformly.
pub fn resize_within_limit(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let longer = width.max(height);
    if longer <= max_dimension {
        return image;
    }
    let ratio = max_dimension as f32 / longer as f32;
    let new_width = ((width as f32 * ratio).round() as u32).max(1);
    let new_height = ((height as f32 * ratio).round() as u32).max(1);
    tracing::info!("Resizing {}x{} to {}x{}", width, height, new_width, new_height);
    image.resize_exact(new_width, new_height, imageops::FilterType::Lanczos3)
}

/// Alpha-blend the foreground over a solid-color canvas and flatten to RGB.
pub fn composite_over_color(foreground: &RgbaImage, color: Rgb<u8>) -> AppResult<RgbImage> {
    let (width, height) = foreground.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::Inference("empty foreground image".to_string()));
    }
    let mut flat = RgbImage::new(width, height);
    for (out, pixel) in flat.pixels_mut().zip(foreground.pixels()) {
        let a = u32::from(pixel[3]);
        for c in 0..3 {
            let fg = u32::from(pixel[c]);
            let bg = u32::from(color[c]);
            out[c] = ((fg * a + bg * (255 - a) + 127) / 255) as u8;
        }
    }
    Ok(flat)
}

/// PNG-encode into an in-memory buffer.
pub fn encode_png(image: &DynamicImage) -> AppResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(AppError::Encode)?;
    Ok(buffer.into_inner())
}

/// `removed_bg_<original stem>.png`
pub fn download_name(original: &str) -> String {
    let stem = original.split('.').next().unwrap_or_default();
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("removed_bg_{}.png", stem)
}
