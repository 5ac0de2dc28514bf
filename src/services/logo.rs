use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GenericImageView};
use tracing::{info, warn};

pub const LOGO_MAX_DIMENSION: u32 = 512;

#[derive(Clone)]
pub struct DecodedImageData {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Reads an image file into a `data:` URL suitable for the site store.
pub fn logo_data_url(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path)
        .map_err(|err| format!("Failed to read logo '{}': {err}", path.display()))?;
    let format = image::guess_format(&bytes)
        .map_err(|err| format!("'{}' is not a supported image: {err}", path.display()))?;
    image::load_from_memory_with_format(&bytes, format)
        .map_err(|err| format!("Failed to decode logo '{}': {err}", path.display()))?;

    info!(
        "Loaded logo {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        format.to_mime_type()
    );
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64.encode(&bytes)
    ))
}

pub fn decode_data_url(data_url: &str, max_dimension: u32) -> Option<DecodedImageData> {
    let (header, payload) = data_url.split_once(',')?;
    if !header.starts_with("data:image/") || !header.ends_with(";base64") {
        warn!("Unsupported logo data URL header: {header}");
        return None;
    }
    let bytes = BASE64.decode(payload.trim()).ok()?;
    let decoded = image::load_from_memory(&bytes).ok()?;
    Some(to_decoded(decoded, max_dimension))
}

pub fn resolve_fallback_path(raw: Option<&str>) -> Option<PathBuf> {
    let raw_path = raw?.trim();
    if raw_path.is_empty() {
        return None;
    }
    let path = PathBuf::from(raw_path);
    if path.exists() && path.is_file() {
        Some(path)
    } else {
        None
    }
}

pub fn decode_image_file(path: &Path, max_dimension: u32) -> Option<DecodedImageData> {
    let bytes = std::fs::read(path).ok()?;
    let decoded = image::load_from_memory(&bytes).ok()?;
    Some(to_decoded(decoded, max_dimension))
}

fn to_decoded(mut decoded: DynamicImage, max_dimension: u32) -> DecodedImageData {
    let (width, height) = decoded.dimensions();
    if width.max(height) > max_dimension {
        decoded = decoded.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Triangle,
        );
    }
    let rgba = decoded.to_rgba8();
    DecodedImageData {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
    }
}
