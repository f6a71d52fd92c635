use std::io::Cursor;

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use tracing::{debug, warn};

use crate::assets::SourceFormat;
use crate::capabilities::Capabilities;
use crate::error::{DecodeError, Result};
use crate::imaging::types::Picture;

/// Decode, orient, and bound the width of a still image
pub fn normalize(
    bytes: &[u8],
    format: SourceFormat,
    max_width: u32,
    capabilities: &Capabilities,
) -> Result<Picture> {
    let picture = decode(bytes, format, capabilities)?;
    let picture = orient(picture);
    Ok(fit_width(picture, max_width))
}

/// Decode raw bytes, keeping the stored orientation pending
///
/// The extension is only a hint: the content is sniffed and wins when it
/// disagrees. HEIC/HEIF needs the optional libheif backend.
pub fn decode(bytes: &[u8], format: SourceFormat, capabilities: &Capabilities) -> Result<Picture> {
    match format.image_format() {
        Some(hint) => decode_with_image(bytes, hint, format),
        None => {
            capabilities.require_heif()?;
            decode_heif(bytes)
        }
    }
}

fn corrupt(format: SourceFormat, reason: impl ToString) -> DecodeError {
    DecodeError::Corrupt {
        format: format.name().to_string(),
        reason: reason.to_string(),
    }
}

fn decode_with_image(
    bytes: &[u8],
    hint: image::ImageFormat,
    format: SourceFormat,
) -> Result<Picture> {
    let reader = ImageReader::with_format(Cursor::new(bytes), hint)
        .with_guessed_format()
        .map_err(|e| corrupt(format, e))?;

    if reader.format() != Some(hint) {
        debug!("Content sniffed as {:?}, extension said {:?}", reader.format(), hint);
    }

    let mut decoder = reader.into_decoder().map_err(|e| corrupt(format, e))?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        warn!("Ignoring unreadable orientation metadata: {}", e);
        Orientation::NoTransforms
    });
    let image = DynamicImage::from_decoder(decoder).map_err(|e| corrupt(format, e))?;

    Ok(Picture::with_orientation(image, orientation))
}

#[cfg(feature = "heif")]
fn decode_heif(bytes: &[u8]) -> Result<Picture> {
    use image::{RgbImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let format = SourceFormat::Heif;
    let lib_heif = LibHeif::new();
    let context = HeifContext::read_from_bytes(bytes).map_err(|e| corrupt(format, e))?;
    let handle = context.primary_image_handle().map_err(|e| corrupt(format, e))?;

    let has_alpha = handle.has_alpha_channel();
    let (chroma, channels) = if has_alpha {
        (RgbChroma::Rgba, 4)
    } else {
        (RgbChroma::Rgb, 3)
    };

    // libheif applies the container's rotation/mirror while decoding
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(chroma), None)
        .map_err(|e| corrupt(format, e))?;
    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| corrupt(format, "no interleaved plane"))?;

    let row_len = plane.width as usize * channels;
    let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
    for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }

    let image = if has_alpha {
        RgbaImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgb8)
    };

    image
        .map(Picture::new)
        .ok_or_else(|| corrupt(format, "pixel buffer size mismatch").into())
}

#[cfg(not(feature = "heif"))]
fn decode_heif(_bytes: &[u8]) -> Result<Picture> {
    Err(crate::error::ConvertError::MissingCapability(
        crate::capabilities::Capability::HeifDecode,
    ))
}

/// Bake the pending orientation into the pixels
///
/// Idempotent: an upright picture comes back unchanged.
pub fn orient(picture: Picture) -> Picture {
    let (mut image, orientation) = picture.into_parts();
    if orientation != Orientation::NoTransforms {
        debug!("Applying orientation {:?}", orientation);
        image.apply_orientation(orientation);
    }
    Picture::new(image)
}

/// Height that keeps the aspect ratio when `width` is scaled to `target_width`
///
/// Rounds to nearest and never returns 0.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return height.max(1);
    }
    let scaled = (height as u64 * target_width as u64 + width as u64 / 2) / width as u64;
    scaled.clamp(1, u32::MAX as u64) as u32
}

/// Downscale to `max_width` with Lanczos resampling; never upscales
pub fn fit_width(picture: Picture, max_width: u32) -> Picture {
    let (width, height) = picture.dimensions();
    if width <= max_width {
        return picture;
    }

    let new_height = scaled_height(width, height, max_width);
    debug!("Resizing {}x{} -> {}x{}", width, height, max_width, new_height);

    let (image, orientation) = picture.into_parts();
    let resized = image.resize_exact(max_width, new_height, FilterType::Lanczos3);
    Picture::with_orientation(resized, orientation)
}
