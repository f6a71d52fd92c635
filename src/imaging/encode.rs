use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};
use tracing::debug;

use crate::assets::{ImageFamily, SourceFormat};
use crate::config::ImageConfig;
use crate::error::{EncodeError, Result};
use crate::imaging::types::Picture;

/// Background JPEG flattens transparency onto
const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

/// How one still image is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSpec {
    pub family: ImageFamily,

    /// Lossy quality (0-100); PNG ignores it
    pub quality: u8,
}

impl EncodeSpec {
    /// Derive the spec for a source format under the run's configuration
    pub fn for_source(format: SourceFormat, config: &ImageConfig) -> Self {
        Self {
            family: format.family(),
            quality: config.quality,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.family.extension()
    }
}

/// Encoded output bytes plus the extension they must be saved under
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Encode a normalized picture according to `spec`
pub fn encode(picture: &Picture, spec: &EncodeSpec) -> Result<EncodedImage> {
    let bytes = match spec.family {
        ImageFamily::Png => encode_png(picture.as_image())?,
        ImageFamily::Webp => encode_webp(picture.as_image(), spec.quality)?,
        ImageFamily::JpegFamily => encode_jpeg(picture.as_image(), spec.quality)?,
    };

    debug!(
        "Encoded {}x{} as {} ({} bytes)",
        picture.width(),
        picture.height(),
        spec.extension(),
        bytes.len()
    );

    Ok(EncodedImage {
        bytes,
        extension: spec.extension(),
    })
}

fn failed(format: &str, reason: impl ToString) -> EncodeError {
    EncodeError::Failed {
        format: format.to_string(),
        reason: reason.to_string(),
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    // PNG has no float samples; everything else is written as decoded
    let converted;
    let image = match image.color() {
        ColorType::Rgb32F => {
            converted = DynamicImage::ImageRgb16(image.to_rgb16());
            &converted
        }
        ColorType::Rgba32F => {
            converted = DynamicImage::ImageRgba16(image.to_rgba16());
            &converted
        }
        _ => image,
    };

    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive);
    encoder
        .write_image(image.as_bytes(), image.width(), image.height(), image.color().into())
        .map_err(|e| failed("png", e))?;
    Ok(bytes)
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = (image.width(), image.height());

    let pixels = if image.color().has_alpha() {
        image.to_rgba8().into_raw()
    } else {
        image.to_rgb8().into_raw()
    };

    let encoder = if image.color().has_alpha() {
        webp::Encoder::from_rgba(&pixels, width, height)
    } else {
        webp::Encoder::from_rgb(&pixels, width, height)
    };
    let memory = encoder
        .encode_simple(false, quality as f32)
        .map_err(|e| failed("webp", format!("{:?}", e)))?;

    Ok(memory.to_vec())
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = flatten_to_rgb(image, FLATTEN_BACKGROUND);

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| failed("jpeg", e))?;
    Ok(bytes)
}

/// Composite onto an opaque background and drop the alpha channel
pub fn flatten_to_rgb(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |channel: u8, back: u8| -> u8 {
            let a = a as u32;
            ((channel as u32 * a + back as u32 * (255 - a) + 127) / 255) as u8
        };
        image::Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, Rgba, RgbaImage};

    fn translucent(width: u32, height: u32) -> Picture {
        let image = RgbaImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgba([200, 0, 0, 0])
            } else {
                Rgba([0, 0, 200, 255])
            }
        });
        Picture::new(DynamicImage::ImageRgba8(image))
    }

    fn spec(family: ImageFamily) -> EncodeSpec {
        EncodeSpec { family, quality: 85 }
    }

    #[test]
    fn test_spec_from_source() {
        let config = ImageConfig::default();
        assert_eq!(EncodeSpec::for_source(SourceFormat::Heif, &config).extension(), "jpg");
        assert_eq!(EncodeSpec::for_source(SourceFormat::Jpeg, &config).extension(), "jpg");
        assert_eq!(EncodeSpec::for_source(SourceFormat::Png, &config).extension(), "png");
        assert_eq!(EncodeSpec::for_source(SourceFormat::Webp, &config).quality, 90);
    }

    #[test]
    fn test_png_keeps_alpha() {
        let encoded = encode(&translucent(6, 4), &spec(ImageFamily::Png)).unwrap();
        assert_eq!(encoded.extension, "png");

        let decoded = image::load_from_memory_with_format(&encoded.bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert!(decoded.color().has_alpha());
        // lossless
        assert_eq!(decoded.to_rgba8().get_pixel(1, 0).0, [0, 0, 200, 255]);
    }

    #[test]
    fn test_jpeg_is_opaque() {
        let encoded = encode(&translucent(16, 16), &spec(ImageFamily::JpegFamily)).unwrap();
        assert_eq!(encoded.extension, "jpg");

        let decoded = image::load_from_memory_with_format(&encoded.bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_webp_roundtrip_dimensions() {
        let encoded = encode(&translucent(10, 7), &spec(ImageFamily::Webp)).unwrap();
        assert_eq!(encoded.extension, "webp");

        let decoded = image::load_from_memory_with_format(&encoded.bytes, ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (10, 7));
    }

    #[test]
    fn test_flatten_blends_onto_background() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_vec(3, 1, vec![
            0, 0, 0, 0,
            0, 0, 0, 255,
            0, 0, 0, 128,
        ]).unwrap());

        let flat = flatten_to_rgb(&image, [255, 255, 255]);
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(flat.get_pixel(2, 0), &Rgb([127, 127, 127]));
    }

    #[test]
    fn test_jpeg_is_deterministic() {
        let picture = translucent(32, 32);
        let first = encode(&picture, &spec(ImageFamily::JpegFamily)).unwrap();
        let second = encode(&picture, &spec(ImageFamily::JpegFamily)).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }
}
