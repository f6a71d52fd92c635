use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Decoders the pipeline knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Webp,
    /// HEIC/HEIF, only decodable with the optional libheif backend
    Heif,
}

impl SourceFormat {
    /// The encode family a source of this format ends up in
    pub fn family(&self) -> ImageFamily {
        match self {
            Self::Png => ImageFamily::Png,
            Self::Webp => ImageFamily::Webp,
            Self::Jpeg | Self::Heif => ImageFamily::JpegFamily,
        }
    }

    /// Matching `image` crate format, if that crate decodes it
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Png => Some(image::ImageFormat::Png),
            Self::Webp => Some(image::ImageFormat::WebP),
            Self::Heif => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Heif => "heif",
        }
    }
}

/// Output container family for still images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFamily {
    /// Lossless PNG, alpha preserved
    Png,
    /// Lossy WebP, alpha preserved
    Webp,
    /// Lossy JPEG, always opaque RGB
    JpegFamily,
}

impl ImageFamily {
    /// Extension written for this family (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::JpegFamily => "jpg",
        }
    }
}

/// What the pipeline does with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image(SourceFormat),
    Video,
    Unsupported,
}

/// Extension of every animation we produce
pub const ANIMATION_EXTENSION: &str = "gif";

/// Classify a path by its extension
pub fn classify<P: AsRef<Path>>(path: P) -> AssetKind {
    let extension = match lowercase_extension(path.as_ref()) {
        Some(ext) => ext,
        None => return AssetKind::Unsupported,
    };

    match extension.as_str() {
        "jpg" | "jpeg" => AssetKind::Image(SourceFormat::Jpeg),
        "png" => AssetKind::Image(SourceFormat::Png),
        "webp" => AssetKind::Image(SourceFormat::Webp),
        "heic" | "heif" => AssetKind::Image(SourceFormat::Heif),
        "mp4" => AssetKind::Video,
        _ => AssetKind::Unsupported,
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// A source file and its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub kind: AssetKind,
}

impl Asset {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let kind = classify(&path);
        Self { path, kind }
    }

    /// File name for logs and reports
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Extension the converted output will carry, `None` when unsupported
    pub fn output_extension(&self) -> Option<&'static str> {
        match self.kind {
            AssetKind::Image(format) => Some(format.family().extension()),
            AssetKind::Video => Some(ANIMATION_EXTENSION),
            AssetKind::Unsupported => None,
        }
    }

    /// `<stem>.<output extension>`; `.jpeg` and `.heic` both become `.jpg`
    pub fn output_file_name(&self) -> Option<OsString> {
        let extension = self.output_extension()?;
        let mut name = self.path.file_stem()?.to_os_string();
        name.push(".");
        name.push(extension);
        Some(name)
    }
}
