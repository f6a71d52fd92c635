//! # Capability Registry
//!
//! Optional codec backends are probed once at startup and recorded here.
//! Pipeline steps ask the registry for what they need and get
//! [`ConvertError::MissingCapability`] back when it is absent, so a missing
//! backend fails one asset instead of the whole run.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{ConvertError, Result};

/// Optional functionality provided by something outside the core pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Decoding HEIC/HEIF stills (libheif, `heif` cargo feature)
    HeifDecode,
    /// Decoding video and producing animations (ffmpeg + ffprobe on PATH)
    VideoTranscode,
}

impl Capability {
    /// How a user gets this capability
    pub fn install_hint(&self) -> &'static str {
        match self {
            Self::HeifDecode => "Rebuild with `--features heif` (requires libheif).",
            Self::VideoTranscode => "Install FFmpeg so that `ffmpeg` and `ffprobe` are on PATH.",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeifDecode => f.write_str("HEIC/HEIF decoding"),
            Self::VideoTranscode => f.write_str("video transcoding (ffmpeg)"),
        }
    }
}

/// Resolved locations of the FFmpeg command line tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FfmpegTools {
    /// Find both tools on `PATH`; `None` unless both are present.
    pub fn discover() -> Option<Self> {
        let ffmpeg = which::which("ffmpeg").ok()?;
        let ffprobe = which::which("ffprobe").ok()?;
        Some(Self { ffmpeg, ffprobe })
    }
}

/// The set of optional backends available to this run
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    heif: bool,
    video: Option<FfmpegTools>,
}

impl Capabilities {
    /// A registry with nothing optional available
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe the environment for every optional backend
    pub fn probe() -> Self {
        let capabilities = Self {
            heif: cfg!(feature = "heif"),
            video: FfmpegTools::discover(),
        };

        if capabilities.heif {
            info!("HEIC/HEIF decoding available (libheif)");
        } else {
            debug!("HEIC/HEIF decoding unavailable: built without the `heif` feature");
        }

        match &capabilities.video {
            Some(tools) => info!(
                "Video transcoding available (ffmpeg: {:?}, ffprobe: {:?})",
                tools.ffmpeg, tools.ffprobe
            ),
            None => warn!("ffmpeg/ffprobe not found on PATH - videos will be reported as failed"),
        }

        capabilities
    }

    /// Record whether HEIF decoding is usable
    pub fn with_heif(mut self, available: bool) -> Self {
        self.heif = available && cfg!(feature = "heif");
        self
    }

    /// Record the FFmpeg tools to use for video
    pub fn with_video(mut self, tools: Option<FfmpegTools>) -> Self {
        self.video = tools;
        self
    }

    /// Check if a capability is available
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::HeifDecode => self.heif,
            Capability::VideoTranscode => self.video.is_some(),
        }
    }

    /// Fail with `MissingCapability` unless HEIF decoding is present
    pub fn require_heif(&self) -> Result<()> {
        if self.heif {
            Ok(())
        } else {
            Err(ConvertError::MissingCapability(Capability::HeifDecode))
        }
    }

    /// The FFmpeg tools, or `MissingCapability`
    pub fn require_video(&self) -> Result<&FfmpegTools> {
        self.video
            .as_ref()
            .ok_or(ConvertError::MissingCapability(Capability::VideoTranscode))
    }
}
