use image::{ImageBuffer, Rgb, RgbImage};
use std::path::PathBuf;

use crate::config::AnimationConfig;
use crate::error::{Result, TranscodeError};
use crate::imaging::scaled_height;

/// Represents a single decoded video frame
///
/// This is a simple wrapper around an RGB image buffer; every frame of one
/// animation shares the same dimensions.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Packed RGB samples, row-major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }
}

/// A probed video stream
#[derive(Debug, Clone, PartialEq)]
pub struct VideoClip {
    /// Path to the video file
    pub path: PathBuf,

    /// Duration in seconds
    pub duration: f64,

    /// Display width, after any container rotation
    pub width: u32,

    /// Display height, after any container rotation
    pub height: u32,

    /// Source frame rate
    pub fps: f64,
}

/// Everything the decoder and GIF encoder need to know about one animation
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlan {
    /// Seconds of source taken from the start of the clip
    pub duration: f64,

    pub width: u32,
    pub height: u32,

    /// Output frame rate, never above the source's
    pub fps: f64,

    /// Frames to emit
    pub frame_count: usize,

    /// 0 loops forever
    pub loop_count: u16,

    /// Upper bound on palette entries
    pub palette_size: u16,
}

impl AnimationPlan {
    /// Work out trim, size, and rate for `clip` under `config`
    pub fn new(clip: &VideoClip, config: &AnimationConfig) -> Result<Self> {
        if !(clip.duration > 0.0 && clip.duration.is_finite()) {
            return Err(TranscodeError::InvalidParameters {
                details: format!("clip duration {}", clip.duration),
            }.into());
        }

        if clip.width == 0 || clip.height == 0 {
            return Err(TranscodeError::InvalidParameters {
                details: format!("clip size {}x{}", clip.width, clip.height),
            }.into());
        }

        let duration = match config.max_duration {
            Some(max_duration) if clip.duration > max_duration => max_duration,
            _ => clip.duration,
        };

        let (width, height) = if clip.width > config.target_width {
            (config.target_width, scaled_height(clip.width, clip.height, config.target_width))
        } else {
            (clip.width, clip.height)
        };

        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(TranscodeError::InvalidParameters {
                details: format!("{}x{} exceeds GIF limits", width, height),
            }.into());
        }

        // Frame rate is only ever lowered
        let fps = if clip.fps > 0.0 && clip.fps < config.fps {
            clip.fps
        } else {
            config.fps
        };

        // Whole frames only, so the animation never outlasts the trimmed clip
        let frame_count = ((duration * fps + 1e-6).floor() as usize).max(1);

        Ok(Self {
            duration,
            width,
            height,
            fps,
            frame_count,
            loop_count: config.loop_count,
            palette_size: config.palette_size,
        })
    }

    /// Per-frame delays in hundredths of a second
    ///
    /// Rounding is accumulated, so the total always matches
    /// `frame_count / fps` to within one centisecond.
    pub fn frame_delays(&self, frames: usize) -> Vec<u16> {
        let stamp = |i: usize| (i as f64 * 100.0 / self.fps).round() as u64;
        (0..frames)
            .map(|i| (stamp(i + 1) - stamp(i)).min(u16::MAX as u64) as u16)
            .collect()
    }
}
