//! FFprobe-backed stream inspection.
//!
//! Shells out to `ffprobe -print_format json` for the first video stream and
//! maps the result into a [`VideoClip`].

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::capabilities::FfmpegTools;
use crate::error::{Result, TranscodeError};
use crate::video::types::VideoClip;

/// Probe the first video stream of `path`
pub fn probe(tools: &FfmpegTools, path: &Path) -> Result<VideoClip> {
    let output = Command::new(&tools.ffprobe)
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_streams",
            "-show_format",
            "-print_format", "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| TranscodeError::ProbeFailed {
            reason: format!("could not run ffprobe: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscodeError::ProbeFailed {
            reason: format!("ffprobe failed: {}", stderr.trim()),
        }.into());
    }

    let json = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(path, &json)
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

/// Map ffprobe JSON into a clip description
pub fn parse_probe_output(path: &Path, json: &str) -> Result<VideoClip> {
    let ff: FfprobeOutput = serde_json::from_str(json).map_err(|e| TranscodeError::ProbeFailed {
        reason: format!("ffprobe JSON parse error: {}", e),
    })?;

    let stream = ff
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().unwrap_or("video") == "video")
        .ok_or_else(|| TranscodeError::ProbeFailed {
            reason: format!("no video stream in {}", path.display()),
        })?;

    let (mut width, mut height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(TranscodeError::ProbeFailed {
                reason: "video stream has no dimensions".to_string(),
            }.into())
        }
    };

    // ffmpeg autorotates while decoding, so report display dimensions
    if is_quarter_turn(rotation_degrees(stream)) {
        std::mem::swap(&mut width, &mut height);
    }

    let duration = stream
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| ff.format.as_ref()?.duration.as_deref().and_then(parse_seconds))
        .ok_or_else(|| TranscodeError::ProbeFailed {
            reason: "video has no known duration".to_string(),
        })?;

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| TranscodeError::ProbeFailed {
            reason: "video has no known frame rate".to_string(),
        })?;

    debug!(
        "Probed {}: {}x{} @ {:.2}fps, {:.2}s",
        path.display(),
        width,
        height,
        fps,
        duration
    );

    Ok(VideoClip {
        path: path.to_path_buf(),
        duration,
        width,
        height,
        fps,
    })
}

fn rotation_degrees(stream: &FfprobeStream) -> f64 {
    stream
        .side_data_list
        .iter()
        .find_map(|side| side.rotation)
        .or_else(|| stream.tags.rotate.as_deref()?.trim().parse().ok())
        .unwrap_or(0.0)
}

fn is_quarter_turn(degrees: f64) -> bool {
    let normalized = degrees.rem_euclid(360.0).round() as i64;
    normalized == 90 || normalized == 270
}

fn parse_seconds(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| *seconds > 0.0 && seconds.is_finite())
}

/// Parse "30000/1001" or "25" into frames per second
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };

    (rate > 0.0 && rate.is_finite()).then_some(rate)
}
