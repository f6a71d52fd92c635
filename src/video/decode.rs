use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::capabilities::FfmpegTools;
use crate::error::{Result, TranscodeError};
use crate::video::types::{AnimationPlan, Frame, VideoClip};

fn decoding_failed(reason: impl ToString) -> TranscodeError {
    TranscodeError::DecodingFailed {
        reason: reason.to_string(),
    }
}

/// Decode the planned span of `clip` into equally sized RGB frames
///
/// FFmpeg trims to `plan.duration`, resamples to `plan.fps`, scales with
/// Lanczos to the planned size, and streams raw `rgb24` on stdout. Frames are
/// read off the pipe one at a time, so memory stays at the planned frame count.
pub fn decode_frames(tools: &FfmpegTools, clip: &VideoClip, plan: &AnimationPlan) -> Result<Vec<Frame>> {
    let filter = format!(
        "fps={},scale={}:{}:flags=lanczos",
        plan.fps, plan.width, plan.height
    );

    debug!(
        "Decoding {} ({:.2}s, filter {})",
        clip.path.display(),
        plan.duration,
        filter
    );

    let duration = format!("{:.3}", plan.duration);
    let frame_count = plan.frame_count.to_string();

    let mut child = Command::new(&tools.ffmpeg)
        .args(["-v", "error", "-nostdin", "-i"])
        .arg(&clip.path)
        .args([
            "-t", duration.as_str(),
            "-vf", filter.as_str(),
            "-an",
            "-frames:v", frame_count.as_str(),
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| decoding_failed(format!("could not run ffmpeg: {}", e)))?;

    // Drained on its own thread so a chatty ffmpeg never blocks on a full pipe
    let stderr = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = pipe.read_to_string(&mut text);
            text
        })
    });

    let read = match child.stdout.take() {
        Some(stdout) => read_frames(stdout, plan),
        None => Err(decoding_failed("ffmpeg stdout was not captured").into()),
    };

    let status = child
        .wait()
        .map_err(|e| decoding_failed(format!("waiting for ffmpeg: {}", e)))?;
    let stderr = stderr
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(decoding_failed(format!("ffmpeg failed: {}", stderr.trim())).into());
    }

    let frames = read?;
    if frames.is_empty() {
        return Err(TranscodeError::NoFrames {
            path: clip.path.display().to_string(),
        }.into());
    }

    Ok(frames)
}

/// Read up to `plan.frame_count` raw `rgb24` frames of the planned size
///
/// A trailing partial frame is dropped.
pub fn read_frames<R: Read>(mut reader: R, plan: &AnimationPlan) -> Result<Vec<Frame>> {
    let frame_len = plan.width as usize * plan.height as usize * 3;
    if frame_len == 0 {
        return Err(TranscodeError::InvalidParameters {
            details: format!("{}x{} frame", plan.width, plan.height),
        }.into());
    }

    let mut frames = Vec::with_capacity(plan.frame_count);
    while frames.len() < plan.frame_count {
        let mut buffer = vec![0u8; frame_len];
        let filled = fill(&mut reader, &mut buffer).map_err(decoding_failed)?;

        if filled < frame_len {
            if filled > 0 {
                warn!("Dropping {} trailing bytes of a partial frame", filled);
            }
            break;
        }

        match Frame::from_rgb_bytes(plan.width, plan.height, buffer) {
            Some(frame) => frames.push(frame),
            None => break,
        }
    }

    debug!("Decoded {} frames at {}x{}", frames.len(), plan.width, plan.height);
    Ok(frames)
}

/// Like `read_exact`, but reports how much was read before end of stream
fn fill<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
