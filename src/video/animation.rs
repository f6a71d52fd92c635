use std::borrow::Cow;
use std::collections::HashMap;

use color_quant::NeuQuant;
use gif::{Encoder, Repeat};
use tracing::debug;

use crate::error::{Result, TranscodeError};
use crate::video::types::{AnimationPlan, Frame};

/// NeuQuant sampling factor: 1 is slowest/best, 30 fastest
const QUANT_SAMPLE_FACTOR: i32 = 10;

/// Frames fed to the quantiser when building the shared palette
const PALETTE_SAMPLE_FRAMES: usize = 12;

/// Represents an encoded animation
#[derive(Debug, Clone)]
pub struct EncodedAnimation {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,

    /// Total play time of one loop in seconds
    pub duration: f64,
}

fn encoding_failed(reason: impl ToString) -> TranscodeError {
    TranscodeError::EncodingFailed {
        reason: reason.to_string(),
    }
}

/// One global palette of at most `colors` entries, learnt from a spread of frames
///
/// GIF color tables hold a power of two entries, so the encoder pads the
/// table when `colors` is not one; the padding is never indexed.
pub fn build_palette(frames: &[Frame], colors: u16) -> NeuQuant {
    let step = (frames.len() / PALETTE_SAMPLE_FRAMES).max(1);

    let mut rgba = Vec::new();
    for frame in frames.iter().step_by(step).take(PALETTE_SAMPLE_FRAMES) {
        rgba.reserve(frame.as_rgb_bytes().len() / 3 * 4);
        for pixel in frame.as_rgb_bytes().chunks_exact(3) {
            rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
        }
    }

    NeuQuant::new(QUANT_SAMPLE_FACTOR, colors as usize, &rgba)
}

/// Map every pixel of `frame` to its palette index
fn index_frame(quantizer: &NeuQuant, frame: &Frame, cache: &mut HashMap<[u8; 3], u8>) -> Vec<u8> {
    frame
        .as_rgb_bytes()
        .chunks_exact(3)
        .map(|pixel| {
            let key = [pixel[0], pixel[1], pixel[2]];
            *cache
                .entry(key)
                .or_insert_with(|| quantizer.index_of(&[key[0], key[1], key[2], 255]) as u8)
        })
        .collect()
}

/// Encode frames as a looping GIF following `plan`
pub fn encode_gif(frames: &[Frame], plan: &AnimationPlan) -> Result<EncodedAnimation> {
    let first = frames.first().ok_or_else(|| encoding_failed("no frames to encode"))?;
    let (width, height) = (first.width(), first.height());

    if frames.iter().any(|f| f.width() != width || f.height() != height) {
        return Err(encoding_failed("frames differ in size").into());
    }

    let gif_width = u16::try_from(width).map_err(|_| encoding_failed("width exceeds GIF limit"))?;
    let gif_height = u16::try_from(height).map_err(|_| encoding_failed("height exceeds GIF limit"))?;

    let quantizer = build_palette(frames, plan.palette_size);
    let palette = quantizer.color_map_rgb();
    debug!("Built {}-color palette from {} frames", palette.len() / 3, frames.len());

    let delays = plan.frame_delays(frames.len());
    let mut cache = HashMap::new();
    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, gif_width, gif_height, &palette)
            .map_err(encoding_failed)?;

        let repeat = match plan.loop_count {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        };
        encoder.set_repeat(repeat).map_err(encoding_failed)?;

        for (frame, delay) in frames.iter().zip(&delays) {
            let gif_frame = gif::Frame {
                width: gif_width,
                height: gif_height,
                delay: *delay,
                buffer: Cow::Owned(index_frame(&quantizer, frame, &mut cache)),
                ..gif::Frame::default()
            };
            encoder.write_frame(&gif_frame).map_err(encoding_failed)?;
        }
    }

    let centiseconds: u64 = delays.iter().map(|d| *d as u64).sum();

    Ok(EncodedAnimation {
        bytes,
        width,
        height,
        frame_count: frames.len(),
        duration: centiseconds as f64 / 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Cursor;

    fn plan(frame_count: usize, loop_count: u16, palette_size: u16) -> AnimationPlan {
        AnimationPlan {
            duration: frame_count as f64 / 10.0,
            width: 16,
            height: 8,
            fps: 10.0,
            frame_count,
            loop_count,
            palette_size,
        }
    }

    /// Horizontal gradient that shifts every frame
    fn gradient_frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                let image = image::RgbImage::from_fn(16, 8, |x, y| {
                    image::Rgb([(x * 16) as u8, (y * 32) as u8, (i * 40) as u8])
                });
                Frame::new(image)
            })
            .collect()
    }

    fn netscape_loop_count(bytes: &[u8]) -> Option<u16> {
        let marker = b"NETSCAPE2.0";
        let start = bytes.windows(marker.len()).position(|w| w == marker)? + marker.len();
        // sub-block: size 3, id 1, little-endian count
        let block = bytes.get(start..start + 4)?;
        Some(u16::from_le_bytes([block[2], block[3]]))
    }

    #[test]
    fn test_gif_respects_palette_size() {
        let frames = gradient_frames(5);
        let encoded = encode_gif(&frames, &plan(5, 0, 8)).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(Cursor::new(&encoded.bytes)).unwrap();

        assert_eq!((decoder.width(), decoder.height()), (16, 8));
        let palette_entries = decoder.global_palette().unwrap().len() / 3;
        assert!(palette_entries <= 8);

        let mut used = HashSet::new();
        let mut decoded_frames = 0;
        let mut total_delay = 0u32;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            used.extend(frame.buffer.iter().copied());
            total_delay += frame.delay as u32;
            decoded_frames += 1;
        }

        assert_eq!(decoded_frames, 5);
        assert!(used.len() <= 8);
        assert_eq!(total_delay, 50);
        assert_eq!(encoded.duration, 0.5);
    }

    #[test]
    fn test_gif_odd_palette_size_limits_indices() {
        let frames = gradient_frames(3);
        let encoded = encode_gif(&frames, &plan(3, 0, 5)).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(Cursor::new(&encoded.bytes)).unwrap();

        let mut used = HashSet::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            used.extend(frame.buffer.iter().copied());
        }

        assert!(used.len() <= 5);
        assert!(used.iter().all(|&index| index < 5));
    }

    #[test]
    fn test_gif_loops_forever_by_default() {
        let encoded = encode_gif(&gradient_frames(2), &plan(2, 0, 16)).unwrap();
        assert_eq!(netscape_loop_count(&encoded.bytes), Some(0));
    }

    #[test]
    fn test_gif_finite_loop_count() {
        let encoded = encode_gif(&gradient_frames(2), &plan(2, 3, 16)).unwrap();
        assert_eq!(netscape_loop_count(&encoded.bytes), Some(3));
    }

    #[test]
    fn test_gif_is_deterministic() {
        let frames = gradient_frames(4);
        let first = encode_gif(&frames, &plan(4, 0, 32)).unwrap();
        let second = encode_gif(&frames, &plan(4, 0, 32)).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_gif_rejects_mismatched_frames() {
        let frames = vec![Frame::new_filled(4, 4, [0, 0, 0]), Frame::new_filled(5, 4, [0, 0, 0])];
        assert!(encode_gif(&frames, &plan(2, 0, 16)).is_err());
        assert!(encode_gif(&[], &plan(0, 0, 16)).is_err());
    }
}
