use std::path::Path;

use tracing::{debug, info};

use crate::capabilities::{Capabilities, FfmpegTools};
use crate::config::AnimationConfig;
use crate::error::Result;
use crate::video::animation::{encode_gif, EncodedAnimation};
use crate::video::decode::decode_frames;
use crate::video::probe::probe;
use crate::video::types::{AnimationPlan, VideoClip};

/// Turns short videos into looping GIFs
///
/// The pipeline is probe → plan → decode → quantise/encode. Each call owns its
/// frames; nothing is shared between clips.
pub struct Transcoder<'a> {
    tools: &'a FfmpegTools,
    config: &'a AnimationConfig,
}

impl<'a> Transcoder<'a> {
    /// Fails with `MissingCapability` when ffmpeg/ffprobe are absent
    pub fn new(capabilities: &'a Capabilities, config: &'a AnimationConfig) -> Result<Self> {
        let tools = capabilities.require_video()?;
        Ok(Self { tools, config })
    }

    /// Probe `path` and transcode it
    pub fn transcode_file(&self, path: &Path) -> Result<EncodedAnimation> {
        let clip = probe(self.tools, path)?;
        self.transcode(&clip)
    }

    /// Transcode an already probed clip
    pub fn transcode(&self, clip: &VideoClip) -> Result<EncodedAnimation> {
        let plan = AnimationPlan::new(clip, self.config)?;
        debug!(
            "Plan for {}: {:.2}s -> {:.2}s, {}x{} -> {}x{}, {:.2} -> {:.2}fps, {} frames",
            clip.path.display(),
            clip.duration,
            plan.duration,
            clip.width,
            clip.height,
            plan.width,
            plan.height,
            clip.fps,
            plan.fps,
            plan.frame_count
        );

        let frames = decode_frames(self.tools, clip, &plan)?;
        let animation = encode_gif(&frames, &plan)?;

        info!(
            "Encoded {} frames ({:.2}s) at {}x{}",
            animation.frame_count, animation.duration, animation.width, animation.height
        );
        Ok(animation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capability;
    use crate::error::ConvertError;
    use std::process::Command;
    use tempfile::tempdir;

    #[test]
    fn test_missing_ffmpeg_is_missing_capability() {
        let capabilities = Capabilities::none();
        let config = AnimationConfig::default();

        match Transcoder::new(&capabilities, &config) {
            Err(ConvertError::MissingCapability(Capability::VideoTranscode)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("transcoder built without ffmpeg"),
        }
    }

    #[test]
    fn test_transcode_generated_clip() {
        let tools = match FfmpegTools::discover() {
            Some(tools) => tools,
            None => return,
        };

        let dir = tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        let status = Command::new(&tools.ffmpeg)
            .args([
                "-v", "error", "-y",
                "-f", "lavfi", "-i", "testsrc=duration=3:size=320x240:rate=30",
                "-c:v", "mpeg4", "-pix_fmt", "yuv420p",
            ])
            .arg(&source)
            .status()
            .unwrap();
        if !status.success() {
            return;
        }

        let capabilities = Capabilities::none().with_video(Some(tools));
        let config = AnimationConfig {
            target_width: 160,
            fps: 10.0,
            max_duration: Some(2.0),
            loop_count: 0,
            palette_size: 64,
        };
        let transcoder = Transcoder::new(&capabilities, &config).unwrap();
        let animation = transcoder.transcode_file(&source).unwrap();

        assert_eq!((animation.width, animation.height), (160, 120));
        assert!(animation.frame_count <= 20);
        assert!(animation.frame_count >= 15);
        assert!(animation.duration <= 2.0 + 1e-9);
        assert!(animation.bytes.starts_with(b"GIF89a"));
    }
}
