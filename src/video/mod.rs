//! # Video Processing Module
//!
//! Turns short MP4 clips into looping GIF animations: ffprobe for stream
//! facts, ffmpeg for trimming/scaling/frame-rate reduction, and an in-process
//! palette quantiser plus GIF encoder for the output.

pub mod animation;
pub mod decode;
pub mod probe;
pub mod transcode;
pub mod types;

pub use animation::{encode_gif, EncodedAnimation};
pub use transcode::Transcoder;
pub use types::{AnimationPlan, Frame, VideoClip};
