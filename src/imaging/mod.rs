//! # Still Image Pipeline
//!
//! Decode → orient → bound width ([`normalize`]), then re-encode per format
//! family ([`encode`]).

pub mod encode;
pub mod normalize;
pub mod types;

pub use encode::{encode, EncodeSpec, EncodedImage};
pub use normalize::{decode, fit_width, normalize, orient, scaled_height};
pub use types::Picture;
