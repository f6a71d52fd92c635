//! # Asset Classification
//!
//! Maps a file extension to what the pipeline does with it. The allow-list is
//! fixed and case-insensitive; anything outside it is [`AssetKind::Unsupported`],
//! which is a normal outcome rather than an error.

pub mod types;

pub use types::{classify, Asset, AssetKind, ImageFamily, SourceFormat, ANIMATION_EXTENSION};
