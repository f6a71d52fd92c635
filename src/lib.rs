//! # Gallery-Web
//!
//! Batch-convert a folder of photos and short clips into web-ready derivatives.
//!
//! Still images are decoded, turned upright, scaled down to a maximum width
//! and re-encoded in their own format family. Short MP4 clips become looping
//! GIF animations. Every file gets a result; one bad file never stops a run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gallery_web::{BatchDriver, BatchSummary, Capabilities, Config};
//!
//! # fn main() -> anyhow::Result<()> {
//! let driver = BatchDriver::new(Config::default(), Capabilities::probe())?;
//! let results = driver.run("Galerie", "Galerie_naweb")?;
//!
//! for result in &results {
//!     println!("{}", result);
//! }
//! println!("{}", BatchSummary::from_results(&results));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`assets`] - Extension-based classification of input files
//! - [`imaging`] - Still image normalization and per-family encoding
//! - [`video`] - Video probing, frame extraction and GIF encoding
//! - [`batch`] - Directory walking, worker pool and per-file results
//! - [`capabilities`] - Optional backends (HEIF, ffmpeg) detected at startup
//! - [`config`] - Configuration management

pub mod assets;
pub mod batch;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod imaging;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    assets::{Asset, AssetKind},
    batch::{BatchDriver, BatchSummary, ConversionResult, Outcome},
    capabilities::{Capabilities, Capability},
    config::Config,
    error::{ConvertError, Result},
};
