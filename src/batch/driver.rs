use std::collections::HashMap;
use std::ffi::OsString;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    assets::{Asset, AssetKind, SourceFormat},
    capabilities::Capabilities,
    config::Config,
    error::{ConvertError, DecodeError, EncodeError, Result},
    imaging::{self, EncodeSpec},
    video::Transcoder,
};

use super::report::{BatchSummary, ConversionResult};

/// Reason reported for files outside the allow-list
pub const UNSUPPORTED_REASON: &str = "unsupported type";

/// Reason reported for dot-files when `batch.skip_hidden` is set
pub const HIDDEN_REASON: &str = "hidden file";

/// Converts every supported file of a directory into a web derivative
///
/// The driver follows a simple pipeline per run:
/// 1. Provisioning - Create the output directory (and the input one on first run)
/// 2. Discovery - List regular files of the input directory, no recursion
/// 3. Conversion - Classify and convert each asset on a bounded worker pool
/// 4. Reporting - Return one result per file, sorted by source path
///
/// A failure on one asset is recorded and never stops the others. When two
/// sources map to the same output name (`a.jpg` and `a.jpeg`), the first in
/// path order is converted and the rest are skipped, so no two workers ever
/// write the same file.
pub struct BatchDriver {
    config: Config,
    capabilities: Capabilities,
}

impl BatchDriver {
    /// Create a driver; the configuration is validated here, before any work
    pub fn new(config: Config, capabilities: Capabilities) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, capabilities })
    }

    /// Convert everything in `input_dir` into `output_dir`
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Q,
    ) -> Result<Vec<ConversionResult>> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();

        info!("Starting gallery conversion");
        info!("   Input: {:?}", input_dir);
        info!("   Output: {:?}", output_dir);

        std::fs::create_dir_all(output_dir)?;

        if !input_dir.exists() {
            std::fs::create_dir_all(input_dir)?;
            info!("Created empty input directory {:?}; add files and run again", input_dir);
            return Ok(Vec::new());
        }

        let assets = self.discover_assets(input_dir)?;
        info!("Found {} files", assets.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.batch.workers)
            .thread_name(|index| format!("convert-{}", index))
            .build()
            .map_err(|e| ConvertError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        let collisions = self.output_collisions(&assets);

        let mut results: Vec<ConversionResult> = pool.install(|| {
            assets
                .par_iter()
                .map(|asset| match collisions.get(&asset.path) {
                    Some(owner) => {
                        let reason = format!("output name collides with {}", owner.name());
                        info!("- {} skipped: {}", asset.name(), reason);
                        ConversionResult::skipped(asset.path.clone(), reason)
                    }
                    None => self.process_asset(asset, output_dir),
                })
                .collect()
        });
        results.sort_by(|a, b| a.source.cmp(&b.source));

        let summary = BatchSummary::from_results(&results);
        info!("Conversion complete: {}", summary);

        Ok(results)
    }

    /// Regular files directly inside `input_dir`, sorted by path
    pub fn discover_assets(&self, input_dir: &Path) -> Result<Vec<Asset>> {
        let mut assets = Vec::new();

        for entry in std::fs::read_dir(input_dir)? {
            let path = entry?.path();

            if !path.is_file() {
                debug!("Skipping non-file entry {:?}", path);
                continue;
            }

            assets.push(Asset::new(path));
        }

        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }

    /// Map each asset that lost its output name to the asset that keeps it
    ///
    /// `assets` must be sorted by path; the first claimant of a name wins.
    pub fn output_collisions<'a>(&self, assets: &'a [Asset]) -> HashMap<PathBuf, &'a Asset> {
        let mut owners: HashMap<OsString, &Asset> = HashMap::new();
        let mut collisions = HashMap::new();

        for asset in assets.iter().filter(|asset| self.skip_reason(asset).is_none()) {
            let Some(name) = asset.output_file_name() else {
                continue;
            };

            match owners.get(&name) {
                Some(owner) => {
                    debug!("{} and {} both map to {:?}", owner.name(), asset.name(), name);
                    collisions.insert(asset.path.clone(), *owner);
                }
                None => {
                    owners.insert(name, asset);
                }
            }
        }

        collisions
    }

    /// Why an asset is left alone without attempting a conversion
    fn skip_reason(&self, asset: &Asset) -> Option<&'static str> {
        if self.config.batch.skip_hidden && is_hidden_file(&asset.path) {
            Some(HIDDEN_REASON)
        } else if asset.kind == AssetKind::Unsupported {
            Some(UNSUPPORTED_REASON)
        } else {
            None
        }
    }

    /// Run one asset to completion and turn any failure into a result
    pub fn process_asset(&self, asset: &Asset, output_dir: &Path) -> ConversionResult {
        if let Some(reason) = self.skip_reason(asset) {
            info!("- {} skipped: {}", asset.name(), reason);
            return ConversionResult::skipped(asset.path.clone(), reason);
        }

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.convert(asset, output_dir)));
        let outcome = match attempt {
            Ok(outcome) => outcome,
            Err(payload) => Err(ConvertError::Internal(panic_message(payload.as_ref()))),
        };

        match outcome {
            Ok(output) => {
                info!("✓ {} → {}", asset.name(), output.display());
                ConversionResult::success(asset.path.clone(), output)
            }
            Err(error) => {
                warn!("✗ {} failed: {}", asset.name(), error);
                ConversionResult::failed(asset.path.clone(), error)
            }
        }
    }

    fn convert(&self, asset: &Asset, output_dir: &Path) -> Result<PathBuf> {
        let file_name = asset.output_file_name().ok_or_else(|| EncodeError::WriteFailed {
            path: asset.path.display().to_string(),
            reason: "no output name for this file".to_string(),
        })?;
        let output = output_dir.join(file_name);

        let bytes = match asset.kind {
            AssetKind::Image(format) => self.convert_image(asset, format)?,
            AssetKind::Video => self.convert_video(asset)?,
            AssetKind::Unsupported => {
                return Err(ConvertError::Internal(format!("{} has no converter", asset.name())))
            }
        };

        write_output(&output, &bytes)?;
        Ok(output)
    }

    fn convert_image(&self, asset: &Asset, format: SourceFormat) -> Result<Vec<u8>> {
        debug!("Converting image {}", asset.name());

        let raw = std::fs::read(&asset.path).map_err(|_| DecodeError::ReadFailed {
            path: asset.path.display().to_string(),
        })?;

        let picture = imaging::normalize(
            &raw,
            format,
            self.config.image.max_width,
            &self.capabilities,
        )?;

        let spec = EncodeSpec::for_source(format, &self.config.image);
        let encoded = imaging::encode(&picture, &spec)?;
        Ok(encoded.bytes)
    }

    fn convert_video(&self, asset: &Asset) -> Result<Vec<u8>> {
        debug!("Transcoding video {}", asset.name());

        let transcoder = Transcoder::new(&self.capabilities, &self.config.animation)?;
        let animation = transcoder.transcode_file(&asset.path)?;
        Ok(animation.bytes)
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| {
        EncodeError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
