use thiserror::Error;

use crate::capabilities::Capability;

/// Main error type for the gallery converter
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing capability: {0}")]
    MissingCapability(Capability),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion aborted unexpectedly: {0}")]
    Internal(String),
}

/// Source bytes could not be turned into pixels
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read source file: {path}")]
    ReadFailed { path: String },

    #[error("Unrecognized image data for {format}: {reason}")]
    Corrupt { format: String, reason: String },
}

/// Encoding or writing an output failed
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("{format} encoding failed: {reason}")]
    Failed { format: String, reason: String },

    #[error("Failed to write output file: {path} - {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Video probing, decoding, or animation encoding failed
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Probing video failed: {reason}")]
    ProbeFailed { reason: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Video contains no decodable frames: {path}")]
    NoFrames { path: String },

    #[error("Animation encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path} - {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ConvertError
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Only configuration problems stop a run; everything else is per-asset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCapability(capability) => {
                format!("{} is not available. {}", capability, capability.install_hint())
            }
            Self::Decode(DecodeError::Corrupt { format, .. }) => {
                format!("File is not a readable {} image.", format)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        let config: ConvertError = ConfigError::InvalidValue {
            key: "image.quality".to_string(),
            value: "101".to_string(),
        }
        .into();
        assert!(config.is_fatal());

        let decode: ConvertError = DecodeError::Corrupt {
            format: "jpeg".to_string(),
            reason: "truncated".to_string(),
        }
        .into();
        assert!(!decode.is_fatal());
        assert!(!ConvertError::MissingCapability(Capability::VideoTranscode).is_fatal());
    }

    #[test]
    fn test_missing_capability_message_names_capability() {
        let err = ConvertError::MissingCapability(Capability::HeifDecode);
        let message = err.user_message();
        assert!(message.contains("HEIC/HEIF decoding"));
        assert!(err.to_string().contains("HEIC/HEIF decoding"));
    }
}
