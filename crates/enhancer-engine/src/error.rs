use std::path::PathBuf;

use enhancer_contracts::runs::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnhanceError>;

/// Failures along the provider call path. None of them are retried.
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Input file not found or not readable: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read input file: {}", path.display())]
    EmptyInput { path: PathBuf },

    #[error("Gemini transport error: {0}")]
    Transport(String),

    #[error("Gemini API error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Gemini returned no image. Response: {response}")]
    NoImageReturned { response: String },

    #[error("Failed to base64-decode model image.")]
    Decode,

    #[error("Failed to decode image binary: {0}")]
    ImageDecode(String),

    #[error("Failed to encode PNG: {0}")]
    ImageEncode(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Config(String),
}

impl EnhanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FileNotFound { .. } | Self::EmptyInput { .. } => ErrorCode::FileNotFound,
            Self::Transport(_) => ErrorCode::TransportError,
            Self::Upstream { .. } => ErrorCode::UpstreamError,
            Self::NoImageReturned { .. } => ErrorCode::NoImageReturned,
            Self::Decode => ErrorCode::DecodeError,
            Self::ImageDecode(_) => ErrorCode::ImageDecodeError,
            Self::ImageEncode(_) => ErrorCode::ImageEncodeError,
            Self::Io { .. } => ErrorCode::IoError,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
