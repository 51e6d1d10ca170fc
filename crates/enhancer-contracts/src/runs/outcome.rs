use std::fmt;

use serde::{Deserialize, Serialize};

pub const OUTPUT_MIME: &str = "image/png";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputImage {
    pub final_url: Option<String>,
    pub final_path: String,
    pub final_filename: String,
    pub final_mime: String,
    pub final_width: u32,
    pub final_height: u32,
}

/// What one successful provider call produced. Only the image file is
/// persisted; this record lives as long as the caller keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub tokens_spent: u64,
    pub approx_price_usd: f64,
    pub usage: TokenUsage,
    pub data: OutputImage,
}

/// Stable machine-readable failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    FileNotFound,
    TransportError,
    UpstreamError,
    NoImageReturned,
    DecodeError,
    ImageDecodeError,
    ImageEncodeError,
    IoError,
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileNotFound => "file_not_found",
            Self::TransportError => "transport_error",
            Self::UpstreamError => "upstream_error",
            Self::NoImageReturned => "no_image_returned",
            Self::DecodeError => "decode_error",
            Self::ImageDecodeError => "image_decode_error",
            Self::ImageEncodeError => "image_encode_error",
            Self::IoError => "io_error",
            Self::ConfigError => "config_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform `{ok, message}` envelope handed back to the host.
///
/// Failures carry `code` next to the human message so callers can branch on
/// the kind without parsing `message`. Successes flatten the result fields
/// into the envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(flatten)]
    pub result: Option<ProcessResult>,
}

impl ProcessOutcome {
    pub fn success(result: ProcessResult) -> Self {
        Self {
            ok: true,
            message: None,
            code: None,
            result: Some(result),
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            code: Some(code),
            result: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub ok: bool,
}
