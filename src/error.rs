//! Error types shared by the document and print pipeline.

use thiserror::Error;

/// TLV encode/decode failures for the ZATCA QR payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TlvError {
    #[error("TLV tag {tag} value is {len} bytes (max 255)")]
    ValueTooLong { tag: u8, len: usize },
    #[error("TLV payload is not valid base64: {0}")]
    Base64(String),
    #[error("TLV record for tag {tag} is truncated")]
    Truncated { tag: u8 },
    #[error("unexpected TLV tag {found} (expected {expected})")]
    UnexpectedTag { expected: u8, found: u8 },
    #[error("TLV payload is missing tag {0}")]
    MissingTag(u8),
    #[error("TLV tag {0} value is not valid UTF-8")]
    InvalidUtf8(u8),
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR encode error: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("QR image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Why a presenter could not show a document.
#[derive(Debug, Error)]
pub enum PresentError {
    /// No window could be opened (no browser, headless session, blocked).
    #[error("print window blocked: {0}")]
    Blocked(String),
    #[error("print artifact io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Tlv(#[from] TlvError),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
