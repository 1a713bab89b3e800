use image::ImageError;
use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum QRError {
    // Builder
    #[error("payload of {len} bytes does not fit in {capacity} data codewords once segment headers are added")]
    EncodingTooLarge { len: usize, capacity: usize },
    #[error("logo could not be decoded as an image")]
    InvalidLogoImage(#[source] ImageError),
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
    #[error("invalid size {0}, expected a positive pixel count")]
    InvalidSize(u32),
    #[error("invalid version {0}")]
    InvalidVersion(usize),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("failed to encode png")]
    Png(#[source] ImageError),

    // Reader
    #[error("input could not be decoded as an image")]
    InvalidImage(#[source] ImageError),
    #[error("symbol not found")]
    SymbolNotFound,
    #[error("cannot compute homography")]
    SingularMatrix,
    #[error("projected point is at infinity")]
    PointAtInfinity,
    #[error("invalid format info detected")]
    InvalidFormatInfo,
    #[error("too many errors to correct successfully")]
    TooManyErrors,
    #[error("invalid mode indicator {0:#06b}")]
    InvalidMode(u8),
    #[error("corrupt data segment")]
    CorruptDataSegment,
    #[error("invalid character encoding")]
    InvalidCharacterEncoding,
}

pub type QRResult<T> = Result<T, QRError>;
