//! Error types for xqmatch.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for xqmatch operations.
pub type XqResult<T> = std::result::Result<T, XqError>;

/// Errors that can occur while capturing, matching or encoding a board.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum XqError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is shorter than one row of pixels.
    #[error("invalid stride {stride} for a row of {row_len} elements")]
    InvalidStride { row_len: usize, stride: usize },
    /// Backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Region of interest does not fit inside the image.
    #[error("roi ({x}, {y}, {width}x{height}) exceeds image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The template cannot be correlated (e.g. it is flat).
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// A template file is missing or unreadable.
    #[error("failed to load template {}: {reason}", .path.display())]
    ImageLoad { path: PathBuf, reason: String },
    /// Writing an image to disk failed.
    #[error("failed to save image {}: {reason}", .path.display())]
    ImageSave { path: PathBuf, reason: String },
    /// The correlation itself could not run.
    #[error("template search failed: {reason}")]
    Match { reason: String },
    /// Two anchors produced a cell pitch below the accepted minimum.
    #[error("calibration rejected: cell pitch {pitch:.2}px is below {min}px")]
    CalibrationInvalid { pitch: f32, min: f32 },
    /// A mandatory anchor piece was not found.
    #[error("anchor piece `{piece}` not found")]
    AnchorNotFound { piece: &'static str },
    /// Capturing a window bitmap failed.
    #[error("capture failed: {reason}")]
    CaptureFailure { reason: String },
    /// No enumerated window hosts a recognizable board.
    #[error("no window with a recognizable board was found")]
    BoardNotFound,
    /// The operation needs a calibrated session.
    #[error("session is not calibrated")]
    NotCalibrated,
    /// Another recognition cycle holds the session.
    #[error("a capture cycle is already running for this session")]
    Busy,
    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,
}

impl XqError {
    /// Returns true for failures the host may simply retry on its next trigger.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            XqError::BoardNotFound
                | XqError::AnchorNotFound { .. }
                | XqError::CalibrationInvalid { .. }
                | XqError::CaptureFailure { .. }
                | XqError::Busy
                | XqError::Match { .. }
        )
    }
}
