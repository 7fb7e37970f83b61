//! Error types for magsnap.

use thiserror::Error;

/// Result alias for magsnap operations.
pub type MagsnapResult<T> = std::result::Result<T, MagsnapError>;

/// Errors that can occur while extracting keypoints or building an index.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MagsnapError {
    /// Width or height is zero, or `width * height` overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The channel count is outside `1..=4`.
    #[error("invalid channel count: {channels} (expected 1..=4)")]
    InvalidChannels { channels: usize },
    /// The backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed} samples, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// An owned pixel buffer does not hold exactly `width * height * channels` samples.
    #[error("buffer size mismatch: expected {expected} samples, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },
    /// The stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// A detector parameter is out of range.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The detector broke while processing a submission.
    #[error("detection failed: {reason}")]
    DetectionFailure { reason: String },
    /// The background worker could not be started or is no longer running.
    #[error("detection worker unavailable: {reason}")]
    WorkerUnavailable { reason: String },
    /// Image decoding failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}

impl MagsnapError {
    /// Returns true for caller contract violations that are reported before
    /// any detection starts.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. }
                | Self::InvalidChannels { .. }
                | Self::BufferTooSmall { .. }
                | Self::BufferSizeMismatch { .. }
                | Self::InvalidStride { .. }
                | Self::InvalidInput(_)
        )
    }
}
