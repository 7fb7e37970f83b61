//! Feature detectors that turn a luminance image into a keypoint set.
//!
//! Two strategies are available and selected at construction time through
//! [`DetectorConfig`]:
//!
//! - [`CornerParams`]: minimum-eigenvalue ("good features to track") corners
//!   with a relative quality threshold and a minimum separation. This is the
//!   default and handles dense feature fields with large point budgets.
//! - [`FastParams`]: the FAST-9 segment test with a single intensity threshold,
//!   cheaper and coarser.
//!
//! Detection is deterministic: identical input and configuration always yield
//! identical points in identical order.

use crate::image::{ImageView, PixelBuffer};
use crate::keypoint::KeypointSet;
use crate::util::{MagsnapError, MagsnapResult};

pub(crate) mod corners;
mod eigen;
pub(crate) mod fast;

pub use corners::corner_response;
pub use fast::fast_scores;

/// Keypoint detection strategy.
///
/// Implementations must be pure with respect to their input: no hidden state
/// may influence the output. The background worker shares a detector across
/// submissions, hence the `Send + Sync` bound.
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Detects keypoints in a single-channel image.
    fn detect(&self, image: ImageView<'_, u8>) -> MagsnapResult<KeypointSet>;

    /// Converts `buffer` to luminance and runs [`Detector::detect`].
    fn detect_buffer(&self, buffer: &PixelBuffer) -> MagsnapResult<KeypointSet> {
        let luma = buffer.to_luma();
        self.detect(luma.view())
    }
}

/// Parameters for minimum-eigenvalue corner detection.
#[derive(Clone, Debug, PartialEq)]
pub struct CornerParams {
    /// Upper bound on retained keypoints; `0` means unlimited.
    pub max_points: usize,
    /// Minimum corner quality relative to the strongest response, in `(0, 1]`.
    pub quality_level: f32,
    /// Minimum Euclidean separation in pixels between retained keypoints.
    pub min_distance: f32,
    /// Side of the window over which derivative products are summed.
    pub block_size: usize,
    /// Compute the response rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for CornerParams {
    fn default() -> Self {
        Self {
            max_points: 5000,
            quality_level: 0.01,
            min_distance: 10.0,
            block_size: 3,
            parallel: false,
        }
    }
}

impl CornerParams {
    /// Checks parameter ranges.
    pub fn validate(&self) -> MagsnapResult<()> {
        if !self.quality_level.is_finite() || self.quality_level <= 0.0 || self.quality_level > 1.0
        {
            return Err(MagsnapError::InvalidInput(
                "quality_level must be in (0, 1]",
            ));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(MagsnapError::InvalidInput(
                "min_distance must be finite and non-negative",
            ));
        }
        if self.block_size == 0 {
            return Err(MagsnapError::InvalidInput("block_size must be at least 1"));
        }
        Ok(())
    }
}

/// Parameters for FAST-9 corner detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastParams {
    /// Intensity difference a circle pixel must exceed to count as brighter
    /// or darker than the centre.
    pub threshold: u8,
    /// Keep only strict 3x3 maxima of the corner score.
    pub nonmax_suppression: bool,
}

impl Default for FastParams {
    fn default() -> Self {
        Self {
            threshold: 20,
            nonmax_suppression: true,
        }
    }
}

/// Detector strategy selected by configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectorConfig {
    /// Minimum-eigenvalue corners.
    Corners(CornerParams),
    /// FAST-9 segment-test corners.
    FastCorners(FastParams),
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::Corners(CornerParams::default())
    }
}

impl DetectorConfig {
    /// Checks the selected strategy's parameters.
    pub fn validate(&self) -> MagsnapResult<()> {
        match self {
            Self::Corners(params) => params.validate(),
            Self::FastCorners(_) => Ok(()),
        }
    }
}

impl Detector for CornerParams {
    fn name(&self) -> &'static str {
        "corners"
    }

    fn detect(&self, image: ImageView<'_, u8>) -> MagsnapResult<KeypointSet> {
        self.validate()?;
        corners::detect_corners(image, self)
    }
}

impl Detector for FastParams {
    fn name(&self) -> &'static str {
        "fast_corners"
    }

    fn detect(&self, image: ImageView<'_, u8>) -> MagsnapResult<KeypointSet> {
        Ok(fast::detect_fast(image, self))
    }
}

impl Detector for DetectorConfig {
    fn name(&self) -> &'static str {
        match self {
            Self::Corners(params) => params.name(),
            Self::FastCorners(params) => params.name(),
        }
    }

    fn detect(&self, image: ImageView<'_, u8>) -> MagsnapResult<KeypointSet> {
        match self {
            Self::Corners(params) => params.detect(image),
            Self::FastCorners(params) => params.detect(image),
        }
    }
}

/// Runs the configured detector over a pixel buffer on the calling thread.
pub fn detect(buffer: &PixelBuffer, config: &DetectorConfig) -> MagsnapResult<KeypointSet> {
    config.detect_buffer(buffer)
}
