//! Image-to-index pipeline used by drawing tools.
//!
//! `IndexBuildPipeline::build` hands a pixel buffer to the background worker
//! and returns a [`BuildHandle`] straight away. The caller services the handle
//! from its own loop (`poll`) or blocks on it (`wait`); either way it receives
//! a ready-to-query [`KeypointIndex`] or the error for that submission only.

use crate::detect::{Detector, DetectorConfig};
use crate::image::PixelBuffer;
use crate::index::KeypointIndex;
use crate::util::MagsnapResult;
use crate::worker::{DetectionWorker, PendingDetection, SubmissionToken};

/// Turns images into keypoint indices off the caller's thread.
#[derive(Debug)]
pub struct IndexBuildPipeline {
    worker: DetectionWorker,
    latest: Option<SubmissionToken>,
}

impl IndexBuildPipeline {
    /// Creates a pipeline running the configured detector.
    ///
    /// Parameter errors are reported here, before any image is submitted.
    pub fn new(config: DetectorConfig) -> MagsnapResult<Self> {
        config.validate()?;
        Self::with_detector(config)
    }

    /// Creates a pipeline around a caller-supplied detector.
    pub fn with_detector<D>(detector: D) -> MagsnapResult<Self>
    where
        D: Detector + 'static,
    {
        Ok(Self {
            worker: DetectionWorker::spawn(detector)?,
            latest: None,
        })
    }

    /// Submits `buffer` and returns a handle to the eventual index.
    ///
    /// Never waits for detection. The submission becomes the pipeline's
    /// latest one; see [`is_latest`](Self::is_latest).
    pub fn build(&mut self, buffer: PixelBuffer) -> MagsnapResult<BuildHandle> {
        let pending = self.worker.submit(buffer)?;
        self.latest = Some(pending.token());
        Ok(BuildHandle { pending })
    }

    /// True when `token` belongs to the most recent submission. Results for
    /// older submissions are stale and should be dropped by the caller.
    pub fn is_latest(&self, token: SubmissionToken) -> bool {
        self.latest == Some(token)
    }

    /// Token of the most recent submission, if any.
    pub fn latest_token(&self) -> Option<SubmissionToken> {
        self.latest
    }

    /// Name of the detector the pipeline runs.
    pub fn detector_name(&self) -> &'static str {
        self.worker.detector_name()
    }
}

/// Pending index for one submitted image.
#[derive(Debug)]
pub struct BuildHandle {
    pending: PendingDetection,
}

impl BuildHandle {
    /// Token of the submission behind this handle.
    pub fn token(&self) -> SubmissionToken {
        self.pending.token()
    }

    /// Returns the index once detection has finished, without blocking.
    ///
    /// Yields `Some` exactly once.
    pub fn poll(&mut self) -> Option<MagsnapResult<KeypointIndex>> {
        self.pending
            .poll()
            .map(|result| result.map(KeypointIndex::new))
    }

    /// Blocks until the index is ready.
    pub fn wait(self) -> MagsnapResult<KeypointIndex> {
        self.pending.wait().map(KeypointIndex::new)
    }
}
