//! magsnap extracts keypoints from raster images and indexes them for the
//! proximity queries behind magnetic drawing tools.
//!
//! A drawing tool submits an image to an [`IndexBuildPipeline`], keeps
//! handling input while detection runs on a background worker, and then
//! snaps pointer positions with [`KeypointIndex::neighbors`]. Corner
//! detection can run row-parallel via the `rayon` feature, the eigenvalue
//! stage can use SIMD via the `simd` feature, and `image-io` adds file
//! decoding helpers.

mod candidate;
pub mod detect;
pub mod image;
pub mod index;
pub mod keypoint;
pub mod lowlevel;
pub mod pipeline;
pub mod runtime;
mod trace;
pub mod util;
pub mod worker;

pub use detect::{detect, CornerParams, Detector, DetectorConfig, FastParams};
pub use image::{ImageView, LumaImage, PixelBuffer};
pub use index::KeypointIndex;
pub use keypoint::{KeypointSet, Point};
pub use pipeline::{BuildHandle, IndexBuildPipeline};
pub use util::{MagsnapError, MagsnapResult};
pub use worker::{DetectionWorker, PendingDetection, SubmissionToken};
