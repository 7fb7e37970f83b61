//! Low-level building blocks for custom detectors.
//!
//! These expose the response maps and candidate pruning the built-in
//! strategies are made of. Most users should go through
//! [`IndexBuildPipeline`](crate::IndexBuildPipeline) instead.

pub use crate::candidate::nms::suppress_min_distance;
pub use crate::candidate::Corner;
pub use crate::detect::{corner_response, fast_scores};
pub use crate::runtime::{runtime, DetectorRuntime};
