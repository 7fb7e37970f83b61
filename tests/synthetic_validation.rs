//! Fixture-driven checks of the full image-to-snapping path.
//!
//! Each case in `tests/fixtures/snapping_cases.json` describes a canvas made
//! of filled rectangles, the detector configuration, where the rectangle
//! corners are, and a few pointer queries with the point they should snap to
//! (or none, when the query is expected to come back empty).

use magsnap::{
    CornerParams, DetectorConfig, FastParams, IndexBuildPipeline, KeypointIndex, PixelBuffer,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Position tolerance in pixels.
const POSITION_TOLERANCE_PX: f32 = 3.0;

#[derive(Debug, Deserialize)]
struct Rect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    value: u8,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct CornerConfigJson {
    max_points: usize,
    quality_level: f32,
    min_distance: f32,
    block_size: usize,
}

impl Default for CornerConfigJson {
    fn default() -> Self {
        let cfg = CornerParams::default();
        Self {
            max_points: cfg.max_points,
            quality_level: cfg.quality_level,
            min_distance: cfg.min_distance,
            block_size: cfg.block_size,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct FastConfigJson {
    threshold: u8,
    nonmax_suppression: bool,
}

impl Default for FastConfigJson {
    fn default() -> Self {
        let cfg = FastParams::default();
        Self {
            threshold: cfg.threshold,
            nonmax_suppression: cfg.nonmax_suppression,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
enum DetectorJson {
    Corners(CornerConfigJson),
    FastCorners(FastConfigJson),
}

impl From<DetectorJson> for DetectorConfig {
    fn from(value: DetectorJson) -> Self {
        match value {
            DetectorJson::Corners(cfg) => DetectorConfig::Corners(CornerParams {
                max_points: cfg.max_points,
                quality_level: cfg.quality_level,
                min_distance: cfg.min_distance,
                block_size: cfg.block_size,
                parallel: false,
            }),
            DetectorJson::FastCorners(cfg) => DetectorConfig::FastCorners(FastParams {
                threshold: cfg.threshold,
                nonmax_suppression: cfg.nonmax_suppression,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Query {
    x: f32,
    y: f32,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    max_distance: Option<f32>,
    /// Expected snap target; absent means "no result".
    #[serde(default)]
    nearest: Option<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
struct Case {
    case_id: String,
    width: usize,
    height: usize,
    background: u8,
    rects: Vec<Rect>,
    detector: DetectorJson,
    #[serde(default)]
    tolerance_px: Option<f32>,
    expected_corners: Vec<[f32; 2]>,
    queries: Vec<Query>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    cases: Vec<Case>,
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("snapping_cases.json")
}

fn render(case: &Case) -> PixelBuffer {
    let mut data = vec![case.background; case.width * case.height];
    for rect in &case.rects {
        for y in rect.y..rect.y + rect.h {
            let row = &mut data[y * case.width..(y + 1) * case.width];
            row[rect.x..rect.x + rect.w].fill(rect.value);
        }
    }
    PixelBuffer::from_luma(data, case.width, case.height).unwrap()
}

fn check_corners(case: &Case, index: &KeypointIndex, tolerance: f32) {
    let points = index.list_all();
    for p in points {
        assert!(
            case.expected_corners
                .iter()
                .any(|&[cx, cy]| p.distance_to(cx, cy) <= tolerance),
            "{}: unexpected keypoint {p:?}",
            case.case_id
        );
    }
    for &[cx, cy] in &case.expected_corners {
        assert!(
            points.iter().any(|p| p.distance_to(cx, cy) <= tolerance),
            "{}: corner ({cx}, {cy}) missed",
            case.case_id
        );
    }
}

fn check_queries(case: &Case, index: &KeypointIndex, tolerance: f32) {
    for query in &case.queries {
        let hits = index.neighbors(query.x, query.y, query.max_results, query.max_distance);
        if let Some(k) = query.max_results {
            assert!(hits.len() <= k, "{}: too many results", case.case_id);
        }
        let distances: Vec<f32> = hits.iter().map(|p| p.distance_to(query.x, query.y)).collect();
        assert!(
            distances.windows(2).all(|w| w[0] <= w[1]),
            "{}: results out of order",
            case.case_id
        );

        match query.nearest {
            Some([ex, ey]) => {
                let first = hits.first().unwrap_or_else(|| {
                    panic!("{}: query {query:?} returned nothing", case.case_id)
                });
                assert!(
                    first.distance_to(ex, ey) <= tolerance,
                    "{}: query {query:?} snapped to {first:?}",
                    case.case_id
                );
            }
            None if query.max_distance.is_some() || case.expected_corners.is_empty() => {
                assert!(
                    hits.is_empty(),
                    "{}: query {query:?} expected nothing, got {hits:?}",
                    case.case_id
                );
            }
            None => {}
        }
    }
}

#[test]
fn synthetic_snapping_cases() {
    let text = fs::read_to_string(fixture_path()).unwrap();
    let fixture: Fixture = serde_json::from_str(&text).unwrap();
    assert!(!fixture.cases.is_empty());

    for case in fixture.cases {
        let buffer = render(&case);
        let tolerance = case.tolerance_px.unwrap_or(POSITION_TOLERANCE_PX);
        let config: DetectorConfig = case.detector.clone().into();

        let mut pipeline = IndexBuildPipeline::new(config).unwrap();
        let index = pipeline.build(buffer).unwrap().wait().unwrap();

        check_corners(&case, &index, tolerance);
        check_queries(&case, &index, tolerance);
    }
}
