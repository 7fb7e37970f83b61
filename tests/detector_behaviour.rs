use magsnap::{detect, CornerParams, DetectorConfig, FastParams, PixelBuffer, Point};

const SIZE: usize = 64;
const SQUARE_CORNERS: [(f32, f32); 4] = [(16.0, 16.0), (47.0, 16.0), (16.0, 47.0), (47.0, 47.0)];

/// Dark canvas with a bright filled square spanning `[16, 47]` on both axes.
fn square_image() -> PixelBuffer {
    let mut data = vec![0u8; SIZE * SIZE];
    for y in 16..48 {
        for x in 16..48 {
            data[y * SIZE + x] = 200;
        }
    }
    PixelBuffer::from_luma(data, SIZE, SIZE).unwrap()
}

fn textured_image(width: usize, height: usize) -> PixelBuffer {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let checker = ((x / 8) + (y / 8)) % 2 == 0;
            let ripple = ((x * 7 + y * 13) % 31) as u8;
            data[y * width + x] = if checker { 180 + ripple } else { 30 + ripple };
        }
    }
    PixelBuffer::from_luma(data, width, height).unwrap()
}

fn near_any_corner(p: &Point, tolerance: f32) -> bool {
    SQUARE_CORNERS
        .iter()
        .any(|&(cx, cy)| p.distance_to(cx, cy) <= tolerance)
}

fn assert_covers_square_corners(points: &[Point], tolerance: f32) {
    for p in points {
        assert!(near_any_corner(p, tolerance), "unexpected point {p:?}");
    }
    for &(cx, cy) in &SQUARE_CORNERS {
        assert!(
            points.iter().any(|p| p.distance_to(cx, cy) <= tolerance),
            "no point near ({cx}, {cy}) in {points:?}"
        );
    }
}

#[test]
fn flat_image_has_no_keypoints() {
    let buffer = PixelBuffer::from_luma(vec![90u8; 40 * 30], 40, 30).unwrap();
    for config in [
        DetectorConfig::default(),
        DetectorConfig::FastCorners(FastParams::default()),
    ] {
        assert!(detect(&buffer, &config).unwrap().is_empty());
    }
}

#[test]
fn corners_find_the_square_corners() {
    let keypoints = detect(&square_image(), &DetectorConfig::default()).unwrap();
    assert_eq!(keypoints.len(), 4, "{keypoints:?}");
    assert_covers_square_corners(keypoints.points(), 3.0);
}

#[test]
fn corners_emit_strongest_first_with_row_major_ties() {
    let params = CornerParams {
        max_points: 2,
        ..CornerParams::default()
    };
    let keypoints = detect(&square_image(), &DetectorConfig::Corners(params)).unwrap();
    assert_eq!(keypoints.len(), 2);
    // The four corners respond equally; the top row wins the tie.
    assert!(keypoints.points().iter().all(|p| p.y < 32.0));
}

#[test]
fn corners_respect_min_distance() {
    let params = CornerParams {
        max_points: 0,
        min_distance: 6.0,
        ..CornerParams::default()
    };
    let keypoints = detect(&textured_image(96, 80), &DetectorConfig::Corners(params)).unwrap();
    assert!(!keypoints.is_empty());
    let points = keypoints.points();
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            assert!(a.distance_to(b.x, b.y) >= 6.0, "{a:?} and {b:?} too close");
        }
    }
}

#[test]
fn corners_respect_max_points() {
    let unlimited = CornerParams {
        max_points: 0,
        min_distance: 2.0,
        ..CornerParams::default()
    };
    let limited = CornerParams {
        max_points: 5,
        ..unlimited.clone()
    };
    let buffer = textured_image(96, 80);
    let all = detect(&buffer, &DetectorConfig::Corners(unlimited)).unwrap();
    let few = detect(&buffer, &DetectorConfig::Corners(limited)).unwrap();
    assert!(all.len() > 5);
    assert_eq!(few.len(), 5);
    assert_eq!(few.points(), &all.points()[..5]);
}

#[test]
fn higher_quality_level_keeps_fewer_points() {
    let buffer = textured_image(96, 80);
    let loose = CornerParams {
        max_points: 0,
        quality_level: 0.01,
        min_distance: 2.0,
        ..CornerParams::default()
    };
    let strict = CornerParams {
        quality_level: 0.5,
        ..loose.clone()
    };
    let loose_count = detect(&buffer, &DetectorConfig::Corners(loose)).unwrap().len();
    let strict_count = detect(&buffer, &DetectorConfig::Corners(strict)).unwrap().len();
    assert!(strict_count <= loose_count);
}

#[test]
fn detection_is_deterministic() {
    let buffer = textured_image(72, 72);
    for config in [
        DetectorConfig::default(),
        DetectorConfig::FastCorners(FastParams::default()),
    ] {
        let first = detect(&buffer, &config).unwrap();
        let second = detect(&buffer, &config).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn fast_finds_the_square_corners() {
    let config = DetectorConfig::FastCorners(FastParams::default());
    let keypoints = detect(&square_image(), &config).unwrap();
    assert!(keypoints.len() >= 4);
    assert_covers_square_corners(keypoints.points(), 4.0);
}

#[test]
fn fast_threshold_above_contrast_finds_nothing() {
    let config = DetectorConfig::FastCorners(FastParams {
        threshold: 250,
        nonmax_suppression: true,
    });
    assert!(detect(&square_image(), &config).unwrap().is_empty());
}

#[test]
fn color_input_matches_its_luma() {
    let gray = square_image();
    let rgba: Vec<u8> = gray
        .data()
        .iter()
        .flat_map(|&v| [v, v, v, 255])
        .collect();
    let color = PixelBuffer::from_rgba(rgba, SIZE, SIZE).unwrap();
    let config = DetectorConfig::default();
    assert_eq!(
        detect(&gray, &config).unwrap(),
        detect(&color, &config).unwrap()
    );
}

#[test]
fn tiny_images_are_handled() {
    let buffer = PixelBuffer::from_luma(vec![0, 255, 255, 0], 2, 2).unwrap();
    for config in [
        DetectorConfig::default(),
        DetectorConfig::FastCorners(FastParams::default()),
    ] {
        assert!(detect(&buffer, &config).is_ok());
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let buffer = square_image();
    let bad = [
        CornerParams {
            quality_level: 0.0,
            ..CornerParams::default()
        },
        CornerParams {
            quality_level: 1.5,
            ..CornerParams::default()
        },
        CornerParams {
            min_distance: -1.0,
            ..CornerParams::default()
        },
        CornerParams {
            block_size: 0,
            ..CornerParams::default()
        },
    ];
    for params in bad {
        let err = detect(&buffer, &DetectorConfig::Corners(params)).unwrap_err();
        assert!(err.is_invalid_input(), "{err:?}");
    }
}
