use clap::Parser;
use magsnap::image::io::load_pixel_buffer;
use magsnap::{CornerParams, DetectorConfig, FastParams, IndexBuildPipeline, Point};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "magsnap CLI: keypoints and snapping queries (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CornerConfigJson {
    max_points: usize,
    quality_level: f32,
    min_distance: f32,
    block_size: usize,
    parallel: bool,
}

impl Default for CornerConfigJson {
    fn default() -> Self {
        let cfg = CornerParams::default();
        Self {
            max_points: cfg.max_points,
            quality_level: cfg.quality_level,
            min_distance: cfg.min_distance,
            block_size: cfg.block_size,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
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

#[derive(Debug, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
enum DetectorConfigJson {
    Corners(CornerConfigJson),
    FastCorners(FastConfigJson),
}

impl Default for DetectorConfigJson {
    fn default() -> Self {
        Self::Corners(CornerConfigJson::default())
    }
}

impl From<DetectorConfigJson> for DetectorConfig {
    fn from(value: DetectorConfigJson) -> Self {
        match value {
            DetectorConfigJson::Corners(cfg) => DetectorConfig::Corners(CornerParams {
                max_points: cfg.max_points,
                quality_level: cfg.quality_level,
                min_distance: cfg.min_distance,
                block_size: cfg.block_size,
                parallel: cfg.parallel,
            }),
            DetectorConfigJson::FastCorners(cfg) => DetectorConfig::FastCorners(FastParams {
                threshold: cfg.threshold,
                nonmax_suppression: cfg.nonmax_suppression,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryJson {
    x: f32,
    y: f32,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    max_distance: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    output_path: Option<String>,
    detector: DetectorConfigJson,
    queries: Vec<QueryJson>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            output_path: None,
            detector: DetectorConfigJson::default(),
            queries: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRecord {
    x: f32,
    y: f32,
    neighbors: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
struct Output {
    detector: &'static str,
    width: usize,
    height: usize,
    keypoints: Vec<[f32; 2]>,
    queries: Vec<QueryRecord>,
}

fn to_pair(p: &Point) -> [f32; 2] {
    [p.x, p.y]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("magsnap=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }

    let buffer = load_pixel_buffer(&config.image_path)?;
    let (width, height) = (buffer.width(), buffer.height());

    let mut pipeline = IndexBuildPipeline::new(config.detector.into())?;
    let detector = pipeline.detector_name();
    let index = pipeline.build(buffer)?.wait()?;
    tracing::info!(keypoints = index.len(), "index ready");

    let queries = config
        .queries
        .iter()
        .map(|q| QueryRecord {
            x: q.x,
            y: q.y,
            neighbors: index
                .neighbors(q.x, q.y, q.max_results, q.max_distance)
                .iter()
                .map(to_pair)
                .collect(),
        })
        .collect();
    let output = Output {
        detector,
        width,
        height,
        keypoints: index.list_all().iter().map(to_pair).collect(),
        queries,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
