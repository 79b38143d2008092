//! Error types for vidio operations

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::filter_graph::GraphError;

/// Result type alias for vidio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Frame axis, used when reporting which side of a region is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

/// The way a crop region violates the source frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundsViolation {
    /// Region collapsed to nothing on at least one axis.
    Empty { width: u32, height: u32 },
    /// `offset + size` runs past `limit` by `overflow` pixels.
    Exceeds {
        axis: Axis,
        offset: u32,
        size: u32,
        limit: u32,
        overflow: u32,
    },
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsViolation::Empty { width, height } => write!(
                f,
                "width and height must be positive, got {}x{}",
                width, height
            ),
            BoundsViolation::Exceeds {
                axis,
                offset,
                size,
                limit,
                overflow,
            } => write!(
                f,
                "region exceeds video {}: {} + {} > {} (over by {})",
                axis, offset, size, limit, overflow
            ),
        }
    }
}

/// vidio error type
#[derive(Error, Debug)]
pub enum Error {
    // Geometry errors
    #[error("Invalid video dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unknown preset: {name}. Valid presets: {valid}")]
    UnknownPreset { name: String, valid: String },

    #[error("Must specify --width and --height together, or use --preset")]
    MissingDimensions,

    #[error("Must specify at least one of: --width, --height, or --scale")]
    MissingScaleParams,

    #[error("Cannot use --scale together with --{0}")]
    ConflictingScaleParams(&'static str),

    #[error("Scale must be greater than {min} and at most {max}, got {factor}")]
    ScaleOutOfRange { factor: f64, min: f64, max: f64 },

    #[error("Crop {0}")]
    CropOutOfBounds(BoundsViolation),

    #[error("Grid size {rows}x{cols} ({cells} cells) cannot accommodate {items} videos")]
    GridTooSmall {
        rows: u32,
        cols: u32,
        cells: u64,
        items: usize,
    },

    #[error("At least {required} input videos are required, got {got}")]
    NotEnoughInputs { required: usize, got: usize },

    // Argument errors
    #[error("Invalid time '{0}': expected seconds, MM:SS or HH:MM:SS")]
    InvalidTime(String),

    #[error("Cannot specify both --end and --duration")]
    ConflictingTimeRange,

    #[error("Frame rate must be between {min} and {max}, got {fps}")]
    FrameRateOutOfRange { fps: u32, min: u32, max: u32 },

    #[error("Quality must be 'low', 'medium', 'high', or a number 1-10, got '{0}'")]
    InvalidQuality(String),

    #[error("Filter graph error: {0}")]
    Graph(#[from] GraphError),

    // Probe errors
    #[error("No video stream found in {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("Could not determine video dimensions of {}", .0.display())]
    DimensionsUnavailable(PathBuf),

    #[error("Failed to parse ffprobe output: {0}")]
    ProbeParse(#[from] serde_json::Error),

    // Engine errors
    #[error("{0} not found in PATH. Install FFmpeg from https://ffmpeg.org/download.html")]
    EngineNotFound(String),

    #[error("{program} failed with exit code {code:?}: {stderr}")]
    ExternalEngineFailure {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output from {program}: {output:?}")]
    UnexpectedOutput { program: String, output: String },

    #[error("Output file was not created: {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an overflow on one axis.
    pub(crate) fn exceeds(axis: Axis, offset: u32, size: u32, limit: u32) -> Self {
        let end = u64::from(offset) + u64::from(size);
        let overflow = end.saturating_sub(u64::from(limit)) as u32;
        Error::CropOutOfBounds(BoundsViolation::Exceeds {
            axis,
            offset,
            size,
            limit,
            overflow,
        })
    }
}
