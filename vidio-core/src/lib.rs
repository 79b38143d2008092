//! Vidio Core - video editing shortcuts built on the FFmpeg CLI
//!
//! This library turns high-level editing requests into FFmpeg invocations:
//! - Crop presets and manual crop regions, resize and scale arithmetic
//! - Grid layouts and filter-graph synthesis for concat/grid/GIF pipelines
//! - Stream-copy trimming and two-pass palette GIF conversion
//! - Media inspection and video file listings via ffprobe

pub mod commands;
pub mod config;
pub mod error;
pub mod ffmpeg_wrapper;
pub mod filter_graph;
pub mod filters;
pub mod format;
pub mod geometry;
pub mod presets;
pub mod probe;
pub mod report;

// Re-export commonly used types at the crate root
pub use commands::{Context, Outcome};
pub use config::Config;
pub use error::{Error, Result};
pub use ffmpeg_wrapper::{Engine, FFmpegCommand, FfmpegEngine, check_ffmpeg};
pub use filter_graph::{FilterChain, FilterGraph, GraphError};
pub use filters::{Dither, GifQuality};
pub use geometry::{Advisory, CropRegion, Dimensions, GridLayout, ScaleTarget};
pub use presets::CropPreset;
pub use report::{ConsoleReporter, MemoryReporter, Reporter};
