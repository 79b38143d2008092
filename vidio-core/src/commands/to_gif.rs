//! Animated GIF conversion.
//!
//! The default path runs FFmpeg twice: the first pass computes an optimal
//! palette into a temporary PNG, the second maps the frames onto it. The
//! palette file lives in a [`TempPath`] and is removed when it drops, on
//! success and failure alike.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::commands::trim::TimeRange;
use crate::commands::{Context, Outcome};
use crate::error::{Error, Result};
use crate::ffmpeg_wrapper::FFmpegCommand;
use crate::filters::{Dither, GifQuality, gif_base_chain, palette_gen_chain, palette_use_graph};
use crate::format::format_megabytes;
use crate::geometry::{GIF_SCALE_BOUNDS, ScaleTarget, resolve_gif_scale};

pub const FPS_RANGE: RangeInclusive<u32> = 1..=30;
pub const DEFAULT_FPS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ToGifOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fps: u32,
    pub width: Option<u32>,
    pub scale: Option<f64>,
    pub quality: GifQuality,
    pub start: String,
    pub end: Option<String>,
    pub duration: Option<String>,
    /// Loop count written to the GIF, 0 loops forever
    pub loop_count: u32,
    pub dither: Dither,
    /// Two-pass palette conversion
    pub optimize: bool,
    pub overwrite: bool,
}

impl ToGifOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            fps: DEFAULT_FPS,
            width: None,
            scale: None,
            quality: GifQuality::Medium,
            start: "0".to_string(),
            end: None,
            duration: None,
            loop_count: 0,
            dither: Dither::default(),
            optimize: true,
            overwrite: false,
        }
    }

    /// Checks that need no probing; returns the seek range
    pub fn validate(&self) -> Result<TimeRange> {
        if !FPS_RANGE.contains(&self.fps) {
            return Err(Error::FrameRateOutOfRange {
                fps: self.fps,
                min: *FPS_RANGE.start(),
                max: *FPS_RANGE.end(),
            });
        }
        let range = TimeRange::parse(&self.start, self.end.as_deref(), self.duration.as_deref())?;
        if self.width.is_some() && self.scale.is_some() {
            return Err(Error::ConflictingScaleParams("width"));
        }
        if let Some(factor) = self.scale {
            GIF_SCALE_BOUNDS.check(factor)?;
        }
        if self.width == Some(0) {
            return Err(Error::InvalidDimensions {
                width: 0,
                height: 0,
            });
        }
        Ok(range)
    }

    fn describe(&self) -> String {
        if let Some(factor) = self.scale {
            format!("Converting to GIF with {}x scale at {} fps", factor, self.fps)
        } else if let Some(width) = self.width {
            format!("Converting to GIF with width {}px at {} fps", width, self.fps)
        } else {
            format!("Converting to GIF at original size with {} fps", self.fps)
        }
    }
}

/// The FFmpeg invocations for one conversion
#[derive(Debug, Clone)]
pub enum GifPlan {
    SinglePass(FFmpegCommand),
    /// Palette generation, then palette mapping
    TwoPass {
        palette: FFmpegCommand,
        apply: FFmpegCommand,
    },
}

/// Build the conversion; a `palette` path selects the two-pass plan.
pub fn build(
    options: &ToGifOptions,
    range: &TimeRange,
    target: &ScaleTarget,
    palette: Option<&Path>,
) -> Result<GifPlan> {
    let base = gif_base_chain(options.fps, target);
    let seek = range.args();
    let loop_args = ["-loop".to_string(), options.loop_count.to_string()];

    let Some(palette) = palette else {
        return Ok(GifPlan::SinglePass(
            FFmpegCommand::new(&options.output)
                .input_with(&options.input, seek)
                .video_filter(&base)
                .output_args(loop_args),
        ));
    };

    let generate = FFmpegCommand::new(palette)
        .input_with(&options.input, seek.clone())
        .video_filter(&palette_gen_chain(&base, options.quality))
        .overwrite(true);
    let apply = FFmpegCommand::new(&options.output)
        .input_with(&options.input, seek)
        .input(palette)
        .filter_graph(&palette_use_graph(&base, options.dither)?)?
        .output_args(loop_args);
    Ok(GifPlan::TwoPass {
        palette: generate,
        apply,
    })
}

fn palette_file() -> Result<TempPath> {
    let file = tempfile::Builder::new()
        .prefix("vidio-palette-")
        .suffix(".png")
        .tempfile()?;
    Ok(file.into_temp_path())
}

pub fn run(options: &ToGifOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let range = options.validate()?;

    let Some(overwrite) = ctx.claim_output(&options.output, options.overwrite) else {
        return Ok(Outcome::Aborted);
    };

    let source = ctx.probe_dimensions(&options.input)?;
    let target = resolve_gif_scale(options.width, options.scale, source)?;

    ctx.reporter.info(&options.describe());

    let palette = if options.optimize {
        ctx.reporter
            .info("Using two-pass conversion with palette optimization...");
        Some(palette_file()?)
    } else {
        ctx.reporter
            .warn("Skipping palette optimization (faster but lower quality)");
        None
    };

    match build(options, &range, &target, palette.as_deref())? {
        GifPlan::SinglePass(command) => {
            ctx.engine.transcode(&command.overwrite(overwrite))?;
        }
        GifPlan::TwoPass {
            palette: generate,
            apply,
        } => {
            ctx.reporter
                .detail("Pass 1: Generating optimal color palette...");
            ctx.engine.transcode(&generate)?;
            ctx.reporter
                .detail("Pass 2: Creating GIF with optimized palette...");
            ctx.engine.transcode(&apply.overwrite(overwrite))?;
        }
    }

    if let Some(palette) = palette {
        if let Err(e) = palette.close() {
            log::warn!("Could not remove palette file: {}", e);
        }
    }

    if !options.output.exists() {
        return Err(Error::OutputMissing(options.output.clone()));
    }
    let size = std::fs::metadata(&options.output)?.len();
    ctx.reporter
        .success(&format!("GIF created: {}", options.output.display()));
    ctx.reporter
        .detail(&format!("File size: {}", format_megabytes(size)));
    Ok(Outcome::Completed)
}
