use std::path::PathBuf;

use crate::commands::{Context, Outcome};
use crate::error::Result;
use crate::ffmpeg_wrapper::FFmpegCommand;
use crate::filter_graph::FilterChain;
use crate::filters::scale_filter;
use crate::geometry::{RESIZE_SCALE_BOUNDS, ScaleRequest, ScaleTarget, resolve_scale};

#[derive(Debug, Clone)]
pub struct ResizeOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f64>,
    /// Use the exact dimensions given, even if that distorts the picture
    pub force_aspect: bool,
    pub overwrite: bool,
}

impl ResizeOptions {
    pub fn request(&self) -> ScaleRequest {
        ScaleRequest {
            width: self.width,
            height: self.height,
            factor: self.scale,
            preserve_aspect: !self.force_aspect,
        }
    }
}

pub fn build(options: &ResizeOptions, target: &ScaleTarget) -> FFmpegCommand {
    FFmpegCommand::new(&options.output)
        .input(&options.input)
        .video_filter(&FilterChain::new().then(scale_filter(target, None)))
        .audio_codec("copy")
}

fn describe(options: &ResizeOptions) -> String {
    if let Some(factor) = options.scale {
        return format!("Scaling video by {}x", factor);
    }
    let side = |v: Option<u32>| v.map_or_else(|| "auto".to_string(), |v| v.to_string());
    format!(
        "Resizing video to {}x{}",
        side(options.width),
        side(options.height)
    )
}

pub fn run(options: &ResizeOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let request = options.request();
    request.validate(RESIZE_SCALE_BOUNDS)?;

    let Some(overwrite) = ctx.claim_output(&options.output, options.overwrite) else {
        return Ok(Outcome::Aborted);
    };

    let source = ctx.probe_dimensions(&options.input)?;
    let resolved = resolve_scale(&request, RESIZE_SCALE_BOUNDS, source)?;

    ctx.reporter.info(&describe(options));
    ctx.reporter.advisories(&resolved.advisories);

    let command = build(options, &resolved.value).overwrite(overwrite);
    ctx.engine.transcode(&command)?;

    ctx.reporter.success(&format!(
        "Resized video saved to {}",
        options.output.display()
    ));
    Ok(Outcome::Completed)
}
