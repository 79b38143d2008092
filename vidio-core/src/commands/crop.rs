use std::path::PathBuf;

use crate::commands::{Context, Outcome};
use crate::error::Result;
use crate::ffmpeg_wrapper::FFmpegCommand;
use crate::filter_graph::FilterChain;
use crate::filters::crop_filter;
use crate::geometry::{CropRegion, CropRequest, resolve_crop};
use crate::presets::CropPreset;

#[derive(Debug, Clone)]
pub struct CropOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub preset: Option<String>,
    /// Center the region when no offsets are given
    pub keep_aspect: bool,
    pub overwrite: bool,
}

impl CropOptions {
    /// Geometry request, with the preset name already checked
    pub fn request(&self) -> Result<CropRequest> {
        let preset = self.preset.as_deref().map(CropPreset::parse).transpose()?;
        Ok(CropRequest {
            preset,
            width: self.width,
            height: self.height,
            x: self.x,
            y: self.y,
            center: self.keep_aspect,
        })
    }
}

/// Crop with the audio stream copied as-is
pub fn build(options: &CropOptions, region: &CropRegion) -> FFmpegCommand {
    FFmpegCommand::new(&options.output)
        .input(&options.input)
        .video_filter(&FilterChain::new().then(crop_filter(region)))
        .audio_codec("copy")
}

pub fn run(options: &CropOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let request = options.request()?;

    let Some(overwrite) = ctx.claim_output(&options.output, options.overwrite) else {
        return Ok(Outcome::Aborted);
    };

    let source = ctx.probe_dimensions(&options.input)?;
    ctx.reporter
        .detail(&format!("Original video dimensions: {}", source));

    let resolved = resolve_crop(&request, source)?;
    if let Some(name) = options.preset.as_deref() {
        ctx.reporter.info(&format!("Using preset: {}", name));
    }
    ctx.reporter.advisories(&resolved.advisories);

    let region = resolved.value;
    ctx.reporter.info(&format!(
        "Cropping to {}x{} at position ({}, {})",
        region.width, region.height, region.x, region.y
    ));

    let command = build(options, &region).overwrite(overwrite);
    ctx.engine.transcode(&command)?;

    ctx.reporter.success(&format!(
        "Cropped video saved to {}",
        options.output.display()
    ));
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeEngine, run_with};
    use crate::error::{Axis, BoundsViolation, Error};
    use crate::report::Level;

    fn options(dir: &tempfile::TempDir) -> CropOptions {
        CropOptions {
            input: PathBuf::from("in.mp4"),
            output: dir.path().join("out.mp4"),
            width: None,
            height: None,
            x: None,
            y: None,
            preset: None,
            keep_aspect: true,
            overwrite: false,
        }
    }

    #[test]
    fn center_square_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.preset = Some("center-square".into());

        let engine = FakeEngine::new().with_video(640, 360);
        let (result, reporter, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert_eq!(result.unwrap(), Outcome::Completed);

        let args = engine.args(0);
        assert_eq!(&args[..4], &["-i", "in.mp4", "-vf", "crop=360:360:140:0"]);
        assert_eq!(&args[4..7], &["-c:a", "copy", "-n"]);
        assert!(reporter.contains("Using preset: center-square"));
        assert!(reporter.contains("Cropping to 360x360 at position (140, 0)"));
    }

    #[test]
    fn unknown_preset_fails_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.preset = Some("21:9".into());

        let engine = FakeEngine::new().with_video(640, 360);
        let (result, _, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert!(matches!(result, Err(Error::UnknownPreset { .. })));
        assert!(engine.probed.borrow().is_empty());
    }

    #[test]
    fn odd_manual_crop_is_centered_and_evened() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.width = Some(301);
        opts.height = Some(201);

        let engine = FakeEngine::new().with_video(640, 360);
        let (result, reporter, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert_eq!(result.unwrap(), Outcome::Completed);
        // centred on the requested size, then shrunk to even
        assert_eq!(engine.args(0)[3], "crop=300:200:169:79");
        assert_eq!(reporter.at(Level::Detail).count(), 4);
    }

    #[test]
    fn crop_past_the_edge_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.width = Some(100);
        opts.height = Some(100);
        opts.x = Some(541);
        opts.y = Some(0);

        let engine = FakeEngine::new().with_video(640, 360);
        let (result, _, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        match result {
            Err(Error::CropOutOfBounds(BoundsViolation::Exceeds { axis, overflow, .. })) => {
                assert_eq!(axis, Axis::Width);
                assert_eq!(overflow, 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(engine.transcodes(), 0);
    }

    #[test]
    fn input_without_video_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir);
        opts.preset = Some("16:9".into());

        let engine = FakeEngine::new().with_probe(
            "in.mp4",
            r#"{"streams":[{"codec_type":"audio"}],"format":{}}"#,
        );
        let (result, _, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert!(matches!(result, Err(Error::NoVideoStream(_))));
    }
}
