use std::path::PathBuf;

use crate::commands::{Context, Outcome};
use crate::error::{Error, Result};
use crate::ffmpeg_wrapper::FFmpegCommand;
use crate::filter_graph::Stack;
use crate::filters::concat_graph;

#[derive(Debug, Clone)]
pub struct ConcatOptions {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub vertical: bool,
    pub overwrite: bool,
}

/// Place every input side by side, or stacked when `vertical`.
///
/// Audio comes from the first input when it has any, and the output stops
/// with the shortest input.
pub fn build(options: &ConcatOptions, audio_codec: &str) -> Result<FFmpegCommand> {
    if options.inputs.len() < 2 {
        return Err(Error::NotEnoughInputs {
            required: 2,
            got: options.inputs.len(),
        });
    }

    let direction = if options.vertical {
        Stack::Vertical
    } else {
        Stack::Horizontal
    };
    let graph = concat_graph(options.inputs.len(), direction)?;

    let command = options
        .inputs
        .iter()
        .fold(FFmpegCommand::new(&options.output), |cmd, input| {
            cmd.input(input)
        })
        .filter_graph(&graph)?
        .map("0:a?")
        .audio_codec(audio_codec)
        .output_args(["-shortest"]);
    Ok(command)
}

pub fn run(options: &ConcatOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let command = build(options, &ctx.config.audio_codec)?;

    let Some(overwrite) = ctx.claim_output(&options.output, options.overwrite) else {
        return Ok(Outcome::Aborted);
    };

    let direction = if options.vertical {
        "vertically"
    } else {
        "horizontally"
    };
    ctx.reporter.info(&format!(
        "Concatenating {} videos {}...",
        options.inputs.len(),
        direction
    ));

    ctx.engine.transcode(&command.overwrite(overwrite))?;

    ctx.reporter.success(&format!(
        "Concatenation completed! Output saved to: {}",
        options.output.display()
    ));
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeEngine, run_with};

    fn options(inputs: &[&str], vertical: bool) -> ConcatOptions {
        ConcatOptions {
            inputs: inputs.iter().map(PathBuf::from).collect(),
            output: PathBuf::from("/nonexistent/vidio-test/out.mp4"),
            vertical,
            overwrite: false,
        }
    }

    #[test]
    fn horizontal_concat_command() {
        let cmd = build(&options(&["a.mp4", "b.mp4"], false), "aac").unwrap();
        assert_eq!(
            cmd.args_lossy(),
            vec![
                "-i",
                "a.mp4",
                "-i",
                "b.mp4",
                "-filter_complex",
                "[0:v][1:v]hstack=inputs=2[v]",
                "-map",
                "[v]",
                "-map",
                "0:a?",
                "-c:a",
                "aac",
                "-shortest",
                "-n",
                "/nonexistent/vidio-test/out.mp4",
            ]
        );
    }

    #[test]
    fn vertical_concat_of_three() {
        let cmd = build(&options(&["a.mp4", "b.mp4", "c.mp4"], true), "aac")
            .unwrap()
            .overwrite(true);
        assert_eq!(
            cmd.filter_complex(),
            Some("[0:v][1:v][2:v]vstack=inputs=3[v]")
        );
        assert!(cmd.args_lossy().contains(&"-y".to_string()));
    }

    #[test]
    fn single_input_fails_before_the_engine() {
        let engine = FakeEngine::new();
        let (result, _, _) = run_with(&engine, true, |ctx| {
            run(&options(&["a.mp4"], false), ctx)
        });
        assert!(matches!(
            result,
            Err(Error::NotEnoughInputs {
                required: 2,
                got: 1
            })
        ));
        assert_eq!(engine.transcodes(), 0);
    }

    #[test]
    fn declining_overwrite_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");
        std::fs::write(&out, b"old").unwrap();
        let mut opts = options(&["a.mp4", "b.mp4"], false);
        opts.output = out;

        let engine = FakeEngine::new();
        let (result, _, questions) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert_eq!(result.unwrap(), Outcome::Aborted);
        assert_eq!(questions.len(), 1);
        assert_eq!(engine.transcodes(), 0);
    }

    #[test]
    fn runs_one_transcode() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&["a.mp4", "b.mp4"], false);
        opts.output = dir.path().join("out.mp4");

        let engine = FakeEngine::new();
        let (result, reporter, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert_eq!(result.unwrap(), Outcome::Completed);
        assert_eq!(engine.transcodes(), 1);
        assert!(reporter.contains("Concatenating 2 videos horizontally..."));
    }
}
