use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::commands::{Context, Outcome};
use crate::config::Config;
use crate::error::Result;
use crate::ffmpeg_wrapper::FFmpegCommand;
use crate::filters::{auto_grid_graph, fixed_grid_graph};
use crate::geometry::{Advisory, Dimensions, GridLayout, Resolved, calculate_grid_size};

#[derive(Debug, Clone)]
pub struct GridOptions {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub rows: Option<NonZeroU32>,
    pub cols: Option<NonZeroU32>,
    /// Cell width; only used together with `height`
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub padding: u32,
    pub background: String,
    pub overwrite: bool,
}

/// Layout and cell size for a grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    pub layout: GridLayout,
    /// `None` when cells are sized by their inputs
    pub cell: Option<Dimensions>,
}

pub fn plan(options: &GridOptions) -> Result<Resolved<GridPlan>> {
    let layout = calculate_grid_size(options.inputs.len(), options.rows, options.cols)?;

    let cell = match (options.width, options.height) {
        (Some(width), Some(height)) => Some(Dimensions::new(width, height)?),
        _ => None,
    };

    let mut resolved = Resolved::new(GridPlan { layout, cell });
    if cell.is_none() {
        if options.width.is_some() || options.height.is_some() {
            resolved.advisories.push(Advisory::CellSizeIgnored);
        }
        if options.padding > 0 {
            resolved.advisories.push(Advisory::PaddingIgnored);
        }
    }
    Ok(resolved)
}

/// Grid video with audio dropped, re-encoded with the configured codec
pub fn build(options: &GridOptions, plan: &GridPlan, config: &Config) -> Result<FFmpegCommand> {
    let count = options.inputs.len();
    let graph = match plan.cell {
        Some(cell) => fixed_grid_graph(
            count,
            plan.layout,
            cell,
            options.padding,
            &options.background,
        )?,
        None => auto_grid_graph(count, plan.layout)?,
    };
    log::debug!("Grid filter graph: {}", graph.render()?);

    let command = options
        .inputs
        .iter()
        .fold(FFmpegCommand::new(&options.output), |cmd, input| {
            cmd.input(input)
        })
        .filter_graph(&graph)?
        .video_codec(&config.video_codec)
        .quality(config.crf)
        .preset(&config.preset)
        .output_args(["-an"]);
    Ok(command)
}

pub fn run(options: &GridOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let resolved = plan(options)?;
    let command = build(options, &resolved.value, ctx.config)?;

    let Some(overwrite) = ctx.claim_output(&options.output, options.overwrite) else {
        return Ok(Outcome::Aborted);
    };

    let layout = resolved.value.layout;
    ctx.reporter.info(&format!(
        "Creating {}x{} video grid with {} videos...",
        layout.rows,
        layout.cols,
        options.inputs.len()
    ));
    ctx.reporter.advisories(&resolved.advisories);

    ctx.engine.transcode(&command.overwrite(overwrite))?;

    ctx.reporter.success(&format!(
        "Grid video saved to {}",
        options.output.display()
    ));
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeEngine, run_with};
    use crate::error::Error;
    use crate::report::Level;

    fn options(count: usize) -> GridOptions {
        GridOptions {
            inputs: (0..count).map(|i| PathBuf::from(format!("v{i}.mp4"))).collect(),
            output: PathBuf::from("/nonexistent/vidio-test/grid.mp4"),
            rows: None,
            cols: None,
            width: None,
            height: None,
            padding: 0,
            background: "black".into(),
            overwrite: false,
        }
    }

    #[test]
    fn four_inputs_make_a_square() {
        let resolved = plan(&options(4)).unwrap();
        assert_eq!(resolved.value.layout, GridLayout { rows: 2, cols: 2 });
        assert_eq!(resolved.value.cell, None);
        assert!(resolved.advisories.is_empty());
    }

    #[test]
    fn grid_too_small_fails_before_anything_runs() {
        let mut opts = options(5);
        opts.rows = NonZeroU32::new(1);
        opts.cols = NonZeroU32::new(2);

        let engine = FakeEngine::new();
        let (result, _, questions) = run_with(&engine, true, |ctx| run(&opts, ctx));
        assert!(matches!(
            result,
            Err(Error::GridTooSmall {
                cells: 2,
                items: 5,
                ..
            })
        ));
        assert!(questions.is_empty());
        assert_eq!(engine.transcodes(), 0);
    }

    #[test]
    fn fixed_cells_with_padding() {
        let mut opts = options(3);
        opts.width = Some(320);
        opts.height = Some(180);
        opts.padding = 4;
        opts.background = "white".into();

        let resolved = plan(&opts).unwrap();
        let cmd = build(&opts, &resolved.value, &Config::default()).unwrap();
        let graph = cmd.filter_complex().unwrap();
        assert!(graph.ends_with("xstack=inputs=3:layout=0_0|324_0|0_184:fill=white[v]"));

        let args = cmd.args_lossy();
        let tail: Vec<&str> = args[args.len() - 11..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "-map",
                "[v]",
                "-c:v",
                "libx264",
                "-crf",
                "23",
                "-preset",
                "medium",
                "-an",
                "-n",
                "/nonexistent/vidio-test/grid.mp4",
            ]
        );
    }

    #[test]
    fn partial_cell_size_is_ignored_with_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(3);
        opts.output = dir.path().join("grid.mp4");
        opts.width = Some(320);
        opts.padding = 10;

        let engine = FakeEngine::new();
        let (result, reporter, _) = run_with(&engine, false, |ctx| run(&opts, ctx));
        assert_eq!(result.unwrap(), Outcome::Completed);
        let warnings: Vec<&str> = reporter.at(Level::Warn).collect();
        assert_eq!(warnings.len(), 2);
        assert!(engine.commands.borrow()[0]
            .filter_complex()
            .unwrap()
            .contains("scale=-1:360"));
        assert!(reporter.contains("Creating 2x2 video grid with 3 videos..."));
    }

    #[test]
    fn oversized_layout_builds_for_few_inputs() {
        let mut opts = options(2);
        opts.rows = NonZeroU32::new(65536);
        opts.cols = NonZeroU32::new(65536);

        let resolved = plan(&opts).unwrap();
        assert_eq!(
            resolved.value.layout,
            GridLayout {
                rows: 65536,
                cols: 65536
            }
        );
        let cmd = build(&opts, &resolved.value, &Config::default()).unwrap();
        assert!(cmd
            .filter_complex()
            .unwrap()
            .contains("[v0][v1]hstack=inputs=2[row0]"));
    }

    #[test]
    fn zero_cell_size_is_invalid() {
        let mut opts = options(2);
        opts.width = Some(0);
        opts.height = Some(180);
        assert!(matches!(
            plan(&opts),
            Err(Error::InvalidDimensions { width: 0, .. })
        ));
    }
}
