use std::io::BufRead;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use console::{Term, style};

use vidio_core::commands::concat::ConcatOptions;
use vidio_core::commands::crop::CropOptions;
use vidio_core::commands::grid::GridOptions;
use vidio_core::commands::info::InfoOptions;
use vidio_core::commands::list::ListOptions;
use vidio_core::commands::resize::ResizeOptions;
use vidio_core::commands::to_gif::{DEFAULT_FPS, ToGifOptions};
use vidio_core::commands::trim::TrimOptions;
use vidio_core::commands::{self, Context, Outcome};
use vidio_core::{Config, ConsoleReporter, Dither, FfmpegEngine, GifQuality};

#[derive(Parser, Debug)]
#[command(name = "vidio")]
#[command(about = "A simple FFmpeg wrapper for common video operations")]
#[command(version, arg_required_else_help = true)]
struct Cli {
    /// Show FFmpeg commands and other debug info
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place videos side by side, or stack them vertically
    Concat(ConcatArgs),
    /// Crop a video to a region or an aspect-ratio preset
    Crop(CropArgs),
    /// Arrange videos in a grid
    Grid(GridArgs),
    /// Resize a video to new dimensions or by a scale factor
    Resize(ResizeArgs),
    /// Convert a video to an optimized animated GIF
    ToGif(ToGifArgs),
    /// Cut a time range out of a video without re-encoding
    Trim(TrimArgs),
    /// Show detailed information about a video file
    Info(InfoArgs),
    /// List video files in a directory
    #[command(visible_alias = "ls")]
    List(ListArgs),
}

#[derive(Args, Debug)]
struct ConcatArgs {
    /// Input videos followed by the output file
    #[arg(required = true, num_args = 2.., value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Stack videos vertically instead of horizontally
    #[arg(short, long)]
    vertical: bool,

    /// Overwrite output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
struct CropArgs {
    /// Input video file
    input: PathBuf,

    /// Output video file
    output: PathBuf,

    /// Width of the cropped region in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Height of the cropped region in pixels
    #[arg(short, long)]
    height: Option<u32>,

    /// X offset (left edge) of the crop region
    #[arg(long)]
    x: Option<u32>,

    /// Y offset (top edge) of the crop region
    #[arg(long)]
    y: Option<u32>,

    /// Preset crop: center-square, 16:9, 9:16, 4:3, 1:1
    #[arg(short, long, value_name = "PRESET")]
    preset: Option<String>,

    /// Center the crop region when no offsets are given (default)
    #[arg(long, overrides_with = "no_keep_aspect")]
    keep_aspect: bool,

    /// Crop from the top-left corner when no offsets are given
    #[arg(long, overrides_with = "keep_aspect")]
    no_keep_aspect: bool,

    /// Overwrite output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
struct GridArgs {
    /// Input videos followed by the output file
    #[arg(required = true, num_args = 2.., value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Number of rows (calculated if not specified)
    #[arg(short, long)]
    rows: Option<NonZeroU32>,

    /// Number of columns (calculated if not specified)
    #[arg(short, long)]
    cols: Option<NonZeroU32>,

    /// Width of each cell in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Height of each cell in pixels
    #[arg(short, long)]
    height: Option<u32>,

    /// Padding between videos in pixels
    #[arg(short, long, default_value_t = 0)]
    padding: u32,

    /// Background color for padding and letterboxing
    #[arg(short, long, default_value = "black")]
    background: String,

    /// Overwrite output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
struct ResizeArgs {
    /// Input video file
    input: PathBuf,

    /// Output video file
    output: PathBuf,

    /// Target width in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(short, long)]
    height: Option<u32>,

    /// Scale factor (e.g. 0.5 for 50%, 2.0 for 200%)
    #[arg(short, long)]
    scale: Option<f64>,

    /// Force exact dimensions (may distort the image)
    #[arg(long)]
    force_aspect: bool,

    /// Overwrite output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Args, Debug)]
struct ToGifArgs {
    /// Input video file
    input: PathBuf,

    /// Output GIF file
    output: PathBuf,

    /// Frame rate of the GIF
    #[arg(short, long, default_value_t = DEFAULT_FPS,
          value_parser = clap::value_parser!(u32).range(1..=30))]
    fps: u32,

    /// Target width in pixels (height follows the aspect ratio)
    #[arg(short, long)]
    width: Option<u32>,

    /// Scale factor (e.g. 0.5 for 50%)
    #[arg(short, long)]
    scale: Option<f64>,

    /// Quality level: low, medium, high, or 1-10
    #[arg(short, long, default_value = "medium", value_parser = parse_quality)]
    quality: GifQuality,

    /// Start time (HH:MM:SS, MM:SS, or seconds)
    #[arg(short = 't', long, default_value = "0")]
    start: String,

    /// End time (HH:MM:SS, MM:SS, or seconds)
    #[arg(short, long)]
    end: Option<String>,

    /// Duration to convert (HH:MM:SS, MM:SS, or seconds)
    #[arg(short, long)]
    duration: Option<String>,

    /// Number of loops (0 = infinite)
    #[arg(long = "loop", default_value_t = 0)]
    loop_count: u32,

    /// Dithering algorithm
    #[arg(long, value_enum, default_value_t = Dither::FloydSteinberg)]
    dither: Dither,

    /// Skip palette optimization (faster but lower quality)
    #[arg(long)]
    no_optimize: bool,

    /// Overwrite output file if it exists
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args, Debug)]
struct TrimArgs {
    /// Input video file
    input: PathBuf,

    /// Output video file
    output: PathBuf,

    /// Start time (HH:MM:SS, MM:SS, or seconds)
    #[arg(short, long, default_value = "0")]
    start: String,

    /// End time; trims to the end of the video if omitted
    #[arg(short, long)]
    end: Option<String>,

    /// Duration to keep, instead of --end
    #[arg(short, long)]
    duration: Option<String>,

    /// Overwrite output file if it exists
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Video file to inspect
    input: PathBuf,

    /// Print the raw ffprobe document as JSON
    #[arg(long)]
    json: bool,

    /// Count frames exactly (slower but accurate)
    #[arg(long)]
    exact_frames: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Directory to search (default: current directory)
    directory: Option<PathBuf>,

    /// Show duration, resolution and codec
    #[arg(short = 'l', long = "list")]
    detailed: bool,

    /// Search subdirectories too
    #[arg(short, long)]
    recursive: bool,

    /// Output information as JSON
    #[arg(long)]
    json: bool,

    /// Use a table instead of ls-style output
    #[arg(short, long)]
    table: bool,
}

fn parse_quality(value: &str) -> std::result::Result<GifQuality, String> {
    GifQuality::parse(value).map_err(|e| e.to_string())
}

/// Split `inputs... output`
fn split_output(files: &[PathBuf]) -> Result<(Vec<PathBuf>, PathBuf)> {
    let (output, inputs) = files
        .split_last()
        .context("An output file is required")?;
    Ok((inputs.to_vec(), output.clone()))
}

fn ensure_inputs_exist<'a>(inputs: impl IntoIterator<Item = &'a PathBuf>) -> Result<()> {
    for input in inputs {
        if !input.is_file() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }
    Ok(())
}

/// Ask on the terminal; anything but yes declines
fn confirm(question: &str) -> bool {
    let term = Term::stderr();
    if term.write_str(&format!("{} [y/N]: ", question)).is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let config = Config::from_env();
    let engine = FfmpegEngine::new(config.clone(), cli.verbose);

    let version = engine.check()?;
    log::info!("FFmpeg version {} detected", version);

    let quiet = matches!(cli.command, Command::Concat(ref args) if args.quiet);
    let mut reporter = ConsoleReporter::new(quiet);
    let mut confirm = confirm;
    let mut ctx = Context {
        engine: &engine,
        reporter: &mut reporter,
        config: &config,
        confirm: &mut confirm,
    };

    let outcome = match cli.command {
        Command::Concat(args) => {
            let (inputs, output) = split_output(&args.files)?;
            ensure_inputs_exist(&inputs)?;
            let options = ConcatOptions {
                inputs,
                output,
                vertical: args.vertical,
                overwrite: args.overwrite,
            };
            commands::concat::run(&options, &mut ctx)?
        }
        Command::Crop(args) => {
            ensure_inputs_exist([&args.input])?;
            let options = CropOptions {
                input: args.input,
                output: args.output,
                width: args.width,
                height: args.height,
                x: args.x,
                y: args.y,
                preset: args.preset,
                keep_aspect: args.keep_aspect || !args.no_keep_aspect,
                overwrite: args.overwrite,
            };
            commands::crop::run(&options, &mut ctx)?
        }
        Command::Grid(args) => {
            let (inputs, output) = split_output(&args.files)?;
            ensure_inputs_exist(&inputs)?;
            let options = GridOptions {
                inputs,
                output,
                rows: args.rows,
                cols: args.cols,
                width: args.width,
                height: args.height,
                padding: args.padding,
                background: args.background,
                overwrite: args.overwrite,
            };
            commands::grid::run(&options, &mut ctx)?
        }
        Command::Resize(args) => {
            ensure_inputs_exist([&args.input])?;
            let options = ResizeOptions {
                input: args.input,
                output: args.output,
                width: args.width,
                height: args.height,
                scale: args.scale,
                force_aspect: args.force_aspect,
                overwrite: args.overwrite,
            };
            commands::resize::run(&options, &mut ctx)?
        }
        Command::ToGif(args) => {
            ensure_inputs_exist([&args.input])?;
            let options = ToGifOptions {
                input: args.input,
                output: args.output,
                fps: args.fps,
                width: args.width,
                scale: args.scale,
                quality: args.quality,
                start: args.start,
                end: args.end,
                duration: args.duration,
                loop_count: args.loop_count,
                dither: args.dither,
                optimize: !args.no_optimize,
                overwrite: args.overwrite,
            };
            commands::to_gif::run(&options, &mut ctx)?
        }
        Command::Trim(args) => {
            ensure_inputs_exist([&args.input])?;
            let options = TrimOptions {
                input: args.input,
                output: args.output,
                start: args.start,
                end: args.end,
                duration: args.duration,
                overwrite: args.overwrite,
            };
            commands::trim::run(&options, &mut ctx)?
        }
        Command::Info(args) => {
            ensure_inputs_exist([&args.input])?;
            let options = InfoOptions {
                input: args.input,
                json: args.json,
                exact_frames: args.exact_frames,
            };
            commands::info::run(&options, &mut ctx)?
        }
        Command::List(args) => {
            let options = ListOptions {
                directory: args.directory,
                detailed: args.detailed,
                recursive: args.recursive,
                json: args.json,
                table: args.table,
            };
            commands::list::run(&options, &mut ctx)?
        }
    };
    Ok(outcome)
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Aborted) => {
            println!("{}", style("Aborted.").yellow());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
