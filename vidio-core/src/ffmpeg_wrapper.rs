use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter_graph::{FilterChain, FilterGraph};
use crate::probe::MediaProbe;

/// Lines of FFmpeg's stderr kept in [`Error::ExternalEngineFailure`].
const STDERR_TAIL_LINES: usize = 20;

/// One `-i` declaration with the options that precede it
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub path: PathBuf,
    pub options: Vec<String>,
}

/// FFmpeg command builder with fluent interface
///
/// Inputs keep their declaration order, which is what `[0:v]`, `[1:v]`, ...
/// in a filter graph refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct FFmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    filter_complex: Option<String>,
    video_filter: Option<String>,
    maps: Vec<String>,
    video_codec: Option<String>,
    audio_codec: Option<String>,
    quality: Option<u8>,
    preset: Option<String>,
    output_args: Vec<String>,
    overwrite: bool,
}

impl FFmpegCommand {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            filter_complex: None,
            video_filter: None,
            maps: Vec::new(),
            video_codec: None,
            audio_codec: None,
            quality: None,
            preset: None,
            output_args: Vec::new(),
            overwrite: false,
        }
    }

    /// Declare an input file
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with(path, Vec::new())
    }

    /// Declare an input file preceded by input options such as `-ss`
    pub fn input_with(mut self, path: impl AsRef<Path>, options: Vec<String>) -> Self {
        self.inputs.push(Input {
            path: path.as_ref().to_path_buf(),
            options,
        });
        self
    }

    /// Use a filter graph and select its output pad as the video stream
    pub fn filter_graph(mut self, graph: &FilterGraph) -> Result<Self> {
        self.filter_complex = Some(graph.render()?);
        self.maps.insert(0, format!("[{}]", FilterGraph::OUTPUT));
        Ok(self)
    }

    /// Apply a simple filter chain with `-vf`
    pub fn video_filter(mut self, chain: &FilterChain) -> Self {
        self.video_filter = Some(chain.to_string());
        self
    }

    /// Add a `-map` stream selector
    pub fn map(mut self, selector: &str) -> Self {
        self.maps.push(selector.to_string());
        self
    }

    /// Set video codec
    pub fn video_codec(mut self, codec: &str) -> Self {
        self.video_codec = Some(codec.to_string());
        self
    }

    /// Set audio codec
    pub fn audio_codec(mut self, codec: &str) -> Self {
        self.audio_codec = Some(codec.to_string());
        self
    }

    /// Set quality (CRF value, 0-51 for x264/x265)
    pub fn quality(mut self, crf: u8) -> Self {
        self.quality = Some(crf);
        self
    }

    /// Set encoding preset (ultrafast, fast, medium, slow, veryslow)
    pub fn preset(mut self, preset: &str) -> Self {
        self.preset = Some(preset.to_string());
        self
    }

    /// Add output arguments placed just before the overwrite flag
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `-y` when true, `-n` otherwise
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn filter_complex(&self) -> Option<&str> {
        self.filter_complex.as_deref()
    }

    /// Argument list, without the program name
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        for input in &self.inputs {
            args.extend(input.options.iter().map(OsString::from));
            args.push("-i".into());
            args.push(input.path.clone().into_os_string());
        }

        if let Some(ref graph) = self.filter_complex {
            args.push("-filter_complex".into());
            args.push(graph.into());
        }
        if let Some(ref chain) = self.video_filter {
            args.push("-vf".into());
            args.push(chain.into());
        }
        for selector in &self.maps {
            args.push("-map".into());
            args.push(selector.into());
        }

        if let Some(ref codec) = self.video_codec {
            args.push("-c:v".into());
            args.push(codec.into());
        }
        if let Some(crf) = self.quality {
            args.push("-crf".into());
            args.push(crf.to_string().into());
        }
        if let Some(ref preset) = self.preset {
            args.push("-preset".into());
            args.push(preset.into());
        }
        if let Some(ref codec) = self.audio_codec {
            args.push("-c:a".into());
            args.push(codec.into());
        }

        args.extend(self.output_args.iter().map(OsString::from));
        args.push(if self.overwrite { "-y" } else { "-n" }.into());
        args.push(self.output.clone().into_os_string());
        args
    }

    /// Arguments as display strings, for logs and tests
    pub fn args_lossy(&self) -> Vec<String> {
        self.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Build the FFmpeg command
    pub fn build(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(self.args());
        cmd
    }
}

/// Runs the probe and transcode tools.
///
/// Commands talk to the engine only through this trait, so they can be
/// exercised without FFmpeg installed.
pub trait Engine {
    /// Probe a media file's format and streams
    fn probe(&self, path: &Path) -> Result<MediaProbe>;

    /// Count video frames by reading every packet
    fn count_frames(&self, path: &Path) -> Result<u64>;

    /// Run a transcode to completion
    fn transcode(&self, command: &FFmpegCommand) -> Result<()>;
}

/// [`Engine`] backed by the `ffmpeg` and `ffprobe` binaries
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    config: Config,
    verbose: bool,
}

impl FfmpegEngine {
    pub fn new(config: Config, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// Check that both binaries are reachable and return the FFmpeg version
    pub fn check(&self) -> Result<String> {
        for program in [&self.config.ffmpeg, &self.config.ffprobe] {
            which::which(program)
                .map_err(|_| Error::EngineNotFound(program.display().to_string()))?;
        }
        check_ffmpeg(&self.config.ffmpeg)
    }

    fn capture(&self, program: &Path, args: &[OsString]) -> Result<String> {
        log::debug!("Running: {} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(program, e))?;

        if !output.status.success() {
            return Err(Error::ExternalEngineFailure {
                program: program_name(program),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run FFmpeg with its output shown as-is
    fn transcode_verbose(&self, mut cmd: Command) -> Result<()> {
        let status = cmd
            .stdin(Stdio::null())
            .status()
            .map_err(|e| spawn_error(&self.config.ffmpeg, e))?;
        if !status.success() {
            return Err(Error::ExternalEngineFailure {
                program: program_name(&self.config.ffmpeg),
                code: status.code(),
                stderr: "see output above".to_string(),
            });
        }
        Ok(())
    }

    /// Run FFmpeg behind a progress bar driven by its stderr
    fn transcode_with_progress(&self, mut cmd: Command) -> Result<()> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| spawn_error(&self.config.ffmpeg, e))?;
        let stderr = child.stderr.take().ok_or_else(|| {
            Error::Io(std::io::Error::other("Failed to capture FFmpeg stderr"))
        })?;

        let pb = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut tracker = ProgressTracker::new();
        let mut all_output = String::new();

        // FFmpeg ends its status line with '\r', not '\n'
        for chunk in BufReader::new(stderr).split(b'\r') {
            let chunk = chunk?;
            let text = String::from_utf8_lossy(&chunk);
            for line in text.lines() {
                all_output.push_str(line);
                all_output.push('\n');
                if let Some(progress) = tracker.update(line) {
                    pb.set_position(progress as u64);
                    pb.set_message(format!("Processing: {:.1}%", progress));
                }
            }
        }

        let status = child.wait()?;
        if !status.success() {
            pb.abandon();
            log::error!("FFmpeg failed with output:\n{}", all_output);
            return Err(Error::ExternalEngineFailure {
                program: program_name(&self.config.ffmpeg),
                code: status.code(),
                stderr: tail(&all_output, STDERR_TAIL_LINES),
            });
        }

        pb.finish_and_clear();
        Ok(())
    }
}

impl Engine for FfmpegEngine {
    fn probe(&self, path: &Path) -> Result<MediaProbe> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            "-show_streams".into(),
            path.as_os_str().to_owned(),
        ];
        let json = self.capture(&self.config.ffprobe, &args)?;
        MediaProbe::from_json(&json)
    }

    fn count_frames(&self, path: &Path) -> Result<u64> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-count_packets".into(),
            "-show_entries".into(),
            "stream=nb_read_packets".into(),
            "-of".into(),
            "csv=p=0".into(),
            path.as_os_str().to_owned(),
        ];
        let output = self.capture(&self.config.ffprobe, &args)?;
        parse_frame_count(&output)
    }

    fn transcode(&self, command: &FFmpegCommand) -> Result<()> {
        let cmd = command.build(&self.config.ffmpeg);
        log::info!("Executing FFmpeg command: {:?}", cmd);

        if self.verbose {
            self.transcode_verbose(cmd)
        } else {
            self.transcode_with_progress(cmd)
        }
    }
}

/// Turns FFmpeg's `Duration:` and `time=` log lines into a percentage
#[derive(Debug)]
struct ProgressTracker {
    duration_regex: Regex,
    progress_regex: Regex,
    total: Option<f64>,
}

impl ProgressTracker {
    fn new() -> Self {
        Self {
            duration_regex: Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})")
                .expect("valid duration regex"),
            progress_regex: Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})")
                .expect("valid progress regex"),
            total: None,
        }
    }

    fn update(&mut self, line: &str) -> Option<f64> {
        if self.total.is_none() {
            if let Some(caps) = self.duration_regex.captures(line) {
                self.total = Some(timestamp_seconds(&caps)).filter(|&t| t > 0.0);
            }
        }

        let caps = self.progress_regex.captures(line)?;
        let total = self.total?;
        Some((timestamp_seconds(&caps) / total * 100.0).min(100.0))
    }
}

fn timestamp_seconds(caps: &regex::Captures<'_>) -> f64 {
    let hours: f64 = caps[1].parse().unwrap_or(0.0);
    let minutes: f64 = caps[2].parse().unwrap_or(0.0);
    let seconds: f64 = caps[3].parse().unwrap_or(0.0);
    let centis: f64 = caps[4].parse().unwrap_or(0.0);
    hours * 3600.0 + minutes * 60.0 + seconds + centis / 100.0
}

/// Check if FFmpeg is runnable and return its version
pub fn check_ffmpeg(program: &Path) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .map_err(|e| spawn_error(program, e))?;

    let version = String::from_utf8_lossy(&output.stdout);
    Ok(parse_version(&version).unwrap_or_else(|| "unknown".to_string()))
}

fn parse_version(banner: &str) -> Option<String> {
    let version_regex = Regex::new(r"ffmpeg version (\S+)").ok()?;
    version_regex
        .captures(banner)
        .map(|caps| caps[1].to_string())
}

/// Packet count printed by `ffprobe -count_packets -of csv=p=0`.
fn parse_frame_count(output: &str) -> Result<u64> {
    let trimmed = output.trim();
    trimmed.parse().map_err(|_| Error::UnexpectedOutput {
        program: "ffprobe".into(),
        output: trimmed.to_string(),
    })
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

fn spawn_error(program: &Path, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::EngineNotFound(program_name(program))
    } else {
        Error::Io(err)
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_graph::Pad;

    #[test]
    fn inputs_keep_declaration_order() {
        let cmd = FFmpegCommand::new("out.mp4")
            .input("a.mp4")
            .input("b.mp4")
            .overwrite(true);
        assert_eq!(
            cmd.args_lossy(),
            vec!["-i", "a.mp4", "-i", "b.mp4", "-y", "out.mp4"]
        );
    }

    #[test]
    fn filter_graph_maps_output_first() {
        let mut graph = FilterGraph::new();
        graph
            .stage(
                [Pad::video(0)],
                FilterChain::new().then("scale=640:-2"),
                FilterGraph::OUTPUT,
            )
            .unwrap();
        let cmd = FFmpegCommand::new("out.mp4")
            .input("in.mp4")
            .map("0:a?")
            .filter_graph(&graph)
            .unwrap()
            .audio_codec("aac")
            .output_args(["-shortest"]);
        assert_eq!(
            cmd.args_lossy(),
            vec![
                "-i",
                "in.mp4",
                "-filter_complex",
                "[0:v]scale=640:-2[v]",
                "-map",
                "[v]",
                "-map",
                "0:a?",
                "-c:a",
                "aac",
                "-shortest",
                "-n",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn unterminated_graph_is_rejected() {
        let graph = FilterGraph::new();
        assert!(matches!(
            FFmpegCommand::new("out.mp4").filter_graph(&graph),
            Err(Error::Graph(_))
        ));
    }

    #[test]
    fn input_options_precede_their_input() {
        let cmd = FFmpegCommand::new("out.gif")
            .input_with("in.mp4", vec!["-ss".into(), "10".into()])
            .video_filter(&FilterChain::new().then("fps=10"));
        assert_eq!(
            cmd.args_lossy(),
            vec!["-ss", "10", "-i", "in.mp4", "-vf", "fps=10", "-n", "out.gif"]
        );
    }

    #[test]
    fn encoder_settings() {
        let cmd = FFmpegCommand::new("out.mp4")
            .input("in.mp4")
            .video_codec("libx264")
            .quality(23)
            .preset("medium");
        let args = cmd.args_lossy();
        assert_eq!(
            &args[2..8],
            &["-c:v", "libx264", "-crf", "23", "-preset", "medium"]
        );
    }

    #[test]
    fn progress_from_stderr_lines() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.update("frame=1 time=00:00:01.00"), None);
        assert_eq!(
            tracker.update("  Duration: 00:00:10.00, start: 0.000000, bitrate: 1000 kb/s"),
            None
        );
        let progress = tracker.update("frame=120 fps=60 time=00:00:05.00 bitrate=1").unwrap();
        assert!((progress - 50.0).abs() < 1e-9);
        let progress = tracker.update("time=00:00:12.00").unwrap();
        assert_eq!(progress, 100.0);
    }

    #[test]
    fn version_banner() {
        assert_eq!(
            parse_version("ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023"),
            Some("6.1.1-3ubuntu5".to_string())
        );
        assert_eq!(parse_version("something else"), None);
    }

    #[test]
    fn frame_count_output() {
        assert_eq!(parse_frame_count("1800\n").unwrap(), 1800);
        let err = parse_frame_count("N/A\n").unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedOutput { ref output, .. } if output == "N/A"
        ));
        assert!(parse_frame_count("").is_err());
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let text = "a\n\nb\nc\nd\n";
        assert_eq!(tail(text, 2), "c\nd");
        assert_eq!(tail(text, 10), "a\nb\nc\nd");
    }

    #[test]
    fn missing_binary_is_engine_not_found() {
        let err = check_ffmpeg(Path::new("/nonexistent/vidio-test-ffmpeg")).unwrap_err();
        assert!(matches!(err, Error::EngineNotFound(_)));
    }
}
