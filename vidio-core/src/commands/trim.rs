use std::path::PathBuf;

use crate::commands::{Context, Outcome};
use crate::error::{Error, Result};
use crate::ffmpeg_wrapper::FFmpegCommand;
use crate::format::parse_time;

#[derive(Debug, Clone)]
pub struct TrimOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start: String,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub overwrite: bool,
}

/// Where a cut starts and how far it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Until {
    End,
    /// Absolute position (`-to`)
    Position(String),
    /// Length from the start (`-t`)
    Length(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub until: Until,
}

impl TimeRange {
    /// Validate start/end/duration arguments; `end` and `duration` exclude
    /// each other.
    pub fn parse(start: &str, end: Option<&str>, duration: Option<&str>) -> Result<Self> {
        let until = match (end, duration) {
            (Some(_), Some(_)) => return Err(Error::ConflictingTimeRange),
            (Some(end), None) => Until::Position(parse_time(end)?),
            (None, Some(length)) => Until::Length(parse_time(length)?),
            (None, None) => Until::End,
        };
        Ok(Self {
            start: parse_time(start)?,
            until,
        })
    }

    pub fn starts_at_zero(&self) -> bool {
        self.start == "0"
    }

    /// `-ss`/`-to`/`-t` arguments; a zero start is left out
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.starts_at_zero() {
            args.push("-ss".to_string());
            args.push(self.start.clone());
        }
        match &self.until {
            Until::End => {}
            Until::Position(at) => {
                args.push("-to".to_string());
                args.push(at.clone());
            }
            Until::Length(length) => {
                args.push("-t".to_string());
                args.push(length.clone());
            }
        }
        args
    }
}

/// Stream-copy cut; no re-encoding
pub fn build(options: &TrimOptions, range: &TimeRange) -> FFmpegCommand {
    FFmpegCommand::new(&options.output)
        .input(&options.input)
        .output_args(range.args())
        .output_args(["-c", "copy", "-avoid_negative_ts", "make_zero"])
}

pub fn run(options: &TrimOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let range = TimeRange::parse(
        &options.start,
        options.end.as_deref(),
        options.duration.as_deref(),
    )?;

    let Some(overwrite) = ctx.claim_output(&options.output, options.overwrite) else {
        return Ok(Outcome::Aborted);
    };

    let command = build(options, &range).overwrite(overwrite);
    ctx.engine.transcode(&command)?;

    ctx.reporter.success(&format!(
        "Trimmed video saved to {}",
        options.output.display()
    ));
    Ok(Outcome::Completed)
}
