use std::path::{Path, PathBuf};

use console::{Color, style};
use serde::Serialize;
use walkdir::WalkDir;

use crate::commands::{Context, Outcome};
use crate::error::{Error, Result};
use crate::ffmpeg_wrapper::Engine;
use crate::format::{Table, format_duration, format_size};

/// File extensions treated as video, compared case-insensitively
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "3g2", "mxf", "roq", "nsv",
    "f4v", "f4p", "f4a", "f4b",
];

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Defaults to the current directory
    pub directory: Option<PathBuf>,
    /// Show duration, resolution and codec
    pub detailed: bool,
    pub recursive: bool,
    pub json: bool,
    pub table: bool,
}

/// One listed file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoEntry {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

impl VideoEntry {
    fn new(path: &Path, size_bytes: u64) -> Self {
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            size_bytes,
            size_formatted: format_size(size_bytes),
            duration_seconds: None,
            duration_formatted: None,
            width: None,
            height: None,
            resolution: None,
            codec: None,
        }
    }

    /// Fill in probe details; a file that cannot be probed shows `Unknown`
    fn probe(&mut self, engine: &dyn Engine) {
        let probe = match engine.probe(&self.path) {
            Ok(probe) => probe,
            Err(e) => {
                log::debug!("Could not probe {}: {}", self.path.display(), e);
                self.duration_seconds = Some(0.0);
                self.duration_formatted = Some(UNKNOWN.to_string());
                self.resolution = Some(UNKNOWN.to_string());
                self.codec = Some(UNKNOWN.to_string());
                return;
            }
        };

        let duration = probe.duration_seconds();
        self.duration_seconds = Some(duration);
        self.duration_formatted = Some(format_duration(duration));

        match probe.video() {
            Some(video) => {
                self.width = video.width;
                self.height = video.height;
                self.resolution = Some(match (video.width, video.height) {
                    (Some(w), Some(h)) if w > 0 && h > 0 => format!("{}x{}", w, h),
                    _ => UNKNOWN.to_string(),
                });
                self.codec = Some(
                    video
                        .codec_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                );
            }
            None => {
                self.resolution = Some(UNKNOWN.to_string());
                self.codec = Some(UNKNOWN.to_string());
            }
        }
    }

    fn field<'a>(value: &'a Option<String>) -> &'a str {
        value.as_deref().unwrap_or(UNKNOWN)
    }
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Video files under `dir`, sorted by path
pub fn find_videos(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_video_file(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// `ls -l` style lines, sizes right-aligned
pub fn ls_lines(entries: &[VideoEntry], detailed: bool) -> Vec<String> {
    let size_width = entries
        .iter()
        .map(|e| e.size_formatted.len())
        .max()
        .unwrap_or(0);
    let duration_width = entries
        .iter()
        .map(|e| VideoEntry::field(&e.duration_formatted).len())
        .max()
        .unwrap_or(0);
    let resolution_width = entries
        .iter()
        .map(|e| VideoEntry::field(&e.resolution).len())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|entry| {
            let size = style(format!("{:>w$}", entry.size_formatted, w = size_width)).green();
            let name = style(&entry.name).cyan();
            if detailed {
                format!(
                    "{} {} {} {} {}",
                    size,
                    style(format!(
                        "{:<w$}",
                        VideoEntry::field(&entry.duration_formatted),
                        w = duration_width
                    ))
                    .yellow(),
                    style(format!(
                        "{:<w$}",
                        VideoEntry::field(&entry.resolution),
                        w = resolution_width
                    ))
                    .magenta(),
                    style(format!("{:<8}", VideoEntry::field(&entry.codec))).blue(),
                    name
                )
            } else {
                format!("{} {}", size, name)
            }
        })
        .collect()
}

fn table_of(dir: &Path, entries: &[VideoEntry], detailed: bool) -> Table {
    let mut table = Table::new()
        .title(format!("Video Files in {}", dir.display()))
        .column("Name", Some(Color::Cyan))
        .column("Size", Some(Color::Green));
    if detailed {
        table = table
            .column("Duration", Some(Color::Yellow))
            .column("Resolution", Some(Color::Magenta))
            .column("Codec", Some(Color::Blue));
    }
    for entry in entries {
        if detailed {
            table.row([
                entry.name.as_str(),
                entry.size_formatted.as_str(),
                VideoEntry::field(&entry.duration_formatted),
                VideoEntry::field(&entry.resolution),
                VideoEntry::field(&entry.codec),
            ]);
        } else {
            table.row([entry.name.as_str(), entry.size_formatted.as_str()]);
        }
    }
    table
}

pub fn run(options: &ListOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let dir = match options.directory {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let files = find_videos(&dir, options.recursive)?;
    if files.is_empty() {
        let location = if options.recursive {
            "recursively"
        } else {
            "in directory"
        };
        ctx.reporter.info(&format!(
            "No video files found {}: {}",
            location,
            dir.display()
        ));
        return Ok(Outcome::Completed);
    }

    // The plain table is the only view without probe details
    let probe = options.detailed || options.json || !options.table;
    let mut entries = Vec::with_capacity(files.len());
    for path in &files {
        let size = std::fs::metadata(path)?.len();
        let mut entry = VideoEntry::new(path, size);
        if probe {
            entry.probe(ctx.engine);
        }
        entries.push(entry);
    }

    if options.json {
        ctx.reporter.print(&serde_json::to_string_pretty(&entries)?);
        return Ok(Outcome::Completed);
    }

    if options.table {
        ctx.reporter
            .print(&table_of(&dir, &entries, options.detailed).render(true));
    } else {
        for line in ls_lines(&entries, options.detailed) {
            ctx.reporter.print(&line);
        }
    }
    ctx.reporter.print(&format!(
        "\n{}",
        style(format!("Found {} video file(s)", entries.len())).bold()
    ));
    Ok(Outcome::Completed)
}
