use std::path::{Path, PathBuf};

use console::Color;

use crate::commands::{Context, Outcome};
use crate::error::{Error, Result};
use crate::format::{Table, format_duration_precise, format_megabytes, group_thousands};
use crate::probe::{MediaProbe, parse_number};

#[derive(Debug, Clone)]
pub struct InfoOptions {
    pub input: PathBuf,
    /// Print the probe document instead of a table
    pub json: bool,
    /// Count frames even when the container declares a count
    pub exact_frames: bool,
}

fn kbps(bits: Option<&str>) -> Option<String> {
    parse_number(bits).map(|b| format!("{:.2} kbps", b / 1000.0))
}

fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or("Unknown").to_string()
}

/// Property table for a probed file
pub fn info_table(path: &Path, probe: &MediaProbe) -> Table {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut table = Table::new()
        .title(format!("Video Information: {}", name))
        .column("Property", Some(Color::Cyan))
        .column("Value", Some(Color::Green));

    table.row([
        "Duration".to_string(),
        format_duration_precise(probe.duration_seconds()),
    ]);
    table.row(["File Size".to_string(), format_megabytes(probe.size_bytes())]);
    table.row([
        "Format".to_string(),
        or_unknown(probe.format.format_name.as_deref()),
    ]);
    table.row([
        "Bit Rate".to_string(),
        kbps(probe.format.bit_rate.as_deref()).unwrap_or_else(|| "0.00 kbps".to_string()),
    ]);

    if let Some(video) = probe.video() {
        table.section();
        table.row([
            "Video Codec".to_string(),
            or_unknown(video.codec_name.as_deref()),
        ]);
        table.row([
            "Resolution".to_string(),
            format!(
                "{}x{}",
                video.width.unwrap_or(0),
                video.height.unwrap_or(0)
            ),
        ]);
        table.row([
            "Frame Rate".to_string(),
            video
                .frame_rate()
                .map(|fps| format!("{:.2} fps", fps))
                .unwrap_or_else(|| "Unknown".to_string()),
        ]);
        table.row([
            "Total Frames".to_string(),
            probe
                .declared_frames()
                .map(group_thousands)
                .unwrap_or_else(|| "Unknown".to_string()),
        ]);
        table.row([
            "Pixel Format".to_string(),
            or_unknown(video.pix_fmt.as_deref()),
        ]);
        if let Some(ref space) = video.color_space {
            table.row(["Color Space".to_string(), space.clone()]);
        }
        if let Some(rate) = kbps(video.bit_rate.as_deref()) {
            table.row(["Video Bitrate".to_string(), rate]);
        }
    }

    if let Some(audio) = probe.audio() {
        table.section();
        table.row([
            "Audio Codec".to_string(),
            or_unknown(audio.codec_name.as_deref()),
        ]);
        table.row([
            "Audio Channels".to_string(),
            audio
                .channels
                .map(|c| c.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        ]);
        if let Some(rate) = parse_number(audio.sample_rate.as_deref()) {
            table.row([
                "Sample Rate".to_string(),
                format!("{:.1} kHz", rate / 1000.0),
            ]);
        }
        if let Some(rate) = kbps(audio.bit_rate.as_deref()) {
            table.row(["Audio Bitrate".to_string(), rate]);
        }
    }

    let subtitles = probe.subtitles();
    if !subtitles.is_empty() {
        table.section();
        table.row(["Subtitle Tracks".to_string(), subtitles.len().to_string()]);
        for (i, sub) in subtitles.iter().enumerate() {
            table.row([
                format!("Subtitle {}", i + 1),
                format!(
                    "{} ({})",
                    or_unknown(sub.codec_name.as_deref()),
                    or_unknown(sub.tags.language.as_deref())
                ),
            ]);
        }
    }

    table
}

pub fn run(options: &InfoOptions, ctx: &mut Context<'_>) -> Result<Outcome> {
    let mut probe = ctx.engine.probe(&options.input)?;

    if probe.video().is_some() && (options.exact_frames || probe.declared_frames().is_none()) {
        if !options.json {
            ctx.reporter
                .detail("Calculating exact frame count (this may take a while)...");
        }
        match ctx.engine.count_frames(&options.input) {
            Ok(frames) => probe.set_frames(frames),
            Err(err @ Error::UnexpectedOutput { .. }) => {
                ctx.reporter.warn(&format!("Could not count frames: {}", err));
            }
            Err(err) => return Err(err),
        }
    }

    if options.json {
        let json = serde_json::to_string_pretty(probe.raw())?;
        ctx.reporter.print(&json);
    } else {
        ctx.reporter
            .print(&info_table(&options.input, &probe).render(true));
    }
    Ok(Outcome::Completed)
}
