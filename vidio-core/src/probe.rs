//! Typed view over `ffprobe -print_format json -show_format -show_streams`.
//!
//! The raw JSON document is kept alongside the typed fields so `info --json`
//! can print exactly what ffprobe reported.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::geometry::Dimensions;

#[derive(Debug, Clone)]
pub struct MediaProbe {
    pub format: ProbeFormat,
    pub streams: Vec<ProbeStream>,
    raw: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    pub format_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub bit_rate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub nb_frames: Option<String>,
    pub r_frame_rate: Option<String>,
    pub pix_fmt: Option<String>,
    pub color_space: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub bit_rate: Option<String>,
    pub channels: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sample_rate: Option<String>,
    #[serde(default)]
    pub tags: ProbeTags,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeTags {
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

impl MediaProbe {
    /// Parse ffprobe's JSON output.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let doc: ProbeDocument = serde_json::from_value(raw.clone())?;
        Ok(Self {
            format: doc.format,
            streams: doc.streams,
            raw,
        })
    }

    fn streams_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ProbeStream> + 'a {
        self.streams
            .iter()
            .filter(move |s| s.codec_type.as_deref() == Some(kind))
    }

    /// First video stream, if any.
    pub fn video(&self) -> Option<&ProbeStream> {
        self.streams_of("video").next()
    }

    /// First audio stream, if any.
    pub fn audio(&self) -> Option<&ProbeStream> {
        self.streams_of("audio").next()
    }

    pub fn subtitles(&self) -> Vec<&ProbeStream> {
        self.streams_of("subtitle").collect()
    }

    /// Dimensions of the first video stream.
    ///
    /// `path` is only used for the error message.
    pub fn dimensions(&self, path: &Path) -> Result<Dimensions> {
        let video = self
            .video()
            .ok_or_else(|| Error::NoVideoStream(path.to_path_buf()))?;
        match (video.width, video.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok(Dimensions {
                width: w,
                height: h,
            }),
            _ => Err(Error::DimensionsUnavailable(path.to_path_buf())),
        }
    }

    /// Container duration in seconds, 0 when unknown.
    pub fn duration_seconds(&self) -> f64 {
        parse_number(self.format.duration.as_deref()).unwrap_or(0.0)
    }

    /// File size in bytes, 0 when unknown.
    pub fn size_bytes(&self) -> u64 {
        self.format
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// Frame count declared in the container metadata.
    ///
    /// `N/A` and `0` count as unknown.
    pub fn declared_frames(&self) -> Option<u64> {
        self.video()
            .and_then(|v| v.nb_frames.as_deref())
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|&n| n > 0)
    }

    /// Record an exact frame count so it shows up in the raw document too.
    pub fn set_frames(&mut self, frames: u64) {
        let index = self
            .streams
            .iter()
            .position(|s| s.codec_type.as_deref() == Some("video"));
        if let Some(index) = index {
            self.streams[index].nb_frames = Some(frames.to_string());
            if let Some(stream) = self
                .raw
                .get_mut("streams")
                .and_then(|s| s.get_mut(index))
                .and_then(|s| s.as_object_mut())
            {
                stream.insert("nb_frames".into(), frames.to_string().into());
            }
        }
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl ProbeStream {
    /// `r_frame_rate` (`"30000/1001"`) as frames per second.
    pub fn frame_rate(&self) -> Option<f64> {
        let (num, den) = self.r_frame_rate.as_deref()?.split_once('/')?;
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            return None;
        }
        Some(num / den)
    }
}

/// ffprobe reports most numbers as strings, but not always.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse a numeric probe field.
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse().ok())
}
