//! Runtime configuration: engine binaries and encoding defaults.

use std::path::PathBuf;

/// Tool and encoder settings shared by every command
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `ffmpeg` binary (name looked up on `PATH`, or a full path)
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary
    pub ffprobe: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    /// CRF used when a command re-encodes video
    pub crf: u8,
    /// Encoder speed/compression preset
    pub preset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            crf: 23,
            preset: "medium".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `VIDIO_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("VIDIO_FFMPEG") {
            config.ffmpeg = PathBuf::from(path);
        }
        if let Some(path) = lookup("VIDIO_FFPROBE") {
            config.ffprobe = PathBuf::from(path);
        }
        if let Some(codec) = lookup("VIDIO_VIDEO_CODEC") {
            config.video_codec = codec;
        }
        if let Some(codec) = lookup("VIDIO_AUDIO_CODEC") {
            config.audio_codec = codec;
        }
        if let Some(crf) = lookup("VIDIO_CRF") {
            match crf.parse::<u8>() {
                Ok(value) if value <= 51 => config.crf = value,
                _ => log::warn!("Ignoring invalid VIDIO_CRF value: {}", crf),
            }
        }
        if let Some(preset) = lookup("VIDIO_PRESET") {
            config.preset = preset;
        }

        config
    }
}
