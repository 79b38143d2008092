//! Subcommand implementations.
//!
//! Each command validates its options, resolves geometry, builds the FFmpeg
//! invocation and hands it to the [`Engine`]. Nothing here touches the
//! terminal directly: output goes through the [`Reporter`] and the overwrite
//! question through the `confirm` callback.

pub mod concat;
pub mod crop;
pub mod grid;
pub mod info;
pub mod list;
pub mod resize;
pub mod to_gif;
pub mod trim;

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::ffmpeg_wrapper::Engine;
use crate::geometry::Dimensions;
use crate::report::Reporter;

/// How a command ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The user declined to overwrite the output file
    Aborted,
}

/// Everything a command needs from its surroundings
pub struct Context<'a> {
    pub engine: &'a dyn Engine,
    pub reporter: &'a mut dyn Reporter,
    pub config: &'a Config,
    /// Asked before replacing an existing file; `true` means go ahead
    pub confirm: &'a mut dyn FnMut(&str) -> bool,
}

impl Context<'_> {
    /// Decide how FFmpeg may treat `output`.
    ///
    /// Returns the value for `-y` (true) or `-n` (false), or `None` when the
    /// file exists and the user declined to replace it.
    pub fn claim_output(&mut self, output: &Path, overwrite: bool) -> Option<bool> {
        if overwrite {
            return Some(true);
        }
        if !output.exists() {
            return Some(false);
        }
        let question = format!("Output file {} already exists. Overwrite?", output.display());
        if (self.confirm)(&question) {
            Some(true)
        } else {
            log::info!("Not overwriting {}", output.display());
            None
        }
    }

    /// Probe `path` and return the size of its first video stream
    pub fn probe_dimensions(&mut self, path: &Path) -> Result<Dimensions> {
        let probe = self.engine.probe(path)?;
        let dims = probe.dimensions(path)?;
        log::debug!("{}: {}", path.display(), dims);
        Ok(dims)
    }
}
