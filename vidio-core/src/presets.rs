use crate::error::{Error, Result};
use crate::geometry::{CropRegion, Dimensions};

/// Named crop presets for common aspect ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPreset {
    /// Largest centered square
    CenterSquare,
    /// Widescreen 16:9
    Widescreen,
    /// Vertical 9:16 for phone-first platforms
    Vertical,
    /// Classic 4:3
    Standard,
}

impl CropPreset {
    /// Get preset from string name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "center-square" | "1:1" => Some(CropPreset::CenterSquare),
            "16:9" => Some(CropPreset::Widescreen),
            "9:16" => Some(CropPreset::Vertical),
            "4:3" => Some(CropPreset::Standard),
            _ => None,
        }
    }

    /// Like [`CropPreset::from_name`], but fails with the list of valid names.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| Error::UnknownPreset {
            name: name.to_string(),
            valid: Self::list_all()
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Target aspect ratio as `(num, den)`
    pub fn ratio(&self) -> (u32, u32) {
        match self {
            CropPreset::CenterSquare => (1, 1),
            CropPreset::Widescreen => (16, 9),
            CropPreset::Vertical => (9, 16),
            CropPreset::Standard => (4, 3),
        }
    }

    /// Compute the crop region this preset selects from a `source` frame.
    ///
    /// The region always lies inside the frame and is centered on the axis
    /// that gets trimmed.
    pub fn region(&self, source: Dimensions) -> CropRegion {
        let (w, h) = (source.width, source.height);

        if let CropPreset::CenterSquare = self {
            let size = w.min(h);
            return CropRegion {
                width: size,
                height: size,
                x: (w - size) / 2,
                y: (h - size) / 2,
            };
        }

        let (num, den) = self.ratio();
        let (num, den) = (u64::from(num), u64::from(den));

        // w/h > num/den without floating point
        if u64::from(w) * den > u64::from(h) * num {
            // Too wide, trim the sides
            let width = (u64::from(h) * num / den) as u32;
            CropRegion {
                width,
                height: h,
                x: (w - width) / 2,
                y: 0,
            }
        } else {
            // Too tall, trim top and bottom
            let height = (u64::from(w) * den / num) as u32;
            CropRegion {
                width: w,
                height,
                x: 0,
                y: (h - height) / 2,
            }
        }
    }

    /// List all available presets
    pub fn list_all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("center-square", "Largest centered square"),
            ("16:9", "Widescreen 16:9"),
            ("9:16", "Vertical 9:16 (portrait)"),
            ("4:3", "Classic 4:3"),
            ("1:1", "Alias for center-square"),
        ]
    }
}
