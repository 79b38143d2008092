//! Pure geometry: crop regions, scale targets and grid layouts.
//!
//! Nothing here touches the filesystem or spawns processes. Every resolver
//! returns either an error describing the violated constraint or a
//! [`Resolved`] value carrying the non-fatal [`Advisory`] notes that the
//! orchestrators forward to the user.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::{Axis, BoundsViolation, Error, Result};
use crate::presets::CropPreset;

/// Crops below this size on either axis get a quality warning.
pub const SMALL_CROP_THRESHOLD: u32 = 64;

/// Sources above this size on either axis get a slowness note.
pub const LARGE_SOURCE_THRESHOLD: u32 = 16384;

/// Factor bounds for `resize --scale`.
pub const RESIZE_SCALE_BOUNDS: ScaleBounds = ScaleBounds { min: 0.0, max: 10.0 };

/// Factor bounds for `to-gif --scale`.
pub const GIF_SCALE_BOUNDS: ScaleBounds = ScaleBounds { min: 0.1, max: 2.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropRegion {
    /// Check the region against the source frame.
    pub fn validate(&self, source: Dimensions) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::CropOutOfBounds(BoundsViolation::Empty {
                width: self.width,
                height: self.height,
            }));
        }
        if u64::from(self.x) + u64::from(self.width) > u64::from(source.width) {
            return Err(Error::exceeds(Axis::Width, self.x, self.width, source.width));
        }
        if u64::from(self.y) + u64::from(self.height) > u64::from(source.height) {
            return Err(Error::exceeds(
                Axis::Height,
                self.y,
                self.height,
                source.height,
            ));
        }
        Ok(())
    }
}

/// Non-fatal condition noticed while resolving geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// An odd crop side was shrunk by one pixel.
    EvenAdjusted { axis: Axis, from: u32, to: u32 },
    /// No offsets were given, so the crop was centered.
    Centered,
    /// Manual crop values were given alongside a preset and ignored.
    PresetOverridesManual,
    SmallCrop { width: u32, height: u32 },
    LargeSource(Dimensions),
    /// Both width and height were given while keeping aspect ratio.
    AspectNotPreserved { requested: Dimensions, source: Dimensions },
    ForcedAspect,
    /// Grid cell size needs both width and height.
    CellSizeIgnored,
    /// Padding only applies to fixed-size grid cells.
    PaddingIgnored,
}

impl Advisory {
    /// Warnings deserve more attention than informational notes.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Advisory::PresetOverridesManual
                | Advisory::SmallCrop { .. }
                | Advisory::LargeSource(_)
                | Advisory::AspectNotPreserved { .. }
                | Advisory::ForcedAspect
                | Advisory::CellSizeIgnored
                | Advisory::PaddingIgnored
        )
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::EvenAdjusted { axis, to, .. } => write!(
                f,
                "Adjusted {} to {} (must be even for codec compatibility)",
                axis, to
            ),
            Advisory::Centered => f.write_str("Centering crop region (no offsets specified)"),
            Advisory::PresetOverridesManual => {
                f.write_str("Preset specified, ignoring manual crop parameters")
            }
            Advisory::SmallCrop { width, height } => write!(
                f,
                "Very small crop dimensions ({}x{}). Output quality may be poor.",
                width, height
            ),
            Advisory::LargeSource(dims) => write!(
                f,
                "Very large video dimensions ({}). Processing may be slow.",
                dims
            ),
            Advisory::AspectNotPreserved { requested, source } => write!(
                f,
                "Both width and height given: output will be exactly {} and may not keep the {} source aspect ratio",
                requested, source
            ),
            Advisory::ForcedAspect => f.write_str("Forcing aspect ratio may distort the video"),
            Advisory::CellSizeIgnored => {
                f.write_str("Cell size needs both --width and --height, using automatic sizing")
            }
            Advisory::PaddingIgnored => {
                f.write_str("Padding only applies when both --width and --height are given")
            }
        }
    }
}

/// A resolved value plus the advisories produced on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Resolved<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            advisories: Vec::new(),
        }
    }
}

/// User-supplied crop parameters.
#[derive(Debug, Clone, Default)]
pub struct CropRequest {
    pub preset: Option<CropPreset>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub x: Option<u32>,
    pub y: Option<u32>,
    /// Center the region when no offsets are given.
    pub center: bool,
}

impl CropRequest {
    fn has_manual_values(&self) -> bool {
        self.width.is_some() || self.height.is_some() || self.x.is_some() || self.y.is_some()
    }
}

/// Resolve a crop request against the source frame.
///
/// Odd sides are shrunk to the nearest even number before the final bounds
/// check, so the returned region is always encoder friendly and inside the
/// source.
pub fn resolve_crop(request: &CropRequest, source: Dimensions) -> Result<Resolved<CropRegion>> {
    let source = Dimensions::new(source.width, source.height)?;
    if source.width < 2 || source.height < 2 {
        return Err(Error::InvalidDimensions {
            width: source.width,
            height: source.height,
        });
    }

    let mut resolved = Resolved::new(CropRegion {
        width: 0,
        height: 0,
        x: 0,
        y: 0,
    });
    if source.width > LARGE_SOURCE_THRESHOLD || source.height > LARGE_SOURCE_THRESHOLD {
        resolved.advisories.push(Advisory::LargeSource(source));
    }

    let region = if let Some(preset) = request.preset {
        if request.has_manual_values() {
            resolved.advisories.push(Advisory::PresetOverridesManual);
        }
        preset.region(source)
    } else {
        let (width, height) = match (request.width, request.height) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(Error::MissingDimensions),
        };
        if width > source.width {
            return Err(Error::exceeds(Axis::Width, 0, width, source.width));
        }
        if height > source.height {
            return Err(Error::exceeds(Axis::Height, 0, height, source.height));
        }

        if request.x.is_none() && request.y.is_none() && request.center {
            resolved.advisories.push(Advisory::Centered);
            CropRegion {
                width,
                height,
                x: (source.width - width) / 2,
                y: (source.height - height) / 2,
            }
        } else {
            CropRegion {
                width,
                height,
                x: request.x.unwrap_or(0),
                y: request.y.unwrap_or(0),
            }
        }
    };

    let region = make_even(region, &mut resolved.advisories);

    if region.width < SMALL_CROP_THRESHOLD || region.height < SMALL_CROP_THRESHOLD {
        resolved.advisories.push(Advisory::SmallCrop {
            width: region.width,
            height: region.height,
        });
    }

    region.validate(source)?;
    resolved.value = region;
    Ok(resolved)
}

fn make_even(mut region: CropRegion, advisories: &mut Vec<Advisory>) -> CropRegion {
    if region.width % 2 != 0 {
        let from = region.width;
        region.width -= 1;
        advisories.push(Advisory::EvenAdjusted {
            axis: Axis::Width,
            from,
            to: region.width,
        });
    }
    if region.height % 2 != 0 {
        let from = region.height;
        region.height -= 1;
        advisories.push(Advisory::EvenAdjusted {
            axis: Axis::Height,
            from,
            to: region.height,
        });
    }
    region
}

/// Exclusive lower and inclusive upper bound on a scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    pub fn check(&self, factor: f64) -> Result<()> {
        if factor > self.min && factor <= self.max {
            Ok(())
        } else {
            Err(Error::ScaleOutOfRange {
                factor,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Output size handed to the `scale` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleTarget {
    Exact { width: u32, height: u32 },
    /// Fixed width, height derived from the aspect ratio and forced even.
    Width(u32),
    /// Fixed height, width derived from the aspect ratio and forced even.
    Height(u32),
}

impl fmt::Display for ScaleTarget {
    /// Renders the `W:H` argument pair of the `scale` filter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleTarget::Exact { width, height } => write!(f, "{}:{}", width, height),
            ScaleTarget::Width(width) => write!(f, "{}:-2", width),
            ScaleTarget::Height(height) => write!(f, "-2:{}", height),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub factor: Option<f64>,
    /// Keep the source aspect ratio when only one axis is given.
    pub preserve_aspect: bool,
}

impl ScaleRequest {
    /// Parameter checks that need no source dimensions.
    pub fn validate(&self, bounds: ScaleBounds) -> Result<()> {
        if self.factor.is_some() {
            if self.width.is_some() {
                return Err(Error::ConflictingScaleParams("width"));
            }
            if self.height.is_some() {
                return Err(Error::ConflictingScaleParams("height"));
            }
        }
        if self.width.is_none() && self.height.is_none() && self.factor.is_none() {
            return Err(Error::MissingScaleParams);
        }
        if let Some(factor) = self.factor {
            bounds.check(factor)?;
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(Error::InvalidDimensions {
                width: self.width.unwrap_or(0),
                height: self.height.unwrap_or(0),
            });
        }
        Ok(())
    }
}

/// Multiply both sides by `factor`, floor, then shrink odd results by one.
pub fn scale_by_factor(source: Dimensions, factor: f64) -> Result<Dimensions> {
    let width = (source.width as f64 * factor).floor() as u32;
    let height = (source.height as f64 * factor).floor() as u32;
    Dimensions::new(width - width % 2, height - height % 2)
}

/// Resolve a resize request into a scale target.
pub fn resolve_scale(
    request: &ScaleRequest,
    bounds: ScaleBounds,
    source: Dimensions,
) -> Result<Resolved<ScaleTarget>> {
    request.validate(bounds)?;

    if let Some(factor) = request.factor {
        let scaled = scale_by_factor(source, factor)?;
        return Ok(Resolved::new(ScaleTarget::Exact {
            width: scaled.width,
            height: scaled.height,
        }));
    }

    if !request.preserve_aspect {
        let mut resolved = Resolved::new(ScaleTarget::Exact {
            width: request.width.unwrap_or(source.width),
            height: request.height.unwrap_or(source.height),
        });
        resolved.advisories.push(Advisory::ForcedAspect);
        return Ok(resolved);
    }

    match (request.width, request.height) {
        (Some(width), Some(height)) => {
            let mut resolved = Resolved::new(ScaleTarget::Exact { width, height });
            let requested = Dimensions { width, height };
            let drift = (requested.aspect_ratio() - source.aspect_ratio()).abs();
            if drift > source.aspect_ratio() * 0.01 {
                resolved.advisories.push(Advisory::AspectNotPreserved { requested, source });
            }
            Ok(resolved)
        }
        (Some(width), None) => Ok(Resolved::new(ScaleTarget::Width(width))),
        (None, Some(height)) => Ok(Resolved::new(ScaleTarget::Height(height))),
        (None, None) => Err(Error::MissingScaleParams),
    }
}

/// Resolve the scale of an animated-image conversion.
///
/// Unlike [`resolve_scale`], giving nothing keeps the source size.
pub fn resolve_gif_scale(
    width: Option<u32>,
    factor: Option<f64>,
    source: Dimensions,
) -> Result<ScaleTarget> {
    match (width, factor) {
        (Some(_), Some(_)) => Err(Error::ConflictingScaleParams("width")),
        (None, Some(factor)) => {
            GIF_SCALE_BOUNDS.check(factor)?;
            let scaled = scale_by_factor(source, factor)?;
            Ok(ScaleTarget::Exact {
                width: scaled.width,
                height: scaled.height,
            })
        }
        (Some(0), None) => Err(Error::InvalidDimensions {
            width: 0,
            height: source.height,
        }),
        (Some(width), None) => Ok(ScaleTarget::Width(width)),
        (None, None) => Ok(ScaleTarget::Exact {
            width: source.width,
            height: source.height,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
}

impl GridLayout {
    pub fn cells(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.cols)
    }

    /// Row-major `(row, col)` of item `index`.
    pub fn position(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (index / self.cols, index % self.cols)
    }
}

/// Compute a grid that holds `item_count` items.
///
/// With neither side given the grid is as square as possible, leaning
/// towards more columns than rows.
pub fn calculate_grid_size(
    item_count: usize,
    rows: Option<NonZeroU32>,
    cols: Option<NonZeroU32>,
) -> Result<GridLayout> {
    if item_count < 2 {
        return Err(Error::NotEnoughInputs {
            required: 2,
            got: item_count,
        });
    }
    let items = item_count as u32;

    let layout = match (rows, cols) {
        (Some(rows), Some(cols)) => {
            let cells = u64::from(rows.get()) * u64::from(cols.get());
            if cells < item_count as u64 {
                return Err(Error::GridTooSmall {
                    rows: rows.get(),
                    cols: cols.get(),
                    cells,
                    items: item_count,
                });
            }
            GridLayout {
                rows: rows.get(),
                cols: cols.get(),
            }
        }
        (Some(rows), None) => GridLayout {
            rows: rows.get(),
            cols: items.div_ceil(rows.get()),
        },
        (None, Some(cols)) => GridLayout {
            rows: items.div_ceil(cols.get()),
            cols: cols.get(),
        },
        (None, None) => {
            let cols = (items as f64).sqrt().ceil() as u32;
            GridLayout {
                rows: items.div_ceil(cols),
                cols,
            }
        }
    };
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn nz(n: u32) -> Option<NonZeroU32> {
        NonZeroU32::new(n)
    }

    fn manual(width: u32, height: u32, x: Option<u32>, y: Option<u32>) -> CropRequest {
        CropRequest {
            width: Some(width),
            height: Some(height),
            x,
            y,
            center: true,
            ..Default::default()
        }
    }

    #[test]
    fn dimensions_reject_zero() {
        assert!(matches!(
            Dimensions::new(0, 10),
            Err(Error::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(Dimensions::new(1, 1).is_ok());
    }

    #[test]
    fn preset_crop_checks_source_first() {
        let request = CropRequest {
            preset: Some(CropPreset::CenterSquare),
            ..Default::default()
        };
        assert!(matches!(
            resolve_crop(&request, dims(0, 360)),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn preset_crop_center_square() {
        let request = CropRequest {
            preset: Some(CropPreset::CenterSquare),
            ..Default::default()
        };
        let resolved = resolve_crop(&request, dims(640, 360)).unwrap();
        assert_eq!(
            resolved.value,
            CropRegion {
                width: 360,
                height: 360,
                x: 140,
                y: 0
            }
        );
        assert!(resolved.advisories.is_empty());
    }

    #[test]
    fn preset_wins_over_manual_values() {
        let request = CropRequest {
            preset: Some(CropPreset::Widescreen),
            width: Some(100),
            ..Default::default()
        };
        let resolved = resolve_crop(&request, dims(640, 360)).unwrap();
        assert_eq!(resolved.value.width, 640);
        assert!(resolved
            .advisories
            .contains(&Advisory::PresetOverridesManual));
    }

    #[test]
    fn manual_crop_needs_both_sides() {
        let request = CropRequest {
            width: Some(100),
            center: true,
            ..Default::default()
        };
        assert!(matches!(
            resolve_crop(&request, dims(640, 360)),
            Err(Error::MissingDimensions)
        ));
        assert!(matches!(
            resolve_crop(&CropRequest::default(), dims(640, 360)),
            Err(Error::MissingDimensions)
        ));
    }

    #[test]
    fn manual_crop_centers_without_offsets() {
        let resolved = resolve_crop(&manual(320, 180, None, None), dims(640, 360)).unwrap();
        assert_eq!(
            resolved.value,
            CropRegion {
                width: 320,
                height: 180,
                x: 160,
                y: 90
            }
        );
        assert_eq!(resolved.advisories, vec![Advisory::Centered]);
    }

    #[test]
    fn manual_crop_defaults_offsets_to_zero_without_centering() {
        let mut request = manual(320, 180, None, None);
        request.center = false;
        let resolved = resolve_crop(&request, dims(640, 360)).unwrap();
        assert_eq!((resolved.value.x, resolved.value.y), (0, 0));

        let resolved = resolve_crop(&manual(320, 180, Some(10), None), dims(640, 360)).unwrap();
        assert_eq!((resolved.value.x, resolved.value.y), (10, 0));
    }

    #[test]
    fn odd_sides_are_made_even_and_stay_in_bounds() {
        for (w, h, x, y) in [(321, 181, 0, 0), (639, 359, 1, 1), (3, 5, 636, 354), (1, 3, 0, 0)] {
            let result = resolve_crop(&manual(w, h, Some(x), Some(y)), dims(640, 360));
            match result {
                Ok(resolved) => {
                    let r = resolved.value;
                    assert_eq!(r.width % 2, 0);
                    assert_eq!(r.height % 2, 0);
                    assert_eq!(r.width, w - w % 2);
                    assert_eq!(r.height, h - h % 2);
                    assert!(r.x + r.width <= 640 && r.y + r.height <= 360);
                }
                // A 1-pixel side collapses to nothing
                Err(Error::CropOutOfBounds(BoundsViolation::Empty { width, .. })) => {
                    assert_eq!(w, 1);
                    assert_eq!(width, 0);
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn odd_adjustment_is_reported() {
        let resolved = resolve_crop(&manual(321, 180, Some(0), Some(0)), dims(640, 360)).unwrap();
        assert_eq!(
            resolved.advisories,
            vec![Advisory::EvenAdjusted {
                axis: Axis::Width,
                from: 321,
                to: 320
            }]
        );
    }

    #[test]
    fn crop_touching_the_edge_is_accepted() {
        let resolved = resolve_crop(&manual(320, 180, Some(320), Some(180)), dims(640, 360));
        assert!(resolved.is_ok());
    }

    #[test]
    fn crop_one_past_the_edge_is_rejected() {
        let err = resolve_crop(&manual(320, 180, Some(322), Some(0)), dims(640, 360)).unwrap_err();
        match err {
            Error::CropOutOfBounds(BoundsViolation::Exceeds { axis, overflow, .. }) => {
                assert_eq!(axis, Axis::Width);
                assert_eq!(overflow, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let region = CropRegion {
            width: 320,
            height: 180,
            x: 321,
            y: 0,
        };
        match region.validate(dims(640, 360)) {
            Err(Error::CropOutOfBounds(BoundsViolation::Exceeds { overflow, .. })) => {
                assert_eq!(overflow, 1)
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn crop_larger_than_source_is_rejected_before_centering() {
        let err = resolve_crop(&manual(800, 100, None, None), dims(640, 360)).unwrap_err();
        assert!(matches!(
            err,
            Error::CropOutOfBounds(BoundsViolation::Exceeds {
                axis: Axis::Width,
                overflow: 160,
                ..
            })
        ));
    }

    #[test]
    fn small_crop_and_large_source_are_advisories() {
        let resolved = resolve_crop(&manual(32, 32, Some(0), Some(0)), dims(640, 360)).unwrap();
        assert!(resolved
            .advisories
            .contains(&Advisory::SmallCrop { width: 32, height: 32 }));

        let request = CropRequest {
            preset: Some(CropPreset::CenterSquare),
            ..Default::default()
        };
        let resolved = resolve_crop(&request, dims(20000, 1000)).unwrap();
        assert!(matches!(resolved.advisories[0], Advisory::LargeSource(_)));
    }

    #[test]
    fn tiny_source_cannot_be_cropped() {
        let request = CropRequest {
            preset: Some(CropPreset::CenterSquare),
            ..Default::default()
        };
        assert!(matches!(
            resolve_crop(&request, dims(1, 360)),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn scale_factor_floors_then_forces_even() {
        let target = resolve_scale(
            &ScaleRequest {
                factor: Some(0.5),
                preserve_aspect: true,
                ..Default::default()
            },
            RESIZE_SCALE_BOUNDS,
            dims(640, 360),
        )
        .unwrap();
        assert_eq!(
            target.value,
            ScaleTarget::Exact {
                width: 320,
                height: 180
            }
        );

        let scaled = scale_by_factor(dims(641, 361), 0.5).unwrap();
        assert_eq!(scaled, dims(320, 180));
        let scaled = scale_by_factor(dims(1000, 562), 0.333).unwrap();
        assert_eq!(scaled, dims(332, 186));
    }

    #[test]
    fn scale_factor_rederivation_is_stable() {
        let once = scale_by_factor(dims(641, 361), 0.5).unwrap();
        let twice = scale_by_factor(once, 1.0).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn conflicting_scale_params_fail_first() {
        for (width, height, factor) in [
            (Some(640), None, 0.5),
            (None, Some(360), 0.5),
            (Some(640), Some(360), 2.0),
            (Some(640), None, 50.0),
            (Some(0), None, -1.0),
        ] {
            for preserve_aspect in [true, false] {
                let request = ScaleRequest {
                    width,
                    height,
                    factor: Some(factor),
                    preserve_aspect,
                };
                assert!(matches!(
                    request.validate(RESIZE_SCALE_BOUNDS),
                    Err(Error::ConflictingScaleParams(_))
                ));
                // Even with an unusable source
                assert!(matches!(
                    resolve_scale(&request, RESIZE_SCALE_BOUNDS, dims(1, 1)),
                    Err(Error::ConflictingScaleParams(_))
                ));
            }
        }
    }

    #[test]
    fn missing_scale_params() {
        assert!(matches!(
            ScaleRequest::default().validate(RESIZE_SCALE_BOUNDS),
            Err(Error::MissingScaleParams)
        ));
    }

    #[test]
    fn scale_factor_bounds() {
        assert!(RESIZE_SCALE_BOUNDS.check(10.0).is_ok());
        assert!(RESIZE_SCALE_BOUNDS.check(0.01).is_ok());
        assert!(RESIZE_SCALE_BOUNDS.check(0.0).is_err());
        assert!(RESIZE_SCALE_BOUNDS.check(10.5).is_err());
        assert!(GIF_SCALE_BOUNDS.check(2.0).is_ok());
        assert!(GIF_SCALE_BOUNDS.check(2.5).is_err());
        assert!(GIF_SCALE_BOUNDS.check(0.1).is_err());
        assert!(GIF_SCALE_BOUNDS.check(f64::NAN).is_err());
    }

    #[test]
    fn aspect_preserving_targets() {
        let source = dims(1920, 1080);
        let resolve = |width, height| {
            resolve_scale(
                &ScaleRequest {
                    width,
                    height,
                    factor: None,
                    preserve_aspect: true,
                },
                RESIZE_SCALE_BOUNDS,
                source,
            )
            .unwrap()
        };
        assert_eq!(resolve(Some(1280), None).value, ScaleTarget::Width(1280));
        assert_eq!(resolve(None, Some(720)).value, ScaleTarget::Height(720));
        assert_eq!(resolve(Some(1280), None).value.to_string(), "1280:-2");
        assert_eq!(resolve(None, Some(720)).value.to_string(), "-2:720");

        let same_ratio = resolve(Some(1280), Some(720));
        assert_eq!(same_ratio.value.to_string(), "1280:720");
        assert!(same_ratio.advisories.is_empty());

        let distorted = resolve(Some(1000), Some(1000));
        assert!(matches!(
            distorted.advisories[0],
            Advisory::AspectNotPreserved { .. }
        ));
    }

    #[test]
    fn forced_aspect_fills_missing_axis_from_source() {
        let resolved = resolve_scale(
            &ScaleRequest {
                width: Some(800),
                height: None,
                factor: None,
                preserve_aspect: false,
            },
            RESIZE_SCALE_BOUNDS,
            dims(1920, 1080),
        )
        .unwrap();
        assert_eq!(
            resolved.value,
            ScaleTarget::Exact {
                width: 800,
                height: 1080
            }
        );
        assert_eq!(resolved.advisories, vec![Advisory::ForcedAspect]);
    }

    #[test]
    fn gif_scale_modes() {
        let source = dims(641, 361);
        assert_eq!(
            resolve_gif_scale(None, None, source).unwrap(),
            ScaleTarget::Exact {
                width: 641,
                height: 361
            }
        );
        assert_eq!(
            resolve_gif_scale(Some(480), None, source).unwrap(),
            ScaleTarget::Width(480)
        );
        assert_eq!(
            resolve_gif_scale(None, Some(0.5), source).unwrap(),
            ScaleTarget::Exact {
                width: 320,
                height: 180
            }
        );
        assert!(matches!(
            resolve_gif_scale(Some(480), Some(0.5), source),
            Err(Error::ConflictingScaleParams(_))
        ));
        assert!(matches!(
            resolve_gif_scale(None, Some(3.0), source),
            Err(Error::ScaleOutOfRange { .. })
        ));
    }

    #[test]
    fn grid_size_table() {
        assert_eq!(
            calculate_grid_size(4, nz(2), nz(2)).unwrap(),
            GridLayout { rows: 2, cols: 2 }
        );
        assert_eq!(
            calculate_grid_size(5, nz(2), None).unwrap(),
            GridLayout { rows: 2, cols: 3 }
        );
        assert_eq!(
            calculate_grid_size(5, None, nz(2)).unwrap(),
            GridLayout { rows: 3, cols: 2 }
        );
        assert_eq!(
            calculate_grid_size(4, None, None).unwrap(),
            GridLayout { rows: 2, cols: 2 }
        );
        assert_eq!(
            calculate_grid_size(5, None, None).unwrap(),
            GridLayout { rows: 2, cols: 3 }
        );
        assert_eq!(
            calculate_grid_size(9, None, None).unwrap(),
            GridLayout { rows: 3, cols: 3 }
        );
    }

    #[test]
    fn grid_too_small() {
        match calculate_grid_size(5, nz(1), nz(2)) {
            Err(Error::GridTooSmall {
                cells: 2, items: 5, ..
            }) => {}
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn grid_needs_two_items() {
        assert!(matches!(
            calculate_grid_size(1, None, None),
            Err(Error::NotEnoughInputs { got: 1, .. })
        ));
    }

    #[test]
    fn grid_always_fits_items() {
        for items in 2..50usize {
            for rows in [None, nz(1), nz(3), nz(7)] {
                for cols in [None, nz(1), nz(4)] {
                    if let Ok(layout) = calculate_grid_size(items, rows, cols) {
                        assert!(layout.cells() >= items as u64);
                        assert!(layout.rows >= 1 && layout.cols >= 1);
                    } else {
                        assert!(rows.is_some() && cols.is_some());
                    }
                }
            }
        }
    }

    #[test]
    fn grid_positions_are_row_major() {
        let layout = GridLayout { rows: 2, cols: 3 };
        assert_eq!(layout.position(0), (0, 0));
        assert_eq!(layout.position(2), (0, 2));
        assert_eq!(layout.position(4), (1, 1));
    }
}
