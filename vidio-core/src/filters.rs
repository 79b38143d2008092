//! Filter recipes for each command, built on [`FilterGraph`].

use std::fmt;

use clap::ValueEnum;

use crate::error::{self, Error};
use crate::filter_graph::{FilterChain, FilterGraph, GraphError, Pad, Stack};
use crate::geometry::{CropRegion, Dimensions, GridLayout, ScaleTarget};

/// Row height every input is scaled to when the grid cell size is automatic.
pub const AUTO_GRID_HEIGHT: u32 = 360;

/// `crop=W:H:X:Y`
pub fn crop_filter(region: &CropRegion) -> String {
    format!(
        "crop={}:{}:{}:{}",
        region.width, region.height, region.x, region.y
    )
}

/// `scale=W:H`, with optional scaler flags such as `lanczos`.
pub fn scale_filter(target: &ScaleTarget, flags: Option<&str>) -> String {
    match flags {
        Some(flags) => format!("scale={}:flags={}", target, flags),
        None => format!("scale={}", target),
    }
}

/// All inputs composed side by side or stacked, in declaration order.
pub fn concat_graph(inputs: usize, direction: Stack) -> Result<FilterGraph, GraphError> {
    let mut graph = FilterGraph::new();
    let pads = (0..inputs).map(Pad::video).collect();
    graph.composite(direction.filter_name(), &[], pads, FilterGraph::OUTPUT)?;
    Ok(graph)
}

/// Number of grid cells that get an input.
fn used_cells(inputs: usize, layout: GridLayout) -> usize {
    usize::try_from(layout.cells()).map_or(inputs, |cells| inputs.min(cells))
}

/// Grid with fixed-size cells.
///
/// Every input is fitted into the cell box (aspect kept, remainder padded
/// with `background`) and placed at `col*(w+padding)`, `row*(h+padding)`.
pub fn fixed_grid_graph(
    inputs: usize,
    layout: GridLayout,
    cell: Dimensions,
    padding: u32,
    background: &str,
) -> Result<FilterGraph, GraphError> {
    let count = used_cells(inputs, layout);
    let mut graph = FilterGraph::new();

    let mut pads = Vec::with_capacity(count);
    let mut positions = Vec::with_capacity(count);
    for i in 0..count {
        let chain = FilterChain::new()
            .then(format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease",
                w = cell.width,
                h = cell.height
            ))
            .then(format!(
                "pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:{bg}",
                w = cell.width,
                h = cell.height,
                bg = background
            ));
        pads.push(graph.stage([Pad::video(i)], chain, format!("v{i}"))?);

        let (row, col) = layout.position(i);
        let x = u64::from(col) * (u64::from(cell.width) + u64::from(padding));
        let y = u64::from(row) * (u64::from(cell.height) + u64::from(padding));
        positions.push(format!("{}_{}", x, y));
    }

    let mut options = vec![format!("layout={}", positions.join("|"))];
    if padding > 0 {
        options.push(format!("fill={}", background));
    }
    graph.composite("xstack", &options, pads, FilterGraph::OUTPUT)?;
    Ok(graph)
}

/// Grid sized by its inputs.
///
/// Inputs are scaled to [`AUTO_GRID_HEIGHT`], each row is stacked
/// horizontally and the rows vertically. Rows left empty because the grid
/// has more cells than inputs produce no stage at all.
pub fn auto_grid_graph(inputs: usize, layout: GridLayout) -> Result<FilterGraph, GraphError> {
    let count = used_cells(inputs, layout);
    let mut graph = FilterGraph::new();

    let mut cells = Vec::with_capacity(count);
    for i in 0..count {
        let chain = FilterChain::new().then(format!("scale=-1:{}", AUTO_GRID_HEIGHT));
        cells.push(graph.stage([Pad::video(i)], chain, format!("v{i}"))?);
    }

    let mut rows = Vec::new();
    let mut cells = cells.into_iter();
    for row in 0..layout.rows {
        let members: Vec<Pad> = cells.by_ref().take(layout.cols as usize).collect();
        if members.is_empty() {
            break;
        }
        rows.push(graph.stack(Stack::Horizontal, members, format!("row{row}"))?);
    }

    graph.stack(Stack::Vertical, rows, FilterGraph::OUTPUT)?;
    Ok(graph)
}

/// Palette size per animated-image quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GifQuality {
    Low,
    Medium,
    High,
}

impl GifQuality {
    /// `low`, `medium`, `high`, or a number from 1 to 10 (1-3 low, 4-7
    /// medium, 8-10 high).
    pub fn parse(value: &str) -> error::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => return Ok(GifQuality::Low),
            "medium" => return Ok(GifQuality::Medium),
            "high" => return Ok(GifQuality::High),
            _ => {}
        }
        match value.trim().parse::<u8>() {
            Ok(1..=3) => Ok(GifQuality::Low),
            Ok(4..=7) => Ok(GifQuality::Medium),
            Ok(8..=10) => Ok(GifQuality::High),
            _ => Err(Error::InvalidQuality(value.to_string())),
        }
    }

    pub fn max_colors(&self) -> u32 {
        match self {
            GifQuality::Low => 128,
            GifQuality::Medium => 192,
            GifQuality::High => 256,
        }
    }
}

/// Dithering used when mapping frames onto the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dither {
    None,
    Bayer,
    #[default]
    #[value(name = "floyd_steinberg")]
    FloydSteinberg,
}

impl fmt::Display for Dither {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dither::None => "none",
            Dither::Bayer => "bayer",
            Dither::FloydSteinberg => "floyd_steinberg",
        })
    }
}

/// Frame-rate limit followed by a lanczos scale.
pub fn gif_base_chain(fps: u32, target: &ScaleTarget) -> FilterChain {
    FilterChain::new()
        .then(format!("fps={}", fps))
        .then(scale_filter(target, Some("lanczos")))
}

/// First pass: the base chain ending in `palettegen`.
pub fn palette_gen_chain(base: &FilterChain, quality: GifQuality) -> FilterChain {
    FilterChain::new().extend(base).then(format!(
        "palettegen=max_colors={}:reserve_transparent=0",
        quality.max_colors()
    ))
}

/// Second pass: the base chain over input 0, mapped through the palette
/// supplied as input 1.
pub fn palette_use_graph(base: &FilterChain, dither: Dither) -> Result<FilterGraph, GraphError> {
    let mut graph = FilterGraph::new();
    let scaled = graph.stage([Pad::video(0)], base.clone(), "x")?;
    graph.stage(
        [scaled, Pad::video(1)],
        FilterChain::new().then(format!("paletteuse=dither={}", dither)),
        FilterGraph::OUTPUT,
    )?;
    Ok(graph)
}
