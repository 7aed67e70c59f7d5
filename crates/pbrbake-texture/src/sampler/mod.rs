//! Resampling strategies.
//!
//! Every sampler takes normalized `(u, v)` coordinates inside a pixel-space
//! bounding rectangle of its source. The rectangle binds one tile or one
//! animation frame inside a larger atlas, and the edge policy (wrap or clamp)
//! applies per axis at the rectangle's edges.
//!
//! Pixel centers sit at `(i + 0.5) / width`, so sampling exactly there with
//! any interpolating sampler returns the stored value.

mod average;
mod bicubic;
mod bilinear;
mod nearest;
mod row;

pub use average::{AverageSampler, WeightedAverageSampler};
pub use bicubic::BicubicSampler;
pub use bilinear::BilinearSampler;
pub use nearest::NearestSampler;
pub use row::{CachedRows, RowSampler};

use pbrbake_spec::{ColorChannel, SamplerKind};

use crate::buffer::PixelSource;

/// Pixel-space rectangle a sampler is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleBounds {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl SampleBounds {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The whole source.
    pub fn full<S: PixelSource + ?Sized>(source: &S) -> Self {
        Self::new(0, 0, source.width(), source.height())
    }

    /// One frame of a vertical animation strip.
    pub fn frame(width: u32, frame_height: u32, frame: u32) -> Self {
        Self::new(0, (frame * frame_height) as i32, width, frame_height)
    }
}

/// Per-axis edge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeMode {
    pub wrap_x: bool,
    pub wrap_y: bool,
}

impl EdgeMode {
    pub fn new(wrap_x: bool, wrap_y: bool) -> Self {
        Self { wrap_x, wrap_y }
    }

    pub fn clamp() -> Self {
        Self::default()
    }

    pub fn wrap() -> Self {
        Self::new(true, true)
    }
}

/// Tuning shared by the box filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
    /// Source pixels covered by one destination pixel, horizontally.
    pub range_x: f32,
    /// Source pixels covered by one destination pixel, vertically.
    pub range_y: f32,
    /// Fraction of the weighted average given to the center sample.
    pub center_weight: f32,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            range_x: 1.0,
            range_y: 1.0,
            center_weight: pbrbake_spec::profile::DEFAULT_WEIGHTED_CENTER,
        }
    }
}

impl SamplerOptions {
    /// Options for resizing `source` pixels to `target` pixels per axis.
    pub fn for_resize(source: (u32, u32), target: (u32, u32), center_weight: f32) -> Self {
        Self {
            range_x: source.0 as f32 / target.0.max(1) as f32,
            range_y: source.1 as f32 / target.1.max(1) as f32,
            center_weight,
        }
    }
}

/// A resampling strategy.
pub trait Sampler {
    /// One channel at normalized coordinates.
    fn sample_channel(&self, u: f32, v: f32, channel: ColorChannel) -> f32;

    /// All four color channels at normalized coordinates.
    fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        [
            self.sample_channel(u, v, ColorChannel::Red),
            self.sample_channel(u, v, ColorChannel::Green),
            self.sample_channel(u, v, ColorChannel::Blue),
            self.sample_channel(u, v, ColorChannel::Alpha),
        ]
    }
}

/// Build a sampler of the given kind.
pub fn create_sampler<'a, S: PixelSource>(
    kind: SamplerKind,
    source: &'a S,
    bounds: SampleBounds,
    edges: EdgeMode,
    options: SamplerOptions,
) -> Box<dyn Sampler + 'a> {
    let grid = Grid::new(source, bounds, edges);
    match kind {
        SamplerKind::Nearest => Box::new(NearestSampler::new(grid)),
        SamplerKind::Bilinear => Box::new(BilinearSampler::new(grid)),
        SamplerKind::Bicubic => Box::new(BicubicSampler::new(grid)),
        SamplerKind::Average => Box::new(AverageSampler::new(grid, options)),
        SamplerKind::WeightedAverage => Box::new(WeightedAverageSampler::new(grid, options)),
    }
}

/// Integer texel access with the edge policy applied.
pub struct Grid<'a, S> {
    source: &'a S,
    bounds: SampleBounds,
    edges: EdgeMode,
}

/// Distance from a texel center below which a coordinate counts as on it.
const CENTER_SNAP: f64 = 1e-5;

/// Integer texel and fractional offset of a center-based pixel coordinate.
/// Offsets within [`CENTER_SNAP`] of either neighbor snap onto it, so
/// rounding in `u * width` never blends a pixel center with its neighbor.
#[inline]
pub(crate) fn split_coord(coord: f64) -> (i64, f32) {
    let nearest = coord.round();
    if (coord - nearest).abs() < CENTER_SNAP {
        return (nearest as i64, 0.0);
    }
    let base = coord.floor();
    (base as i64, (coord - base) as f32)
}

impl<'a, S: PixelSource> Grid<'a, S> {
    pub fn new(source: &'a S, bounds: SampleBounds, edges: EdgeMode) -> Self {
        Self {
            source,
            bounds,
            edges,
        }
    }

    /// Pixel-space coordinates with texel centers at integers.
    #[inline]
    pub fn to_pixel(&self, u: f32, v: f32) -> (f64, f64) {
        (
            self.bounds.left as f64 + u as f64 * self.bounds.width as f64 - 0.5,
            self.bounds.top as f64 + v as f64 * self.bounds.height as f64 - 0.5,
        )
    }

    /// Pixel-space coordinates with texel edges at integers.
    #[inline]
    pub fn to_pixel_edges(&self, u: f32, v: f32) -> (f64, f64) {
        let (x, y) = self.to_pixel(u, v);
        (x + 0.5, y + 0.5)
    }

    #[inline]
    pub fn texel(&self, x: i64, y: i64, channel: ColorChannel) -> f32 {
        let sx = resolve(
            x,
            self.bounds.left,
            self.bounds.width,
            self.edges.wrap_x,
            self.source.width(),
        );
        let sy = resolve(
            y,
            self.bounds.top,
            self.bounds.height,
            self.edges.wrap_y,
            self.source.height(),
        );
        self.source.texel(sx, sy, channel)
    }
}

/// Map an integer coordinate into the rectangle `[start, start + len)`.
#[inline]
fn resolve(coord: i64, start: i32, len: u32, wrap: bool, limit: u32) -> u32 {
    let start = start as i64;
    let len = len.max(1) as i64;
    let c = if wrap {
        start + (coord - start).rem_euclid(len)
    } else {
        coord.clamp(start, start + len - 1)
    };
    c.clamp(0, limit.max(1) as i64 - 1) as u32
}
