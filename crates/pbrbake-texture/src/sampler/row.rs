//! Row-cached sampling for scanline-order resizing.
//!
//! A destination scanline only touches a handful of source rows. The cache
//! copies those rows out of the source once, so adjacent destination pixels
//! (and the other channels of the same scanline) reuse them instead of
//! recomputing texels. Cached values are exact copies, so the output is
//! bit-identical to sampling the source directly.

use std::cell::RefCell;
use std::collections::VecDeque;

use pbrbake_spec::{ColorChannel, SamplerKind};

use super::{create_sampler, EdgeMode, SampleBounds, SamplerOptions};
use crate::buffer::PixelSource;

const CHANNELS: usize = 5;

#[inline]
fn slot(channel: ColorChannel) -> usize {
    channel.index().unwrap_or(4)
}

/// A [`PixelSource`] that keeps a bounded number of whole source rows.
///
/// Uses interior mutability and is deliberately `!Sync`: each worker thread
/// owns its own cache.
pub struct CachedRows<'a, S> {
    source: &'a S,
    capacity: usize,
    rows: RefCell<VecDeque<(u32, Vec<f32>)>>,
}

impl<'a, S: PixelSource> CachedRows<'a, S> {
    pub fn new(source: &'a S, capacity: usize) -> Self {
        Self {
            source,
            capacity: capacity.max(1),
            rows: RefCell::new(VecDeque::new()),
        }
    }

    /// Number of rows currently held.
    pub fn cached_rows(&self) -> usize {
        self.rows.borrow().len()
    }

    fn load_row(&self, y: u32) -> Vec<f32> {
        let width = self.source.width();
        let mut row = Vec::with_capacity(width as usize * CHANNELS);
        for x in 0..width {
            row.push(self.source.texel(x, y, ColorChannel::Red));
            row.push(self.source.texel(x, y, ColorChannel::Green));
            row.push(self.source.texel(x, y, ColorChannel::Blue));
            row.push(self.source.texel(x, y, ColorChannel::Alpha));
            row.push(self.source.texel(x, y, ColorChannel::Magnitude));
        }
        row
    }
}

impl<S: PixelSource> PixelSource for CachedRows<'_, S> {
    fn width(&self) -> u32 {
        self.source.width()
    }

    fn height(&self) -> u32 {
        self.source.height()
    }

    fn texel(&self, x: u32, y: u32, channel: ColorChannel) -> f32 {
        let idx = x as usize * CHANNELS + slot(channel);
        if let Some((_, row)) = self.rows.borrow().iter().find(|(ry, _)| *ry == y) {
            return row[idx];
        }
        let row = self.load_row(y);
        let value = row[idx];
        let mut rows = self.rows.borrow_mut();
        if rows.len() == self.capacity {
            rows.pop_front();
        }
        rows.push_back((y, row));
        value
    }
}

/// Samples whole destination scanlines through a [`CachedRows`] cache.
pub struct RowSampler<'a, S> {
    cache: CachedRows<'a, S>,
    kind: SamplerKind,
    bounds: SampleBounds,
    edges: EdgeMode,
    options: SamplerOptions,
}

impl<'a, S: PixelSource> RowSampler<'a, S> {
    pub fn new(
        source: &'a S,
        kind: SamplerKind,
        bounds: SampleBounds,
        edges: EdgeMode,
        options: SamplerOptions,
    ) -> Self {
        Self {
            cache: CachedRows::new(source, rows_needed(kind, &options)),
            kind,
            bounds,
            edges,
            options,
        }
    }

    /// Fill `out` with evenly spaced samples along the destination row at `v`.
    pub fn sample_row(&self, v: f32, channel: ColorChannel, out: &mut [f32]) {
        let sampler = create_sampler(self.kind, &self.cache, self.bounds, self.edges, self.options);
        let width = out.len() as f32;
        for (x, value) in out.iter_mut().enumerate() {
            let u = (x as f32 + 0.5) / width;
            *value = sampler.sample_channel(u, v, channel);
        }
    }
}

/// Source rows one destination row can touch.
fn rows_needed(kind: SamplerKind, options: &SamplerOptions) -> usize {
    match kind {
        SamplerKind::Nearest => 1,
        SamplerKind::Bilinear => 2,
        SamplerKind::Bicubic => 4,
        SamplerKind::Average | SamplerKind::WeightedAverage => {
            let size = if options.range_y.is_finite() {
                options.range_y.max(1.0).ceil() as usize
            } else {
                1
            };
            size + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Image, PixelFormat};

    #[test]
    fn test_cache_is_bounded() {
        let image = Image::new(4, 8, PixelFormat::Rgb, 1.0);
        let cache = CachedRows::new(&image, 2);
        for y in 0..8 {
            assert_eq!(cache.texel(1, y, ColorChannel::Green), 1.0);
        }
        assert_eq!(cache.cached_rows(), 2);
    }

    #[test]
    fn test_rows_needed() {
        let options = SamplerOptions {
            range_y: 3.5,
            ..Default::default()
        };
        assert_eq!(rows_needed(SamplerKind::Average, &options), 5);
        assert_eq!(rows_needed(SamplerKind::Bicubic, &options), 4);
    }
}
