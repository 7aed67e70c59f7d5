use pbrbake_spec::ColorChannel;

use super::{Grid, Sampler};
use crate::buffer::PixelSource;

/// Point sampling: `floor(coord + 0.5)` then the edge policy.
pub struct NearestSampler<'a, S> {
    grid: Grid<'a, S>,
}

impl<'a, S: PixelSource> NearestSampler<'a, S> {
    pub fn new(grid: Grid<'a, S>) -> Self {
        Self { grid }
    }
}

impl<S: PixelSource> Sampler for NearestSampler<'_, S> {
    fn sample_channel(&self, u: f32, v: f32, channel: ColorChannel) -> f32 {
        let (px, py) = self.grid.to_pixel(u, v);
        let x = (px + 0.5).floor() as i64;
        let y = (py + 0.5).floor() as i64;
        self.grid.texel(x, y, channel)
    }
}
