use pbrbake_spec::ColorChannel;

use super::{split_coord, Grid, Sampler};
use crate::buffer::PixelSource;

/// 2x2 neighborhood, linear in X then Y.
pub struct BilinearSampler<'a, S> {
    grid: Grid<'a, S>,
}

impl<'a, S: PixelSource> BilinearSampler<'a, S> {
    pub fn new(grid: Grid<'a, S>) -> Self {
        Self { grid }
    }
}

impl<S: PixelSource> Sampler for BilinearSampler<'_, S> {
    fn sample_channel(&self, u: f32, v: f32, channel: ColorChannel) -> f32 {
        let (px, py) = self.grid.to_pixel(u, v);
        let (x0, fx) = split_coord(px);
        let (y0, fy) = split_coord(py);

        let c00 = self.grid.texel(x0, y0, channel);
        if fx == 0.0 && fy == 0.0 {
            return c00;
        }
        let c10 = self.grid.texel(x0 + 1, y0, channel);
        let c01 = self.grid.texel(x0, y0 + 1, channel);
        let c11 = self.grid.texel(x0 + 1, y0 + 1, channel);

        let top = c00 + (c10 - c00) * fx;
        let bottom = c01 + (c11 - c01) * fx;
        top + (bottom - top) * fy
    }
}
