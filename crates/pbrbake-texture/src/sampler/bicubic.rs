use pbrbake_spec::ColorChannel;

use super::{split_coord, Grid, Sampler};
use crate::buffer::PixelSource;

/// Separable cubic Hermite (Catmull-Rom) over a 4x4 neighborhood: four
/// passes along X, then one along Y.
pub struct BicubicSampler<'a, S> {
    grid: Grid<'a, S>,
}

impl<'a, S: PixelSource> BicubicSampler<'a, S> {
    pub fn new(grid: Grid<'a, S>) -> Self {
        Self { grid }
    }
}

/// Cubic Hermite through `p1` (t = 0) and `p2` (t = 1) with Catmull-Rom
/// tangents. Exact at `t = 0`.
#[inline]
pub(crate) fn hermite(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    ((a * t + b) * t + c) * t + p1
}

impl<S: PixelSource> Sampler for BicubicSampler<'_, S> {
    fn sample_channel(&self, u: f32, v: f32, channel: ColorChannel) -> f32 {
        let (px, py) = self.grid.to_pixel(u, v);
        let (x1, tx) = split_coord(px);
        let (y1, ty) = split_coord(py);

        let mut column = [0.0f32; 4];
        for (i, value) in column.iter_mut().enumerate() {
            let y = y1 + i as i64 - 1;
            *value = hermite(
                self.grid.texel(x1 - 1, y, channel),
                self.grid.texel(x1, y, channel),
                self.grid.texel(x1 + 1, y, channel),
                self.grid.texel(x1 + 2, y, channel),
                tx,
            );
        }
        hermite(column[0], column[1], column[2], column[3], ty)
    }
}
