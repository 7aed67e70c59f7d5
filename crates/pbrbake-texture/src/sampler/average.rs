use pbrbake_spec::ColorChannel;

use super::{Grid, Sampler, SamplerOptions};
use crate::buffer::PixelSource;

/// Box filter covering `ceil(max(range, 1))` source pixels per axis.
pub struct AverageSampler<'a, S> {
    grid: Grid<'a, S>,
    size_x: i64,
    size_y: i64,
}

impl<'a, S: PixelSource> AverageSampler<'a, S> {
    pub fn new(grid: Grid<'a, S>, options: SamplerOptions) -> Self {
        Self {
            grid,
            size_x: box_size(options.range_x),
            size_y: box_size(options.range_y),
        }
    }

    fn mean(&self, u: f32, v: f32, channel: ColorChannel) -> f32 {
        let (fx, fy) = self.grid.to_pixel_edges(u, v);
        let start_x = box_start(fx, self.size_x);
        let start_y = box_start(fy, self.size_y);

        let mut sum = 0.0f64;
        for y in start_y..start_y + self.size_y {
            for x in start_x..start_x + self.size_x {
                sum += self.grid.texel(x, y, channel) as f64;
            }
        }
        (sum / (self.size_x * self.size_y) as f64) as f32
    }
}

impl<S: PixelSource> Sampler for AverageSampler<'_, S> {
    fn sample_channel(&self, u: f32, v: f32, channel: ColorChannel) -> f32 {
        self.mean(u, v, channel)
    }
}

/// Box filter that gives a fixed fraction of the result to the center
/// sample and spreads the remainder uniformly over the box.
pub struct WeightedAverageSampler<'a, S> {
    average: AverageSampler<'a, S>,
    center_weight: f32,
}

impl<'a, S: PixelSource> WeightedAverageSampler<'a, S> {
    pub fn new(grid: Grid<'a, S>, options: SamplerOptions) -> Self {
        Self {
            average: AverageSampler::new(grid, options),
            center_weight: options.center_weight.clamp(0.0, 1.0),
        }
    }
}

impl<S: PixelSource> Sampler for WeightedAverageSampler<'_, S> {
    fn sample_channel(&self, u: f32, v: f32, channel: ColorChannel) -> f32 {
        let grid = &self.average.grid;
        let (px, py) = grid.to_pixel(u, v);
        let center = grid.texel(
            (px + 0.5).floor() as i64,
            (py + 0.5).floor() as i64,
            channel,
        );
        let mean = self.average.mean(u, v, channel);
        self.center_weight * center + (1.0 - self.center_weight) * mean
    }
}

#[inline]
fn box_size(range: f32) -> i64 {
    if range.is_finite() {
        range.max(1.0).ceil() as i64
    } else {
        1
    }
}

/// First pixel of a box of `size` pixels centered on `f` (edge coordinates).
#[inline]
fn box_start(f: f64, size: i64) -> i64 {
    (f - size as f64 / 2.0 + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_geometry() {
        assert_eq!(box_size(0.3), 1);
        assert_eq!(box_size(2.0), 2);
        assert_eq!(box_size(2.2), 3);
        assert_eq!(box_size(f32::NAN), 1);
        // Downscale by two: destination pixel j covers source 2j and 2j + 1.
        assert_eq!(box_start(3.0, 2), 2);
        // Identity: the box is the pixel itself.
        assert_eq!(box_start(4.5, 1), 4);
        assert_eq!(box_start(4.5, 3), 3);
    }
}
