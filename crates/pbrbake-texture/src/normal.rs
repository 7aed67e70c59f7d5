//! Normal synthesis from a height field.

use pbrbake_spec::ColorChannel;

use crate::buffer::ScalarField;
use crate::sampler::{EdgeMode, Grid, SampleBounds};

/// Tangent-space normal components, each in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalField {
    pub x: ScalarField,
    pub y: ScalarField,
    pub z: ScalarField,
}

/// Normal map generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalGenerator {
    /// Strength multiplier for the gradient.
    pub strength: f32,
    /// Whether to invert the height field.
    pub invert: bool,
}

impl NormalGenerator {
    pub fn new() -> Self {
        Self {
            strength: 1.0,
            invert: false,
        }
    }

    /// Set the strength.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    /// Set whether to invert the height field.
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Generate normals from a height field in `[0, 1]` using Sobel operators.
    ///
    /// Neighbors outside the field follow the edge policy.
    pub fn generate(&self, height: &ScalarField, edges: EdgeMode) -> NormalField {
        let (w, h) = (height.width, height.height);
        let mut field = NormalField {
            x: ScalarField::new(w, h, 0.0),
            y: ScalarField::new(w, h, 0.0),
            z: ScalarField::new(w, h, 1.0),
        };
        let grid = Grid::new(height, SampleBounds::full(height), edges);

        for y in 0..h {
            for x in 0..w {
                let [nx, ny, nz] = self.normal_at(&grid, x as i64, y as i64);
                field.x.set(x, y, nx);
                field.y.set(x, y, ny);
                field.z.set(x, y, nz);
            }
        }
        field
    }

    #[allow(clippy::needless_range_loop)]
    fn normal_at(&self, grid: &Grid<'_, ScalarField>, x: i64, y: i64) -> [f32; 3] {
        let mut s = [[0.0f32; 3]; 3];
        for dy in 0..3 {
            for dx in 0..3 {
                let v = grid.texel(x + dx as i64 - 1, y + dy as i64 - 1, ColorChannel::Red);
                s[dy][dx] = if self.invert { 1.0 - v } else { v };
            }
        }

        // Gx = | -1  0  1 |    Gy = | -1 -2 -1 |
        //      | -2  0  2 |         |  0  0  0 |
        //      | -1  0  1 |         |  1  2  1 |
        let gx = (s[0][2] + 2.0 * s[1][2] + s[2][2]) - (s[0][0] + 2.0 * s[1][0] + s[2][0]);
        let gy = (s[2][0] + 2.0 * s[2][1] + s[2][2]) - (s[0][0] + 2.0 * s[0][1] + s[0][2]);

        // Y-up: a height increase towards +x tilts the normal to -x, and image
        // rows grow downward.
        let nx = -gx * self.strength;
        let ny = gy * self.strength;
        let len = (nx * nx + ny * ny + 1.0).sqrt();
        [nx / len, ny / len, 1.0 / len]
    }
}

impl Default for NormalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Z component of a unit normal from its X and Y components.
#[inline]
pub fn reconstruct_z(x: f32, y: f32) -> f32 {
    (1.0 - x * x - y * y).max(0.0).sqrt()
}
