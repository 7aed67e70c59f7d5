//! CPU occlusion backend: rows in parallel with rayon.

use rayon::prelude::*;

use pbrbake_spec::ColorChannel;

use super::{OcclusionError, OcclusionOptions, RaySet};
use crate::buffer::ScalarField;
use crate::cancel::CancellationToken;
use crate::sampler::{BilinearSampler, Grid, SampleBounds, Sampler};

/// Generate occlusion for every pixel of `height`.
///
/// The token is checked once per row; a cancelled run returns
/// [`OcclusionError::Cancelled`] and discards partial output.
pub fn generate(
    height: &ScalarField,
    options: &OcclusionOptions,
    rays: &RaySet,
    cancel: Option<&CancellationToken>,
) -> Result<ScalarField, OcclusionError> {
    let width = height.width as usize;
    let mut out = ScalarField::new(height.width, height.height, 0.0);
    if width == 0 || height.height == 0 {
        return Ok(out);
    }

    out.data
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(y, row)| {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(OcclusionError::Cancelled);
            }
            let sampler = BilinearSampler::new(Grid::new(
                height,
                SampleBounds::full(height),
                options.edges,
            ));
            for (x, value) in row.iter_mut().enumerate() {
                *value = pixel_occlusion(&sampler, height, x as u32, y as u32, options, rays);
            }
            Ok(())
        })?;

    Ok(out)
}

/// Occlusion of one pixel in `[0, 1]`.
pub fn pixel_occlusion<S: Sampler + ?Sized>(
    sampler: &S,
    height: &ScalarField,
    x: u32,
    y: u32,
    options: &OcclusionOptions,
    rays: &RaySet,
) -> f32 {
    if rays.is_empty() {
        return 0.0;
    }
    let origin = [
        x as f32,
        y as f32,
        height.get(x, y) * options.z_scale + options.z_bias,
    ];
    let total: f32 = rays
        .directions
        .iter()
        .map(|dir| march(sampler, height, origin, *dir, options))
        .sum();
    (1.0 - total / rays.len() as f32).clamp(0.0, 1.0)
}

/// Visibility factor of one ray: 1 when it escapes, less the sooner it hits.
fn march<S: Sampler + ?Sized>(
    sampler: &S,
    height: &ScalarField,
    origin: [f32; 3],
    dir: [f32; 3],
    options: &OcclusionOptions,
) -> f32 {
    let (w, h) = (height.width as f32, height.height as f32);
    for i in 1..=options.steps {
        let t = i as f32;
        let z = origin[2] + dir[2] * t;
        if z > options.z_scale {
            return 1.0;
        }
        let u = (origin[0] + 0.5 + dir[0] * t) / w;
        let v = (origin[1] + 0.5 + dir[1] * t) / h;
        let surface = sampler.sample_channel(u, v, ColorChannel::Red) * options.z_scale;
        if z < surface {
            return ((i - 1) as f32 / options.steps as f32).powf(options.hit_power);
        }
    }
    1.0
}
