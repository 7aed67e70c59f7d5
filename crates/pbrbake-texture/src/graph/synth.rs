//! Normal and occlusion synthesis over frame strips.

use log::debug;

use super::context::TextureGraphContext;
use super::planes::Geometry;
use crate::buffer::ScalarField;
use crate::cancel::CancellationToken;
use crate::error::PublishError;
use crate::normal::{NormalField, NormalGenerator};
use crate::occlusion::{OcclusionError, OcclusionGenerator};

/// Normals for every frame of a height strip.
pub fn normals(ctx: &TextureGraphContext, height: &ScalarField, geometry: Geometry) -> NormalField {
    let generator = NormalGenerator::new().with_strength(ctx.normal_strength());
    let edges = ctx.edges();
    debug!(
        "material '{}': synthesizing normals (strength {})",
        ctx.material.name, generator.strength
    );

    let (w, h) = (height.width, height.height);
    let mut out = NormalField {
        x: ScalarField::new(w, h, 0.0),
        y: ScalarField::new(w, h, 0.0),
        z: ScalarField::new(w, h, 1.0),
    };
    for frame in 0..geometry.frame_count {
        let top = frame * geometry.frame_height;
        let band = height.rows(top, geometry.frame_height);
        let normals = generator.generate(&band, edges);
        out.x.put_rows(top, &normals.x);
        out.y.put_rows(top, &normals.y);
        out.z.put_rows(top, &normals.z);
    }
    out
}

/// Occlusion for every frame of a height strip.
pub fn occlusion(
    ctx: &TextureGraphContext,
    height: &ScalarField,
    geometry: Geometry,
    cancel: Option<&CancellationToken>,
) -> Result<ScalarField, PublishError> {
    let generator =
        OcclusionGenerator::new(ctx.occlusion_options()).with_backend(ctx.profile.occlusion_backend);
    debug!(
        "material '{}': synthesizing occlusion ({:?} backend)",
        ctx.material.name, generator.backend
    );

    let mut out = ScalarField::new(height.width, height.height, 0.0);
    for frame in 0..geometry.frame_count {
        let top = frame * geometry.frame_height;
        let band = height.rows(top, geometry.frame_height);
        let occlusion = generator
            .generate(&band, cancel)
            .map_err(|source| match source {
                OcclusionError::Cancelled => PublishError::Cancelled {
                    material: ctx.material.name.clone(),
                },
                source => PublishError::Occlusion {
                    material: ctx.material.name.clone(),
                    source,
                },
            })?;
        out.put_rows(top, &occlusion);
    }
    Ok(out)
}
