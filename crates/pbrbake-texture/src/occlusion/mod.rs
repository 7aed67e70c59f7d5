//! Ambient occlusion from a height field.
//!
//! Both backends consume the same [`RaySet`] and apply the same termination
//! rule, so they agree per pixel within float rounding:
//!
//! - A ray starts at `(x, y, h(x, y) * z_scale + z_bias)` and advances one
//!   unit per step along its direction, for at most `steps` steps.
//! - The height field is sampled bilinearly at the stepped `(x, y)` with the
//!   material's wrap/clamp policy.
//! - The ray escapes (factor 1) once its z exceeds `z_scale`, or when it runs
//!   out of steps.
//! - It hits when its z drops below `h * z_scale`; a hit on step `i` scores
//!   `((i - 1) / steps) ^ hit_power`, so near hits occlude more than distant
//!   ones.
//!
//! `occlusion = 1 - mean(factor)`, so a flat field is zero everywhere.

pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;

use log::{debug, warn};
use thiserror::Error;

use pbrbake_spec::{OcclusionBackend, ResolvedOcclusion};

use crate::buffer::ScalarField;
use crate::cancel::CancellationToken;
use crate::sampler::EdgeMode;

/// Errors from occlusion synthesis.
#[derive(Debug, Error)]
pub enum OcclusionError {
    #[error("step count must be positive, got {0}")]
    InvalidStepCount(i32),

    #[error("quality must be in [0, 1], got {0}")]
    InvalidQuality(f32),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    #[error("GPU failure: {0}")]
    Gpu(String),

    #[error("cancelled")]
    Cancelled,
}

impl OcclusionError {
    /// Returns true for errors detected before any work starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OcclusionError::InvalidStepCount(_)
                | OcclusionError::InvalidQuality(_)
                | OcclusionError::InvalidParameter(_)
        )
    }
}

/// Fully resolved occlusion settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionOptions {
    pub quality: f32,
    pub steps: i32,
    pub z_scale: f32,
    pub z_bias: f32,
    pub hit_power: f32,
    pub edges: EdgeMode,
}

impl Default for OcclusionOptions {
    fn default() -> Self {
        Self::new(ResolvedOcclusion::default(), EdgeMode::clamp())
    }
}

impl OcclusionOptions {
    pub fn new(resolved: ResolvedOcclusion, edges: EdgeMode) -> Self {
        Self {
            quality: resolved.quality,
            steps: resolved.steps,
            z_scale: resolved.z_scale,
            z_bias: resolved.z_bias,
            hit_power: resolved.hit_power,
            edges,
        }
    }

    /// Reject settings that cannot produce a meaningful result.
    pub fn validate(&self) -> Result<(), OcclusionError> {
        if self.steps <= 0 {
            return Err(OcclusionError::InvalidStepCount(self.steps));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(OcclusionError::InvalidQuality(self.quality));
        }
        if !self.z_scale.is_finite() || self.z_scale <= 0.0 {
            return Err(OcclusionError::InvalidParameter(format!(
                "z-scale must be positive, got {}",
                self.z_scale
            )));
        }
        if !self.hit_power.is_finite() || self.hit_power <= 0.0 {
            return Err(OcclusionError::InvalidParameter(format!(
                "hit-power must be positive, got {}",
                self.hit_power
            )));
        }
        if !self.z_bias.is_finite() || self.z_bias < 0.0 {
            return Err(OcclusionError::InvalidParameter(format!(
                "z-bias must be non-negative, got {}",
                self.z_bias
            )));
        }
        Ok(())
    }
}

/// Horizontal (azimuth) ray count for a quality.
pub fn horizontal_steps(quality: f32) -> u32 {
    4 + (quality * 356.0).round() as u32
}

/// Vertical (elevation) ray count for a quality. Truncates, so quality 0.1
/// gives 9 bands.
pub fn vertical_steps(quality: f32) -> u32 {
    1 + (quality * 88.0).floor() as u32
}

/// Unit ray directions, evenly spaced over 360 degrees of azimuth and
/// 0 to 90 degrees of elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct RaySet {
    pub horizontal: u32,
    pub vertical: u32,
    /// `[x, y, z]` unit vectors, azimuth-major.
    pub directions: Vec<[f32; 3]>,
}

impl RaySet {
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

/// Build the ray set for a quality in `[0, 1]`.
///
/// Elevations sit at the centers of `vertical` equal bands so no ray is
/// horizontal or vertical.
pub fn build_ray_set(quality: f32) -> Result<RaySet, OcclusionError> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(OcclusionError::InvalidQuality(quality));
    }
    let horizontal = horizontal_steps(quality);
    let vertical = vertical_steps(quality);

    let mut directions = Vec::with_capacity((horizontal * vertical) as usize);
    for i in 0..horizontal {
        let azimuth = (i as f32 / horizontal as f32) * std::f32::consts::TAU;
        let (sin_a, cos_a) = azimuth.sin_cos();
        for j in 0..vertical {
            let elevation = ((j as f32 + 0.5) / vertical as f32) * std::f32::consts::FRAC_PI_2;
            let (sin_e, cos_e) = elevation.sin_cos();
            directions.push([cos_e * cos_a, cos_e * sin_a, sin_e]);
        }
    }

    Ok(RaySet {
        horizontal,
        vertical,
        directions,
    })
}

/// Occlusion generator with a preferred backend.
#[derive(Debug, Clone)]
pub struct OcclusionGenerator {
    pub options: OcclusionOptions,
    pub backend: OcclusionBackend,
}

impl OcclusionGenerator {
    pub fn new(options: OcclusionOptions) -> Self {
        Self {
            options,
            backend: OcclusionBackend::Cpu,
        }
    }

    /// Set the preferred backend.
    pub fn with_backend(mut self, backend: OcclusionBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Generate occlusion for a height field in `[0, 1]`.
    ///
    /// Configuration is validated before any work. A GPU request falls back
    /// to the CPU when no adapter is available.
    pub fn generate(
        &self,
        height: &ScalarField,
        cancel: Option<&CancellationToken>,
    ) -> Result<ScalarField, OcclusionError> {
        self.options.validate()?;
        let rays = build_ray_set(self.options.quality)?;
        debug!(
            "occlusion {}x{}: {} rays ({}x{}), {} steps",
            height.width,
            height.height,
            rays.len(),
            rays.horizontal,
            rays.vertical,
            self.options.steps
        );

        if self.backend == OcclusionBackend::Gpu {
            match self.generate_gpu(height, &rays) {
                Ok(field) => return Ok(field),
                Err(e) => warn!("GPU occlusion unavailable, using CPU: {}", e),
            }
        }
        cpu::generate(height, &self.options, &rays, cancel)
    }

    #[cfg(feature = "gpu")]
    fn generate_gpu(&self, height: &ScalarField, rays: &RaySet) -> Result<ScalarField, OcclusionError> {
        gpu::GpuOcclusion::new()?.generate(height, &self.options, rays)
    }

    #[cfg(not(feature = "gpu"))]
    fn generate_gpu(&self, _height: &ScalarField, _rays: &RaySet) -> Result<ScalarField, OcclusionError> {
        Err(OcclusionError::GpuUnavailable(
            "built without the `gpu` feature".to_string(),
        ))
    }
}
