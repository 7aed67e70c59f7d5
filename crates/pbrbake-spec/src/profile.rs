//! Pack-wide publishing profiles.

use serde::{Deserialize, Serialize};

use crate::catalog::names;
use crate::channel::SamplerKind;
use crate::error::SpecError;
use crate::material::{NormalProperties, OcclusionProperties};

/// Default occlusion quality.
pub const DEFAULT_OCCLUSION_QUALITY: f32 = 0.1;
/// Default occlusion march length in pixels.
pub const DEFAULT_OCCLUSION_STEPS: i32 = 16;
/// Default height-to-depth scale for occlusion.
pub const DEFAULT_OCCLUSION_Z_SCALE: f32 = 25.0;
/// Default exponent applied to the hit distance factor.
pub const DEFAULT_OCCLUSION_HIT_POWER: f32 = 1.5;
/// Default normal-from-height strength.
pub const DEFAULT_NORMAL_STRENGTH: f32 = 1.0;
/// Default weighted-average centre fraction.
pub const DEFAULT_WEIGHTED_CENTER: f32 = 0.5;

/// Which occlusion backend a profile prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcclusionBackend {
    #[default]
    Cpu,
    /// Compute shader; falls back to the CPU when no adapter is available.
    Gpu,
}

/// Pack-wide publishing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackProfile {
    /// Encoding of the source textures.
    #[serde(default = "default_input_format", alias = "input")]
    pub input_format: String,
    /// Encoding of the published textures.
    #[serde(default = "default_output_format", alias = "output")]
    pub output_format: String,
    /// Target width of one published frame in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "size")]
    pub texture_size: Option<u32>,
    /// Multiplier applied to the source size when no target size is set.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "scale")]
    pub texture_scale: Option<f32>,
    /// Sampler used for resizing.
    #[serde(default)]
    pub sampler: SamplerKind,
    /// Default wrap flag for materials that do not set one.
    #[serde(default)]
    pub wrap: bool,
    #[serde(default)]
    pub occlusion: OcclusionProperties,
    #[serde(default)]
    pub normal: NormalProperties,
    /// Synthesize normals from height when no normal source exists.
    #[serde(default = "default_true")]
    pub auto_generate_normal: bool,
    /// Synthesize occlusion from height when no occlusion source exists.
    #[serde(default = "default_true")]
    pub auto_generate_occlusion: bool,
    #[serde(default)]
    pub occlusion_backend: OcclusionBackend,
    /// Centre fraction of the weighted-average sampler.
    #[serde(default = "default_weighted_center")]
    pub weighted_center: f32,
}

fn default_input_format() -> String {
    names::RAW.to_string()
}

fn default_output_format() -> String {
    names::LAB_PBR_1_3.to_string()
}

fn default_true() -> bool {
    true
}

fn default_weighted_center() -> f32 {
    DEFAULT_WEIGHTED_CENTER
}

impl Default for PackProfile {
    fn default() -> Self {
        Self {
            input_format: default_input_format(),
            output_format: default_output_format(),
            texture_size: None,
            texture_scale: None,
            sampler: SamplerKind::default(),
            wrap: false,
            occlusion: OcclusionProperties::default(),
            normal: NormalProperties::default(),
            auto_generate_normal: true,
            auto_generate_occlusion: true,
            occlusion_backend: OcclusionBackend::default(),
            weighted_center: DEFAULT_WEIGHTED_CENTER,
        }
    }
}

impl PackProfile {
    /// A profile converting between two named encodings with defaults elsewhere.
    pub fn new(input_format: impl Into<String>, output_format: impl Into<String>) -> Self {
        Self {
            input_format: input_format.into(),
            output_format: output_format.into(),
            ..Default::default()
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SpecError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Final occlusion settings for one material, material fields first.
    pub fn resolve_occlusion(&self, material: Option<&OcclusionProperties>) -> ResolvedOcclusion {
        let pick = |f: fn(&OcclusionProperties) -> Option<f32>| {
            material.and_then(f).or_else(|| f(&self.occlusion))
        };
        ResolvedOcclusion {
            quality: pick(|o| o.quality).unwrap_or(DEFAULT_OCCLUSION_QUALITY),
            steps: material
                .and_then(|o| o.steps)
                .or(self.occlusion.steps)
                .unwrap_or(DEFAULT_OCCLUSION_STEPS),
            z_scale: pick(|o| o.z_scale).unwrap_or(DEFAULT_OCCLUSION_Z_SCALE),
            z_bias: pick(|o| o.z_bias).unwrap_or(0.0),
            hit_power: pick(|o| o.hit_power).unwrap_or(DEFAULT_OCCLUSION_HIT_POWER),
        }
    }

    /// Final normal strength for one material.
    pub fn resolve_normal_strength(&self, material: Option<&NormalProperties>) -> f32 {
        material
            .and_then(|n| n.strength)
            .or(self.normal.strength)
            .unwrap_or(DEFAULT_NORMAL_STRENGTH)
    }
}

/// Occlusion settings with every field decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOcclusion {
    pub quality: f32,
    pub steps: i32,
    pub z_scale: f32,
    pub z_bias: f32,
    pub hit_power: f32,
}

impl Default for ResolvedOcclusion {
    fn default() -> Self {
        PackProfile::default().resolve_occlusion(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_document() {
        let profile = PackProfile::from_yaml_str("{}").unwrap();
        assert_eq!(profile, PackProfile::default());
        assert_eq!(profile.input_format, "raw");
        assert_eq!(profile.output_format, "lab-pbr-1.3");
        assert!(profile.auto_generate_normal);
        assert_eq!(profile.sampler, SamplerKind::Bicubic);
    }

    #[test]
    fn test_parse_with_aliases() {
        let profile = PackProfile::from_yaml_str(
            "input: old-pbr\noutput: alpha-pbr\nsize: 64\nsampler: box\nocclusion-backend: gpu\n",
        )
        .unwrap();
        assert_eq!(profile.input_format, "old-pbr");
        assert_eq!(profile.output_format, "alpha-pbr");
        assert_eq!(profile.texture_size, Some(64));
        assert_eq!(profile.sampler, SamplerKind::Average);
        assert_eq!(profile.occlusion_backend, OcclusionBackend::Gpu);
    }

    #[test]
    fn test_occlusion_resolution_prefers_material() {
        let mut profile = PackProfile::default();
        profile.occlusion.steps = Some(8);
        profile.occlusion.quality = Some(0.2);

        let material = OcclusionProperties {
            quality: Some(0.05),
            ..Default::default()
        };
        let resolved = profile.resolve_occlusion(Some(&material));
        assert_eq!(resolved.quality, 0.05);
        assert_eq!(resolved.steps, 8);
        assert_eq!(resolved.z_scale, DEFAULT_OCCLUSION_Z_SCALE);
        assert_eq!(resolved.z_bias, 0.0);
    }

    #[test]
    fn test_normal_strength_resolution() {
        let profile = PackProfile::default();
        assert_eq!(profile.resolve_normal_strength(None), 1.0);
        let material = NormalProperties {
            strength: Some(2.5),
        };
        assert_eq!(profile.resolve_normal_strength(Some(&material)), 2.5);
    }
}
