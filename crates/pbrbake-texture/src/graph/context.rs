//! Per-material resolution state.

use log::warn;

use pbrbake_spec::hash::config_fingerprint;
use pbrbake_spec::validation::{validate_material, validate_profile};
use pbrbake_spec::{names, MaterialProperties, PackProfile, SamplerKind};

use crate::encoding::ResolvedEncoding;
use crate::error::PublishError;
use crate::occlusion::OcclusionOptions;
use crate::sampler::{EdgeMode, SamplerOptions};

/// Everything one publish of one material needs, resolved up front.
///
/// Owned by a single builder invocation and discarded afterwards.
#[derive(Debug, Clone)]
pub struct TextureGraphContext {
    pub material: MaterialProperties,
    pub profile: PackProfile,
    /// Encoding of the source files, with the material's overrides.
    pub input: ResolvedEncoding,
    /// Encoding of the published files.
    pub output: ResolvedEncoding,
    /// Converting a published pack back into editable material folders.
    pub is_import: bool,
    /// Publish with global (`{material}{suffix}`) names.
    pub publish_as_global: bool,
    /// Set once sources are known to hold more than one frame.
    pub is_animated: bool,
    /// Largest frame count among the sources.
    pub max_frame_count: u32,
    /// Configuration fingerprint.
    pub fingerprint: String,
}

impl TextureGraphContext {
    /// Resolve a material for publishing.
    ///
    /// Unknown encoding names and invalid documents fail here, before any
    /// file is touched.
    pub fn new(material: MaterialProperties, profile: PackProfile) -> Result<Self, PublishError> {
        let name = material.name.clone();
        let spec_err = |source| PublishError::Spec {
            material: name.clone(),
            source,
        };

        let input_format = material
            .input
            .as_ref()
            .and_then(|i| i.format.as_deref())
            .unwrap_or(&profile.input_format);
        let mut input = ResolvedEncoding::by_name(input_format).map_err(spec_err)?;
        if let Some(overrides) = material.input.as_ref().map(|i| &i.overrides) {
            input = input.with_overrides(overrides);
        }
        let output = ResolvedEncoding::by_name(&profile.output_format).map_err(spec_err)?;

        let mut result = validate_profile(&profile);
        result.merge(validate_material(&material));
        for warning in &result.warnings {
            warn!("material '{}': {}", name, warning);
        }
        if let Err(errors) = result.into_result() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PublishError::InvalidConfig {
                material: name,
                message,
            });
        }

        let fingerprint = config_fingerprint(&material, &profile).map_err(spec_err)?;

        Ok(Self {
            material,
            profile,
            input,
            output,
            is_import: false,
            publish_as_global: true,
            is_animated: false,
            max_frame_count: 1,
            fingerprint,
        })
    }

    /// Resolve a material for import: the output is forced to `raw` with
    /// local naming.
    pub fn for_import(material: MaterialProperties, profile: PackProfile) -> Result<Self, PublishError> {
        let mut profile = profile;
        profile.output_format = names::RAW.to_string();
        let mut ctx = Self::new(material, profile)?;
        ctx.is_import = true;
        ctx.publish_as_global = false;
        Ok(ctx)
    }

    pub fn is_ctm(&self) -> bool {
        self.material.is_ctm()
    }

    pub fn is_multi_part(&self) -> bool {
        self.material.is_multi_part()
    }

    /// Source images only hold stacked animation frames when they are not
    /// tile atlases.
    pub fn detects_frames(&self) -> bool {
        !self.is_ctm() && !self.is_multi_part()
    }

    /// Source files are matched by global names. An import always reads a
    /// published pack, which uses them.
    pub fn input_is_global(&self) -> bool {
        self.material.use_global_matching || self.is_import
    }

    pub fn edges(&self) -> EdgeMode {
        let (x, y) = self.material.wrap_axes(self.profile.wrap);
        EdgeMode::new(x, y)
    }

    pub fn sampler(&self) -> SamplerKind {
        self.profile.sampler
    }

    /// Box-filter options for resizing one frame.
    pub fn sampler_options(&self, source: (u32, u32), target: (u32, u32)) -> SamplerOptions {
        SamplerOptions::for_resize(source, target, self.profile.weighted_center)
    }

    pub fn occlusion_options(&self) -> OcclusionOptions {
        OcclusionOptions::new(
            self.profile.resolve_occlusion(self.material.occlusion.as_ref()),
            self.edges(),
        )
    }

    pub fn normal_strength(&self) -> f32 {
        self.profile
            .resolve_normal_strength(self.material.normal.as_ref())
    }

    /// Target frame size for a reference source frame.
    ///
    /// An explicit texture size sets the width of one frame (one tile for
    /// connected textures) and keeps the source aspect; otherwise the scale
    /// applies; otherwise the source size is kept.
    pub fn target_frame_size(&self, reference: Option<(u32, u32)>) -> (u32, u32) {
        let (src_w, src_h) = reference.unwrap_or((1, 1));
        let (src_w, src_h) = (src_w.max(1), src_h.max(1));
        if let Some(size) = self.profile.texture_size {
            let columns = match &self.material.ctm {
                Some(ctm) if self.is_ctm() => ctm.grid().0.max(1),
                _ => 1,
            };
            let width = size.max(1) * columns;
            if reference.is_none() {
                return (width, width);
            }
            let height = (width as f64 * src_h as f64 / src_w as f64).round().max(1.0) as u32;
            return (width, height);
        }
        if let Some(scale) = self.profile.texture_scale {
            let scaled = |v: u32| (v as f64 * scale as f64).round().max(1.0) as u32;
            return (scaled(src_w), scaled(src_h));
        }
        (src_w, src_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbrbake_spec::{CtmMethod, CtmProperties, InputEncoding, SpecError};

    #[test]
    fn test_unknown_output_encoding_is_fatal() {
        let profile = PackProfile::new("raw", "lab-pbr-9");
        let err = TextureGraphContext::new(MaterialProperties::new("stone", "stone"), profile)
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::Spec {
                source: SpecError::UnknownEncoding(_),
                ..
            }
        ));
        assert!(err.is_configuration());
        assert_eq!(err.material(), "stone");
    }

    #[test]
    fn test_material_input_format_wins() {
        let mut material = MaterialProperties::new("stone", "stone");
        material.input = Some(InputEncoding {
            format: Some("old-pbr".to_string()),
            ..Default::default()
        });
        let ctx = TextureGraphContext::new(material, PackProfile::default()).unwrap();
        assert_eq!(ctx.input.name(), "old-pbr");
        assert_eq!(ctx.output.name(), "lab-pbr-1.3");
        assert!(ctx.publish_as_global);
        assert_eq!(ctx.fingerprint.len(), 64);
    }

    #[test]
    fn test_invalid_occlusion_is_rejected_before_work() {
        let mut profile = PackProfile::default();
        profile.occlusion.steps = Some(0);
        let err = TextureGraphContext::new(MaterialProperties::new("stone", "stone"), profile)
            .unwrap_err();
        assert!(matches!(err, PublishError::InvalidConfig { .. }));
        assert!(err.to_string().contains("E010"));
    }

    #[test]
    fn test_import_forces_raw_local() {
        let profile = PackProfile::new("lab-pbr-1.3", "alpha-pbr");
        let ctx =
            TextureGraphContext::for_import(MaterialProperties::new("stone", "stone"), profile)
                .unwrap();
        assert_eq!(ctx.output.name(), "raw");
        assert!(ctx.is_import);
        assert!(!ctx.publish_as_global);
        assert!(ctx.input_is_global());
    }

    #[test]
    fn test_target_frame_size() {
        let mut profile = PackProfile::default();
        let material = MaterialProperties::new("stone", "stone");
        let ctx = TextureGraphContext::new(material.clone(), profile.clone()).unwrap();
        assert_eq!(ctx.target_frame_size(Some((16, 16))), (16, 16));
        assert_eq!(ctx.target_frame_size(None), (1, 1));

        profile.texture_scale = Some(2.0);
        let ctx = TextureGraphContext::new(material.clone(), profile.clone()).unwrap();
        assert_eq!(ctx.target_frame_size(Some((16, 8))), (32, 16));

        profile.texture_size = Some(64);
        let mut ctm_material = material;
        ctm_material.ctm = Some(CtmProperties {
            method: CtmMethod::Compact,
            width: None,
            height: None,
            tile_start: 0,
        });
        let ctx = TextureGraphContext::new(ctm_material, profile).unwrap();
        assert_eq!(ctx.target_frame_size(Some((80, 16))), (320, 64));
        assert!(!ctx.detects_frames());
    }
}
