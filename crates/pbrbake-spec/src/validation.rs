//! Validation of material documents and pack profiles.
//!
//! Validation runs before any pixel work; every problem found is reported at
//! once so a document can be fixed in one pass.

use std::collections::HashSet;

use crate::catalog::EncodingStandard;
use crate::error::{
    ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::mapping::ChannelOverride;
use crate::material::{MaterialProperties, OcclusionProperties};
use crate::profile::PackProfile;

/// Largest supported target texture width.
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// Quality above this value produces an unusually large ray set.
const EXPENSIVE_QUALITY: f32 = 0.5;

/// Validates a pack profile.
///
/// # Example
/// ```
/// use pbrbake_spec::{PackProfile, validation::validate_profile};
///
/// let profile = PackProfile::new("raw", "lab-pbr-1.3");
/// assert!(validate_profile(&profile).is_ok());
///
/// let profile = PackProfile::new("raw", "lab-pbr-7");
/// assert!(!validate_profile(&profile).is_ok());
/// ```
pub fn validate_profile(profile: &PackProfile) -> ValidationResult {
    let mut result = ValidationResult::success();

    validate_format(&profile.input_format, "input-format", &mut result);
    validate_format(&profile.output_format, "output-format", &mut result);

    if let Some(size) = profile.texture_size {
        if size == 0 || size > MAX_TEXTURE_SIZE {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidTextureSize,
                format!("texture size must be in [1, {}], got {}", MAX_TEXTURE_SIZE, size),
                "texture-size",
            ));
        }
    }

    if let Some(scale) = profile.texture_scale {
        if !scale.is_finite() || scale <= 0.0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidTextureScale,
                format!("texture scale must be a positive number, got {}", scale),
                "texture-scale",
            ));
        }
        if profile.texture_size.is_some() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::SizeAndScale,
                "both texture size and texture scale are set; size is used",
                "texture-scale",
            ));
        }
    }

    if !(0.0..=1.0).contains(&profile.weighted_center) {
        result.add_error(ValidationError::with_path(
            ErrorCode::OutOfRange,
            format!(
                "weighted center must be in [0, 1], got {}",
                profile.weighted_center
            ),
            "weighted-center",
        ));
    }

    validate_occlusion(&profile.occlusion, "occlusion", &mut result);

    result
}

/// Validates a material document.
pub fn validate_material(material: &MaterialProperties) -> ValidationResult {
    let mut result = ValidationResult::success();

    if let Some(input) = &material.input {
        if let Some(format) = &input.format {
            validate_format(format, "input.format", &mut result);
        }
        for (channel, ov) in &input.overrides {
            validate_override(ov, &format!("input.{}", channel), &mut result);
        }
    }

    for (channel, props) in &material.channels {
        if props.value.is_some() && props.texture.is_some() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::ConstantShadowsTexture,
                "constant value takes precedence over the texture",
                format!("channels.{}", channel),
            ));
        }
        for (name, v) in [("value", props.value), ("scale", props.scale), ("shift", props.shift)] {
            if let Some(v) = v {
                if !v.is_finite() {
                    result.add_error(ValidationError::with_path(
                        ErrorCode::OutOfRange,
                        format!("{} must be finite, got {}", name, v),
                        format!("channels.{}.{}", channel, name),
                    ));
                }
            }
        }
    }

    if let Some(ctm) = &material.ctm {
        let (cols, rows, _) = ctm.grid();
        if cols == 0 || rows == 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidCtmGrid,
                format!("CTM grid must be at least 1x1, got {}x{}", cols, rows),
                "ctm",
            ));
        }
    }

    let mut names = HashSet::new();
    for (i, part) in material.parts.iter().enumerate() {
        let path = format!("parts[{}]", i);
        if part.width == 0 || part.height == 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidPart,
                format!("part '{}' has an empty rectangle", part.name),
                path.clone(),
            ));
        }
        if let Some([ref_w, ref_h]) = material.part_reference_size {
            let right = part.left as u64 + part.width as u64;
            let bottom = part.top as u64 + part.height as u64;
            if right > ref_w as u64 || bottom > ref_h as u64 {
                result.add_error(ValidationError::with_path(
                    ErrorCode::InvalidPart,
                    format!(
                        "part '{}' extends outside the {}x{} reference size",
                        part.name, ref_w, ref_h
                    ),
                    path.clone(),
                ));
            }
        }
        if !names.insert(part.name.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicatePartName,
                format!("part name '{}' is used more than once", part.name),
                path,
            ));
        }
    }
    if !material.parts.is_empty() && material.part_reference_size.is_none() {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidPart,
            "parts require part-reference-size",
            "part-reference-size",
        ));
    }

    if let Some(occlusion) = &material.occlusion {
        validate_occlusion(occlusion, "occlusion", &mut result);
    }

    result
}

/// Validates occlusion settings: steps must be positive and quality in [0, 1].
pub fn validate_occlusion(
    occlusion: &OcclusionProperties,
    prefix: &str,
    result: &mut ValidationResult,
) {
    if let Some(steps) = occlusion.steps {
        if steps <= 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidStepCount,
                format!("step count must be positive, got {}", steps),
                format!("{}.steps", prefix),
            ));
        }
    }
    if let Some(quality) = occlusion.quality {
        if !(0.0..=1.0).contains(&quality) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidQuality,
                format!("quality must be in [0, 1], got {}", quality),
                format!("{}.quality", prefix),
            ));
        } else if quality > EXPENSIVE_QUALITY {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::ExpensiveOcclusion,
                format!("quality {} casts a very large number of rays", quality),
                format!("{}.quality", prefix),
            ));
        }
    }
    for (name, v) in [("z-scale", occlusion.z_scale), ("hit-power", occlusion.hit_power)] {
        if let Some(v) = v {
            if !v.is_finite() || v <= 0.0 {
                result.add_error(ValidationError::with_path(
                    ErrorCode::InvalidOcclusionParameter,
                    format!("{} must be positive, got {}", name, v),
                    format!("{}.{}", prefix, name),
                ));
            }
        }
    }
    if let Some(bias) = occlusion.z_bias {
        if !bias.is_finite() || bias < 0.0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidOcclusionParameter,
                format!("z-bias must be non-negative, got {}", bias),
                format!("{}.z-bias", prefix),
            ));
        }
    }
}

fn validate_format(name: &str, path: &str, result: &mut ValidationResult) {
    if EncodingStandard::find(name).is_none() {
        result.add_error(ValidationError::with_path(
            ErrorCode::UnknownEncoding,
            format!("unknown encoding standard '{}'", name),
            path,
        ));
    }
}

fn validate_override(ov: &ChannelOverride, path: &str, result: &mut ValidationResult) {
    if let (Some(lo), Some(hi)) = (ov.range_min, ov.range_max) {
        if lo > hi {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidRawRange,
                format!("range-min {} is above range-max {}", lo, hi),
                path,
            ));
        }
    }
    for v in [ov.min_value, ov.max_value, ov.power, ov.default_value, ov.clip_value]
        .into_iter()
        .flatten()
    {
        if !v.is_finite() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidValueRange,
                format!("channel values must be finite, got {}", v),
                path,
            ));
        }
    }
}
