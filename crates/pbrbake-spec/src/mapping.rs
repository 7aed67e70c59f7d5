//! Channel mappings: where one semantic property lives and how it is encoded.

use serde::{Deserialize, Serialize};

use crate::channel::{ColorChannel, EncodingChannel, SamplerKind, TextureTag};

/// One semantic property's encoding within one physical texture channel.
///
/// Mappings are plain data and can be built in `const` context, which is how
/// the encoding catalog declares its tables:
///
/// ```
/// use pbrbake_spec::{ChannelMapping, ColorChannel, EncodingChannel, TextureTag};
///
/// const SMOOTH: ChannelMapping =
///     ChannelMapping::new(EncodingChannel::Smooth, TextureTag::Normal, ColorChannel::Alpha)
///         .range(73, 157);
/// assert_eq!(SMOOTH.range_min, 73);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelMapping {
    /// Semantic property stored by this mapping.
    pub channel: EncodingChannel,
    /// Texture the property is stored in.
    pub texture: TextureTag,
    /// Physical channel within the texture.
    pub color: ColorChannel,
    /// Semantic value at the low end of the raw range.
    pub min_value: f32,
    /// Semantic value at the high end of the raw range.
    pub max_value: f32,
    /// Lowest raw byte (after shift) owned by this mapping.
    pub range_min: u8,
    /// Highest raw byte (after shift) owned by this mapping.
    pub range_max: u8,
    /// Byte-domain offset added on decode and removed on encode, wrapping at 256.
    pub shift: i32,
    /// Curve exponent applied to the normalized value on decode.
    pub power: f32,
    /// Whether the normalized value is flipped.
    pub invert: bool,
    /// Value used when the raw byte falls outside the range.
    pub default_value: Option<f32>,
    /// Encode threshold; values below it are not written when clipping is enabled.
    pub clip_value: f32,
    /// Enables the encode threshold.
    pub enable_clipping: bool,
    /// Tie-break when raw ranges of one physical channel overlap (higher wins).
    pub priority: i32,
    /// Resampling override for this channel.
    pub sampler: Option<SamplerKind>,
}

impl ChannelMapping {
    /// A full-range [0, 255] → [0, 1] mapping.
    pub const fn new(channel: EncodingChannel, texture: TextureTag, color: ColorChannel) -> Self {
        Self {
            channel,
            texture,
            color,
            min_value: 0.0,
            max_value: 1.0,
            range_min: 0,
            range_max: 255,
            shift: 0,
            power: 1.0,
            invert: false,
            default_value: None,
            clip_value: 0.0,
            enable_clipping: false,
            priority: 0,
            sampler: None,
        }
    }

    /// Set the semantic value range.
    pub const fn values(mut self, min: f32, max: f32) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// Set the raw byte range.
    pub const fn range(mut self, min: u8, max: u8) -> Self {
        self.range_min = min;
        self.range_max = max;
        self
    }

    /// Set the byte-domain shift.
    pub const fn shift(mut self, shift: i32) -> Self {
        self.shift = shift;
        self
    }

    /// Set the curve exponent.
    pub const fn power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    /// Flip the normalized value.
    pub const fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Set the default value.
    pub const fn default_value(mut self, value: f32) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Enable the encode threshold.
    pub const fn clip(mut self, value: f32) -> Self {
        self.clip_value = value;
        self.enable_clipping = true;
        self
    }

    /// Set the overlap priority.
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the resampling override.
    pub const fn sampler(mut self, sampler: SamplerKind) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Returns true when both mappings target the same physical channel.
    pub fn shares_slot(&self, other: &ChannelMapping) -> bool {
        self.texture == other.texture && self.color == other.color
    }

    /// Returns true when a shifted raw value lies inside this mapping's range.
    pub fn contains_raw(&self, shifted: f32) -> bool {
        shifted >= self.range_min as f32 && shifted <= self.range_max as f32
    }

    /// Returns true when the two raw ranges intersect.
    pub fn overlaps(&self, other: &ChannelMapping) -> bool {
        self.range_min <= other.range_max && other.range_min <= self.range_max
    }
}

/// Per-material adjustment of one mapping of the input encoding.
///
/// Every field is optional; unset fields keep the standard's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "min")]
    pub min_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "max")]
    pub max_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_min: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_max: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "default")]
    pub default_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "clip")]
    pub clip_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<SamplerKind>,
}

impl ChannelOverride {
    /// Apply the set fields onto a mapping.
    pub fn apply_to(&self, mapping: &mut ChannelMapping) {
        if let Some(texture) = self.texture {
            mapping.texture = texture;
        }
        if let Some(color) = self.color {
            mapping.color = color;
        }
        if let Some(v) = self.min_value {
            mapping.min_value = v;
        }
        if let Some(v) = self.max_value {
            mapping.max_value = v;
        }
        if let Some(v) = self.range_min {
            mapping.range_min = v;
        }
        if let Some(v) = self.range_max {
            mapping.range_max = v;
        }
        if let Some(v) = self.shift {
            mapping.shift = v;
        }
        if let Some(v) = self.power {
            mapping.power = v;
        }
        if let Some(v) = self.invert {
            mapping.invert = v;
        }
        if let Some(v) = self.default_value {
            mapping.default_value = Some(v);
        }
        if let Some(v) = self.clip_value {
            mapping.clip_value = v;
            mapping.enable_clipping = true;
        }
        if let Some(v) = self.priority {
            mapping.priority = v;
        }
        if let Some(v) = self.sampler {
            mapping.sampler = Some(v);
        }
    }

    /// Build a fresh mapping for a channel the standard does not carry.
    ///
    /// Returns `None` when the override does not name a texture.
    pub fn to_mapping(&self, channel: EncodingChannel) -> Option<ChannelMapping> {
        let texture = self.texture?;
        let mut mapping =
            ChannelMapping::new(channel, texture, self.color.unwrap_or(ColorChannel::Red));
        self.apply_to(&mut mapping);
        Some(mapping)
    }
}
