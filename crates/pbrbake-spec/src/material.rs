//! Per-material declarative documents.
//!
//! A material document is usually a small YAML file next to the material's
//! textures:
//!
//! ```yaml
//! name: stone
//! input:
//!   format: lab-pbr-1.3
//!   height:
//!     invert: true
//! wrap: true
//! channels:
//!   smooth:
//!     scale: 0.8
//!   metal:
//!     value: 0.0
//! occlusion:
//!   quality: 0.1
//!   steps: 24
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::channel::{EncodingChannel, TextureTag};
use crate::error::SpecError;
use crate::mapping::ChannelOverride;

/// Per-material override layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MaterialProperties {
    /// Material name; file names are derived from it.
    #[serde(default)]
    pub name: String,
    /// Directory holding the material's source textures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Source files are named `{name}{suffix}` in `local_path` rather than
    /// `{tag}` inside a per-material folder.
    #[serde(default, alias = "global")]
    pub use_global_matching: bool,
    /// Input encoding selection and per-channel adjustments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputEncoding>,
    /// Wraps both axes when set; axis-specific flags take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_x: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_y: Option<bool>,
    /// Per-channel file, constant and scale/shift overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<EncodingChannel, ChannelProperties>,
    /// Connected-texture tiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctm: Option<CtmProperties>,
    /// Rectangles published as separate materials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MaterialPart>,
    /// Pixel size the part rectangles are expressed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_reference_size: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<NormalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion: Option<OcclusionProperties>,
}

/// Input encoding for one material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputEncoding {
    /// Catalog name; the profile's input format is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Adjustments keyed by semantic channel.
    #[serde(flatten)]
    pub overrides: BTreeMap<EncodingChannel, ChannelOverride>,
}

/// Overrides for one semantic channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelProperties {
    /// Explicit source file name (relative to the material directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    /// Constant value replacing any source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    /// Multiplier applied after decoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Offset applied after scaling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<f32>,
}

impl ChannelProperties {
    /// Apply scale then shift.
    pub fn adjust(&self, value: f32) -> f32 {
        value * self.scale.unwrap_or(1.0) + self.shift.unwrap_or(0.0)
    }

    /// Returns true when the value passes through unchanged.
    pub fn is_identity(&self) -> bool {
        self.scale.map_or(true, |s| s == 1.0) && self.shift.map_or(true, |s| s == 0.0)
    }
}

/// Connected-texture tiling methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CtmMethod {
    /// 47 tiles laid out in a 12x4 grid.
    Full,
    /// 5 tiles in one row.
    Compact,
    /// 4 tiles in one row.
    Horizontal,
    /// 4 tiles in one column.
    Vertical,
    /// `width` x `height` tiles.
    Repeat,
    /// `width` x `height` tiles chosen at random by the game.
    Random,
    /// A single tile.
    Fixed,
}

impl CtmMethod {
    /// Grid columns/rows and the number of used tiles, or `None` when the
    /// grid comes from the document.
    pub fn fixed_grid(&self) -> Option<(u32, u32, u32)> {
        match self {
            CtmMethod::Full => Some((12, 4, 47)),
            CtmMethod::Compact => Some((5, 1, 5)),
            CtmMethod::Horizontal => Some((4, 1, 4)),
            CtmMethod::Vertical => Some((1, 4, 4)),
            CtmMethod::Fixed => Some((1, 1, 1)),
            CtmMethod::Repeat | CtmMethod::Random => None,
        }
    }
}

/// Connected-texture descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CtmProperties {
    pub method: CtmMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Index of the first published tile.
    #[serde(default, alias = "start")]
    pub tile_start: u32,
}

impl CtmProperties {
    /// Columns, rows and used tile count.
    pub fn grid(&self) -> (u32, u32, u32) {
        match self.method.fixed_grid() {
            Some(grid) => grid,
            None => {
                let cols = self.width.unwrap_or(1);
                let rows = self.height.unwrap_or(1);
                (cols, rows, cols * rows)
            }
        }
    }
}

/// A named rectangle of the material published on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPart {
    pub name: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Normal synthesis settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NormalProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
}

/// Occlusion synthesis settings; unset fields fall back to the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OcclusionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "step-count")]
    pub steps: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_bias: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_power: Option<f32>,
}

impl MaterialProperties {
    /// A material with only a name and a source directory.
    pub fn new(name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            local_path: Some(local_path.into()),
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

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String, SpecError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Resolve the per-axis wrap flags against a profile default.
    pub fn wrap_axes(&self, default: bool) -> (bool, bool) {
        let both = self.wrap.unwrap_or(default);
        (self.wrap_x.unwrap_or(both), self.wrap_y.unwrap_or(both))
    }

    /// The channel properties for a semantic channel, if any.
    pub fn channel(&self, channel: EncodingChannel) -> Option<&ChannelProperties> {
        self.channels.get(&channel)
    }

    /// Explicit source file name for a channel.
    pub fn explicit_texture(&self, channel: EncodingChannel) -> Option<&str> {
        self.channel(channel).and_then(|c| c.texture.as_deref())
    }

    /// Constant value for a channel.
    pub fn constant(&self, channel: EncodingChannel) -> Option<f32> {
        self.channel(channel).and_then(|c| c.value)
    }

    /// Returns true when the material is split into CTM tiles.
    pub fn is_ctm(&self) -> bool {
        self.ctm.as_ref().map_or(false, |ctm| ctm.grid().2 > 1)
    }

    /// Returns true when the material is split into named parts.
    pub fn is_multi_part(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Returns true when any channel names an explicit file for this tag's
    /// semantic contents.
    pub fn has_explicit_for(&self, channels: &[EncodingChannel]) -> bool {
        channels.iter().any(|c| self.explicit_texture(*c).is_some())
    }
}

/// Texture tags that carry the three normal components in every standard.
pub const NORMAL_CHANNELS: [EncodingChannel; 3] = [
    EncodingChannel::NormalX,
    EncodingChannel::NormalY,
    EncodingChannel::NormalZ,
];

/// The tag a channel lives in when a material names no encoding at all.
pub fn default_tag_for(channel: EncodingChannel) -> TextureTag {
    match channel {
        EncodingChannel::ColorRed | EncodingChannel::ColorGreen | EncodingChannel::ColorBlue => {
            TextureTag::Color
        }
        EncodingChannel::NormalX | EncodingChannel::NormalY | EncodingChannel::NormalZ => {
            TextureTag::Normal
        }
        EncodingChannel::Opacity => TextureTag::Opacity,
        EncodingChannel::Height => TextureTag::Height,
        EncodingChannel::Occlusion => TextureTag::Occlusion,
        EncodingChannel::Specular => TextureTag::Specular,
        EncodingChannel::Smooth => TextureTag::Smooth,
        EncodingChannel::Rough => TextureTag::Rough,
        EncodingChannel::Metal => TextureTag::Metal,
        EncodingChannel::Hcm => TextureTag::Hcm,
        EncodingChannel::F0 => TextureTag::F0,
        EncodingChannel::Porosity => TextureTag::Porosity,
        EncodingChannel::Sss => TextureTag::Sss,
        EncodingChannel::Emissive => TextureTag::Emissive,
    }
}
