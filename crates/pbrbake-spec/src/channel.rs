//! Semantic channels, physical color channels, texture tags and sampler kinds.

use serde::{Deserialize, Serialize};

/// A named material property, independent of where it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingChannel {
    ColorRed,
    ColorGreen,
    ColorBlue,
    Opacity,
    Height,
    NormalX,
    NormalY,
    NormalZ,
    Occlusion,
    Specular,
    Smooth,
    Rough,
    Metal,
    Hcm,
    F0,
    Porosity,
    Sss,
    Emissive,
}

impl EncodingChannel {
    /// Every semantic channel, in declaration order.
    pub const ALL: [EncodingChannel; 18] = [
        EncodingChannel::ColorRed,
        EncodingChannel::ColorGreen,
        EncodingChannel::ColorBlue,
        EncodingChannel::Opacity,
        EncodingChannel::Height,
        EncodingChannel::NormalX,
        EncodingChannel::NormalY,
        EncodingChannel::NormalZ,
        EncodingChannel::Occlusion,
        EncodingChannel::Specular,
        EncodingChannel::Smooth,
        EncodingChannel::Rough,
        EncodingChannel::Metal,
        EncodingChannel::Hcm,
        EncodingChannel::F0,
        EncodingChannel::Porosity,
        EncodingChannel::Sss,
        EncodingChannel::Emissive,
    ];

    /// Kebab-case identifier used in documents and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingChannel::ColorRed => "color-red",
            EncodingChannel::ColorGreen => "color-green",
            EncodingChannel::ColorBlue => "color-blue",
            EncodingChannel::Opacity => "opacity",
            EncodingChannel::Height => "height",
            EncodingChannel::NormalX => "normal-x",
            EncodingChannel::NormalY => "normal-y",
            EncodingChannel::NormalZ => "normal-z",
            EncodingChannel::Occlusion => "occlusion",
            EncodingChannel::Specular => "specular",
            EncodingChannel::Smooth => "smooth",
            EncodingChannel::Rough => "rough",
            EncodingChannel::Metal => "metal",
            EncodingChannel::Hcm => "hcm",
            EncodingChannel::F0 => "f0",
            EncodingChannel::Porosity => "porosity",
            EncodingChannel::Sss => "sss",
            EncodingChannel::Emissive => "emissive",
        }
    }

    /// Returns true for the three tangent-space normal components.
    pub fn is_normal(&self) -> bool {
        matches!(
            self,
            EncodingChannel::NormalX | EncodingChannel::NormalY | EncodingChannel::NormalZ
        )
    }
}

impl std::fmt::Display for EncodingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical channel of a stored texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
    Alpha,
    /// Length of the RGB vector, scaled back into the byte domain.
    Magnitude,
}

impl ColorChannel {
    /// Index into an RGBA pixel, or `None` for the derived magnitude channel.
    pub fn index(&self) -> Option<usize> {
        match self {
            ColorChannel::Red => Some(0),
            ColorChannel::Green => Some(1),
            ColorChannel::Blue => Some(2),
            ColorChannel::Alpha => Some(3),
            ColorChannel::Magnitude => None,
        }
    }
}

/// Identifies one stored texture of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureTag {
    Color,
    Opacity,
    Height,
    Normal,
    Occlusion,
    Specular,
    Smooth,
    Rough,
    Metal,
    Hcm,
    F0,
    Porosity,
    Sss,
    Emissive,
}

impl TextureTag {
    /// Lowercase identifier used in file names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureTag::Color => "color",
            TextureTag::Opacity => "opacity",
            TextureTag::Height => "height",
            TextureTag::Normal => "normal",
            TextureTag::Occlusion => "occlusion",
            TextureTag::Specular => "specular",
            TextureTag::Smooth => "smooth",
            TextureTag::Rough => "rough",
            TextureTag::Metal => "metal",
            TextureTag::Hcm => "hcm",
            TextureTag::F0 => "f0",
            TextureTag::Porosity => "porosity",
            TextureTag::Sss => "sss",
            TextureTag::Emissive => "emissive",
        }
    }
}

impl std::fmt::Display for TextureTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplerKind {
    #[serde(alias = "point")]
    Nearest,
    #[serde(alias = "linear")]
    Bilinear,
    #[default]
    #[serde(alias = "cubic")]
    Bicubic,
    #[serde(alias = "box")]
    Average,
    WeightedAverage,
}
