//! The encoding catalog: every named texture-set convention as one table.
//!
//! A standard is an ordered list of mapping groups. Groups are shared between
//! standards (the color texture, for example, is identical in most of them),
//! so each convention is declared once and only its distinguishing slots are
//! spelled out.

use crate::channel::ColorChannel::{Alpha, Blue, Green, Magnitude, Red};
use crate::channel::{EncodingChannel as C, SamplerKind, TextureTag as T};
use crate::error::SpecError;
use crate::mapping::ChannelMapping;

/// Standard names.
pub mod names {
    pub const RAW: &str = "raw";
    pub const COLOR: &str = "color";
    pub const VANILLA: &str = "vanilla";
    pub const SPECULAR: &str = "specular";
    pub const OLD_PBR: &str = "old-pbr";
    pub const LAB_PBR_1_1: &str = "lab-pbr-1.1";
    pub const LAB_PBR_1_2: &str = "lab-pbr-1.2";
    pub const LAB_PBR_1_3: &str = "lab-pbr-1.3";
    pub const ALPHA_PBR: &str = "alpha-pbr";
}

/// A named, immutable, ordered set of channel mappings.
#[derive(Debug)]
pub struct EncodingStandard {
    /// Lookup name, e.g. "lab-pbr-1.3".
    pub name: &'static str,
    /// One-line description for listings.
    pub description: &'static str,
    groups: &'static [&'static [ChannelMapping]],
}

impl EncodingStandard {
    /// Iterate the mappings in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = &'static ChannelMapping> + '_ {
        self.groups.iter().flat_map(|group| group.iter())
    }

    /// Copy the mappings into an owned list for merging.
    pub fn to_vec(&self) -> Vec<ChannelMapping> {
        self.mappings().copied().collect()
    }

    /// Look up a standard by name (case-insensitive, `_` accepted for `-`).
    pub fn find(name: &str) -> Option<&'static EncodingStandard> {
        let key = name.trim().to_ascii_lowercase().replace('_', "-");
        let key = match key.as_str() {
            "lab-pbr" | "labpbr" => names::LAB_PBR_1_3,
            "default" => names::RAW,
            other => return STANDARDS.iter().find(|s| s.name == other),
        };
        STANDARDS.iter().find(|s| s.name == key)
    }

    /// Look up a standard by name, failing for unknown names.
    pub fn by_name(name: &str) -> Result<&'static EncodingStandard, SpecError> {
        Self::find(name).ok_or_else(|| SpecError::UnknownEncoding(name.to_string()))
    }

    /// Every standard in the catalog.
    pub fn all() -> &'static [EncodingStandard] {
        STANDARDS
    }
}

const fn m(
    channel: crate::channel::EncodingChannel,
    texture: crate::channel::TextureTag,
    color: crate::channel::ColorChannel,
) -> ChannelMapping {
    ChannelMapping::new(channel, texture, color)
}

/// Clip threshold for packed properties that are only written where present.
const PACKED_PRESENCE: f32 = 0.5 / 255.0;

// Shared groups

const COLOR_RGB: &[ChannelMapping] = &[
    m(C::ColorRed, T::Color, Red),
    m(C::ColorGreen, T::Color, Green),
    m(C::ColorBlue, T::Color, Blue),
];

const COLOR_OPACITY: &[ChannelMapping] = &[m(C::Opacity, T::Color, Alpha).default_value(1.0)];

const NORMAL_XY: &[ChannelMapping] = &[
    m(C::NormalX, T::Normal, Red).values(-1.0, 1.0).default_value(0.0),
    m(C::NormalY, T::Normal, Green).values(-1.0, 1.0).default_value(0.0),
];

const NORMAL_Z: &[ChannelMapping] =
    &[m(C::NormalZ, T::Normal, Blue).values(-1.0, 1.0).default_value(1.0)];

const NORMAL_HEIGHT: &[ChannelMapping] = &[m(C::Height, T::Normal, Alpha).default_value(1.0)];

// Raw: one property per texture.

const RAW_SEPARATE: &[ChannelMapping] = &[
    m(C::Opacity, T::Opacity, Red).default_value(1.0),
    m(C::Height, T::Height, Red),
    m(C::Occlusion, T::Occlusion, Red),
    m(C::Specular, T::Specular, Red),
    m(C::Smooth, T::Smooth, Red),
    m(C::Rough, T::Rough, Red),
    m(C::Metal, T::Metal, Red),
    m(C::Hcm, T::Hcm, Red)
        .range(230, 254)
        .values(230.0, 254.0)
        .sampler(SamplerKind::Nearest),
    m(C::F0, T::F0, Red),
    m(C::Porosity, T::Porosity, Red),
    m(C::Sss, T::Sss, Red),
    m(C::Emissive, T::Emissive, Red),
];

// Specular-intensity workflow.

const SPECULAR_GRAY: &[ChannelMapping] =
    &[m(C::Specular, T::Specular, Magnitude).default_value(0.0)];

// Old PBR (smooth / metal / emissive in specular RGB).

const OLD_PBR_SPECULAR: &[ChannelMapping] = &[
    m(C::Smooth, T::Specular, Red).default_value(0.0),
    m(C::Metal, T::Specular, Green).default_value(0.0),
    m(C::Emissive, T::Specular, Blue).default_value(0.0),
];

// LabPBR

const LAB_OCCLUSION: &[ChannelMapping] =
    &[m(C::Occlusion, T::Normal, Blue).inverted().default_value(0.0)];

const LAB_SMOOTH: &[ChannelMapping] = &[m(C::Smooth, T::Specular, Red).default_value(0.0)];

const LAB_F0_HCM: &[ChannelMapping] = &[
    m(C::F0, T::Specular, Green)
        .range(0, 229)
        .values(0.0, 229.0 / 255.0)
        .default_value(0.04),
    m(C::Hcm, T::Specular, Green)
        .range(230, 254)
        .values(230.0, 254.0)
        .priority(2)
        .sampler(SamplerKind::Nearest),
];

const LAB_METAL_LEGACY: &[ChannelMapping] = &[m(C::Metal, T::Specular, Green)
    .range(230, 255)
    .values(1.0, 1.0)
    .clip(0.5)
    .priority(1)];

const LAB_METAL_ALBEDO: &[ChannelMapping] = &[m(C::Metal, T::Specular, Green)
    .range(255, 255)
    .values(1.0, 1.0)
    .clip(0.5)
    .priority(1)];

const LAB_POROSITY_SSS: &[ChannelMapping] = &[
    m(C::Porosity, T::Specular, Blue)
        .range(0, 64)
        .default_value(0.0),
    m(C::Sss, T::Specular, Blue)
        .range(65, 255)
        .clip(PACKED_PRESENCE)
        .priority(1),
];

const LAB_EMISSIVE: &[ChannelMapping] = &[m(C::Emissive, T::Specular, Alpha)
    .range(1, 255)
    .shift(1)
    .default_value(0.0)];

// Alpha PBR: several properties multiplexed into the normal alpha channel.

const ALPHA_PBR_PACKED: &[ChannelMapping] = &[
    m(C::Porosity, T::Normal, Alpha)
        .range(1, 64)
        .clip(PACKED_PRESENCE)
        .priority(1),
    m(C::Smooth, T::Normal, Alpha)
        .range(73, 157)
        .default_value(0.0),
    m(C::Emissive, T::Normal, Alpha)
        .range(230, 250)
        .clip(PACKED_PRESENCE)
        .priority(2),
    m(C::Metal, T::Normal, Alpha)
        .range(251, 251)
        .values(1.0, 1.0)
        .clip(0.5)
        .priority(3),
];

/// The catalog.
pub const STANDARDS: &[EncodingStandard] = &[
    EncodingStandard {
        name: names::RAW,
        description: "One property per texture; editable source layout",
        groups: &[COLOR_RGB, NORMAL_XY, NORMAL_Z, RAW_SEPARATE],
    },
    EncodingStandard {
        name: names::COLOR,
        description: "Color only",
        groups: &[COLOR_RGB],
    },
    EncodingStandard {
        name: names::VANILLA,
        description: "Color with opacity",
        groups: &[COLOR_RGB, COLOR_OPACITY],
    },
    EncodingStandard {
        name: names::SPECULAR,
        description: "Color, normal and a grayscale specular intensity map",
        groups: &[COLOR_RGB, COLOR_OPACITY, NORMAL_XY, NORMAL_Z, SPECULAR_GRAY],
    },
    EncodingStandard {
        name: names::OLD_PBR,
        description: "Smooth/metal/emissive specular with height in normal alpha",
        groups: &[
            COLOR_RGB,
            COLOR_OPACITY,
            NORMAL_XY,
            NORMAL_Z,
            NORMAL_HEIGHT,
            OLD_PBR_SPECULAR,
        ],
    },
    EncodingStandard {
        name: names::LAB_PBR_1_1,
        description: "LabPBR 1.1",
        groups: &[
            COLOR_RGB,
            COLOR_OPACITY,
            NORMAL_XY,
            NORMAL_Z,
            NORMAL_HEIGHT,
            LAB_SMOOTH,
            LAB_F0_HCM,
            LAB_METAL_LEGACY,
            LAB_POROSITY_SSS,
            LAB_EMISSIVE,
        ],
    },
    EncodingStandard {
        name: names::LAB_PBR_1_2,
        description: "LabPBR 1.2 (occlusion in normal blue)",
        groups: &[
            COLOR_RGB,
            COLOR_OPACITY,
            NORMAL_XY,
            LAB_OCCLUSION,
            NORMAL_HEIGHT,
            LAB_SMOOTH,
            LAB_F0_HCM,
            LAB_METAL_LEGACY,
            LAB_POROSITY_SSS,
            LAB_EMISSIVE,
        ],
    },
    EncodingStandard {
        name: names::LAB_PBR_1_3,
        description: "LabPBR 1.3 (albedo metal only at 255)",
        groups: &[
            COLOR_RGB,
            COLOR_OPACITY,
            NORMAL_XY,
            LAB_OCCLUSION,
            NORMAL_HEIGHT,
            LAB_SMOOTH,
            LAB_F0_HCM,
            LAB_METAL_ALBEDO,
            LAB_POROSITY_SSS,
            LAB_EMISSIVE,
        ],
    },
    EncodingStandard {
        name: names::ALPHA_PBR,
        description: "Alpha PBR (packed normal alpha)",
        groups: &[COLOR_RGB, COLOR_OPACITY, NORMAL_XY, NORMAL_Z, ALPHA_PBR_PACKED],
    },
];
