//! Source resolution: where each semantic channel comes from.
//!
//! Resolution only checks file existence; pixels are loaded later and only
//! for the channels the remaining tags need.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use pbrbake_spec::material::default_tag_for;
use pbrbake_spec::{ChannelMapping, ColorChannel, EncodingChannel, TextureTag};

use super::context::TextureGraphContext;
use crate::io::InputReader;
use crate::naming::NamingResolver;

/// A value computed from other channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Derivation {
    RoughFromSmooth,
    SmoothFromRough,
    NormalZFromXY,
    MetalFromHcm,
}

impl Derivation {
    /// Channels the derivation reads.
    pub fn inputs(&self) -> &'static [EncodingChannel] {
        match self {
            Derivation::RoughFromSmooth => &[EncodingChannel::Smooth],
            Derivation::SmoothFromRough => &[EncodingChannel::Rough],
            Derivation::NormalZFromXY => &[EncodingChannel::NormalX, EncodingChannel::NormalY],
            Derivation::MetalFromHcm => &[EncodingChannel::Hcm],
        }
    }
}

/// A channel generated from the height field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Synthesis {
    NormalFromHeight,
    OcclusionFromHeight,
}

/// Where one semantic channel comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSource {
    /// Decoded from a source file through an input mapping.
    Texture {
        path: PathBuf,
        mapping: ChannelMapping,
    },
    Constant(f32),
    Derived(Derivation),
    Synthesized(Synthesis),
}

impl ChannelSource {
    /// Channels this source reads besides its own file.
    pub fn dependencies(&self) -> &'static [EncodingChannel] {
        match self {
            ChannelSource::Derived(d) => d.inputs(),
            ChannelSource::Synthesized(_) => &[EncodingChannel::Height],
            _ => &[],
        }
    }
}

/// The resolved source of every channel that has one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePlan {
    sources: BTreeMap<EncodingChannel, ChannelSource>,
}

impl SourcePlan {
    /// Resolve sources for a material.
    ///
    /// Precedence per channel: constant, explicit file, the input encoding's
    /// file, a derivation, then synthesis. Explicit normal or occlusion
    /// sources always win over synthesis.
    pub fn resolve(
        ctx: &TextureGraphContext,
        reader: &dyn InputReader,
        naming: &dyn NamingResolver,
    ) -> Self {
        let material = &ctx.material;
        let mut sources = BTreeMap::new();

        for channel in EncodingChannel::ALL {
            if let Some(value) = material.constant(channel) {
                sources.insert(channel, ChannelSource::Constant(value));
                continue;
            }

            let input_mapping = ctx.input.mapping(channel).copied();
            let candidate = match material.explicit_texture(channel) {
                Some(file) => {
                    let mapping = input_mapping.unwrap_or_else(|| {
                        ChannelMapping::new(channel, default_tag_for(channel), ColorChannel::Red)
                    });
                    Some((naming.explicit_path(material, file), mapping))
                }
                None => input_mapping.map(|mapping| {
                    let path = naming.input_path(material, mapping.texture, ctx.input_is_global());
                    (path, mapping)
                }),
            };
            if let Some((path, mapping)) = candidate {
                if reader.file_exists(&path) {
                    sources.insert(channel, ChannelSource::Texture { path, mapping });
                }
            }
        }

        let direct: BTreeSet<EncodingChannel> = sources.keys().copied().collect();
        let wants = |c: EncodingChannel| ctx.output.contains(c);
        let has = |c: EncodingChannel| direct.contains(&c);

        let has_height = has(EncodingChannel::Height);
        let has_normal = has(EncodingChannel::NormalX) || has(EncodingChannel::NormalY);
        if !has_normal
            && has_height
            && ctx.profile.auto_generate_normal
            && (wants(EncodingChannel::NormalX) || wants(EncodingChannel::NormalY))
        {
            for channel in pbrbake_spec::material::NORMAL_CHANNELS {
                sources.insert(channel, ChannelSource::Synthesized(Synthesis::NormalFromHeight));
            }
        }
        if !has(EncodingChannel::Occlusion)
            && has_height
            && ctx.profile.auto_generate_occlusion
            && wants(EncodingChannel::Occlusion)
        {
            sources.insert(
                EncodingChannel::Occlusion,
                ChannelSource::Synthesized(Synthesis::OcclusionFromHeight),
            );
        }

        let derivations = [
            (EncodingChannel::Rough, Derivation::RoughFromSmooth),
            (EncodingChannel::Smooth, Derivation::SmoothFromRough),
            (EncodingChannel::NormalZ, Derivation::NormalZFromXY),
            (EncodingChannel::Metal, Derivation::MetalFromHcm),
        ];
        for (channel, derivation) in derivations {
            if !sources.contains_key(&channel) && derivation.inputs().iter().all(|c| has(*c)) {
                sources.insert(channel, ChannelSource::Derived(derivation));
            }
        }

        Self { sources }
    }

    pub fn get(&self, channel: EncodingChannel) -> Option<&ChannelSource> {
        self.sources.get(&channel)
    }

    /// Returns true when the channel has any source.
    pub fn is_sourced(&self, channel: EncodingChannel) -> bool {
        self.sources.contains_key(&channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EncodingChannel, &ChannelSource)> + '_ {
        self.sources.iter().map(|(c, s)| (*c, s))
    }

    /// Files contributing to a set of channels, following derivations and
    /// synthesis.
    pub fn paths_for(&self, channels: &BTreeSet<EncodingChannel>) -> BTreeSet<PathBuf> {
        self.closure(channels)
            .iter()
            .filter_map(|c| match self.get(*c) {
                Some(ChannelSource::Texture { path, .. }) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// The channels plus everything they depend on.
    pub fn closure(&self, channels: &BTreeSet<EncodingChannel>) -> BTreeSet<EncodingChannel> {
        let mut out = BTreeSet::new();
        let mut pending: Vec<EncodingChannel> = channels.iter().copied().collect();
        while let Some(channel) = pending.pop() {
            if !out.insert(channel) {
                continue;
            }
            if let Some(source) = self.get(channel) {
                pending.extend(source.dependencies().iter().copied());
            }
        }
        out
    }

    /// Decide whether a tag can be published.
    ///
    /// At least one of the tag's channels needs a source, and every physical
    /// channel of the tag needs a sourced mapping or a default. Returns the
    /// reason when the tag must be skipped.
    pub fn check_tag(&self, ctx: &TextureGraphContext, tag: TextureTag) -> Result<(), String> {
        let mut any = false;
        for color in ctx.output.tag_colors(tag) {
            let slot = ctx.output.slot(tag, color);
            let sourced = slot.iter().any(|m| self.is_sourced(m.channel));
            any |= sourced;
            if !sourced && slot.iter().all(|m| m.default_value.is_none()) {
                let names: Vec<&str> = slot.iter().map(|m| m.channel.as_str()).collect();
                return Err(format!("no source or default for {}", names.join("/")));
            }
        }
        if any {
            Ok(())
        } else {
            Err("no channel has a source".to_string())
        }
    }
}
