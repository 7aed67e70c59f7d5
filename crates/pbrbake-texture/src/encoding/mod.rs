//! Channel transform engine.
//!
//! [`transform`] holds the per-mapping numeric rules; [`ResolvedEncoding`]
//! applies them to a whole standard, including packed channels where several
//! mappings share one physical channel by raw value range.

pub mod transform;

use std::collections::BTreeMap;

use pbrbake_spec::{
    ChannelMapping, ChannelOverride, ColorChannel, EncodingChannel, EncodingStandard, SamplerKind,
    SpecError, TextureTag,
};

pub use transform::{decode, decode_in_range, encode, is_clipped, shift_raw};

/// An encoding standard with per-material overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEncoding {
    name: String,
    mappings: Vec<ChannelMapping>,
}

impl ResolvedEncoding {
    pub fn from_standard(standard: &EncodingStandard) -> Self {
        Self {
            name: standard.name.to_string(),
            mappings: standard.to_vec(),
        }
    }

    /// Resolve a catalog name; unknown names are an error.
    pub fn by_name(name: &str) -> Result<Self, SpecError> {
        EncodingStandard::by_name(name).map(Self::from_standard)
    }

    /// Apply per-channel overrides. Overrides for channels the standard does
    /// not carry add a mapping when they name a texture.
    pub fn with_overrides(mut self, overrides: &BTreeMap<EncodingChannel, ChannelOverride>) -> Self {
        for (channel, ov) in overrides {
            match self.mappings.iter_mut().find(|m| m.channel == *channel) {
                Some(mapping) => ov.apply_to(mapping),
                None => {
                    if let Some(mapping) = ov.to_mapping(*channel) {
                        self.mappings.push(mapping);
                    }
                }
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mappings(&self) -> &[ChannelMapping] {
        &self.mappings
    }

    /// The mapping that stores a semantic channel.
    pub fn mapping(&self, channel: EncodingChannel) -> Option<&ChannelMapping> {
        self.mappings.iter().find(|m| m.channel == channel)
    }

    pub fn contains(&self, channel: EncodingChannel) -> bool {
        self.mapping(channel).is_some()
    }

    /// Texture tags in order of first appearance.
    pub fn tags(&self) -> Vec<TextureTag> {
        let mut tags = Vec::new();
        for m in &self.mappings {
            if !tags.contains(&m.texture) {
                tags.push(m.texture);
            }
        }
        tags
    }

    /// Mappings stored in one texture.
    pub fn tag_mappings(&self, tag: TextureTag) -> impl Iterator<Item = &ChannelMapping> + '_ {
        self.mappings.iter().filter(move |m| m.texture == tag)
    }

    /// Physical channels used by one texture, in first-use order.
    pub fn tag_colors(&self, tag: TextureTag) -> Vec<ColorChannel> {
        let mut colors = Vec::new();
        for m in self.tag_mappings(tag) {
            if !colors.contains(&m.color) {
                colors.push(m.color);
            }
        }
        colors
    }

    /// Mappings sharing one physical channel, in declaration order.
    pub fn slot(&self, tag: TextureTag, color: ColorChannel) -> Vec<&ChannelMapping> {
        self.mappings
            .iter()
            .filter(|m| m.texture == tag && m.color == color)
            .collect()
    }

    /// Returns true when the mapping shares its physical channel.
    pub fn is_packed(&self, mapping: &ChannelMapping) -> bool {
        self.mappings
            .iter()
            .filter(|m| m.shares_slot(mapping))
            .take(2)
            .count()
            > 1
    }

    /// The mapping owning a raw value of a physical channel.
    ///
    /// Among the mappings whose (shifted) range contains the value, the
    /// highest priority wins and declaration order breaks ties.
    pub fn owner(&self, tag: TextureTag, color: ColorChannel, raw: f32) -> Option<&ChannelMapping> {
        let mut best: Option<&ChannelMapping> = None;
        for m in self.slot(tag, color) {
            if !m.contains_raw(shift_raw(raw, m.shift)) {
                continue;
            }
            match best {
                Some(b) if b.priority >= m.priority => {}
                _ => best = Some(m),
            }
        }
        best
    }

    /// Decode one semantic channel from the raw value of its physical channel.
    ///
    /// In a packed channel the value is only decoded when this mapping owns
    /// the raw value; otherwise the mapping's default (if any) applies.
    pub fn decode_channel(&self, channel: EncodingChannel, raw: f32) -> Option<f32> {
        let mapping = self.mapping(channel)?;
        if !self.is_packed(mapping) {
            return decode(raw, mapping);
        }
        match self.owner(mapping.texture, mapping.color, raw) {
            Some(owner) if owner.channel == channel => {
                Some(decode_in_range(shift_raw(raw, mapping.shift), mapping))
            }
            _ => mapping.default_value,
        }
    }

    /// Encode one physical channel from semantic values.
    ///
    /// Mappings are tried in descending priority (declaration order breaks
    /// ties); the first one with a present, unclipped value writes the byte.
    /// Otherwise the first mapping with a default writes its default.
    pub fn encode_slot<F>(&self, tag: TextureTag, color: ColorChannel, value: F) -> Option<u8>
    where
        F: Fn(EncodingChannel) -> Option<f32>,
    {
        let mut ordered = self.slot(tag, color);
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        for m in &ordered {
            if let Some(v) = value(m.channel) {
                if !is_clipped(v, m) {
                    return Some(encode(v, m));
                }
            }
        }
        ordered
            .iter()
            .find_map(|m| m.default_value.map(|d| encode(d, m)))
    }

    /// Sampler used when reading a mapping's physical channel.
    ///
    /// Packed channels default to nearest so interpolation never invents
    /// values between unrelated intervals.
    pub fn input_sampler(&self, mapping: &ChannelMapping, default: SamplerKind) -> SamplerKind {
        match mapping.sampler {
            Some(kind) => kind,
            None if self.is_packed(mapping) => SamplerKind::Nearest,
            None => default,
        }
    }

    /// Sampler used when resampling a whole physical channel.
    pub fn slot_sampler(&self, tag: TextureTag, color: ColorChannel, default: SamplerKind) -> SamplerKind {
        let slot = self.slot(tag, color);
        if let Some(kind) = slot.iter().find_map(|m| m.sampler) {
            return kind;
        }
        if slot.len() > 1 {
            SamplerKind::Nearest
        } else {
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbrbake_spec::names;

    #[test]
    fn test_overrides_modify_and_add() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            EncodingChannel::Height,
            ChannelOverride {
                invert: Some(true),
                ..Default::default()
            },
        );
        overrides.insert(
            EncodingChannel::Sss,
            ChannelOverride {
                texture: Some(TextureTag::Sss),
                ..Default::default()
            },
        );
        let enc = ResolvedEncoding::by_name(names::OLD_PBR)
            .unwrap()
            .with_overrides(&overrides);
        assert!(enc.mapping(EncodingChannel::Height).unwrap().invert);
        assert_eq!(
            enc.mapping(EncodingChannel::Sss).unwrap().texture,
            TextureTag::Sss
        );
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            ResolvedEncoding::by_name("lab-pbr-0.9"),
            Err(SpecError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_lab_green_priority_resolution() {
        let enc = ResolvedEncoding::by_name(names::LAB_PBR_1_1).unwrap();
        let owner = |raw: f32| {
            enc.owner(TextureTag::Specular, ColorChannel::Green, raw)
                .map(|m| m.channel)
        };
        assert_eq!(owner(10.0), Some(EncodingChannel::F0));
        assert_eq!(owner(240.0), Some(EncodingChannel::Hcm));
        assert_eq!(owner(255.0), Some(EncodingChannel::Metal));

        let hcm = enc.decode_channel(EncodingChannel::Hcm, 240.0).unwrap();
        assert!((hcm - 240.0).abs() < 1e-3);
        assert_eq!(enc.decode_channel(EncodingChannel::Metal, 240.0), None);
        assert_eq!(enc.decode_channel(EncodingChannel::Metal, 255.0), Some(1.0));
        assert_eq!(enc.decode_channel(EncodingChannel::F0, 255.0), Some(0.04));
    }

    #[test]
    fn test_alpha_pbr_scenario_bytes() {
        let enc = ResolvedEncoding::by_name(names::ALPHA_PBR).unwrap();
        let owner = |raw: f32| {
            enc.owner(TextureTag::Normal, ColorChannel::Alpha, raw)
                .map(|m| m.channel)
        };
        assert_eq!(owner(0.0), None);
        assert_eq!(owner(40.0), Some(EncodingChannel::Porosity));
        assert_eq!(owner(200.0), None);
        assert_eq!(owner(251.0), Some(EncodingChannel::Metal));
        for raw in 252..=255 {
            assert_eq!(owner(raw as f32), None);
        }
        // Smooth falls back to its default where it does not own the byte.
        assert_eq!(enc.decode_channel(EncodingChannel::Smooth, 200.0), Some(0.0));
        assert_eq!(enc.decode_channel(EncodingChannel::Porosity, 200.0), None);
    }

    #[test]
    fn test_packed_encode_selection() {
        let enc = ResolvedEncoding::by_name(names::LAB_PBR_1_3).unwrap();
        let encode_green = |metal: Option<f32>, hcm: Option<f32>, f0: Option<f32>| {
            enc.encode_slot(TextureTag::Specular, ColorChannel::Green, |c| match c {
                EncodingChannel::Metal => metal,
                EncodingChannel::Hcm => hcm,
                EncodingChannel::F0 => f0,
                _ => None,
            })
        };
        // Metal below the clip value falls through to F0.
        assert_eq!(encode_green(Some(0.0), None, Some(0.2)), Some(51));
        assert_eq!(encode_green(Some(1.0), None, Some(0.2)), Some(255));
        assert_eq!(encode_green(Some(1.0), Some(231.0), Some(0.2)), Some(231));
        // Nothing present: F0's default.
        assert_eq!(encode_green(None, None, None), Some(10));
    }

    #[test]
    fn test_packed_sampler_defaults_to_nearest() {
        let enc = ResolvedEncoding::by_name(names::ALPHA_PBR).unwrap();
        let smooth = enc.mapping(EncodingChannel::Smooth).unwrap();
        assert_eq!(
            enc.input_sampler(smooth, SamplerKind::Bicubic),
            SamplerKind::Nearest
        );
        let red = enc.mapping(EncodingChannel::ColorRed).unwrap();
        assert_eq!(
            enc.input_sampler(red, SamplerKind::Bicubic),
            SamplerKind::Bicubic
        );
        assert_eq!(
            enc.slot_sampler(TextureTag::Normal, ColorChannel::Alpha, SamplerKind::Bilinear),
            SamplerKind::Nearest
        );
    }
}
