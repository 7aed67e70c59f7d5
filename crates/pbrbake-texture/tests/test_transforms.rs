//! Channel transform tests over the whole encoding catalog.
//!
//! Covers encode/decode round trips for every non-clipping mapping and the
//! interval/priority resolution of packed channels.

use pbrbake_spec::{EncodingChannel, EncodingStandard, TextureTag};
use pbrbake_texture::encoding::{decode, encode, shift_raw, ResolvedEncoding};

// ============================================================================
// Round Trips
// ============================================================================

/// Every non-clipping mapping re-encodes a decoded value to the same byte
/// (within one) across its value range.
#[test]
fn test_round_trip_within_one_byte() {
    for standard in EncodingStandard::all() {
        for mapping in standard.mappings().filter(|m| !m.enable_clipping) {
            for i in 0..=100 {
                let t = i as f32 / 100.0;
                let v = mapping.min_value + t * (mapping.max_value - mapping.min_value);
                let byte = encode(v, mapping);
                let decoded = decode(byte as f32, mapping).unwrap_or_else(|| {
                    panic!(
                        "{} {:?}: byte {} from {} does not decode",
                        standard.name, mapping.channel, byte, v
                    )
                });
                let again = encode(decoded, mapping);
                assert!(
                    (again as i32 - byte as i32).abs() <= 1,
                    "{} {:?}: {} -> {} -> {} -> {}",
                    standard.name,
                    mapping.channel,
                    v,
                    byte,
                    decoded,
                    again
                );
            }
        }
    }
}

/// Linear mappings decode back to the original value within one byte step.
#[test]
fn test_linear_round_trip_value_error() {
    for standard in EncodingStandard::all() {
        for mapping in standard
            .mappings()
            .filter(|m| !m.enable_clipping && m.power == 1.0 && m.range_max > m.range_min)
        {
            let step = (mapping.max_value - mapping.min_value).abs()
                / (mapping.range_max - mapping.range_min) as f32;
            for i in 0..=50 {
                let t = i as f32 / 50.0;
                let v = mapping.min_value + t * (mapping.max_value - mapping.min_value);
                let decoded = decode(encode(v, mapping) as f32, mapping).unwrap();
                assert!(
                    (decoded - v).abs() <= step + 1e-4,
                    "{} {:?}: {} decoded as {}",
                    standard.name,
                    mapping.channel,
                    v,
                    decoded
                );
            }
        }
    }
}

// ============================================================================
// Packed Channels
// ============================================================================

/// Slots whose ranges do not overlap resolve each byte to at most one
/// mapping; overlapping slots resolve to the highest-priority candidate.
#[test]
fn test_packed_resolution_is_unambiguous() {
    for standard in EncodingStandard::all() {
        let encoding = ResolvedEncoding::from_standard(standard);
        for tag in encoding.tags() {
            for color in encoding.tag_colors(tag) {
                let slot = encoding.slot(tag, color);
                if slot.len() < 2 {
                    continue;
                }
                let overlapping = slot
                    .iter()
                    .enumerate()
                    .any(|(i, a)| slot[i + 1..].iter().any(|b| a.overlaps(b)));

                for raw in 0..=255u32 {
                    let raw = raw as f32;
                    let candidates: Vec<_> = slot
                        .iter()
                        .filter(|m| m.contains_raw(shift_raw(raw, m.shift)))
                        .collect();
                    let owner = encoding.owner(tag, color, raw);

                    if !overlapping {
                        assert!(candidates.len() <= 1, "{} {} {:?}", standard.name, tag, color);
                    }
                    match owner {
                        Some(owner) => {
                            assert!(candidates.iter().all(|m| m.priority <= owner.priority));
                            assert_eq!(encoding.owner(tag, color, raw), Some(owner));
                        }
                        None => assert!(candidates.is_empty()),
                    }
                }
            }
        }
    }
}

/// Bytes 0, 40 and 200 of the alpha-pbr packed normal alpha.
#[test]
fn test_alpha_pbr_scenario() {
    let alpha = ResolvedEncoding::by_name("alpha-pbr").unwrap();
    let owner = |raw: f32| {
        alpha
            .owner(TextureTag::Normal, pbrbake_spec::ColorChannel::Alpha, raw)
            .map(|m| m.channel)
    };

    assert_eq!(owner(0.0), None);
    assert_eq!(owner(40.0), Some(EncodingChannel::Porosity));
    assert_eq!(owner(200.0), None);
    for raw in 252..=255 {
        assert_eq!(owner(raw as f32), None);
    }
    assert_eq!(owner(100.0), Some(EncodingChannel::Smooth));
    assert_eq!(owner(251.0), Some(EncodingChannel::Metal));

    // A byte outside every interval still decodes smoothness to its default.
    assert_eq!(alpha.decode_channel(EncodingChannel::Smooth, 200.0), Some(0.0));
    assert_eq!(alpha.decode_channel(EncodingChannel::Porosity, 200.0), None);
}

/// LabPBR 1.1 metal and hcm share 230..=254; hcm has the higher priority.
#[test]
fn test_lab_overlap_priority() {
    let lab = ResolvedEncoding::by_name("lab-pbr-1.1").unwrap();
    let owner = |raw: f32| {
        lab.owner(TextureTag::Specular, pbrbake_spec::ColorChannel::Green, raw)
            .map(|m| m.channel)
    };
    assert_eq!(owner(100.0), Some(EncodingChannel::F0));
    assert_eq!(owner(240.0), Some(EncodingChannel::Hcm));
    assert_eq!(owner(255.0), Some(EncodingChannel::Metal));
}

/// Encoding a packed slot prefers the highest-priority present value.
#[test]
fn test_packed_encode_selection() {
    let lab = ResolvedEncoding::by_name("lab-pbr-1.3").unwrap();
    let green = pbrbake_spec::ColorChannel::Green;

    let metal = lab.encode_slot(TextureTag::Specular, green, |c| match c {
        EncodingChannel::Metal => Some(1.0),
        EncodingChannel::F0 => Some(0.2),
        _ => None,
    });
    assert_eq!(metal, Some(255));

    // Metal below its clip value falls through to f0.
    let f0 = lab.encode_slot(TextureTag::Specular, green, |c| match c {
        EncodingChannel::Metal => Some(0.0),
        EncodingChannel::F0 => Some(0.2),
        _ => None,
    });
    assert_eq!(f0, Some(51));

    // Nothing present: the f0 default.
    let fallback = lab.encode_slot(TextureTag::Specular, green, |_| None);
    assert_eq!(fallback, Some(10));
}
