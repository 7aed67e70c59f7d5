//! Numeric encode/decode of one channel mapping.
//!
//! Raw values are in the byte domain (0 to 255) but may be fractional when
//! they come out of a resampler.

use pbrbake_spec::ChannelMapping;

/// Apply the mapping's shift, wrapping at 256.
#[inline]
pub fn shift_raw(raw: f32, shift: i32) -> f32 {
    if shift == 0 {
        raw
    } else {
        (raw + shift as f32).rem_euclid(256.0)
    }
}

#[inline]
fn curve_exponent(mapping: &ChannelMapping) -> f32 {
    if mapping.power.is_finite() && mapping.power > 0.0 {
        mapping.power
    } else {
        1.0
    }
}

/// Decode a raw value.
///
/// Returns the mapping's default when the shifted value falls outside
/// `[range_min, range_max]`; `None` when there is no default.
pub fn decode(raw: f32, mapping: &ChannelMapping) -> Option<f32> {
    let shifted = shift_raw(raw, mapping.shift);
    if mapping.contains_raw(shifted) {
        Some(decode_in_range(shifted, mapping))
    } else {
        mapping.default_value
    }
}

/// Decode a shifted raw value already known to lie in the mapping's range.
pub fn decode_in_range(shifted: f32, mapping: &ChannelMapping) -> f32 {
    let lo = mapping.range_min as f32;
    let hi = mapping.range_max as f32;
    let mut t = if hi > lo { (shifted - lo) / (hi - lo) } else { 1.0 };
    t = t.clamp(0.0, 1.0);

    let power = curve_exponent(mapping);
    if power != 1.0 {
        t = t.powf(power);
    }
    if mapping.invert {
        t = 1.0 - t;
    }
    mapping.min_value + t * (mapping.max_value - mapping.min_value)
}

/// Encode a semantic value to a raw byte.
///
/// Values outside `[min_value, max_value]` saturate; the result is rounded
/// half-up and the shift is removed.
pub fn encode(value: f32, mapping: &ChannelMapping) -> u8 {
    let span = mapping.max_value - mapping.min_value;
    let mut t = if span.abs() > f32::EPSILON {
        (value - mapping.min_value) / span
    } else {
        1.0
    };
    // NaN collapses to the low end.
    t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    if mapping.invert {
        t = 1.0 - t;
    }
    let power = curve_exponent(mapping);
    if power != 1.0 {
        t = t.powf(1.0 / power);
    }

    let lo = mapping.range_min as f32;
    let hi = mapping.range_max as f32;
    let raw = (lo + t * (hi - lo) + 0.5).floor().clamp(lo, hi);
    (raw as i32 - mapping.shift).rem_euclid(256) as u8
}

/// Returns true when the mapping refuses to write this value.
#[inline]
pub fn is_clipped(value: f32, mapping: &ChannelMapping) -> bool {
    mapping.enable_clipping && value < mapping.clip_value
}
