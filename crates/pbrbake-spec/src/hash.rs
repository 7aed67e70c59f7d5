//! Canonical hashing of configuration documents.
//!
//! Publishing is skipped for materials whose outputs are newer than their
//! sources, but only while the configuration stays the same. The
//! configuration fingerprint is:
//!
//! ```text
//! fingerprint = hex(BLAKE3(JCS({"material": material_json, "profile": profile_json})))
//! ```
//!
//! where JCS is the JSON canonicalization scheme of RFC 8785 (sorted keys, no
//! whitespace).

use crate::error::SpecError;
use crate::material::MaterialProperties;
use crate::profile::PackProfile;

/// Computes the configuration fingerprint of one material under a profile.
///
/// # Example
/// ```
/// use pbrbake_spec::{MaterialProperties, PackProfile};
/// use pbrbake_spec::hash::config_fingerprint;
///
/// let material = MaterialProperties::new("stone", "stone");
/// let profile = PackProfile::default();
/// let hash = config_fingerprint(&material, &profile).unwrap();
/// assert_eq!(hash.len(), 64);
/// ```
pub fn config_fingerprint(
    material: &MaterialProperties,
    profile: &PackProfile,
) -> Result<String, SpecError> {
    let value = serde_json::json!({
        "material": serde_json::to_value(material)?,
        "profile": serde_json::to_value(profile)?,
    });
    Ok(canonical_value_hash(&value))
}

/// Computes the canonical BLAKE3 hash of a JSON value.
pub fn canonical_value_hash(value: &serde_json::Value) -> String {
    let canonical = canonicalize_json(value);
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

/// Canonicalizes a JSON value: object keys sorted, no whitespace.
pub fn canonicalize_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => format_number(n),
        serde_json::Value::String(s) => format_string(s),
        serde_json::Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonicalize_json).collect();
            format!("[{}]", items.join(","))
        }
        serde_json::Value::Object(obj) => {
            let mut pairs: Vec<(&String, &serde_json::Value)> = obj.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            let pairs: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", format_string(k), canonicalize_json(v)))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => {
            if f == 0.0 {
                "0".to_string()
            } else if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", f as i64)
            } else {
                format!("{}", f)
            }
        }
        _ => "null".to_string(),
    }
}

fn format_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
