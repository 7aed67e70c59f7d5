//! pbrbake channel-mapping model and configuration documents.
//!
//! This crate describes *what* a PBR texture set stores and *where*: which
//! semantic material property lives in which color channel of which texture,
//! including packed encodings where several properties share one 8-bit
//! channel by value range. It has no image I/O; the pixel pipeline lives in
//! `pbrbake-texture`.
//!
//! # Example
//!
//! ```
//! use pbrbake_spec::{EncodingStandard, MaterialProperties, PackProfile};
//! use pbrbake_spec::validation::{validate_material, validate_profile};
//!
//! let lab = EncodingStandard::by_name("lab-pbr-1.3").unwrap();
//! assert!(lab.mappings().count() > 10);
//!
//! let profile = PackProfile::new("raw", "lab-pbr-1.3");
//! assert!(validate_profile(&profile).is_ok());
//!
//! let material = MaterialProperties::from_yaml_str("name: stone\nwrap: true\n").unwrap();
//! assert!(validate_material(&material).is_ok());
//! ```
//!
//! # Modules
//!
//! - [`channel`]: Semantic channels, color channels, texture tags, samplers
//! - [`mapping`]: Channel mappings and per-material overrides
//! - [`catalog`]: The named encoding standards
//! - [`material`]: Per-material documents
//! - [`profile`]: Pack-wide profiles
//! - [`validation`]: Document validation
//! - [`hash`]: Configuration fingerprints
//! - [`error`]: Error and warning types

pub mod catalog;
pub mod channel;
pub mod error;
pub mod hash;
pub mod mapping;
pub mod material;
pub mod profile;
pub mod validation;

// Re-export commonly used types at the crate root
pub use catalog::{names, EncodingStandard};
pub use channel::{ColorChannel, EncodingChannel, SamplerKind, TextureTag};
pub use error::{
    BackendError, Diagnostic, ErrorCode, SpecError, ValidationError, ValidationResult,
    ValidationWarning, WarningCode,
};
pub use mapping::{ChannelMapping, ChannelOverride};
pub use material::{
    ChannelProperties, CtmMethod, CtmProperties, InputEncoding, MaterialPart, MaterialProperties,
    NormalProperties, OcclusionProperties,
};
pub use profile::{OcclusionBackend, PackProfile, ResolvedOcclusion};
