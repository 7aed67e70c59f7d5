//! Publishing errors.

use std::path::PathBuf;

use thiserror::Error;

use pbrbake_spec::{BackendError, SpecError, TextureTag};

use crate::occlusion::OcclusionError;
use crate::png::PngError;

/// Errors that abort publishing of one material.
///
/// Missing sources are not errors: the affected tag is skipped and reported in
/// the publish summary. Everything here is fatal for the material but never
/// for its siblings in a batch.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("material '{material}': {source}")]
    Spec {
        material: String,
        #[source]
        source: SpecError,
    },

    #[error("material '{material}': invalid configuration: {message}")]
    InvalidConfig { material: String, message: String },

    #[error(
        "material '{material}', tag '{tag}': frame count {frames} does not divide the material frame count {max}"
    )]
    FrameCountMismatch {
        material: String,
        tag: TextureTag,
        frames: u32,
        max: u32,
    },

    #[error("material '{material}': occlusion: {source}")]
    Occlusion {
        material: String,
        #[source]
        source: OcclusionError,
    },

    #[error("material '{material}': failed to decode {}: {source}", .path.display())]
    Decode {
        material: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("material '{material}', tag '{tag}': {source}")]
    Png {
        material: String,
        tag: TextureTag,
        #[source]
        source: PngError,
    },

    #[error("material '{material}': I/O error on {}: {source}", .path.display())]
    Io {
        material: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("material '{material}': cancelled")]
    Cancelled { material: String },
}

impl PublishError {
    /// Name of the material the error belongs to.
    pub fn material(&self) -> &str {
        match self {
            PublishError::Spec { material, .. }
            | PublishError::InvalidConfig { material, .. }
            | PublishError::FrameCountMismatch { material, .. }
            | PublishError::Occlusion { material, .. }
            | PublishError::Decode { material, .. }
            | PublishError::Png { material, .. }
            | PublishError::Io { material, .. }
            | PublishError::Cancelled { material } => material,
        }
    }

    /// Texture tag the error belongs to, when it concerns a single tag.
    pub fn tag(&self) -> Option<TextureTag> {
        match self {
            PublishError::FrameCountMismatch { tag, .. } | PublishError::Png { tag, .. } => {
                Some(*tag)
            }
            _ => None,
        }
    }

    /// Returns true for errors raised before any pixel work.
    pub fn is_configuration(&self) -> bool {
        match self {
            PublishError::Spec { .. }
            | PublishError::InvalidConfig { .. }
            | PublishError::FrameCountMismatch { .. } => true,
            PublishError::Occlusion { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// Returns false only for cooperative cancellation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PublishError::Cancelled { .. })
    }
}

impl BackendError for PublishError {
    fn code(&self) -> &'static str {
        match self {
            PublishError::Spec { .. } => "PUBLISH_001",
            PublishError::InvalidConfig { .. } => "PUBLISH_002",
            PublishError::FrameCountMismatch { .. } => "PUBLISH_003",
            PublishError::Occlusion { .. } => "PUBLISH_004",
            PublishError::Decode { .. } => "PUBLISH_005",
            PublishError::Png { .. } => "PUBLISH_006",
            PublishError::Io { .. } => "PUBLISH_007",
            PublishError::Cancelled { .. } => "PUBLISH_008",
        }
    }

    fn category(&self) -> &'static str {
        "publish"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_and_codes() {
        let err = PublishError::FrameCountMismatch {
            material: "lava".to_string(),
            tag: TextureTag::Normal,
            frames: 3,
            max: 4,
        };
        assert_eq!(err.material(), "lava");
        assert_eq!(err.tag(), Some(TextureTag::Normal));
        assert!(err.is_configuration());
        assert!(err.is_fatal());
        assert_eq!(err.code(), "PUBLISH_003");
        assert_eq!(err.category(), "publish");
        assert!(err.to_string().contains("tag 'normal'"));
    }

    #[test]
    fn test_unknown_encoding_is_configuration() {
        let err = PublishError::Spec {
            material: "stone".to_string(),
            source: SpecError::UnknownEncoding("lab-pbr-9".to_string()),
        };
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "material 'stone': unknown encoding standard 'lab-pbr-9'"
        );
    }

    #[test]
    fn test_cancelled_is_not_fatal() {
        let err = PublishError::Cancelled {
            material: "stone".to_string(),
        };
        assert!(!err.is_fatal());
        assert!(!err.is_configuration());
    }
}
