//! The texture graph: from a material's source files to its published
//! textures.
//!
//! - [`context`]: per-material resolved state
//! - [`sources`]: where each semantic channel comes from
//! - [`planes`]: decoded channel planes at the target size
//! - [`synth`]: normal and occlusion synthesis
//! - [`uptodate`]: incremental publishing
//! - [`builder`]: composition, region splitting and writing

pub mod builder;
pub mod context;
pub mod planes;
pub mod sources;
pub mod synth;
pub mod uptodate;

pub use builder::{PublishSummary, PublishedFile, SkippedTag, TextureGraphBuilder};
pub use context::TextureGraphContext;
pub use planes::{ChannelPlanes, Geometry};
pub use sources::{ChannelSource, Derivation, SourcePlan, Synthesis};
pub use uptodate::PublishManifest;
