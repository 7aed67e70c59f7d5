//! pbrbake texture pipeline
//!
//! Converts a material's source textures from one PBR encoding standard to
//! another: every stored channel is decoded into its semantic value, resized,
//! optionally synthesized (normals and ambient occlusion from height) and
//! re-encoded into the published texture layout.
//!
//! # Features
//!
//! - **Channel transforms**: range, shift, power curve, inversion and packed
//!   channels resolved by value interval and priority
//! - **Samplers**: nearest, bilinear, bicubic, average and weighted average,
//!   with per-axis wrap/clamp and a row-cached scanline sampler
//! - **Occlusion**: CPU (rayon) and, with the `gpu` feature, compute-shader
//!   backends sharing one ray set
//! - **Publishing**: connected-texture tiles, named parts, animation strips,
//!   incremental regeneration and atomic writes
//! - **Deterministic PNG**: fixed compression settings and BLAKE3 hashes
//!
//! # Example
//!
//! ```no_run
//! use pbrbake_spec::{MaterialProperties, PackProfile};
//! use pbrbake_texture::graph::TextureGraphBuilder;
//! use pbrbake_texture::io::{LocalInputReader, LocalOutputWriter};
//!
//! let reader = LocalInputReader::new("materials");
//! let writer = LocalOutputWriter::new("pack/textures");
//! let profile = PackProfile::new("raw", "lab-pbr-1.3");
//!
//! let summary = TextureGraphBuilder::new(&reader, &writer)
//!     .publish_material(MaterialProperties::new("stone", "stone"), profile)
//!     .unwrap();
//! for file in &summary.written {
//!     println!("{} {}", file.path.display(), file.hash);
//! }
//! ```

pub mod batch;
pub mod buffer;
pub mod cancel;
pub mod encoding;
pub mod error;
pub mod graph;
pub mod io;
pub mod naming;
pub mod normal;
pub mod occlusion;
pub mod png;
pub mod region;
pub mod sampler;

// Re-export main types for convenience
pub use batch::{discover_materials, BatchPublisher, BatchReport, FailedMaterial};
pub use buffer::{Image, PixelFormat, PixelSource, ScalarField};
pub use cancel::CancellationToken;
pub use encoding::ResolvedEncoding;
pub use error::PublishError;
pub use graph::{PublishSummary, PublishedFile, SkippedTag, TextureGraphBuilder, TextureGraphContext};
pub use io::{InputReader, LocalInputReader, LocalOutputWriter, OutputSink, OutputWriter};
pub use naming::{DefaultNaming, NamingResolver};
pub use normal::{NormalField, NormalGenerator};
pub use occlusion::{build_ray_set, OcclusionError, OcclusionGenerator, OcclusionOptions, RaySet};
pub use png::{PngConfig, PngError};
pub use region::{DefaultRegionEnumerator, PartKind, RegionEnumerator, TexturePublishPart, UvRegion};
pub use sampler::{create_sampler, EdgeMode, SampleBounds, Sampler, SamplerOptions};
