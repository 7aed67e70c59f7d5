//! Publishing one material.
//!
//! [`TextureGraphBuilder::publish`] resolves sources, skips tags that cannot be
//! produced or are already up to date, decodes the remaining channels at the
//! target size, re-encodes every output tag, splits it into parts and writes
//! the parts. All files of a material are encoded in memory first and written
//! only when nothing failed, each through an atomic sink.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use pbrbake_spec::{ColorChannel, EncodingChannel, MaterialProperties, PackProfile, TextureTag};

use super::context::TextureGraphContext;
use super::planes::{load_images, max_frame_count, reference_frame, ChannelPlanes, Geometry};
use super::sources::SourcePlan;
use super::uptodate::{is_up_to_date, manifest_path, read_manifest, PublishManifest};
use crate::buffer::{Image, PixelFormat};
use crate::cancel::CancellationToken;
use crate::error::PublishError;
use crate::io::{write_file, InputReader, OutputWriter};
use crate::naming::{DefaultNaming, NamingResolver};
use crate::png::{encode_to_vec_with_hash, PngConfig};
use crate::region::{DefaultRegionEnumerator, RegionEnumerator, TexturePublishPart};

/// One written file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedFile {
    pub tag: TextureTag,
    pub path: PathBuf,
    /// BLAKE3 hash of the PNG data.
    pub hash: String,
    pub width: u32,
    pub height: u32,
}

/// A tag that was not published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTag {
    pub tag: TextureTag,
    pub reason: String,
}

/// Outcome of publishing one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishSummary {
    pub material: String,
    pub fingerprint: String,
    pub input_format: String,
    pub output_format: String,
    pub frame_count: u32,
    pub written: Vec<PublishedFile>,
    pub skipped: Vec<SkippedTag>,
    pub up_to_date: Vec<TextureTag>,
}

impl PublishSummary {
    fn new(ctx: &TextureGraphContext) -> Self {
        Self {
            material: ctx.material.name.clone(),
            fingerprint: ctx.fingerprint.clone(),
            input_format: ctx.input.name().to_string(),
            output_format: ctx.output.name().to_string(),
            frame_count: ctx.max_frame_count,
            written: Vec::new(),
            skipped: Vec::new(),
            up_to_date: Vec::new(),
        }
    }

    /// Returns true when nothing had to be written.
    pub fn is_unchanged(&self) -> bool {
        self.written.is_empty()
    }
}

/// Drives publishing against a reader and a writer.
pub struct TextureGraphBuilder<'a> {
    reader: &'a dyn InputReader,
    writer: &'a dyn OutputWriter,
    naming: &'a dyn NamingResolver,
    regions: &'a dyn RegionEnumerator,
    cancel: Option<CancellationToken>,
    force: bool,
    png: PngConfig,
}

impl<'a> TextureGraphBuilder<'a> {
    /// A builder with the default naming and region conventions.
    pub fn new(reader: &'a dyn InputReader, writer: &'a dyn OutputWriter) -> Self {
        Self {
            reader,
            writer,
            naming: &DefaultNaming,
            regions: &DefaultRegionEnumerator,
            cancel: None,
            force: false,
            png: PngConfig::default(),
        }
    }

    pub fn with_naming(mut self, naming: &'a dyn NamingResolver) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_regions(mut self, regions: &'a dyn RegionEnumerator) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Regenerate every tag even when its outputs are up to date.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_png_config(mut self, png: PngConfig) -> Self {
        self.png = png;
        self
    }

    /// Resolve and publish a material in one call.
    pub fn publish_material(
        &self,
        material: MaterialProperties,
        profile: PackProfile,
    ) -> Result<PublishSummary, PublishError> {
        let mut ctx = TextureGraphContext::new(material, profile)?;
        self.publish(&mut ctx)
    }

    /// Publish every producible tag of a material.
    pub fn publish(&self, ctx: &mut TextureGraphContext) -> Result<PublishSummary, PublishError> {
        self.check_cancelled(ctx)?;
        let cancel = self.cancel.as_ref();
        let plan = SourcePlan::resolve(ctx, self.reader, self.naming);
        let mut summary = PublishSummary::new(ctx);

        let manifest_file = manifest_path(&ctx.material);
        let unchanged_config = !self.force
            && read_manifest(self.writer, &manifest_file)
                .is_some_and(|m| m.fingerprint == ctx.fingerprint);

        let mut pending = Vec::new();
        let mut kept = Vec::new();
        for tag in ctx.output.tags() {
            if let Err(reason) = plan.check_tag(ctx, tag) {
                debug!("material '{}': skipping tag '{}': {}", ctx.material.name, tag, reason);
                summary.skipped.push(SkippedTag { tag, reason });
                continue;
            }
            if unchanged_config {
                let outputs = self.expected_outputs(ctx, tag);
                let sources = plan.paths_for(&tag_channels(ctx, tag));
                if is_up_to_date(self.reader, self.writer, &sources, &outputs) {
                    debug!("material '{}': tag '{}' is up to date", ctx.material.name, tag);
                    summary.up_to_date.push(tag);
                    kept.extend(outputs);
                    continue;
                }
            }
            pending.push(tag);
        }
        if pending.is_empty() {
            return Ok(summary);
        }

        let channels: BTreeSet<EncodingChannel> = pending
            .iter()
            .flat_map(|tag| tag_channels(ctx, *tag))
            .collect();
        let images = load_images(ctx, self.reader, &plan.paths_for(&channels))?;

        let frame_count = max_frame_count(ctx, &plan, &images)?;
        ctx.max_frame_count = frame_count;
        ctx.is_animated = frame_count > 1;
        summary.frame_count = frame_count;

        // Each tag is sized to the largest of its own sources; tags of one
        // size share decoded planes.
        let material_frame = reference_frame(ctx, images.values());
        let mut sizes: BTreeMap<(u32, u32), Vec<TextureTag>> = BTreeMap::new();
        for tag in &pending {
            let sources = plan.paths_for(&tag_channels(ctx, *tag));
            let reference = reference_frame(ctx, sources.iter().filter_map(|p| images.get(p)))
                .or(material_frame);
            sizes
                .entry(ctx.target_frame_size(reference))
                .or_default()
                .push(*tag);
        }

        let mut composed: BTreeMap<TextureTag, (Image, Geometry)> = BTreeMap::new();
        for ((frame_width, frame_height), tags) in sizes {
            let geometry = Geometry {
                frame_width,
                frame_height,
                frame_count,
            };
            debug!(
                "material '{}': {:?} at {} frame(s) of {}x{}",
                ctx.material.name, tags, frame_count, frame_width, frame_height
            );
            let channels: BTreeSet<EncodingChannel> = tags
                .iter()
                .flat_map(|tag| tag_channels(ctx, *tag))
                .collect();
            let closure = plan.closure(&channels);
            let planes = ChannelPlanes::build(ctx, &plan, &images, &closure, geometry, cancel)?;
            for tag in tags {
                let image = compose(ctx, &planes, tag, geometry, cancel)?;
                composed.insert(tag, (image, geometry));
            }
        }

        let mut encoded = Vec::new();
        for tag in pending {
            let Some((image, geometry)) = composed.remove(&tag) else {
                continue;
            };
            for part in self.regions.enumerate(&ctx.material, tag, frame_count) {
                let part_image = extract_part(&image, &part, geometry);
                let path = self
                    .naming
                    .output_path(&ctx.material, tag, &part.kind, ctx.publish_as_global);
                let (data, hash) =
                    encode_to_vec_with_hash(&part_image, &self.png).map_err(|source| {
                        PublishError::Png {
                            material: ctx.material.name.clone(),
                            tag,
                            source,
                        }
                    })?;
                encoded.push((
                    PublishedFile {
                        tag,
                        path,
                        hash,
                        width: part_image.width,
                        height: part_image.height,
                    },
                    data,
                ));
            }
        }

        self.check_cancelled(ctx)?;
        for (file, data) in encoded {
            write_file(self.writer, &file.path, &data).map_err(|source| PublishError::Io {
                material: ctx.material.name.clone(),
                path: file.path.clone(),
                source,
            })?;
            info!(
                "material '{}': published {} ({}x{})",
                ctx.material.name,
                file.path.display(),
                file.width,
                file.height
            );
            summary.written.push(file);
        }

        let manifest = PublishManifest {
            material: ctx.material.name.clone(),
            fingerprint: ctx.fingerprint.clone(),
            files: summary
                .written
                .iter()
                .map(|f| f.path.clone())
                .chain(kept)
                .collect(),
        };
        let io_err = |source: std::io::Error| PublishError::Io {
            material: ctx.material.name.clone(),
            path: manifest_file.clone(),
            source,
        };
        let data = serde_json::to_vec_pretty(&manifest).map_err(|e| io_err(e.into()))?;
        write_file(self.writer, &manifest_file, &data).map_err(io_err)?;

        Ok(summary)
    }

    /// Files a tag publishes to.
    fn expected_outputs(&self, ctx: &TextureGraphContext, tag: TextureTag) -> Vec<PathBuf> {
        self.regions
            .enumerate(&ctx.material, tag, 1)
            .iter()
            .map(|part| {
                self.naming
                    .output_path(&ctx.material, tag, &part.kind, ctx.publish_as_global)
            })
            .collect()
    }

    fn check_cancelled(&self, ctx: &TextureGraphContext) -> Result<(), PublishError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(PublishError::Cancelled {
                material: ctx.material.name.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Semantic channels stored in a tag.
fn tag_channels(ctx: &TextureGraphContext, tag: TextureTag) -> BTreeSet<EncodingChannel> {
    ctx.output.tag_mappings(tag).map(|m| m.channel).collect()
}

/// Encode every physical channel of a tag from the decoded planes.
///
/// The image uses the narrowest format holding the tag's channels. A slot
/// with neither a value nor a default is written as zero.
pub fn compose(
    ctx: &TextureGraphContext,
    planes: &ChannelPlanes,
    tag: TextureTag,
    geometry: Geometry,
    cancel: Option<&CancellationToken>,
) -> Result<Image, PublishError> {
    let colors = ctx.output.tag_colors(tag);
    let format = PixelFormat::narrowest(colors.iter().copied());
    let stored = format.channels();
    let width = geometry.frame_width;
    let mut image = Image::new(width, geometry.strip_height(), format, 0.0);

    image
        .data
        .par_chunks_mut(width as usize * stored)
        .enumerate()
        .try_for_each(|(y, row)| {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(PublishError::Cancelled {
                    material: ctx.material.name.clone(),
                });
            }
            let y = y as u32;
            for x in 0..width {
                let pixel = &mut row[x as usize * stored..(x as usize + 1) * stored];
                for &color in &colors {
                    let byte = ctx
                        .output
                        .encode_slot(tag, color, |channel| planes.value(channel, x, y))
                        .unwrap_or(0);
                    put(pixel, format, color, byte as f32);
                }
            }
            Ok(())
        })?;
    Ok(image)
}

fn put(pixel: &mut [f32], format: PixelFormat, color: ColorChannel, value: f32) {
    match (format, color.index()) {
        (PixelFormat::Gray, _) => pixel[0] = value,
        (_, Some(c)) => {
            if let Some(slot) = pixel.get_mut(c) {
                *slot = value;
            }
        }
        (_, None) => {
            for slot in pixel.iter_mut().take(3) {
                *slot = value;
            }
        }
    }
}

/// Cut one part out of a composed strip, stacking its per-frame rectangles.
pub fn extract_part(image: &Image, part: &TexturePublishPart, geometry: Geometry) -> Image {
    let rects: Vec<(u32, u32, u32, u32)> = part
        .regions
        .iter()
        .filter(|r| r.frame < geometry.frame_count)
        .map(|r| r.to_pixels(geometry.frame_width, geometry.frame_height))
        .collect();
    let Some(&(_, _, width, height)) = rects.first() else {
        return image.clone();
    };

    let stride = image.format.channels() * width as usize;
    let mut out = Image::new(width, height * rects.len() as u32, image.format, 0.0);
    for (i, &(left, top, w, h)) in rects.iter().enumerate() {
        let tile = image.crop(left, top, w.min(width), h.min(height));
        let tile_stride = image.format.channels() * tile.width as usize;
        for row in 0..tile.height as usize {
            let dst = (i * height as usize + row) * stride;
            let src = row * tile_stride;
            out.data[dst..dst + tile_stride].copy_from_slice(&tile.data[src..src + tile_stride]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbrbake_spec::ChannelProperties;

    use crate::region::{PartKind, UvRegion};

    fn strip(width: u32, frames: u32) -> Image {
        let mut image = Image::new(width, width * frames, PixelFormat::Gray, 0.0);
        for y in 0..image.height {
            for x in 0..width {
                image.set(x, y, 0, (y * width + x) as f32);
            }
        }
        image
    }

    #[test]
    fn test_extract_part_stacks_frames() {
        let image = strip(4, 2);
        let geometry = Geometry {
            frame_width: 4,
            frame_height: 4,
            frame_count: 2,
        };
        let part = TexturePublishPart {
            kind: PartKind::Tile(0),
            regions: (0..2)
                .map(|frame| UvRegion {
                    frame,
                    left: 0.5,
                    top: 0.5,
                    width: 0.5,
                    height: 0.5,
                })
                .collect(),
        };
        let out = extract_part(&image, &part, geometry);
        assert_eq!((out.width, out.height), (2, 4));
        // Frame 0 pixel (2, 2), then frame 1 pixel (2, 2).
        assert_eq!(out.get(0, 0, 0), Some(10.0));
        assert_eq!(out.get(0, 2, 0), Some(26.0));
    }

    #[test]
    fn test_whole_part_is_identity() {
        let image = strip(4, 3);
        let geometry = Geometry {
            frame_width: 4,
            frame_height: 4,
            frame_count: 3,
        };
        let out = extract_part(&image, &TexturePublishPart::whole(3), geometry);
        assert_eq!(out, image);
    }

    #[test]
    fn test_compose_constants() {
        let mut material = MaterialProperties::new("paint", "paint");
        for (channel, value) in [
            (EncodingChannel::ColorRed, 1.0),
            (EncodingChannel::ColorGreen, 0.5),
            (EncodingChannel::ColorBlue, 0.0),
        ] {
            material.channels.insert(
                channel,
                ChannelProperties {
                    value: Some(value),
                    ..Default::default()
                },
            );
        }
        let ctx = TextureGraphContext::new(material, PackProfile::new("raw", "raw")).unwrap();
        let reader = crate::io::LocalInputReader::new("/nonexistent");
        let plan = SourcePlan::resolve(&ctx, &reader, &DefaultNaming);
        let geometry = Geometry {
            frame_width: 2,
            frame_height: 2,
            frame_count: 1,
        };
        let channels = tag_channels(&ctx, TextureTag::Color);
        let planes = ChannelPlanes::build(
            &ctx,
            &plan,
            &Default::default(),
            &plan.closure(&channels),
            geometry,
            None,
        )
        .unwrap();

        let image = compose(&ctx, &planes, TextureTag::Color, geometry, None).unwrap();
        assert_eq!(image.format, PixelFormat::Rgb);
        assert_eq!(image.to_bytes()[..3], [255, 128, 0]);
    }
}
