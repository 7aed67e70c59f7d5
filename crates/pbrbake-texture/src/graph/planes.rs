//! Decoded semantic planes at the target resolution.
//!
//! A plane is a [`ScalarField`] holding one semantic channel for every frame,
//! stacked vertically like the source strips. `NaN` marks pixels where the
//! channel has no value.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;

use pbrbake_spec::{ChannelMapping, EncodingChannel, TextureTag};

use super::context::TextureGraphContext;
use super::sources::{ChannelSource, Derivation, SourcePlan, Synthesis};
use super::synth;
use crate::buffer::{Image, ScalarField};
use crate::cancel::CancellationToken;
use crate::encoding::decode;
use crate::error::PublishError;
use crate::io::InputReader;
use crate::normal::reconstruct_z;
use crate::sampler::{RowSampler, SampleBounds};

/// How a source image is split into animation frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub frame_count: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl FrameLayout {
    pub fn of(image: &Image, detect_frames: bool) -> Self {
        let frame_count = if detect_frames { image.frame_count() } else { 1 };
        Self {
            frame_count,
            frame_width: image.width,
            frame_height: image.height / frame_count,
        }
    }
}

/// Target geometry of every plane and composed texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_count: u32,
}

impl Geometry {
    /// Height of the whole frame strip.
    pub fn strip_height(&self) -> u32 {
        self.frame_height * self.frame_count
    }
}

/// Read and decode every listed file.
pub fn load_images(
    ctx: &TextureGraphContext,
    reader: &dyn InputReader,
    paths: &BTreeSet<PathBuf>,
) -> Result<BTreeMap<PathBuf, Image>, PublishError> {
    let mut images = BTreeMap::new();
    for path in paths {
        let data = reader.read_all(path).map_err(|source| PublishError::Io {
            material: ctx.material.name.clone(),
            path: path.clone(),
            source,
        })?;
        let image = Image::decode(&data).map_err(|source| PublishError::Decode {
            material: ctx.material.name.clone(),
            path: path.clone(),
            source,
        })?;
        debug!(
            "material '{}': loaded {} ({}x{})",
            ctx.material.name,
            path.display(),
            image.width,
            image.height
        );
        images.insert(path.clone(), image);
    }
    Ok(images)
}

/// Largest frame count among the sources.
///
/// Every source's frame count must divide the largest one.
pub fn max_frame_count(
    ctx: &TextureGraphContext,
    plan: &SourcePlan,
    images: &BTreeMap<PathBuf, Image>,
) -> Result<u32, PublishError> {
    let detect = ctx.detects_frames();
    let max = images
        .values()
        .map(|image| FrameLayout::of(image, detect).frame_count)
        .max()
        .unwrap_or(1);

    for (path, image) in images {
        let frames = FrameLayout::of(image, detect).frame_count;
        if max % frames != 0 {
            return Err(PublishError::FrameCountMismatch {
                material: ctx.material.name.clone(),
                tag: source_tag(plan, path).unwrap_or(TextureTag::Color),
                frames,
                max,
            });
        }
    }
    Ok(max)
}

fn source_tag(plan: &SourcePlan, path: &Path) -> Option<TextureTag> {
    plan.iter().find_map(|(_, source)| match source {
        ChannelSource::Texture { path: p, mapping } if p == path => Some(mapping.texture),
        _ => None,
    })
}

/// Size of the largest source frame, by width.
pub fn reference_frame<'a>(
    ctx: &TextureGraphContext,
    images: impl IntoIterator<Item = &'a Image>,
) -> Option<(u32, u32)> {
    let detect = ctx.detects_frames();
    images
        .into_iter()
        .map(|image| FrameLayout::of(image, detect))
        .max_by_key(|layout| (layout.frame_width, layout.frame_height))
        .map(|layout| (layout.frame_width, layout.frame_height))
}

/// Resample one physical channel of a source to the target geometry and
/// decode it. Raw values are resampled first, so packed channels sample with
/// nearest unless the mapping overrides it.
pub fn decode_plane(
    ctx: &TextureGraphContext,
    image: &Image,
    mapping: &ChannelMapping,
    geometry: Geometry,
    cancel: Option<&CancellationToken>,
) -> Result<ScalarField, PublishError> {
    let layout = FrameLayout::of(image, ctx.detects_frames());
    let kind = ctx.input.input_sampler(mapping, ctx.sampler());
    let edges = ctx.edges();
    let options = ctx.sampler_options(
        (layout.frame_width, layout.frame_height),
        (geometry.frame_width, geometry.frame_height),
    );
    let from_standard = ctx.input.mapping(mapping.channel) == Some(mapping);

    let width = geometry.frame_width as usize;
    let mut plane = ScalarField::new(geometry.frame_width, geometry.strip_height(), f32::NAN);
    plane
        .data
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(y, row)| {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(PublishError::Cancelled {
                    material: ctx.material.name.clone(),
                });
            }
            let y = y as u32;
            let frame = y / geometry.frame_height;
            let bounds = SampleBounds::frame(
                layout.frame_width,
                layout.frame_height,
                frame % layout.frame_count,
            );
            let v = ((y % geometry.frame_height) as f32 + 0.5) / geometry.frame_height as f32;

            RowSampler::new(image, kind, bounds, edges, options).sample_row(v, mapping.color, row);
            for value in row.iter_mut() {
                let decoded = if from_standard {
                    ctx.input.decode_channel(mapping.channel, *value)
                } else {
                    decode(*value, mapping)
                };
                *value = decoded.unwrap_or(f32::NAN);
            }
            Ok(())
        })?;
    Ok(plane)
}

/// Planes keyed by semantic channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelPlanes {
    planes: BTreeMap<EncodingChannel, ScalarField>,
}

impl ChannelPlanes {
    /// Build the planes for `channels` (which must be closed under the plan's
    /// dependencies): files and constants first, then synthesis from height,
    /// then derivations.
    pub fn build(
        ctx: &TextureGraphContext,
        plan: &SourcePlan,
        images: &BTreeMap<PathBuf, Image>,
        channels: &BTreeSet<EncodingChannel>,
        geometry: Geometry,
        cancel: Option<&CancellationToken>,
    ) -> Result<Self, PublishError> {
        let mut planes = ChannelPlanes::default();
        let (w, h) = (geometry.frame_width, geometry.strip_height());

        for &channel in channels {
            let plane = match plan.get(channel) {
                Some(ChannelSource::Texture { path, mapping }) => match images.get(path) {
                    Some(image) => decode_plane(ctx, image, mapping, geometry, cancel)?,
                    None => continue,
                },
                Some(ChannelSource::Constant(value)) => ScalarField::new(w, h, *value),
                _ => continue,
            };
            let constant = matches!(plan.get(channel), Some(ChannelSource::Constant(_)));
            planes.insert_adjusted(ctx, channel, plane, !constant);
        }

        let wants_normal = channels.iter().any(|c| {
            c.is_normal() && plan.get(*c) == Some(&ChannelSource::Synthesized(Synthesis::NormalFromHeight))
        });
        let wants_occlusion = channels.contains(&EncodingChannel::Occlusion)
            && plan.get(EncodingChannel::Occlusion)
                == Some(&ChannelSource::Synthesized(Synthesis::OcclusionFromHeight));

        if wants_normal || wants_occlusion {
            let height = planes.height_or_zero(w, h);
            if wants_normal {
                let normals = synth::normals(ctx, &height, geometry);
                for (channel, plane) in [
                    (EncodingChannel::NormalX, normals.x),
                    (EncodingChannel::NormalY, normals.y),
                    (EncodingChannel::NormalZ, normals.z),
                ] {
                    if channels.contains(&channel) {
                        planes.insert_adjusted(ctx, channel, plane, true);
                    }
                }
            }
            if wants_occlusion {
                let occlusion = synth::occlusion(ctx, &height, geometry, cancel)?;
                planes.insert_adjusted(ctx, EncodingChannel::Occlusion, occlusion, true);
            }
        }

        for &channel in channels {
            if let Some(ChannelSource::Derived(derivation)) = plan.get(channel) {
                if let Some(plane) = planes.derive(*derivation) {
                    planes.insert_adjusted(ctx, channel, plane, true);
                }
            }
        }

        Ok(planes)
    }

    pub fn get(&self, channel: EncodingChannel) -> Option<&ScalarField> {
        self.planes.get(&channel)
    }

    /// Value of a channel at a pixel; `None` when absent.
    #[inline]
    pub fn value(&self, channel: EncodingChannel, x: u32, y: u32) -> Option<f32> {
        self.planes.get(&channel).and_then(|p| p.value(x, y))
    }

    /// Apply the material's scale/shift (unless the plane is a constant) and
    /// clamp into the output mapping's value range.
    fn insert_adjusted(
        &mut self,
        ctx: &TextureGraphContext,
        channel: EncodingChannel,
        mut plane: ScalarField,
        adjust: bool,
    ) {
        let props = ctx
            .material
            .channel(channel)
            .filter(|p| adjust && !p.is_identity());
        let range = ctx.output.mapping(channel).map(|m| {
            (m.min_value.min(m.max_value), m.min_value.max(m.max_value))
        });

        if props.is_some() || range.is_some() {
            for v in plane.data.iter_mut().filter(|v| !v.is_nan()) {
                if let Some(props) = props {
                    *v = props.adjust(*v);
                }
                if let Some((lo, hi)) = range {
                    *v = v.clamp(lo, hi);
                }
            }
        }
        self.planes.insert(channel, plane);
    }

    fn height_or_zero(&self, width: u32, height: u32) -> ScalarField {
        let mut field = self
            .get(EncodingChannel::Height)
            .cloned()
            .unwrap_or_else(|| ScalarField::new(width, height, 0.0));
        for v in field.data.iter_mut().filter(|v| v.is_nan()) {
            *v = 0.0;
        }
        field
    }

    fn derive(&self, derivation: Derivation) -> Option<ScalarField> {
        let map = |source: &ScalarField, f: &dyn Fn(f32) -> f32| ScalarField {
            width: source.width,
            height: source.height,
            data: source
                .data
                .iter()
                .map(|&v| if v.is_nan() { v } else { f(v) })
                .collect(),
        };
        match derivation {
            Derivation::RoughFromSmooth => {
                Some(map(self.get(EncodingChannel::Smooth)?, &|v| 1.0 - v))
            }
            Derivation::SmoothFromRough => {
                Some(map(self.get(EncodingChannel::Rough)?, &|v| 1.0 - v))
            }
            Derivation::MetalFromHcm => Some(map(self.get(EncodingChannel::Hcm)?, &|_| 1.0)),
            Derivation::NormalZFromXY => {
                let x = self.get(EncodingChannel::NormalX)?;
                let y = self.get(EncodingChannel::NormalY)?;
                Some(ScalarField {
                    width: x.width,
                    height: x.height,
                    data: x
                        .data
                        .iter()
                        .zip(&y.data)
                        .map(|(&nx, &ny)| {
                            if nx.is_nan() || ny.is_nan() {
                                f32::NAN
                            } else {
                                reconstruct_z(nx, ny)
                            }
                        })
                        .collect(),
                })
            }
        }
    }
}
