//! Splitting a composed texture into published parts.
//!
//! A composed texture holds every animation frame stacked vertically. A
//! [`TexturePublishPart`] selects one rectangle out of each frame; the frames'
//! rectangles are stacked again to form the published file.

use pbrbake_spec::{MaterialProperties, TextureTag};
use serde::Serialize;

/// A rectangle within one frame, in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvRegion {
    pub frame: u32,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRegion {
    /// The whole frame.
    pub fn full(frame: u32) -> Self {
        Self {
            frame,
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    /// Pixel rectangle `(left, top, width, height)` inside a vertical strip of
    /// `frame_width` x `frame_height` frames.
    ///
    /// Edges are rounded independently so adjacent regions tile exactly.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let (fw, fh) = (frame_width.max(1), frame_height.max(1));
        let edge = |v: f32, size: u32| ((v * size as f32).round().max(0.0) as u32).min(size);
        let left = edge(self.left, fw).min(fw - 1);
        let top = edge(self.top, fh).min(fh - 1);
        let right = edge(self.left + self.width, fw).max(left + 1);
        let bottom = edge(self.top + self.height, fh).max(top + 1);
        (left, self.frame * fh + top, right - left, bottom - top)
    }
}

/// What a published part stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PartKind {
    /// The material as a whole.
    Whole,
    /// One connected-texture tile, by published tile number.
    Tile(u32),
    /// A named sub-material.
    Named(String),
}

/// One file to publish: a region per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TexturePublishPart {
    pub kind: PartKind,
    pub regions: Vec<UvRegion>,
}

impl TexturePublishPart {
    pub fn whole(frame_count: u32) -> Self {
        Self {
            kind: PartKind::Whole,
            regions: (0..frame_count.max(1)).map(UvRegion::full).collect(),
        }
    }
}

/// Yields the parts of a texture (tiling/animation policy).
pub trait RegionEnumerator: Send + Sync {
    fn enumerate(
        &self,
        material: &MaterialProperties,
        tag: TextureTag,
        frame_count: u32,
    ) -> Vec<TexturePublishPart>;
}

/// Whole textures, connected-texture grids and named parts.
///
/// Named parts take precedence over a tile grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegionEnumerator;

impl RegionEnumerator for DefaultRegionEnumerator {
    fn enumerate(
        &self,
        material: &MaterialProperties,
        _tag: TextureTag,
        frame_count: u32,
    ) -> Vec<TexturePublishPart> {
        let frames = frame_count.max(1);

        if material.is_multi_part() {
            let [ref_w, ref_h] = material.part_reference_size.unwrap_or([1, 1]);
            let (ref_w, ref_h) = (ref_w.max(1) as f32, ref_h.max(1) as f32);
            return material
                .parts
                .iter()
                .map(|part| TexturePublishPart {
                    kind: PartKind::Named(part.name.clone()),
                    regions: (0..frames)
                        .map(|frame| UvRegion {
                            frame,
                            left: part.left as f32 / ref_w,
                            top: part.top as f32 / ref_h,
                            width: part.width as f32 / ref_w,
                            height: part.height as f32 / ref_h,
                        })
                        .collect(),
                })
                .collect();
        }

        if let Some(ctm) = material.ctm.as_ref().filter(|_| material.is_ctm()) {
            let (cols, rows, count) = ctm.grid();
            let (cols, rows) = (cols.max(1), rows.max(1));
            return (0..count.min(cols * rows))
                .map(|index| {
                    let (col, row) = (index % cols, index / cols);
                    TexturePublishPart {
                        kind: PartKind::Tile(ctm.tile_start + index),
                        regions: (0..frames)
                            .map(|frame| UvRegion {
                                frame,
                                left: col as f32 / cols as f32,
                                top: row as f32 / rows as f32,
                                width: 1.0 / cols as f32,
                                height: 1.0 / rows as f32,
                            })
                            .collect(),
                    }
                })
                .collect();
        }

        vec![TexturePublishPart::whole(frames)]
    }
}
