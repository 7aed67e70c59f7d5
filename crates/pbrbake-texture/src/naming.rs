//! File naming conventions.
//!
//! Local naming keeps each material in its own folder with files named after
//! the texture tag (`stone/normal.png`). Global naming puts files next to each
//! other with the material name and a suffix (`stone_n.png`), which is the
//! layout a published pack uses.

use std::path::{Path, PathBuf};

use pbrbake_spec::{MaterialProperties, TextureTag};

use crate::region::PartKind;

/// Extension of every image file read or written.
pub const IMAGE_EXTENSION: &str = "png";

/// Maps semantic tags to file paths, hiding directory-layout conventions.
pub trait NamingResolver: Send + Sync {
    /// File stem for a tag.
    fn name_fragment(&self, material: &str, tag: TextureTag, global: bool) -> String;

    /// Expected source file of a tag.
    fn input_path(&self, material: &MaterialProperties, tag: TextureTag, global: bool) -> PathBuf;

    /// Source file named explicitly by a material document.
    fn explicit_path(&self, material: &MaterialProperties, file: &str) -> PathBuf;

    /// Published file of one part of a tag.
    fn output_path(
        &self,
        material: &MaterialProperties,
        tag: TextureTag,
        part: &PartKind,
        global: bool,
    ) -> PathBuf;
}

/// Global-name suffix of a tag.
pub fn tag_suffix(tag: TextureTag) -> String {
    match tag {
        TextureTag::Color => String::new(),
        TextureTag::Normal => "_n".to_string(),
        TextureTag::Specular => "_s".to_string(),
        other => format!("_{}", other.as_str()),
    }
}

fn material_dir(material: &MaterialProperties) -> &Path {
    material.local_path.as_deref().unwrap_or_else(|| Path::new(""))
}

fn image_file(stem: &str) -> String {
    format!("{}.{}", stem, IMAGE_EXTENSION)
}

/// The conventions described in the module documentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNaming;

impl NamingResolver for DefaultNaming {
    fn name_fragment(&self, material: &str, tag: TextureTag, global: bool) -> String {
        if global {
            format!("{}{}", material, tag_suffix(tag))
        } else {
            tag.as_str().to_string()
        }
    }

    fn input_path(&self, material: &MaterialProperties, tag: TextureTag, global: bool) -> PathBuf {
        let stem = self.name_fragment(&material.name, tag, global);
        material_dir(material).join(image_file(&stem))
    }

    fn explicit_path(&self, material: &MaterialProperties, file: &str) -> PathBuf {
        let path = material_dir(material).join(file);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension(IMAGE_EXTENSION)
        }
    }

    fn output_path(
        &self,
        material: &MaterialProperties,
        tag: TextureTag,
        part: &PartKind,
        global: bool,
    ) -> PathBuf {
        let dir = material_dir(material);
        match part {
            PartKind::Whole => dir.join(image_file(&self.name_fragment(&material.name, tag, global))),
            PartKind::Tile(tile) => {
                let tile = tile.to_string();
                if global {
                    dir.join(&material.name)
                        .join(image_file(&format!("{}{}", tile, tag_suffix(tag))))
                } else {
                    dir.join(tile).join(image_file(tag.as_str()))
                }
            }
            PartKind::Named(name) => {
                if global {
                    dir.join(image_file(&self.name_fragment(name, tag, true)))
                } else {
                    dir.join(name).join(image_file(tag.as_str()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> MaterialProperties {
        MaterialProperties::new("stone", "blocks")
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(tag_suffix(TextureTag::Color), "");
        assert_eq!(tag_suffix(TextureTag::Normal), "_n");
        assert_eq!(tag_suffix(TextureTag::Specular), "_s");
        assert_eq!(tag_suffix(TextureTag::Occlusion), "_occlusion");
    }

    #[test]
    fn test_input_paths() {
        let naming = DefaultNaming;
        assert_eq!(
            naming.input_path(&stone(), TextureTag::Height, false),
            PathBuf::from("blocks/height.png")
        );
        assert_eq!(
            naming.input_path(&stone(), TextureTag::Normal, true),
            PathBuf::from("blocks/stone_n.png")
        );
        assert_eq!(
            naming.explicit_path(&stone(), "bump"),
            PathBuf::from("blocks/bump.png")
        );
        assert_eq!(
            naming.explicit_path(&stone(), "maps/bump.tga"),
            PathBuf::from("blocks/maps/bump.tga")
        );
    }

    #[test]
    fn test_output_paths() {
        let naming = DefaultNaming;
        let m = stone();
        assert_eq!(
            naming.output_path(&m, TextureTag::Color, &PartKind::Whole, true),
            PathBuf::from("blocks/stone.png")
        );
        assert_eq!(
            naming.output_path(&m, TextureTag::Normal, &PartKind::Tile(3), true),
            PathBuf::from("blocks/stone/3_n.png")
        );
        assert_eq!(
            naming.output_path(&m, TextureTag::Normal, &PartKind::Tile(3), false),
            PathBuf::from("blocks/3/normal.png")
        );
        let top = PartKind::Named("stone_top".to_string());
        assert_eq!(
            naming.output_path(&m, TextureTag::Specular, &top, true),
            PathBuf::from("blocks/stone_top_s.png")
        );
        assert_eq!(
            naming.output_path(&m, TextureTag::Specular, &top, false),
            PathBuf::from("blocks/stone_top/specular.png")
        );
    }
}
