//! End-to-end publishing tests against temporary directories.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use pbrbake_spec::{
    CtmMethod, CtmProperties, MaterialPart, MaterialProperties, PackProfile, SpecError, TextureTag,
};
use pbrbake_texture::buffer::{Image, PixelFormat};
use pbrbake_texture::graph::{TextureGraphBuilder, TextureGraphContext};
use pbrbake_texture::io::{LocalInputReader, LocalOutputWriter};
use pbrbake_texture::png::{encode_to_vec_with_hash, PngConfig};
use pbrbake_texture::{BatchPublisher, PublishError};
use tempfile::{tempdir, TempDir};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn filled(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> Image {
    let bytes: Vec<u8> = (0..width * height).flat_map(|_| pixel.iter().copied()).collect();
    Image::from_bytes(width, height, format, &bytes)
}

fn write_png(root: &Path, path: &str, image: &Image) {
    let (data, _) = encode_to_vec_with_hash(image, &PngConfig::default()).unwrap();
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, data).unwrap();
}

fn read_png(root: &Path, path: &str) -> Image {
    Image::decode(&fs::read(root.join(path)).unwrap()).unwrap()
}

fn age(root: &Path, path: &str) {
    let file = fs::File::options().write(true).open(root.join(path)).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(3600))
        .unwrap();
}

struct Pack {
    src: TempDir,
    out: TempDir,
}

impl Pack {
    fn new() -> Self {
        init_logging();
        Self {
            src: tempdir().unwrap(),
            out: tempdir().unwrap(),
        }
    }

    fn reader(&self) -> LocalInputReader {
        LocalInputReader::new(self.src.path())
    }

    fn writer(&self) -> LocalOutputWriter {
        LocalOutputWriter::new(self.out.path())
    }

    fn publish(
        &self,
        material: MaterialProperties,
        profile: PackProfile,
    ) -> Result<pbrbake_texture::PublishSummary, PublishError> {
        let (reader, writer) = (self.reader(), self.writer());
        TextureGraphBuilder::new(&reader, &writer).publish_material(material, profile)
    }
}

fn lab() -> PackProfile {
    PackProfile::new("raw", "lab-pbr-1.3")
}

// ============================================================================
// Normal Synthesis
// ============================================================================

/// Height without a normal source synthesizes a flat normal map, plus
/// occlusion and height in the packed normal texture.
#[test]
fn test_height_only_synthesizes_normal() {
    let pack = Pack::new();
    write_png(pack.src.path(), "stone/height.png", &filled(8, 8, PixelFormat::Gray, &[128]));

    let summary = pack.publish(MaterialProperties::new("stone", "stone"), lab()).unwrap();
    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.written[0].tag, TextureTag::Normal);
    assert_eq!(summary.written[0].path, Path::new("stone/stone_n.png"));
    assert_eq!(summary.written[0].hash.len(), 64);

    let normal = read_png(pack.out.path(), "stone/stone_n.png");
    assert_eq!(normal.format, PixelFormat::Rgba);
    // Flat: x = y = 0, no occlusion (stored inverted), height passes through.
    assert_eq!(normal.to_bytes()[..4], [128, 128, 255, 128]);

    let skipped: Vec<TextureTag> = summary.skipped.iter().map(|s| s.tag).collect();
    assert!(skipped.contains(&TextureTag::Color));
    assert!(skipped.contains(&TextureTag::Specular));
}

/// An explicit normal source wins over synthesis from height.
#[test]
fn test_explicit_normal_is_not_synthesized() {
    let pack = Pack::new();
    write_png(pack.src.path(), "stone/height.png", &filled(8, 8, PixelFormat::Gray, &[128]));
    write_png(
        pack.src.path(),
        "stone/normal.png",
        &filled(8, 8, PixelFormat::Rgb, &[200, 60, 255]),
    );

    pack.publish(MaterialProperties::new("stone", "stone"), lab()).unwrap();
    let normal = read_png(pack.out.path(), "stone/stone_n.png");
    assert_eq!(normal.to_bytes()[..2], [200, 60]);
}

// ============================================================================
// Skipping and Incremental Publishing
// ============================================================================

#[test]
fn test_missing_sources_skip_tags() {
    let pack = Pack::new();
    write_png(
        pack.src.path(),
        "paint/color.png",
        &filled(4, 4, PixelFormat::Rgb, &[10, 20, 30]),
    );

    let summary = pack.publish(MaterialProperties::new("paint", "paint"), lab()).unwrap();
    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.written[0].path, Path::new("paint/paint.png"));

    let color = read_png(pack.out.path(), "paint/paint.png");
    // Opacity has no source and falls back to its default of 1.
    assert_eq!(color.to_bytes()[..4], [10, 20, 30, 255]);

    let reasons: Vec<(TextureTag, &str)> = summary
        .skipped
        .iter()
        .map(|s| (s.tag, s.reason.as_str()))
        .collect();
    assert!(reasons.iter().any(|(tag, _)| *tag == TextureTag::Normal));
    assert!(reasons.contains(&(TextureTag::Specular, "no channel has a source")));
    assert!(!pack.out.path().join("paint/paint_n.png").exists());
}

#[test]
fn test_up_to_date_outputs_are_kept() {
    let pack = Pack::new();
    write_png(
        pack.src.path(),
        "paint/color.png",
        &filled(4, 4, PixelFormat::Rgb, &[10, 20, 30]),
    );
    age(pack.src.path(), "paint/color.png");
    let material = MaterialProperties::new("paint", "paint");

    let first = pack.publish(material.clone(), lab()).unwrap();
    assert_eq!(first.written.len(), 1);
    assert!(pack.out.path().join(".pbrbake/paint/paint.json").exists());

    let second = pack.publish(material.clone(), lab()).unwrap();
    assert!(second.is_unchanged());
    assert_eq!(second.up_to_date, vec![TextureTag::Color]);
    assert_eq!(second.fingerprint, first.fingerprint);

    // Forcing regenerates identical bytes.
    let (reader, writer) = (pack.reader(), pack.writer());
    let forced = TextureGraphBuilder::new(&reader, &writer)
        .with_force(true)
        .publish_material(material.clone(), lab())
        .unwrap();
    assert_eq!(forced.written.len(), 1);
    assert_eq!(forced.written[0].hash, first.written[0].hash);

    // A configuration change invalidates the outputs.
    let mut profile = lab();
    profile.sampler = pbrbake_spec::SamplerKind::Nearest;
    let changed = pack.publish(material.clone(), profile).unwrap();
    assert_eq!(changed.written.len(), 1);
    assert_ne!(changed.fingerprint, first.fingerprint);

    // A newer source invalidates them too.
    write_png(
        pack.src.path(),
        "paint/color.png",
        &filled(4, 4, PixelFormat::Rgb, &[90, 20, 30]),
    );
    let mut profile = lab();
    profile.sampler = pbrbake_spec::SamplerKind::Nearest;
    let touched = pack.publish(material, profile).unwrap();
    assert_eq!(touched.written.len(), 1);
    assert_eq!(read_png(pack.out.path(), "paint/paint.png").to_bytes()[0], 90);
}

// ============================================================================
// Fatal Errors
// ============================================================================

#[test]
fn test_unknown_encoding_is_fatal() {
    let pack = Pack::new();
    write_png(pack.src.path(), "stone/height.png", &filled(4, 4, PixelFormat::Gray, &[0]));

    let err = pack
        .publish(
            MaterialProperties::new("stone", "stone"),
            PackProfile::new("raw", "lab-pbr-9"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PublishError::Spec {
            source: SpecError::UnknownEncoding(_),
            ..
        }
    ));
    assert_eq!(fs::read_dir(pack.out.path()).unwrap().count(), 0);
}

#[test]
fn test_frame_count_mismatch() {
    let pack = Pack::new();
    write_png(pack.src.path(), "lava/color.png", &filled(8, 24, PixelFormat::Rgb, &[1, 2, 3]));
    write_png(pack.src.path(), "lava/height.png", &filled(8, 16, PixelFormat::Gray, &[0]));

    let err = pack.publish(MaterialProperties::new("lava", "lava"), lab()).unwrap_err();
    match &err {
        PublishError::FrameCountMismatch { frames, max, .. } => {
            assert_eq!((*frames, *max), (2, 3));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.is_configuration());
}

/// One broken material does not stop the others.
#[test]
fn test_batch_isolates_failures() {
    let pack = Pack::new();
    fs::create_dir_all(pack.src.path().join("broken")).unwrap();
    fs::write(pack.src.path().join("broken/height.png"), b"not a png").unwrap();
    write_png(pack.src.path(), "stone/height.png", &filled(4, 4, PixelFormat::Gray, &[64]));

    let (reader, writer) = (pack.reader(), pack.writer());
    let report = BatchPublisher::new(&reader, &writer, lab()).publish_all(&[
        MaterialProperties::new("broken", "broken"),
        MaterialProperties::new("stone", "stone"),
    ]);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].material, "broken");
    assert_eq!(report.failed[0].code, "PUBLISH_005");
    assert!(!report.failed[0].configuration);
    assert_eq!(report.published.len(), 1);
    assert_eq!(report.published[0].material, "stone");
    assert!(pack.out.path().join("stone/stone_n.png").exists());
}

// ============================================================================
// Regions
// ============================================================================

/// A compact connected texture publishes five tiles into a folder named
/// after the material.
#[test]
fn test_ctm_tiles() {
    let pack = Pack::new();
    let mut atlas = Image::new(80, 16, PixelFormat::Rgb, 0.0);
    for y in 0..16 {
        for x in 0..80 {
            atlas.set(x, y, 0, (x / 16 * 50) as f32);
        }
    }
    write_png(pack.src.path(), "glass/color.png", &atlas);

    let mut material = MaterialProperties::new("glass", "glass");
    material.ctm = Some(CtmProperties {
        method: CtmMethod::Compact,
        width: None,
        height: None,
        tile_start: 0,
    });
    let summary = pack.publish(material, lab()).unwrap();
    assert_eq!(summary.written.len(), 5);

    for tile in 0..5u32 {
        let path = format!("glass/glass/{}.png", tile);
        let image = read_png(pack.out.path(), &path);
        assert_eq!((image.width, image.height), (16, 16), "{}", path);
        assert_eq!(image.get(8, 8, 0), Some((tile * 50) as f32), "{}", path);
    }
}

#[test]
fn test_named_parts() {
    let pack = Pack::new();
    let mut sheet = Image::new(16, 8, PixelFormat::Rgb, 0.0);
    for y in 0..8 {
        for x in 0..16 {
            sheet.set(x, y, 0, if x < 8 { 10.0 } else { 240.0 });
        }
    }
    write_png(pack.src.path(), "trim/color.png", &sheet);

    let mut material = MaterialProperties::new("trim", "trim");
    material.part_reference_size = Some([16, 8]);
    material.parts = vec![
        MaterialPart {
            name: "top".to_string(),
            left: 0,
            top: 0,
            width: 8,
            height: 8,
        },
        MaterialPart {
            name: "side".to_string(),
            left: 8,
            top: 0,
            width: 8,
            height: 8,
        },
    ];
    pack.publish(material, lab()).unwrap();

    let top = read_png(pack.out.path(), "trim/top.png");
    let side = read_png(pack.out.path(), "trim/side.png");
    assert_eq!((top.width, top.height), (8, 8));
    assert_eq!(top.get(4, 4, 0), Some(10.0));
    assert_eq!(side.get(4, 4, 0), Some(240.0));
}

/// A three-frame strip animates every output; single-frame sources repeat.
#[test]
fn test_animation_frames() {
    let pack = Pack::new();
    let mut strip = Image::new(8, 24, PixelFormat::Rgb, 0.0);
    for y in 0..24 {
        for x in 0..8 {
            strip.set(x, y, 0, (y / 8 * 100) as f32);
        }
    }
    write_png(pack.src.path(), "lava/color.png", &strip);
    write_png(pack.src.path(), "lava/height.png", &filled(8, 8, PixelFormat::Gray, &[0]));

    let summary = pack.publish(MaterialProperties::new("lava", "lava"), lab()).unwrap();
    assert_eq!(summary.frame_count, 3);

    let color = read_png(pack.out.path(), "lava/lava.png");
    assert_eq!((color.width, color.height), (8, 24));
    for frame in 0..3u32 {
        assert_eq!(color.get(4, frame * 8 + 4, 0), Some((frame * 100) as f32));
    }
    let normal = read_png(pack.out.path(), "lava/lava_n.png");
    assert_eq!(normal.height, 24);
}

/// Each output is sized to the largest of its own sources, not to the
/// largest source of the material.
#[test]
fn test_each_tag_sized_to_its_sources() {
    let pack = Pack::new();
    write_png(
        pack.src.path(),
        "paint/color.png",
        &filled(4, 4, PixelFormat::Rgb, &[10, 20, 30]),
    );
    write_png(
        pack.src.path(),
        "paint/smooth.png",
        &filled(32, 32, PixelFormat::Gray, &[200]),
    );

    let summary = pack.publish(MaterialProperties::new("paint", "paint"), lab()).unwrap();
    let size_of = |tag| {
        let file = summary.written.iter().find(|f| f.tag == tag).unwrap();
        (file.width, file.height)
    };
    assert_eq!(size_of(TextureTag::Color), (4, 4));
    assert_eq!(size_of(TextureTag::Specular), (32, 32));

    let color = read_png(pack.out.path(), "paint/paint.png");
    assert_eq!((color.width, color.height), (4, 4));
    assert_eq!(color.to_bytes()[..3], [10, 20, 30]);
    let specular = read_png(pack.out.path(), "paint/paint_s.png");
    assert_eq!((specular.width, specular.height), (32, 32));
    assert_eq!(specular.to_bytes()[0], 200);
}

/// An explicit texture size resizes every frame.
#[test]
fn test_texture_size() {
    let pack = Pack::new();
    write_png(
        pack.src.path(),
        "paint/color.png",
        &filled(16, 16, PixelFormat::Rgb, &[10, 20, 30]),
    );
    let mut profile = lab();
    profile.texture_size = Some(4);
    let summary = pack.publish(MaterialProperties::new("paint", "paint"), profile).unwrap();
    assert_eq!((summary.written[0].width, summary.written[0].height), (4, 4));
    assert_eq!(read_png(pack.out.path(), "paint/paint.png").to_bytes()[..3], [10, 20, 30]);
}

// ============================================================================
// Import
// ============================================================================

/// Importing a published LabPBR pack yields raw per-material files.
#[test]
fn test_import_published_pack() {
    let pack = Pack::new();
    write_png(
        pack.src.path(),
        "stone/stone.png",
        &filled(4, 4, PixelFormat::Rgba, &[10, 20, 30, 255]),
    );
    write_png(
        pack.src.path(),
        "stone/stone_n.png",
        &filled(4, 4, PixelFormat::Rgba, &[128, 128, 255, 200]),
    );

    let (reader, writer) = (pack.reader(), pack.writer());
    let mut ctx = TextureGraphContext::for_import(
        MaterialProperties::new("stone", "stone"),
        PackProfile::new("lab-pbr-1.3", "lab-pbr-1.3"),
    )
    .unwrap();
    let summary = TextureGraphBuilder::new(&reader, &writer).publish(&mut ctx).unwrap();
    assert_eq!(summary.output_format, "raw");

    let color = read_png(pack.out.path(), "stone/color.png");
    assert_eq!(color.to_bytes()[..3], [10, 20, 30]);

    // Z is reconstructed from x and y.
    let normal = read_png(pack.out.path(), "stone/normal.png");
    assert_eq!(normal.to_bytes()[2], 255);

    let height = read_png(pack.out.path(), "stone/height.png");
    assert_eq!(height.format, PixelFormat::Gray);
    assert_eq!(height.to_bytes()[0], 200);

    let occlusion = read_png(pack.out.path(), "stone/occlusion.png");
    assert_eq!(occlusion.to_bytes()[0], 0);
}
