//! PNG output for published textures.
//!
//! Encoder settings are fixed per [`PngConfig`] and the `png` crate writes no
//! time chunks, so an image always encodes to the same bytes and the BLAKE3
//! hash in a publish summary only changes when pixels change.

use std::io::Write;

use png::{BitDepth, Compression, Encoder, FilterType};
use thiserror::Error;

use crate::buffer::Image;

#[derive(Debug, Error)]
pub enum PngError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoder failed: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("cannot encode {width}x{height} image with {values} values for {channels} channel(s)")]
    InvalidDimensions {
        width: u32,
        height: u32,
        channels: usize,
        values: usize,
    },
}

/// Compression and row filter used for every published file.
#[derive(Debug, Clone)]
pub struct PngConfig {
    pub compression: Compression,
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Paeth filtering at the best compression level.
    pub fn smallest() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }

    pub fn fastest() -> Self {
        Self {
            compression: Compression::Fast,
            filter: FilterType::NoFilter,
        }
    }
}

/// Encode an 8-bit image in its stored pixel format.
pub fn write_png<W: Write>(image: &Image, out: W, config: &PngConfig) -> Result<(), PngError> {
    let channels = image.format.channels();
    let values = image.data.len();
    if image.width == 0
        || image.height == 0
        || values != image.width as usize * image.height as usize * channels
    {
        return Err(PngError::InvalidDimensions {
            width: image.width,
            height: image.height,
            channels,
            values,
        });
    }

    let mut encoder = Encoder::new(out, image.width, image.height);
    encoder.set_color(image.format.png_color_type());
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);
    let mut stream = encoder.write_header()?;
    stream.write_image_data(&image.to_bytes())?;
    stream.finish()?;
    Ok(())
}

/// Hex BLAKE3 digest of encoded file contents.
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Encode into memory, returning the bytes and their hash.
pub fn encode_to_vec_with_hash(
    image: &Image,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_png(image, &mut data, config)?;
    let hash = content_hash(&data);
    Ok((data, hash))
}
