//! Pixel buffers.
//!
//! Stored textures are kept in the raw byte domain as `f32` (0.0 to 255.0) so
//! resampling can produce fractional raw values before channel decoding.
//! Semantic values (heights, occlusion, decoded channels) live in
//! [`ScalarField`]s.

use pbrbake_spec::ColorChannel;

/// Read access to texels, shared by every sampler.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Value of one channel at an in-bounds pixel.
    fn texel(&self, x: u32, y: u32, channel: ColorChannel) -> f32;
}

/// Storage layout of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PixelFormat {
    Gray,
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Number of stored channels.
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// Narrowest format that can hold every listed channel.
    ///
    /// Red and magnitude fit in grayscale, green or blue need color, and alpha
    /// needs color with alpha.
    pub fn narrowest<I: IntoIterator<Item = ColorChannel>>(channels: I) -> PixelFormat {
        channels
            .into_iter()
            .map(|c| match c {
                ColorChannel::Red | ColorChannel::Magnitude => PixelFormat::Gray,
                ColorChannel::Green | ColorChannel::Blue => PixelFormat::Rgb,
                ColorChannel::Alpha => PixelFormat::Rgba,
            })
            .max()
            .unwrap_or(PixelFormat::Gray)
    }

    /// Matching PNG color type.
    pub fn png_color_type(&self) -> png::ColorType {
        match self {
            PixelFormat::Gray => png::ColorType::Grayscale,
            PixelFormat::Rgb => png::ColorType::Rgb,
            PixelFormat::Rgba => png::ColorType::Rgba,
        }
    }
}

/// A stored texture in the raw byte domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Row-major interleaved channel values.
    pub data: Vec<f32>,
}

impl Image {
    /// Create an image filled with one raw value in every channel.
    pub fn new(width: u32, height: u32, format: PixelFormat, fill: f32) -> Self {
        let size = width as usize * height as usize * format.channels();
        Self {
            width,
            height,
            format,
            data: vec![fill; size],
        }
    }

    /// Wrap 8-bit interleaved data.
    pub fn from_bytes(width: u32, height: u32, format: PixelFormat, bytes: &[u8]) -> Self {
        Self {
            width,
            height,
            format,
            data: bytes.iter().map(|&b| b as f32).collect(),
        }
    }

    /// Decode an encoded image (PNG and friends) keeping its channel layout.
    pub fn decode(bytes: &[u8]) -> Result<Self, ::image::ImageError> {
        let decoded = ::image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(&decoded))
    }

    /// Convert a decoded image, keeping grayscale and alpha-less layouts narrow.
    pub fn from_dynamic(decoded: &::image::DynamicImage) -> Self {
        let color = decoded.color();
        let (width, height) = (decoded.width(), decoded.height());
        if color.has_color() {
            if color.has_alpha() {
                Self::from_bytes(width, height, PixelFormat::Rgba, decoded.to_rgba8().as_raw())
            } else {
                Self::from_bytes(width, height, PixelFormat::Rgb, decoded.to_rgb8().as_raw())
            }
        } else if color.has_alpha() {
            // Gray + alpha is widened so alpha stays addressable.
            Self::from_bytes(width, height, PixelFormat::Rgba, decoded.to_rgba8().as_raw())
        } else {
            Self::from_bytes(width, height, PixelFormat::Gray, decoded.to_luma8().as_raw())
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.channels()
    }

    /// Stored value of one channel, or `None` when the layout lacks it.
    pub fn get(&self, x: u32, y: u32, channel: usize) -> Option<f32> {
        let stored = self.format.channels();
        let slot = match (self.format, channel) {
            (PixelFormat::Gray, 0..=2) => 0,
            (_, c) if c < stored => c,
            _ => return None,
        };
        Some(self.data[self.index(x, y) + slot])
    }

    /// Write one stored channel; writes to channels the layout lacks are ignored.
    pub fn set(&mut self, x: u32, y: u32, channel: usize, value: f32) {
        if channel < self.format.channels() {
            let idx = self.index(x, y) + channel;
            self.data[idx] = value;
        }
    }

    /// Write a color channel; magnitude writes set red, green and blue.
    pub fn set_channel(&mut self, x: u32, y: u32, channel: ColorChannel, value: f32) {
        match channel.index() {
            Some(c) => self.set(x, y, c, value),
            None => {
                for c in 0..self.format.channels().min(3) {
                    self.set(x, y, c, value);
                }
            }
        }
    }

    /// Number of square animation frames stacked vertically.
    pub fn frame_count(&self) -> u32 {
        if self.width > 0 && self.height > self.width && self.height % self.width == 0 {
            self.height / self.width
        } else {
            1
        }
    }

    /// Height of one animation frame.
    pub fn frame_height(&self) -> u32 {
        self.height / self.frame_count()
    }

    /// Convert to 8-bit interleaved bytes, rounding and clamping.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v + 0.5).floor().clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Copy a rectangle into a new image.
    pub fn crop(&self, left: u32, top: u32, width: u32, height: u32) -> Image {
        let mut out = Image::new(width, height, self.format, 0.0);
        let stride = self.format.channels();
        for y in 0..height {
            let src = self.index(left, top + y);
            let dst = out.index(0, y);
            let len = width as usize * stride;
            out.data[dst..dst + len].copy_from_slice(&self.data[src..src + len]);
        }
        out
    }
}

impl PixelSource for Image {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn texel(&self, x: u32, y: u32, channel: ColorChannel) -> f32 {
        match channel.index() {
            Some(c) => self.get(x, y, c).unwrap_or(255.0),
            None => {
                let r = self.get(x, y, 0).unwrap_or(0.0);
                let g = self.get(x, y, 1).unwrap_or(0.0);
                let b = self.get(x, y, 2).unwrap_or(0.0);
                ((r * r + g * g + b * b) / 3.0).sqrt()
            }
        }
    }
}

/// Single-channel `f32` field.
///
/// `NaN` marks pixels where a decoded channel has no value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ScalarField {
    pub fn new(width: u32, height: u32, fill: f32) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width as usize * height as usize],
        }
    }

    /// A field where every pixel is absent.
    pub fn absent(width: u32, height: u32) -> Self {
        Self::new(width, height, f32::NAN)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = value;
    }

    /// Value as an option, `None` when absent.
    #[inline]
    pub fn value(&self, x: u32, y: u32) -> Option<f32> {
        let v = self.get(x, y);
        (!v.is_nan()).then_some(v)
    }

    /// Copy a horizontal band of rows.
    pub fn rows(&self, top: u32, height: u32) -> ScalarField {
        let start = top as usize * self.width as usize;
        let end = start + height as usize * self.width as usize;
        ScalarField {
            width: self.width,
            height,
            data: self.data[start..end].to_vec(),
        }
    }

    /// Overwrite a horizontal band of rows.
    pub fn put_rows(&mut self, top: u32, band: &ScalarField) {
        let start = top as usize * self.width as usize;
        self.data[start..start + band.data.len()].copy_from_slice(&band.data);
    }
}

impl PixelSource for ScalarField {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn texel(&self, x: u32, y: u32, _channel: ColorChannel) -> f32 {
        self.get(x, y)
    }
}
