//! Luminance sources: the grayscale view an engine decodes from.
//!
//! A [`LuminanceSource`] can be built from a single-plane luma buffer (the
//! live camera path) or from interleaved RGB samples (the still-image path).
//! RGB conversion uses ITU-R BT.709 coefficients.

/// ITU-R BT.709 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.2126;

/// ITU-R BT.709 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.7152;

/// ITU-R BT.709 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.0722;

/// Calculate luminance from u8 RGB values (0 to 255).
#[inline]
pub fn luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    let lum = LUMINANCE_R * r as f32 + LUMINANCE_G * g as f32 + LUMINANCE_B * b as f32;
    lum.clamp(0.0, 255.0).round() as u8
}

/// A grayscale pixel-intensity view of an image, consumed by the decode
/// engine.
#[derive(Debug, Clone)]
pub struct LuminanceSource {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl LuminanceSource {
    /// Build a source from a single-plane luminance buffer.
    ///
    /// Returns `None` when the geometry is unusable (zero dimension or
    /// byte-count mismatch); callers treat that as a failed attempt without
    /// invoking the engine.
    pub fn from_luma(luma: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || luma.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            luma,
        })
    }

    /// Build a source from interleaved RGB samples (3 bytes per pixel).
    ///
    /// Returns `None` when the geometry is unusable.
    pub fn from_rgb(pixels: &[u8], width: u32, height: u32) -> Option<Self> {
        let count = (width as usize) * (height as usize);
        if width == 0 || height == 0 || pixels.len() != count * 3 {
            return None;
        }
        let luma = pixels
            .chunks_exact(3)
            .map(|px| luminance_u8(px[0], px[1], px[2]))
            .collect();
        Some(Self {
            width,
            height,
            luma,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major luminance samples.
    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Sample at `(x, y)`. Out-of-range coordinates read as black.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        if x >= self.width as usize || y >= self.height as usize {
            return 0;
        }
        self.luma[y * self.width as usize + x]
    }

    /// Render a half-resolution grayscale preview of this source.
    ///
    /// Used to show the user what was decoded. Every second sample is taken
    /// in each direction; dimensions of 1 stay at 1 rather than collapsing
    /// to zero.
    pub fn render_preview(&self) -> PreviewImage {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut luma = Vec::with_capacity((width * height) as usize);
        for y in 0..height as usize {
            for x in 0..width as usize {
                luma.push(self.sample(x * 2, y * 2));
            }
        }
        PreviewImage {
            width,
            height,
            luma,
            scale_factor: width as f32 / self.width as f32,
        }
    }
}

/// A downscaled grayscale preview of a decoded source.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    /// Preview width in pixels.
    pub width: u32,
    /// Preview height in pixels.
    pub height: u32,
    /// Row-major luminance samples.
    pub luma: Vec<u8>,
    /// Ratio of preview width to source width, in (0, 1].
    pub scale_factor: f32,
}
