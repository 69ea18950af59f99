//! Still-image decoding: one picked photo, one decode attempt.
//!
//! Unlike the live path, a picked image can be arbitrarily large, so the
//! pipeline bounds it before decoding:
//!
//! 1. Probe the intrinsic dimensions from the file header without
//!    materializing pixels.
//! 2. Pick an integer sample factor against a 480×800 portrait budget.
//! 3. Decode, correct EXIF orientation, and subsample by that factor.
//! 4. Build an RGB-derived luminance source and run a single decode with an
//!    explicit UTF-8 character-set hint (a picked file carries no camera
//!    hint context).
//!
//! This path runs on demand, independent of live scanning, and must use its
//! own engine instance: the worker's engine is owned by the worker thread
//! and the two paths can run concurrently.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::{DecodeEngine, DecodeHints, DecodedSymbol, EngineError, LuminanceSource};

/// Width budget for the downsampled image, in pixels.
pub const TARGET_WIDTH: u32 = 480;

/// Height budget for the downsampled image, in pixels.
pub const TARGET_HEIGHT: u32 = 800;

/// Error types for the still-image path.
///
/// The plain [`decode_still`] contract collapses all of these to `None`;
/// [`decode_still_detailed`] preserves them for callers that need to tell
/// an unreadable file from an image with no symbol in it.
#[derive(Debug, Error)]
pub enum StillDecodeError {
    /// The file could not be read or is not a decodable image.
    #[error("failed to read image: {0}")]
    Unreadable(String),

    /// The image decoded to a zero-area pixel grid.
    #[error("image has degenerate dimensions {width}x{height}")]
    DegenerateImage {
        /// Reported width in pixels.
        width: u32,
        /// Reported height in pixels.
        height: u32,
    },

    /// The image was readable but contained no recognizable symbol.
    #[error("no symbol found in image")]
    NoSymbol,

    /// The engine failed unexpectedly.
    #[error("decode engine fault: {0}")]
    EngineFault(String),
}

/// EXIF orientation values (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90Cw = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270Cw = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90Cw,
            7 => Orientation::Transverse,
            _ => Orientation::Normal,
        }
    }
}

/// Select the integer sample factor for an image of the given intrinsic
/// size against the 480×800 portrait budget.
///
/// Landscape images wider than the width budget divide by it; portrait
/// images taller than the height budget divide by that. Anything that fits
/// (including exactly-square images) keeps factor 1. The result is always
/// at least 1.
pub fn select_sample_factor(width: u32, height: u32) -> u32 {
    let factor = if width > height && width > TARGET_WIDTH {
        width / TARGET_WIDTH
    } else if width < height && height > TARGET_HEIGHT {
        height / TARGET_HEIGHT
    } else {
        1
    };
    factor.max(1)
}

/// Decode one symbol from an image file.
///
/// Every failure mode (unreadable file, degenerate image, no symbol)
/// collapses to `None`, matching the caller-facing contract of the live
/// pipeline's album action. Use [`decode_still_detailed`] to distinguish
/// them.
pub fn decode_still(path: impl AsRef<Path>, engine: &mut dyn DecodeEngine) -> Option<DecodedSymbol> {
    decode_still_detailed(path, engine).ok()
}

/// Decode one symbol from an image file, preserving the failure cause.
///
/// # Errors
///
/// See [`StillDecodeError`].
pub fn decode_still_detailed(
    path: impl AsRef<Path>,
    engine: &mut dyn DecodeEngine,
) -> Result<DecodedSymbol, StillDecodeError> {
    let bytes =
        fs::read(path.as_ref()).map_err(|e| StillDecodeError::Unreadable(e.to_string()))?;
    decode_still_bytes(&bytes, engine)
}

/// Decode one symbol from in-memory image file bytes.
///
/// # Errors
///
/// See [`StillDecodeError`].
pub fn decode_still_bytes(
    bytes: &[u8],
    engine: &mut dyn DecodeEngine,
) -> Result<DecodedSymbol, StillDecodeError> {
    // Bounds probe: dimensions only, no pixel data.
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StillDecodeError::Unreadable(e.to_string()))?
        .into_dimensions()
        .map_err(|e| StillDecodeError::Unreadable(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(StillDecodeError::DegenerateImage { width, height });
    }

    let factor = select_sample_factor(width, height);
    debug!(width, height, factor, "decoding still image");

    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StillDecodeError::Unreadable(e.to_string()))?
        .decode()
        .map_err(|e| StillDecodeError::Unreadable(e.to_string()))?;
    let oriented = apply_orientation(decoded, extract_orientation(bytes));
    let rgb = oriented.into_rgb8();

    let (sub_width, sub_height, pixels) = subsample_rgb(&rgb, factor);
    let source = LuminanceSource::from_rgb(&pixels, sub_width, sub_height).ok_or(
        StillDecodeError::DegenerateImage {
            width: sub_width,
            height: sub_height,
        },
    )?;

    let result = engine.decode(&source, &DecodeHints::utf8());
    // Same discipline as the live path: the engine is reset after every
    // attempt, whatever the result.
    engine.reset();

    match result {
        Ok(symbol) => Ok(symbol),
        Err(EngineError::SymbolNotFound) => Err(StillDecodeError::NoSymbol),
        Err(EngineError::Fault(reason)) => {
            warn!(%reason, "engine fault while decoding still image");
            Err(StillDecodeError::EngineFault(reason))
        }
    }
}

/// Extract EXIF orientation from image file bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90Cw => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270Cw => img.rotate270(),
    }
}

/// Take every `factor`-th pixel in each direction.
///
/// Output dimensions are the integer quotients, floored, never below 1.
fn subsample_rgb(image: &RgbImage, factor: u32) -> (u32, u32, Vec<u8>) {
    if factor <= 1 {
        return (image.width(), image.height(), image.as_raw().clone());
    }

    let width = (image.width() / factor).max(1);
    let height = (image.height() / factor).max(1);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let px = image.get_pixel(x * factor, y * factor);
            pixels.extend_from_slice(&px.0);
        }
    }
    (width, height, pixels)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
