//! Camera frame types.
//!
//! A [`Frame`] is a single-plane luminance buffer as delivered by the camera
//! collaborator: `width * height` bytes in row-major order, tagged with a
//! monotonic arrival timestamp. Frames are validated once at the boundary
//! where raw sensor bytes enter the pipeline; everything downstream can rely
//! on the byte-count invariant holding.

use std::time::Instant;

use thiserror::Error;

/// Error types for frame construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer length does not match the claimed dimensions, or a
    /// dimension is zero.
    #[error("invalid frame geometry: {len} bytes for {width}x{height}")]
    InvalidFrameGeometry {
        /// Claimed width in pixels.
        width: u32,
        /// Claimed height in pixels.
        height: u32,
        /// Actual buffer length in bytes.
        len: usize,
    },
}

/// A raw luminance frame from the camera, in sensor orientation.
///
/// Immutable after construction. Consumed exactly once by the rotation
/// transform; never retained past the decode attempt it feeds.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
    captured_at: Instant,
}

impl Frame {
    /// Wrap a raw luminance buffer, validating its geometry.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidFrameGeometry`] if either dimension is
    /// zero or `luma.len() != width * height`.
    pub fn new(width: u32, height: u32, luma: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 || luma.len() != (width as usize) * (height as usize) {
            return Err(FrameError::InvalidFrameGeometry {
                width,
                height,
                len: luma.len(),
            });
        }
        Ok(Self {
            width,
            height,
            luma,
            captured_at: Instant::now(),
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major luminance samples, one byte per pixel.
    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Monotonic timestamp taken when the frame entered the pipeline.
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

/// A frame after the quarter-turn transform: dimensions swapped relative to
/// the source, same byte count.
///
/// Owned exclusively by the decode attempt that created it.
#[derive(Debug)]
pub struct RotatedFrame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl RotatedFrame {
    pub(crate) fn new(width: u32, height: u32, luma: Vec<u8>) -> Self {
        debug_assert_eq!(
            luma.len(),
            (width as usize) * (height as usize),
            "rotated buffer size mismatch"
        );
        Self {
            width,
            height,
            luma,
        }
    }

    /// Width in pixels (the source frame's height).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (the source frame's width).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major luminance samples.
    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Consume the frame, returning its buffer.
    pub fn into_luma(self) -> Vec<u8> {
        self.luma
    }
}
