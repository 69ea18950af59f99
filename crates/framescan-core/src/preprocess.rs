//! Frame preprocessing: sensor orientation to display orientation.
//!
//! Camera sensors deliver landscape-oriented luminance buffers while the
//! scanning surface is portrait, so every frame gets a single 90° rotation
//! before decoding.
//!
//! # Algorithm
//!
//! The rotation is a transpose combined with a row reversal, done in one
//! pass with no intermediate 2D structure. For every source coordinate
//! `(x, y)`:
//!
//! ```text
//! out[x * height + (height - y - 1)] = src[y * width + x]
//! ```
//!
//! The output buffer has the same byte count as the input with width and
//! height swapped. The transform is bit-exact and a bijection: applying it
//! four times yields the original buffer.

use crate::frame::{Frame, RotatedFrame};

/// Rotate a luminance frame a quarter turn.
///
/// Consumes the frame and allocates one new buffer of the same size; the
/// input buffer is never aliased. Geometry is guaranteed valid by
/// [`Frame::new`], so the transform itself cannot fail.
pub fn rotate(frame: Frame) -> RotatedFrame {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let src = frame.luma();

    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let dst_col = height - y - 1;
        for (x, &sample) in row.iter().enumerate() {
            out[x * height + dst_col] = sample;
        }
    }

    RotatedFrame::new(frame.height(), frame.width(), out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, luma: Vec<u8>) -> Frame {
        Frame::new(width, height, luma).unwrap()
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let rotated = rotate(frame(4, 3, vec![0u8; 12]));
        assert_eq!(rotated.width(), 3);
        assert_eq!(rotated.height(), 4);
        assert_eq!(rotated.luma().len(), 12);
    }

    #[test]
    fn test_rotate_2x3_hand_checked() {
        // Source (width 2, height 3):
        //   1 2
        //   3 4
        //   5 6
        // A quarter turn moves the bottom-left sample to the top-left:
        //   5 3 1
        //   6 4 2
        let rotated = rotate(frame(2, 3, vec![1, 2, 3, 4, 5, 6]));
        assert_eq!(rotated.width(), 3);
        assert_eq!(rotated.height(), 2);
        assert_eq!(rotated.luma(), &[5, 3, 1, 6, 4, 2]);
    }

    #[test]
    fn test_rotate_single_pixel() {
        let rotated = rotate(frame(1, 1, vec![128]));
        assert_eq!(rotated.luma(), &[128]);
    }

    #[test]
    fn test_rotate_single_row() {
        // A 1-pixel-tall row becomes a 1-pixel-wide column, order preserved.
        let rotated = rotate(frame(4, 1, vec![10, 20, 30, 40]));
        assert_eq!(rotated.width(), 1);
        assert_eq!(rotated.height(), 4);
        assert_eq!(rotated.luma(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_rotate_single_column() {
        // A 1-pixel-wide column becomes a reversed row.
        let rotated = rotate(frame(1, 4, vec![10, 20, 30, 40]));
        assert_eq!(rotated.width(), 4);
        assert_eq!(rotated.height(), 1);
        assert_eq!(rotated.luma(), &[40, 30, 20, 10]);
    }

    #[test]
    fn test_rotate_index_formula() {
        // Every source sample must land exactly where the documented
        // formula says it does.
        let width = 5u32;
        let height = 4u32;
        let luma: Vec<u8> = (0..width * height).map(|v| v as u8).collect();
        let rotated = rotate(frame(width, height, luma.clone()));

        for y in 0..height as usize {
            for x in 0..width as usize {
                let src = luma[y * width as usize + x];
                let dst = rotated.luma()[x * height as usize + (height as usize - y - 1)];
                assert_eq!(src, dst, "sample ({}, {}) misplaced", x, y);
            }
        }
    }

    #[test]
    fn test_four_rotations_restore_original() {
        let width = 6u32;
        let height = 4u32;
        let luma: Vec<u8> = (0..width * height).map(|v| (v * 7 % 256) as u8).collect();

        let mut current = frame(width, height, luma.clone());
        for _ in 0..4 {
            let rotated = rotate(current);
            current = Frame::new(rotated.width(), rotated.height(), rotated.into_luma()).unwrap();
        }

        assert_eq!(current.width(), width);
        assert_eq!(current.height(), height);
        assert_eq!(current.luma(), luma.as_slice());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
