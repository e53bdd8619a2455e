//! Change scoring between canonical frames.
//!
//! The change score is the Mean Squared Error between two preprocessed
//! frames: the per-pixel squared difference averaged over all pixels. One
//! score exists per consecutive frame pair, and the extraction threshold is
//! compared against it.

use image::GrayImage;

/// Mean Squared Error between two canonical frames.
///
/// Pure function, O(pixels), no retained state. Accumulates in `f64`; two
/// maximally different binary frames (all 0 vs all 255) score 255².
///
/// # Panics
///
/// The caller guarantees both frames have identical dimensions; a mismatch
/// is a programming error, not a recoverable condition.
pub fn mean_squared_error(first: &GrayImage, second: &GrayImage) -> f64 {
    assert_eq!(
        first.dimensions(),
        second.dimensions(),
        "change score requires identically sized frames"
    );

    let pixel_count = (first.width() as u64 * first.height() as u64).max(1);
    let sum: f64 = first
        .as_raw()
        .iter()
        .zip(second.as_raw().iter())
        .map(|(&a, &b)| {
            let diff = a as f64 - b as f64;
            diff * diff
        })
        .sum();

    sum / pixel_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([value]))
    }

    #[test]
    fn identical_frames_score_zero() {
        let a = solid(12, 8, 77);
        let b = solid(12, 8, 77);
        assert_eq!(mean_squared_error(&a, &b), 0.0);
    }

    #[test]
    fn opposite_binary_frames_score_max() {
        let black = solid(16, 9, 0);
        let white = solid(16, 9, 255);
        assert_eq!(mean_squared_error(&black, &white), 255.0 * 255.0);
    }

    #[test]
    fn single_pixel_difference() {
        let a = solid(10, 10, 0);
        let mut b = solid(10, 10, 0);
        b.put_pixel(3, 4, image::Luma([255]));
        let expected = (255.0 * 255.0) / 100.0;
        assert!((mean_squared_error(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "identically sized")]
    fn mismatched_shapes_panic() {
        let a = solid(4, 4, 0);
        let b = solid(5, 4, 0);
        mean_squared_error(&a, &b);
    }
}
