//! Frame preprocessing.
//!
//! Raw color frames are reduced to a canonical comparable form before
//! scoring: grayscale, a 25% crop off each side (surveillance footage keeps
//! its interesting content in the center band), and binarization against the
//! median pixel value. The canonical form is only ever compared, never
//! persisted.

use image::{DynamicImage, GrayImage, imageops};

/// Fraction of the frame width cropped away on each side.
pub const SIDE_CROP_RATIO: f64 = 0.25;

/// Reduce a raw color frame to its canonical binary form.
///
/// Steps, in order: grayscale conversion, cropping `floor(width * 0.25)`
/// columns off the left and right edges (full height kept), and
/// binarization: pixels at or above the cropped region's median become 255,
/// the rest become 0.
///
/// Deterministic and stateless. A fully uniform frame binarizes to an
/// all-white frame (every pixel is ≥ the median); that is a valid canonical
/// frame, not an error.
pub fn canonical_frame(frame: &DynamicImage) -> GrayImage {
    let gray = frame.to_luma8();
    let (width, height) = gray.dimensions();

    let crop_width = (width as f64 * SIDE_CROP_RATIO) as u32;
    let mut cropped =
        imageops::crop_imm(&gray, crop_width, 0, width - 2 * crop_width, height).to_image();

    let threshold = median(&cropped);
    for pixel in cropped.pixels_mut() {
        pixel.0[0] = if pixel.0[0] >= threshold { 255 } else { 0 };
    }

    cropped
}

/// Median pixel value of a grayscale image, by histogram rank.
///
/// For even pixel counts this selects the upper middle element, so the
/// result is always an actual pixel value.
pub(crate) fn median(image: &GrayImage) -> u8 {
    let mut histogram = [0_u64; 256];
    for pixel in image.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total: u64 = image.pixels().len() as u64;
    if total == 0 {
        return 0;
    }

    let rank = total / 2;
    let mut seen = 0_u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > rank {
            return value as u8;
        }
    }

    255
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn solid_frame(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
    }

    #[test]
    fn canonical_frame_crops_both_sides() {
        let frame = solid_frame(64, 48, 120);
        let canonical = canonical_frame(&frame);
        // 25% of 64 is 16, cropped from each side.
        assert_eq!(canonical.dimensions(), (32, 48));
    }

    #[test]
    fn canonical_frame_is_binary() {
        let mut raw = RgbImage::new(40, 20);
        for (x, y, pixel) in raw.enumerate_pixels_mut() {
            let value = ((x * 7 + y * 13) % 256) as u8;
            *pixel = Rgb([value, value, value]);
        }
        let canonical = canonical_frame(&DynamicImage::ImageRgb8(raw));
        assert!(
            canonical
                .pixels()
                .all(|p| p.0[0] == 0 || p.0[0] == 255)
        );
    }

    #[test]
    fn uniform_frame_binarizes_to_white() {
        let canonical = canonical_frame(&solid_frame(16, 16, 90));
        assert!(canonical.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn crop_width_rounds_down() {
        // 25% of 10 is 2.5, floored to 2 per side: 10 - 4 = 6.
        let canonical = canonical_frame(&solid_frame(10, 5, 0));
        assert_eq!(canonical.dimensions(), (6, 5));
    }

    #[test]
    fn median_of_known_values() {
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(0, 0, Luma([10]));
        image.put_pixel(1, 0, Luma([50]));
        image.put_pixel(2, 0, Luma([200]));
        assert_eq!(median(&image), 50);
    }

    #[test]
    fn median_even_count_takes_upper_middle() {
        let mut image = GrayImage::new(4, 1);
        image.put_pixel(0, 0, Luma([10]));
        image.put_pixel(1, 0, Luma([20]));
        image.put_pixel(2, 0, Luma([30]));
        image.put_pixel(3, 0, Luma([40]));
        assert_eq!(median(&image), 30);
    }
}
