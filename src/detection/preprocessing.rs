use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Sigma of a 5x5 Gaussian smoothing kernel
pub const SMOOTHING_SIGMA: f32 = 1.1;

/// Sigma of the Gaussian weighting over an 11x11 threshold neighbourhood
pub const THRESHOLD_BLOCK_SIGMA: f32 = 2.0;

/// Subtracted from the local weighted mean before comparing
pub const THRESHOLD_OFFSET: f32 = 2.0;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Binarize against a Gaussian-weighted local mean: a pixel turns white when
/// it is brighter than its neighbourhood mean minus `offset`.
pub fn adaptive_threshold(img: &GrayImage, block_sigma: f32, offset: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(img, block_sigma);
    let mut binary = GrayImage::new(img.width(), img.height());

    for (x, y, pixel) in img.enumerate_pixels() {
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - offset;
        let value = if pixel[0] as f32 > threshold { 255u8 } else { 0u8 };
        binary.put_pixel(x, y, Luma([value]));
    }

    binary
}

/// Fixed preprocessing chain run ahead of the annotator:
/// grayscale, smoothing, adaptive thresholding.
pub fn preprocess(img: &DynamicImage) -> DynamicImage {
    let gray = to_grayscale(img);
    let blurred = apply_blur(&gray, SMOOTHING_SIGMA);
    let binary = adaptive_threshold(&blurred, THRESHOLD_BLOCK_SIGMA, THRESHOLD_OFFSET);
    DynamicImage::ImageLuma8(binary)
}
