//! # Ops Module
//!
//! Pixel operations behind the built-in layers.
//!
//! Resizing goes through `fast_image_resize`, flips and crops through the
//! `image` crate. Everything else (rotation, padding, color adjustments,
//! blur kernels) runs on a normalized RGBA `f32` working copy and is then
//! converted back to the color type of the input.
//!
//! All operations here are deterministic. Random draws belong to the layers.

pub mod color;
pub mod filter;
pub mod geometry;
pub mod resize;

pub use resize::{FastResizer, Interpolation};

use image::{ColorType, DynamicImage, Rgba32FImage};
use thiserror::Error;

/// Failures of a pixel operation
#[derive(Error, Debug)]
pub enum OpError {
    #[error("Resize to {width}x{height} failed: {reason}")]
    Resize {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("A {width}x{height} result exceeds the addressable image size")]
    TooLarge { width: u64, height: u64 },

    #[error("A {size}x{size} window exceeds the available memory")]
    WindowTooLarge { size: u32 },

    #[error("Unsupported pixel layout: {0:?}")]
    UnsupportedColor(ColorType),
}

/// Normalized RGBA copy of `image`: 8 and 16 bit samples map to `[0, 1]`
pub(crate) fn working_copy(image: &DynamicImage) -> Rgba32FImage {
    image.to_rgba32f()
}

/// Convert a working copy back to `color`.
pub(crate) fn restore(color: ColorType, buffer: Rgba32FImage) -> DynamicImage {
    let image = DynamicImage::ImageRgba32F(buffer);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        _ => image,
    }
}

/// A zero-area image of the same color type, the marker for "drop me"
pub(crate) fn empty_like(image: &DynamicImage) -> DynamicImage {
    DynamicImage::new(0, 0, image.color())
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{DynamicImage, ImageBuffer, Rgb};

    /// Gradient test image, distinct in every pixel of a small image
    pub fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) * 128 / (width + height).max(1)) as u8;
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(img)
    }

    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::gradient;
    use super::*;

    #[test]
    fn working_copy_round_trips_rgb8() {
        let image = gradient(16, 9);
        let restored = restore(image.color(), working_copy(&image));

        assert_eq!(restored.color(), ColorType::Rgb8);
        assert_eq!(restored.as_bytes(), image.as_bytes());
    }

    #[test]
    fn working_copy_round_trips_luma8() {
        let image = DynamicImage::ImageLuma8(gradient(8, 8).to_luma8());
        let restored = restore(image.color(), working_copy(&image));

        assert_eq!(restored.color(), ColorType::L8);
        let drift = restored
            .as_bytes()
            .iter()
            .zip(image.as_bytes())
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0);
        assert!(drift <= 1);
    }

    #[test]
    fn empty_like_keeps_color_type() {
        let empty = empty_like(&gradient(4, 4));
        assert_eq!(empty.width(), 0);
        assert_eq!(empty.color(), ColorType::Rgb8);
    }
}
