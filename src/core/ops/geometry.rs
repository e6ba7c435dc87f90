//! Crops, padding, flips, rotation and the trim-and-resize shifts.
//!
//! Coordinates are `x` for columns and `y` for rows.

use image::{imageops, DynamicImage, Rgba, Rgba32FImage};

use super::resize::{FastResizer, Interpolation};
use super::{empty_like, restore, working_copy, OpError};

/// The `width` x `height` region at `(x, y)`.
///
/// The region must lie inside the image. Anything reaching past an edge
/// yields an empty image, which the layer loops drop.
pub fn crop(image: &DynamicImage, x: u32, y: u32, width: u32, height: u32) -> DynamicImage {
    let fits_x = u64::from(x) + u64::from(width) <= u64::from(image.width());
    let fits_y = u64::from(y) + u64::from(height) <= u64::from(image.height());

    if !fits_x || !fits_y || width == 0 || height == 0 {
        return empty_like(image);
    }

    image.crop_imm(x, y, width, height)
}

/// Constant-color border around `image`.
///
/// Fails when the padded size no longer fits `u32` dimensions or a buffer.
pub fn pad(
    image: &DynamicImage,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    color: [u8; 3],
) -> Result<DynamicImage, OpError> {
    let wide = u64::from(image.width()) + u64::from(left) + u64::from(right);
    let tall = u64::from(image.height()) + u64::from(top) + u64::from(bottom);
    let too_large = || OpError::TooLarge {
        width: wide,
        height: tall,
    };

    let width = u32::try_from(wide).map_err(|_| too_large())?;
    let height = u32::try_from(tall).map_err(|_| too_large())?;
    wide.checked_mul(tall)
        .and_then(|pixels| pixels.checked_mul(4))
        .and_then(|samples| usize::try_from(samples).ok())
        .ok_or_else(too_large)?;

    let fill = Rgba([
        f32::from(color[0]) / 255.0,
        f32::from(color[1]) / 255.0,
        f32::from(color[2]) / 255.0,
        1.0,
    ]);
    let mut canvas = Rgba32FImage::from_pixel(width, height, fill);
    imageops::replace(&mut canvas, &working_copy(image), i64::from(left), i64::from(top));

    Ok(restore(image.color(), canvas))
}

/// Mirror left to right
pub fn flip_horizontal(image: &DynamicImage) -> DynamicImage {
    image.fliph()
}

/// Mirror top to bottom
pub fn flip_vertical(image: &DynamicImage) -> DynamicImage {
    image.flipv()
}

/// Rotate by `angle` degrees (counter-clockwise) about the image center.
///
/// The canvas keeps its size; corners that fall outside the rotated content
/// are black. Sampling is bilinear.
pub fn rotate(image: &DynamicImage, angle: f64) -> DynamicImage {
    if angle == 0.0 {
        return image.clone();
    }

    let source = working_copy(image);
    let (width, height) = source.dimensions();
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let (sin, cos) = angle.to_radians().sin_cos();

    let rotated = Rgba32FImage::from_fn(width, height, |x, y| {
        let dx = f64::from(x) - cx;
        let dy = f64::from(y) - cy;
        let sx = cos * dx - sin * dy + cx;
        let sy = sin * dx + cos * dy + cy;
        sample_bilinear(&source, sx, sy)
    });

    restore(image.color(), rotated)
}

fn sample_bilinear(source: &Rgba32FImage, x: f64, y: f64) -> Rgba<f32> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;

    let pixel_at = |px: f64, py: f64| -> [f32; 4] {
        if px < 0.0 || py < 0.0 || px >= f64::from(source.width()) || py >= f64::from(source.height()) {
            [0.0; 4]
        } else {
            source.get_pixel(px as u32, py as u32).0
        }
    };

    let p00 = pixel_at(x0, y0);
    let p10 = pixel_at(x0 + 1.0, y0);
    let p01 = pixel_at(x0, y0 + 1.0);
    let p11 = pixel_at(x0 + 1.0, y0 + 1.0);

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    Rgba(out)
}

/// Crop a `zoom` fraction of the image at `(x, y)` and scale it back up.
///
/// Returns an empty image when the window has no area.
pub fn zoom(
    resizer: &mut FastResizer,
    image: &DynamicImage,
    x: u32,
    y: u32,
    window: (u32, u32),
) -> Result<DynamicImage, OpError> {
    let cropped = crop(image, x, y, window.0, window.1);
    if cropped.width() == 0 || cropped.height() == 0 {
        return Ok(cropped);
    }
    resizer.resize(&cropped, image.width(), image.height(), Interpolation::Cubic)
}

/// Size of a zoom window covering `fraction` of each side
pub fn zoom_window(image: &DynamicImage, fraction: f64) -> (u32, u32) {
    (
        (fraction * f64::from(image.width())) as u32,
        (fraction * f64::from(image.height())) as u32,
    )
}

/// Shift content horizontally by `ratio` of the width.
///
/// A positive ratio trims the right edge, a negative one the left edge;
/// the remainder is stretched back to the original width.
pub fn shift_horizontal(
    resizer: &mut FastResizer,
    image: &DynamicImage,
    ratio: f64,
) -> Result<DynamicImage, OpError> {
    let (start, keep) = trimmed_span(image.width(), ratio);
    let trimmed = crop(image, start, 0, keep, image.height());
    stretch_back(resizer, image, trimmed)
}

/// Shift content vertically by `ratio` of the height.
pub fn shift_vertical(
    resizer: &mut FastResizer,
    image: &DynamicImage,
    ratio: f64,
) -> Result<DynamicImage, OpError> {
    let (start, keep) = trimmed_span(image.height(), ratio);
    let trimmed = crop(image, 0, start, image.width(), keep);
    stretch_back(resizer, image, trimmed)
}

/// `(first kept index, kept length)` along one axis of length `len`
fn trimmed_span(len: u32, ratio: f64) -> (u32, u32) {
    let to_shift = f64::from(len) * ratio;
    if ratio > 0.0 {
        (0, (f64::from(len) - to_shift).max(0.0) as u32)
    } else if ratio < 0.0 {
        let start = ((-to_shift) as u32).min(len);
        (start, len - start)
    } else {
        (0, len)
    }
}

fn stretch_back(
    resizer: &mut FastResizer,
    original: &DynamicImage,
    trimmed: DynamicImage,
) -> Result<DynamicImage, OpError> {
    if trimmed.width() == 0 || trimmed.height() == 0 {
        return Ok(trimmed);
    }
    resizer.resize(&trimmed, original.width(), original.height(), Interpolation::Cubic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ops::test_support::{gradient, solid};
    use image::{GenericImageView, Rgb};

    #[test]
    fn crop_inside_bounds() {
        let image = gradient(10, 8);
        let cropped = crop(&image, 2, 3, 4, 5);

        assert_eq!((cropped.width(), cropped.height()), (4, 5));
        assert_eq!(cropped.get_pixel(0, 0), image.get_pixel(2, 3));
    }

    #[test]
    fn crop_past_the_edge_is_empty() {
        let image = gradient(10, 8);

        assert_eq!(crop(&image, 8, 0, 4, 4).width(), 0);
        assert_eq!(crop(&image, 0, 6, 4, 4).height(), 0);
        assert_eq!(crop(&image, 50, 50, 1, 1).width(), 0);
    }

    #[test]
    fn pad_adds_colored_border() {
        let image = solid(4, 4, [0, 0, 0]);
        let padded = pad(&image, 1, 2, 3, 4, [255, 0, 0]).unwrap();

        assert_eq!((padded.width(), padded.height()), (11, 7));
        let rgb = padded.to_rgb8();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*rgb.get_pixel(3, 1), Rgb([0, 0, 0]));
        assert_eq!(*rgb.get_pixel(10, 6), Rgb([255, 0, 0]));
    }

    #[test]
    fn pad_past_u32_dimensions_is_an_error() {
        let image = solid(4, 4, [0, 0, 0]);

        let result = pad(&image, 0, 0, u32::MAX, 1, [0, 0, 0]);
        assert!(matches!(result, Err(OpError::TooLarge { height: 4, .. })));

        let result = pad(&image, u32::MAX - 2, 0, 0, 0, [0, 0, 0]);
        assert!(matches!(result, Err(OpError::TooLarge { width: 4, .. })));
    }

    #[test]
    fn flips_mirror_pixels() {
        let image = gradient(5, 3);

        assert_eq!(flip_horizontal(&image).get_pixel(0, 0), image.get_pixel(4, 0));
        assert_eq!(flip_vertical(&image).get_pixel(0, 0), image.get_pixel(0, 2));
    }

    #[test]
    fn rotate_keeps_canvas_size() {
        let image = gradient(20, 10);
        let rotated = rotate(&image, 30.0);

        assert_eq!((rotated.width(), rotated.height()), (20, 10));
        assert_eq!(rotated.color(), image.color());
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let image = gradient(7, 7);
        assert_eq!(rotate(&image, 0.0).as_bytes(), image.as_bytes());
    }

    #[test]
    fn rotate_fills_corners_with_black() {
        let image = solid(20, 20, [255, 255, 255]);
        let rotated = rotate(&image, 45.0).to_rgb8();

        assert_eq!(*rotated.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*rotated.get_pixel(10, 10), Rgb([255, 255, 255]));
    }

    #[test]
    fn zoom_restores_original_size() {
        let mut resizer = FastResizer::new();
        let image = gradient(40, 20);
        let window = zoom_window(&image, 0.5);

        assert_eq!(window, (20, 10));
        let zoomed = zoom(&mut resizer, &image, 5, 5, window).unwrap();
        assert_eq!((zoomed.width(), zoomed.height()), (40, 20));
    }

    #[test]
    fn zero_zoom_is_empty() {
        let mut resizer = FastResizer::new();
        let image = gradient(40, 20);
        let zoomed = zoom(&mut resizer, &image, 0, 0, zoom_window(&image, 0.0)).unwrap();
        assert_eq!(zoomed.width(), 0);
    }

    #[test]
    fn trimmed_span_follows_sign_of_ratio() {
        assert_eq!(trimmed_span(100, 0.25), (0, 75));
        assert_eq!(trimmed_span(100, -0.25), (25, 75));
        assert_eq!(trimmed_span(100, 0.0), (0, 100));
        assert_eq!(trimmed_span(100, 1.0), (0, 0));
    }

    #[test]
    fn shifts_restore_original_size() {
        let mut resizer = FastResizer::new();
        let image = gradient(30, 20);

        let shifted = shift_horizontal(&mut resizer, &image, 0.3).unwrap();
        assert_eq!((shifted.width(), shifted.height()), (30, 20));

        let shifted = shift_vertical(&mut resizer, &image, -0.3).unwrap();
        assert_eq!((shifted.width(), shifted.height()), (30, 20));
    }

    #[test]
    fn full_shift_is_empty() {
        let mut resizer = FastResizer::new();
        let image = gradient(30, 20);
        assert_eq!(shift_vertical(&mut resizer, &image, 1.0).unwrap().height(), 0);
    }
}
