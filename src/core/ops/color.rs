//! Color-space conversions and per-channel adjustments.

use image::{DynamicImage, Rgba};

use super::{restore, working_copy};

/// Single-channel luminance image
pub fn grayscale(image: &DynamicImage) -> DynamicImage {
    image.grayscale()
}

/// Multiply every color sample by `factor`.
///
/// The result is a float image (`Rgb32F`, or `Rgba32F` when the input has
/// alpha), since scaled samples no longer fit the integer range. Alpha is
/// left untouched. `DynamicImage` has no single-channel float layout, so
/// gray input comes out as three equal channels.
pub fn rescale(image: &DynamicImage, factor: f64) -> DynamicImage {
    let factor = (f64::from(sample_range(image)) * factor) as f32;

    if image.color().has_alpha() {
        let mut buffer = image.to_rgba32f();
        for pixel in buffer.pixels_mut() {
            for channel in pixel.0.iter_mut().take(3) {
                *channel *= factor;
            }
        }
        DynamicImage::ImageRgba32F(buffer)
    } else {
        let mut buffer = image.to_rgb32f();
        for pixel in buffer.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel *= factor;
            }
        }
        DynamicImage::ImageRgb32F(buffer)
    }
}

/// Largest sample value of the input's storage type; float conversion divides by it
fn sample_range(image: &DynamicImage) -> f32 {
    match image.color().bytes_per_pixel() / image.color().channel_count() {
        1 => 255.0,
        2 => 65535.0,
        _ => 1.0,
    }
}

/// Scale HSV saturation and value by `factor`, clamped to the channel range
pub fn brightness(image: &DynamicImage, factor: f64) -> DynamicImage {
    let factor = factor as f32;
    let mut buffer = working_copy(image);

    for pixel in buffer.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r, g, b) = hsv_to_rgb(h, (s * factor).min(1.0), (v * factor).min(1.0));
        *pixel = Rgba([r, g, b, a]);
    }

    restore(image.color(), buffer)
}

/// Add `value` (in 8-bit units) to every color channel, clamped
pub fn channel_shift(image: &DynamicImage, value: f64) -> DynamicImage {
    let offset = (value / 255.0) as f32;
    let mut buffer = working_copy(image);

    for pixel in buffer.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = (*channel + offset).clamp(0.0, 1.0);
        }
    }

    restore(image.color(), buffer)
}

/// `r, g, b` in `[0, 1]` to hue in degrees, saturation and value in `[0, 1]`
fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
    (hue, saturation, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let sector = (h / 60.0).rem_euclid(6.0);
    let x = c * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}
