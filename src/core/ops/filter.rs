//! Smoothing and convolution kernels.
//!
//! Neighbourhoods reaching past an edge replicate the edge pixel. Alpha is
//! carried over from the source, only color channels are filtered.

use image::{DynamicImage, Rgba32FImage};

use super::{restore, working_copy, OpError};

/// Normalized box filter of `width` x `height`
pub fn average_blur(image: &DynamicImage, kernel: (u32, u32)) -> DynamicImage {
    let row = vec![1.0 / kernel.0 as f32; kernel.0 as usize];
    let column = vec![1.0 / kernel.1 as f32; kernel.1 as usize];
    separable(image, &row, &column)
}

/// Gaussian filter with per-axis kernel size and sigma.
///
/// A sigma of zero is derived from the kernel size; `sigma_y == 0` reuses
/// `sigma_x`.
pub fn gaussian_blur(
    image: &DynamicImage,
    kernel: (u32, u32),
    sigma_x: f64,
    sigma_y: f64,
) -> DynamicImage {
    let sigma_y = if sigma_y == 0.0 { sigma_x } else { sigma_y };
    let row = gaussian_kernel(kernel.0, sigma_x);
    let column = gaussian_kernel(kernel.1, sigma_y);
    separable(image, &row, &column)
}

/// Median of each `size` x `size` neighbourhood, per channel
pub fn median_blur(image: &DynamicImage, size: u32) -> Result<DynamicImage, OpError> {
    let too_large = || OpError::WindowTooLarge { size };
    let area = usize::try_from(size)
        .ok()
        .and_then(|side| side.checked_mul(side))
        .ok_or_else(too_large)?;
    let mut window = Vec::new();
    window.try_reserve_exact(area).map_err(|_| too_large())?;

    let source = working_copy(image);
    let radius = i64::from(size / 2);

    let filtered = Rgba32FImage::from_fn(source.width(), source.height(), |x, y| {
        let mut out = source.get_pixel(x, y).0;
        for (c, slot) in out.iter_mut().enumerate().take(3) {
            window.clear();
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    window.push(clamped(&source, x as i64 + dx, y as i64 + dy)[c]);
                }
            }
            window.sort_by(|a, b| a.total_cmp(b));
            *slot = window[window.len() / 2];
        }
        image::Rgba(out)
    });

    Ok(restore(image.color(), filtered))
}

/// Edge-preserving bilateral filter over a `diameter` neighbourhood.
///
/// `sigma_color` is in 8-bit intensity units, `sigma_space` in pixels.
pub fn bilateral_blur(
    image: &DynamicImage,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> DynamicImage {
    let source = working_copy(image);
    let radius = (diameter / 2) as i64;
    let color_coeff = -0.5 / (sigma_color * sigma_color) as f32;
    let space_coeff = -0.5 / (sigma_space * sigma_space) as f32;

    let filtered = Rgba32FImage::from_fn(source.width(), source.height(), |x, y| {
        let center = source.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        let mut weight_sum = 0.0f32;

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let distance2 = (dx * dx + dy * dy) as f32;
                if distance2 > (radius * radius) as f32 {
                    continue;
                }
                let neighbour = clamped(&source, x as i64 + dx, y as i64 + dy);
                let color2: f32 = (0..3)
                    .map(|c| {
                        let diff = (neighbour[c] - center[c]) * 255.0;
                        diff * diff
                    })
                    .sum();
                let weight = (distance2 * space_coeff + color2 * color_coeff).exp();
                for c in 0..3 {
                    sum[c] += neighbour[c] * weight;
                }
                weight_sum += weight;
            }
        }

        let mut out = center;
        if weight_sum > 0.0 {
            for c in 0..3 {
                out[c] = sum[c] / weight_sum;
            }
        }
        image::Rgba(out)
    });

    restore(image.color(), filtered)
}

/// 2D correlation with an arbitrary `rows` x `cols` kernel anchored at its center
pub fn convolve(image: &DynamicImage, kernel: &[Vec<f64>]) -> DynamicImage {
    let source = working_copy(image);
    let rows = kernel.len() as i64;
    let cols = kernel.first().map_or(0, |row| row.len()) as i64;
    let (anchor_y, anchor_x) = (rows / 2, cols / 2);

    let filtered = Rgba32FImage::from_fn(source.width(), source.height(), |x, y| {
        let mut out = source.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        for (ky, row) in kernel.iter().enumerate() {
            for (kx, weight) in row.iter().enumerate() {
                let sx = x as i64 + kx as i64 - anchor_x;
                let sy = y as i64 + ky as i64 - anchor_y;
                let pixel = clamped(&source, sx, sy);
                for c in 0..3 {
                    sum[c] += pixel[c] * *weight as f32;
                }
            }
        }
        out[..3].copy_from_slice(&sum);
        image::Rgba(out)
    });

    restore(image.color(), filtered)
}

/// Horizontal pass with `row` followed by a vertical pass with `column`
fn separable(image: &DynamicImage, row: &[f32], column: &[f32]) -> DynamicImage {
    let source = working_copy(image);
    let (width, height) = source.dimensions();
    let row_anchor = (row.len() / 2) as i64;
    let column_anchor = (column.len() / 2) as i64;

    let horizontal = Rgba32FImage::from_fn(width, height, |x, y| {
        let mut out = source.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        for (k, weight) in row.iter().enumerate() {
            let pixel = clamped(&source, x as i64 + k as i64 - row_anchor, y as i64);
            for c in 0..3 {
                sum[c] += pixel[c] * weight;
            }
        }
        out[..3].copy_from_slice(&sum);
        image::Rgba(out)
    });

    let vertical = Rgba32FImage::from_fn(width, height, |x, y| {
        let mut out = horizontal.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        for (k, weight) in column.iter().enumerate() {
            let pixel = clamped(&horizontal, x as i64, y as i64 + k as i64 - column_anchor);
            for c in 0..3 {
                sum[c] += pixel[c] * weight;
            }
        }
        out[..3].copy_from_slice(&sum);
        image::Rgba(out)
    });

    restore(image.color(), vertical)
}

/// Normalized 1D Gaussian weights
fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    let sigma = if sigma <= 0.0 {
        0.3 * ((f64::from(size) - 1.0) * 0.5 - 1.0) + 0.8
    } else {
        sigma
    };
    let center = (f64::from(size) - 1.0) / 2.0;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = f64::from(i) - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

fn clamped(buffer: &Rgba32FImage, x: i64, y: i64) -> [f32; 4] {
    let x = x.clamp(0, i64::from(buffer.width()) - 1) as u32;
    let y = y.clamp(0, i64::from(buffer.height()) - 1) as u32;
    buffer.get_pixel(x, y).0
}
