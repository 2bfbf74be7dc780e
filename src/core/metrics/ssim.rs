//! Mean structural similarity (SSIM) between pixel grids.
//!
//! Uniform 7x7 window, `K1 = 0.01`, `K2 = 0.03`, data range 255 and sample
//! covariance. Only windows lying fully inside the grid are averaged. Window
//! sums come from summed-area tables, so the cost per pair is linear in the
//! grid size.

use crate::core::normalizer::PixelGrid;
use crate::error::MetricError;

/// Side of the square comparison window
pub const SSIM_WINDOW: u32 = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Mean SSIM of two same-shaped grids, averaged over channels.
///
/// 1.0 for identical grids; values near 0 (or negative) for unrelated ones.
pub fn structural_similarity(a: &PixelGrid, b: &PixelGrid) -> Result<f64, MetricError> {
    if !a.same_shape(b) {
        return Err(MetricError::GridMismatch {
            left: a.shape_label(),
            right: b.shape_label(),
        });
    }
    if a.width() < SSIM_WINDOW || a.height() < SSIM_WINDOW {
        return Err(MetricError::WindowTooLarge {
            window: SSIM_WINDOW,
            shape: a.shape_label(),
        });
    }

    let channels = a.channels() as usize;
    let total: f64 = (0..channels).map(|c| channel_ssim(a, b, c)).sum();

    Ok(total / channels as f64)
}

/// Summed-area table with a zero border row and column
struct Integral {
    stride: usize,
    sums: Vec<f64>,
}

impl Integral {
    fn new(width: usize, height: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut sums = vec![0.0f64; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0f64;
            for x in 0..width {
                row += value(x, y);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { stride, sums }
    }

    /// Sum over the `size x size` window whose top-left corner is (x, y)
    fn window(&self, x: usize, y: usize, size: usize) -> f64 {
        let s = self.stride;
        self.sums[(y + size) * s + x + size] - self.sums[y * s + x + size]
            - self.sums[(y + size) * s + x]
            + self.sums[y * s + x]
    }
}

fn channel_ssim(a: &PixelGrid, b: &PixelGrid, channel: usize) -> f64 {
    let (width, height) = (a.width() as usize, a.height() as usize);
    let stride = a.channels() as usize;
    let at = |grid: &PixelGrid, x: usize, y: usize| {
        grid.samples()[(y * width + x) * stride + channel] as f64
    };

    let sum_a = Integral::new(width, height, |x, y| at(a, x, y));
    let sum_b = Integral::new(width, height, |x, y| at(b, x, y));
    let sum_aa = Integral::new(width, height, |x, y| at(a, x, y) * at(a, x, y));
    let sum_bb = Integral::new(width, height, |x, y| at(b, x, y) * at(b, x, y));
    let sum_ab = Integral::new(width, height, |x, y| at(a, x, y) * at(b, x, y));

    let size = SSIM_WINDOW as usize;
    let np = (size * size) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0f64;
    let mut windows = 0usize;
    for y in 0..=height - size {
        for x in 0..=width - size {
            let ux = sum_a.window(x, y, size) / np;
            let uy = sum_b.window(x, y, size) / np;
            let uxx = sum_aa.window(x, y, size) / np;
            let uyy = sum_bb.window(x, y, size) / np;
            let uxy = sum_ab.window(x, y, size) / np;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * (ux * uy) + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }

    total / windows as f64
}
