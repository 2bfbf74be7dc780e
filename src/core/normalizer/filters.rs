//! Post-resize filters applied to pixel grids.
//!
//! - Gaussian blur via `imageproc` (separable, clamp-to-edge borders)
//! - Robust contrast stretch mapping the 1st..99th intensity percentile
//!   onto the full 0..255 range

use super::PixelGrid;
use crate::error::NormalizeError;
use image::{GrayImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::stats::percentile;

/// Percentiles clipped at each end of the histogram by the contrast stretch
const STRETCH_LOW: u8 = 1;
const STRETCH_HIGH: u8 = 99;

/// Blur a grid in place with a Gaussian of the given sigma.
///
/// Channels are blurred independently. A non-positive sigma is a no-op.
pub fn gaussian_blur(grid: &mut PixelGrid, sigma: f32) -> Result<(), NormalizeError> {
    if sigma <= 0.0 {
        return Ok(());
    }

    let (width, height) = (grid.width(), grid.height());
    let samples = grid.samples().to_vec();
    let blurred = match grid.channels() {
        1 => GrayImage::from_raw(width, height, samples)
            .map(|image| gaussian_blur_f32(&image, sigma).into_raw()),
        3 => RgbImage::from_raw(width, height, samples)
            .map(|image| gaussian_blur_f32(&image, sigma).into_raw()),
        _ => None,
    };

    let blurred = blurred.ok_or_else(|| NormalizeError::GridShape {
        expected: format!("{}x{}x1 or {}x{}x3", width, height, width, height),
        found: grid.shape_label(),
    })?;
    grid.samples_mut().copy_from_slice(&blurred);
    Ok(())
}

/// Stretch each channel so its 1st..99th percentile spans 0..255.
///
/// A channel whose percentiles coincide (flat or nearly flat) is left untouched.
pub fn stretch_contrast(grid: &mut PixelGrid) -> Result<(), NormalizeError> {
    let (width, height) = (grid.width(), grid.height());
    let channels = grid.channels() as usize;

    for c in 0..channels {
        let plane: Vec<u8> = grid.samples().iter().skip(c).step_by(channels).copied().collect();
        let plane = GrayImage::from_raw(width, height, plane).ok_or_else(|| {
            NormalizeError::GridShape {
                expected: format!("{}x{}x{}", width, height, channels),
                found: grid.shape_label(),
            }
        })?;

        let low = percentile(&plane, STRETCH_LOW);
        let high = percentile(&plane, STRETCH_HIGH);
        if high <= low {
            continue;
        }

        let scale = 255.0 / (high - low) as f32;
        for value in grid.samples_mut().iter_mut().skip(c).step_by(channels) {
            let stretched = (*value as f32 - low as f32) * scale;
            *value = stretched.round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(width: u32, height: u32, samples: Vec<u8>) -> PixelGrid {
        PixelGrid::from_raw(width, height, 1, samples).unwrap()
    }

    #[test]
    fn blur_keeps_flat_grid_flat() {
        let mut grid = grid_from(8, 8, vec![200; 64]);
        gaussian_blur(&mut grid, 1.5).unwrap();
        assert!(grid.samples().iter().all(|&v| v == 200));
    }

    #[test]
    fn blur_softens_a_single_spike() {
        let mut samples = vec![0u8; 49];
        samples[24] = 255;
        let mut grid = grid_from(7, 7, samples);

        gaussian_blur(&mut grid, 1.0).unwrap();

        let center = grid.samples()[24];
        let neighbour = grid.samples()[23];
        assert!(center < 255);
        assert!(neighbour > 0);
        assert!(center > neighbour);
    }

    #[test]
    fn blur_handles_rgb_channels_independently() {
        let samples: Vec<u8> = (0..16).flat_map(|_| [10u8, 120, 250]).collect();
        let mut grid = PixelGrid::from_raw(4, 4, 3, samples.clone()).unwrap();

        gaussian_blur(&mut grid, 0.8).unwrap();
        assert_eq!(grid.samples(), samples.as_slice());
    }

    #[test]
    fn zero_sigma_is_a_no_op() {
        let samples: Vec<u8> = (0..16).map(|v| v * 10).collect();
        let mut grid = grid_from(4, 4, samples.clone());
        gaussian_blur(&mut grid, 0.0).unwrap();
        assert_eq!(grid.samples(), samples.as_slice());
    }

    #[test]
    fn stretch_expands_narrow_range() {
        let samples: Vec<u8> = (0..100).map(|i| 100 + (i % 50) as u8).collect();
        let mut grid = grid_from(10, 10, samples);

        stretch_contrast(&mut grid).unwrap();

        let min = *grid.samples().iter().min().unwrap();
        let max = *grid.samples().iter().max().unwrap();
        assert_eq!(min, 0);
        assert_eq!(max, 255);
    }

    #[test]
    fn stretch_leaves_flat_grid_alone() {
        let mut grid = grid_from(4, 4, vec![0; 16]);
        stretch_contrast(&mut grid).unwrap();
        assert!(grid.samples().iter().all(|&v| v == 0));
    }
}
