//! Normalized cross-correlation between pixel grids.
//!
//! `cross_correlation` reports a grid with zero variance as
//! [`MetricError::DegenerateImage`]. `similarity_score` resolves that case:
//! two sample-for-sample identical grids score 1.0, anything else 0.0.

use crate::core::normalizer::PixelGrid;
use crate::error::MetricError;

/// Pearson correlation of the samples of two same-shaped grids, in [-1, 1].
pub fn cross_correlation(a: &PixelGrid, b: &PixelGrid) -> Result<f64, MetricError> {
    if !a.same_shape(b) {
        return Err(MetricError::GridMismatch {
            left: a.shape_label(),
            right: b.shape_label(),
        });
    }

    let n = a.samples().len() as f64;
    let mean_a = a.samples().iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.samples().iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut numerator = 0.0f64;
    let mut denom_a = 0.0f64;
    let mut denom_b = 0.0f64;

    for (&va, &vb) in a.samples().iter().zip(b.samples()) {
        let da = va as f64 - mean_a;
        let db = vb as f64 - mean_b;
        numerator += da * db;
        denom_a += da * da;
        denom_b += db * db;
    }

    if denom_a == 0.0 || denom_b == 0.0 {
        return Err(MetricError::DegenerateImage);
    }

    Ok((numerator / (denom_a * denom_b).sqrt()).clamp(-1.0, 1.0))
}

/// Correlation mapped onto [0, 1] as `(ncc + 1) / 2`.
pub fn similarity_score(a: &PixelGrid, b: &PixelGrid) -> Result<f64, MetricError> {
    match cross_correlation(a, b) {
        Ok(ncc) => Ok((ncc + 1.0) / 2.0),
        Err(MetricError::DegenerateImage) => Ok(if a == b { 1.0 } else { 0.0 }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(samples: Vec<u8>) -> PixelGrid {
        let len = samples.len() as u32;
        PixelGrid::from_raw(len, 1, 1, samples).unwrap()
    }

    #[test]
    fn self_correlation_is_one() {
        let a = grid(vec![10, 50, 90, 30, 70]);
        assert!((cross_correlation(&a, &a).unwrap() - 1.0).abs() < 1e-12);
        assert!((similarity_score(&a, &a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_correlation_is_minus_one() {
        let a = grid(vec![10, 50, 90, 30, 70]);
        let b = grid(a.samples().iter().map(|v| 255 - v).collect());

        assert!((cross_correlation(&a, &b).unwrap() + 1.0).abs() < 1e-12);
        assert!(similarity_score(&a, &b).unwrap().abs() < 1e-12);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = grid(vec![0, 255, 0, 255, 0, 255, 0, 255]);
        let b = grid(vec![255, 255, 0, 0, 255, 255, 0, 0]);
        assert_eq!(
            similarity_score(&a, &b).unwrap(),
            similarity_score(&b, &a).unwrap()
        );
    }

    #[test]
    fn flat_grid_is_degenerate() {
        let flat = grid(vec![40; 6]);
        let textured = grid(vec![0, 10, 20, 30, 40, 50]);
        assert_eq!(
            cross_correlation(&flat, &textured),
            Err(MetricError::DegenerateImage)
        );
    }

    #[test]
    fn identical_flat_grids_are_fully_similar() {
        let black = grid(vec![0; 6]);
        assert_eq!(similarity_score(&black, &black).unwrap(), 1.0);
    }

    #[test]
    fn differing_flat_grids_score_zero() {
        let black = grid(vec![0; 6]);
        let white = grid(vec![255; 6]);
        let textured = grid(vec![0, 10, 20, 30, 40, 50]);

        assert_eq!(similarity_score(&black, &white).unwrap(), 0.0);
        assert_eq!(similarity_score(&black, &textured).unwrap(), 0.0);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let a = grid(vec![1, 2, 3]);
        let b = grid(vec![1, 2, 3, 4]);
        assert!(matches!(
            similarity_score(&a, &b),
            Err(MetricError::GridMismatch { .. })
        ));
    }
}
