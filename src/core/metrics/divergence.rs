//! Mean absolute pixel divergence.

use crate::core::normalizer::PixelGrid;
use crate::error::MetricError;

/// Mean absolute difference over every sample of two same-shaped grids.
///
/// 0 means identical; 255 is the maximum (black vs white).
pub fn pixel_divergence(a: &PixelGrid, b: &PixelGrid) -> Result<f64, MetricError> {
    if !a.same_shape(b) {
        return Err(MetricError::GridMismatch {
            left: a.shape_label(),
            right: b.shape_label(),
        });
    }

    let total: u64 = a
        .samples()
        .iter()
        .zip(b.samples())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();

    Ok(total as f64 / a.samples().len() as f64)
}
