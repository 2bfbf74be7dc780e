//! Fingerprint difference visualization.
//!
//! Renders the 64 bits of a fingerprint pair as an 8x8 grid so users can
//! see where two images disagree.

use crate::core::hasher::Fingerprint;
use crate::error::MetricError;

const GRID_SIZE: u32 = 8;

/// Visualizes fingerprint differences
#[derive(Debug, Clone, Copy, Default)]
pub struct HashVisualizer;

impl HashVisualizer {
    pub fn new() -> Self {
        Self
    }

    /// Generate an ASCII visualization of fingerprint difference
    ///
    /// Bits are laid out in emission order, most significant first:
    /// - `.` = bits match
    /// - `X` = bits differ
    pub fn visualize_difference(
        &self,
        a: &Fingerprint,
        b: &Fingerprint,
    ) -> Result<String, MetricError> {
        a.distance(b)?;
        let differing = a.bits() ^ b.bits();

        let mut output = format!(
            "{} difference map (. = same, X = different):\n\n",
            a.algorithm()
        );

        for row in 0..GRID_SIZE {
            output.push_str("  ");
            for col in 0..GRID_SIZE {
                let shift = Fingerprint::BITS - 1 - (row * GRID_SIZE + col);
                output.push(if (differing >> shift) & 1 == 1 { 'X' } else { '.' });
                output.push(' ');
            }
            output.push('\n');
        }

        Ok(output)
    }

    /// Generate a summary of the difference
    pub fn summarize_difference(
        &self,
        a: &Fingerprint,
        b: &Fingerprint,
    ) -> Result<String, MetricError> {
        let differing = a.distance(b)?;
        let similarity = a.similarity(b)?;

        Ok(format!(
            "{} of {} bits differ ({:.1}% similar)",
            differing,
            a.bit_len(),
            similarity
        ))
    }

    /// Generate a compact similarity indicator
    ///
    /// Returns a visual bar showing similarity:
    /// `[████████░░] 80%`
    pub fn similarity_bar(&self, similarity_percent: f64) -> String {
        let filled = ((similarity_percent / 10.0).round() as usize).min(10);
        let empty = 10 - filled;

        format!(
            "[{}{}] {:.0}%",
            "█".repeat(filled),
            "░".repeat(empty),
            similarity_percent
        )
    }
}
