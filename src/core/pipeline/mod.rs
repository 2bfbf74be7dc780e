//! # Pipeline Module
//!
//! Orchestrates profiling, comparison and grouping behind one [`Detector`].
//!
//! ## Stages
//! 1. **Profile** - Decode-independent grids and fingerprints per image (cached by content)
//! 2. **Compare** - Metrics plus verdict fusion for every requested pair
//! 3. **Group** - Transitive closure over derivative pairs, original selection
//!
//! ## Parallelism
//! Uses rayon for parallel profiling and pairwise comparison.

mod executor;

pub use executor::{Detector, DetectorBuilder, DetectorConfig};
