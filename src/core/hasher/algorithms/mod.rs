//! Hash algorithm implementations.

mod difference;
mod perceptual;

pub use difference::DifferenceHasher;
pub use perceptual::{DcTerm, PerceptualHasher};
