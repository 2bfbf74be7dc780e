//! # pixel-peep
//!
//! Detects copied, recompressed and otherwise derivative versions of an image.
//!
//! ## Signals
//! - **Pixel divergence** - mean absolute difference of small blurred thumbnails
//! - **Similarity score** - normalized cross-correlation after contrast stretch
//! - **Perceptual hash** - Hamming distance between DCT fingerprints
//!
//! The first signal to cross its threshold decides the verdict and is
//! reported as the detection method.
//!
//! ## Architecture
//! - `core` - The detection engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types for every stage
//!
//! ## Example
//! ```rust,ignore
//! use pixel_peep::core::{Detector, ImageBuffer};
//!
//! let detector = Detector::builder().build()?;
//! let verdict = detector.compare(
//!     &ImageBuffer::decode(std::fs::read("original.png")?)?,
//!     &ImageBuffer::decode(std::fs::read("upload.jpg")?)?,
//! )?;
//! println!("{} via {}", verdict.is_derivative, verdict.method);
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DetectorError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides the default `warn` level.
pub fn init_tracing() {
    init_tracing_with_default("warn");
}

/// Initialize tracing with a fallback directive used when `RUST_LOG` is unset
pub fn init_tracing_with_default(directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
