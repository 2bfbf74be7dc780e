//! # pixel-peep CLI
//!
//! Command-line interface for the derivative image detector.
//!
//! ## Usage
//! ```bash
//! pixel-peep compare original.png uploads/
//! pixel-peep cluster uploads/ --output json
//! ```

mod cli;

use pixel_peep::Result;

fn main() -> Result<()> {
    cli::run()
}
