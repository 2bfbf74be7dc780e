//! # Normalizer Module
//!
//! Turns an encoded image into the canonical pixel grids every metric works on.
//!
//! ## Pipeline
//! 1. Decode once into an [`ImageBuffer`] (zune-jpeg for JPEG, image crate otherwise)
//! 2. Collapse to luma (Rec. 709 weights) when grayscale is requested
//! 3. Resize to exactly `width x height` with a bilinear convolution
//! 4. Optionally blur (separable Gaussian) and stretch contrast
//!
//! ## Example
//! ```rust,ignore
//! use pixel_peep::core::normalizer::{normalize, ImageBuffer, NormalizeOptions};
//!
//! let buffer = ImageBuffer::decode(bytes)?;
//! let grid = normalize(&buffer, 256, 256, &NormalizeOptions::similarity())?;
//! ```

mod decode;
pub mod filters;
mod resize;

pub use decode::{sniff_format, FastDecoder};
pub use resize::GridResizer;

use crate::error::NormalizeError;
use image::{DynamicImage, ImageFormat};
use xxhash_rust::xxh3::xxh3_64;

/// A decoded image together with the bytes it was decoded from
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
    image: DynamicImage,
    format: Option<ImageFormat>,
    digest: u64,
}

impl ImageBuffer {
    /// Decode an encoded raster image (JPEG, PNG, WebP, GIF, BMP, TIFF)
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Result<Self, NormalizeError> {
        let bytes = bytes.into();
        let (image, format) = FastDecoder::decode(&bytes)?;

        if image.width() == 0 || image.height() == 0 {
            return Err(NormalizeError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let digest = xxh3_64(&bytes);
        Ok(Self {
            bytes,
            image,
            format: Some(format),
            digest,
        })
    }

    /// Wrap pixels that were already decoded by the caller
    pub fn from_image(image: DynamicImage) -> Result<Self, NormalizeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(NormalizeError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let mut keyed = image.as_bytes().to_vec();
        keyed.extend_from_slice(&image.width().to_le_bytes());
        keyed.extend_from_slice(&image.height().to_le_bytes());
        keyed.push(image.color().channel_count());

        Ok(Self {
            bytes: Vec::new(),
            digest: xxh3_64(&keyed),
            image,
            format: None,
        })
    }

    /// The decoded image
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// The encoded bytes (empty when built from already decoded pixels)
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the encoded input in bytes
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of color channels in the decoded image
    pub fn channels(&self) -> u8 {
        self.image.color().channel_count()
    }

    /// Encoded format, if the buffer was decoded by us
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Content digest (xxh3) used to recognise identical inputs
    pub fn digest(&self) -> u64 {
        self.digest
    }
}

/// An owned, row-major grid of 8-bit samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl PixelGrid {
    /// Build a grid from raw interleaved samples
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        samples: Vec<u8>,
    ) -> Result<Self, NormalizeError> {
        if width == 0 || height == 0 {
            return Err(NormalizeError::Dimension { width, height });
        }

        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || samples.len() != expected {
            return Err(NormalizeError::Resize(format!(
                "expected {} samples for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Sample at column `x`, row `y`, channel `c`
    pub fn get(&self, x: u32, y: u32, c: u8) -> u8 {
        let index = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + c as usize;
        self.samples[index]
    }

    /// True when two grids can be compared sample-for-sample
    pub fn same_shape(&self, other: &PixelGrid) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Short `WxHxC` description used in error messages
    pub fn shape_label(&self) -> String {
        format!("{}x{}x{}", self.width, self.height, self.channels)
    }

    /// Fails unless the grid is exactly `width x height x channels`
    pub fn require_shape(
        &self,
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<(), NormalizeError> {
        if self.width == width && self.height == height && self.channels == channels {
            return Ok(());
        }
        Err(NormalizeError::GridShape {
            expected: format!("{}x{}x{}", width, height, channels),
            found: self.shape_label(),
        })
    }
}

/// Options controlling how a buffer is normalized into a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    /// Collapse channels to a single luma channel
    pub grayscale: bool,
    /// Gaussian blur sigma applied after resizing (0 disables)
    pub blur_sigma: f32,
    /// Stretch the intensity histogram to the full range
    pub normalize_contrast: bool,
}

impl NormalizeOptions {
    /// Plain grayscale, used by both hash extractors
    pub fn hashing() -> Self {
        Self {
            grayscale: true,
            blur_sigma: 0.0,
            normalize_contrast: false,
        }
    }

    /// Grayscale with light blur, used for pixel divergence
    pub fn divergence() -> Self {
        Self {
            grayscale: true,
            blur_sigma: 0.5,
            normalize_contrast: false,
        }
    }

    /// Blurred, contrast-normalized grayscale, used for the similarity score
    pub fn similarity() -> Self {
        Self {
            grayscale: true,
            blur_sigma: 0.5,
            normalize_contrast: true,
        }
    }

    /// Unfiltered RGB, used for the hue histogram
    pub fn color() -> Self {
        Self {
            grayscale: false,
            blur_sigma: 0.0,
            normalize_contrast: false,
        }
    }

    fn validate(&self) -> Result<(), NormalizeError> {
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(NormalizeError::InvalidBlur {
                sigma: self.blur_sigma,
            });
        }
        Ok(())
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::hashing()
    }
}

/// Normalize a decoded image into a `width x height` grid.
pub fn normalize(
    buffer: &ImageBuffer,
    width: u32,
    height: u32,
    options: &NormalizeOptions,
) -> Result<PixelGrid, NormalizeError> {
    if width == 0 || height == 0 {
        return Err(NormalizeError::Dimension { width, height });
    }
    options.validate()?;

    let mut resizer = GridResizer::new();
    let image = buffer.image();

    let mut grid = if options.grayscale {
        let samples = resizer.resize_gray(&image.to_luma8(), width, height)?;
        PixelGrid::from_raw(width, height, 1, samples)?
    } else {
        let samples = resizer.resize_rgb(&image.to_rgb8(), width, height)?;
        PixelGrid::from_raw(width, height, 3, samples)?
    };

    if options.blur_sigma > 0.0 {
        filters::gaussian_blur(&mut grid, options.blur_sigma)?;
    }

    if options.normalize_contrast {
        filters::stretch_contrast(&mut grid)?;
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Luma, Rgb};

    fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let rgb = image.to_rgb8();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .unwrap();
        bytes
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 64])
        }))
    }

    #[test]
    fn decode_records_metadata() {
        let bytes = encode_png(&gradient(120, 80));
        let buffer = ImageBuffer::decode(bytes.clone()).unwrap();

        assert_eq!(buffer.width(), 120);
        assert_eq!(buffer.height(), 80);
        assert_eq!(buffer.channels(), 3);
        assert_eq!(buffer.byte_len(), bytes.len());
        assert_eq!(buffer.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn identical_bytes_share_a_digest() {
        let bytes = encode_png(&gradient(32, 32));
        let a = ImageBuffer::decode(bytes.clone()).unwrap();
        let b = ImageBuffer::decode(bytes).unwrap();
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn output_has_exact_requested_dimensions() {
        let buffer = ImageBuffer::from_image(gradient(300, 170)).unwrap();

        let grid = normalize(&buffer, 9, 8, &NormalizeOptions::hashing()).unwrap();
        assert_eq!((grid.width(), grid.height(), grid.channels()), (9, 8, 1));
        assert_eq!(grid.samples().len(), 72);

        let color = NormalizeOptions {
            grayscale: false,
            ..NormalizeOptions::hashing()
        };
        let grid = normalize(&buffer, 64, 64, &color).unwrap();
        assert_eq!(grid.channels(), 3);
        assert_eq!(grid.samples().len(), 64 * 64 * 3);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let buffer = ImageBuffer::from_image(gradient(16, 16)).unwrap();
        let result = normalize(&buffer, 0, 32, &NormalizeOptions::hashing());
        assert_eq!(
            result,
            Err(NormalizeError::Dimension {
                width: 0,
                height: 32
            })
        );
    }

    #[test]
    fn negative_blur_is_rejected() {
        let buffer = ImageBuffer::from_image(gradient(16, 16)).unwrap();
        let options = NormalizeOptions {
            blur_sigma: -1.0,
            ..NormalizeOptions::divergence()
        };
        assert!(matches!(
            normalize(&buffer, 8, 8, &options),
            Err(NormalizeError::InvalidBlur { .. })
        ));
    }

    #[test]
    fn normalization_is_deterministic() {
        let buffer = ImageBuffer::from_image(gradient(200, 150)).unwrap();
        let a = normalize(&buffer, 256, 256, &NormalizeOptions::similarity()).unwrap();
        let b = normalize(&buffer, 256, 256, &NormalizeOptions::similarity()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn contrast_normalization_widens_dim_images() {
        let dim = DynamicImage::ImageLuma8(image::ImageBuffer::from_fn(64, 64, |x, _| {
            Luma([(40 + x / 4) as u8])
        }));
        let buffer = ImageBuffer::from_image(dim).unwrap();

        let plain = normalize(&buffer, 64, 64, &NormalizeOptions::divergence()).unwrap();
        let stretched = normalize(&buffer, 64, 64, &NormalizeOptions::similarity()).unwrap();

        let range = |g: &PixelGrid| {
            let min = *g.samples().iter().min().unwrap() as i32;
            let max = *g.samples().iter().max().unwrap() as i32;
            max - min
        };
        assert!(range(&stretched) > range(&plain));
    }

    #[test]
    fn from_raw_rejects_wrong_sample_count() {
        assert!(PixelGrid::from_raw(4, 4, 1, vec![0; 15]).is_err());
    }
}
