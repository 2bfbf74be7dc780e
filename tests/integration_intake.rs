//! Integration tests for collecting images from disk and detecting on them.

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use pixel_peep::core::intake::{load_all, ImageCollector, IntakeConfig, WalkDirIntake};
use pixel_peep::core::pipeline::Detector;
use pixel_peep::error::IntakeError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn save(dir: &Path, name: &str, pattern: &str, lo: u8, format: ImageFormat) {
    let bits: Vec<bool> = pattern.chars().map(|c| c == '1').collect();
    let image = GrayImage::from_fn(256, 256, |x, y| {
        Luma([if bits[(y / 64 * 4 + x / 64) as usize] { 255 } else { lo }])
    });
    DynamicImage::ImageLuma8(image)
        .save_with_format(dir.join(name), format)
        .unwrap();
}

#[test]
fn directory_batch_is_clustered_in_name_order() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "a_original.png", "0011101000100011", 0, ImageFormat::Png);
    save(dir.path(), "b_other.png", "0110000010011110", 0, ImageFormat::Png);
    save(dir.path(), "c_darker.bmp", "0011101000100011", 12, ImageFormat::Bmp);
    fs::write(dir.path().join("readme.txt"), "not an image").unwrap();

    let files = WalkDirIntake::default()
        .collect(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(files.len(), 3);

    let images = load_all(&files).unwrap();
    let result = Detector::builder().build().unwrap().cluster(&images).unwrap();

    let groups: Vec<Vec<usize>> = result.groups.iter().map(|g| g.members.clone()).collect();
    assert_eq!(groups, vec![vec![0, 2], vec![1]]);
    assert_eq!(result.originals(), vec![0, 1]);
}

#[test]
fn identical_files_share_one_cached_profile() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "one.png", "0000010101001001", 0, ImageFormat::Png);
    fs::copy(dir.path().join("one.png"), dir.path().join("two.png")).unwrap();

    let files = WalkDirIntake::default()
        .collect(&[dir.path().to_path_buf()])
        .unwrap();
    let images = load_all(&files).unwrap();

    let detector = Detector::builder().build().unwrap();
    let result = detector.cluster(&images).unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(detector.cache_stats().total_entries, 1);
    assert!(detector.cache_stats().hits >= 1);
}

#[test]
fn oversized_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "big.png", "0011101000100011", 0, ImageFormat::Png);

    let intake = WalkDirIntake::new(IntakeConfig {
        max_file_size: 16,
        ..IntakeConfig::default()
    });
    let result = intake.collect(&[dir.path().join("big.png")]);

    assert!(matches!(result, Err(IntakeError::TooLarge { .. })));
}
