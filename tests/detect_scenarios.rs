// End-to-end detection scenarios through image files on disk
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use tamper_detect::detector::{
    diff, DetectError, GrayArray, ImageSource, TamperDetector, DEFAULT_THRESHOLD,
};

fn write_gray(dir: &Path, name: &str, width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> PathBuf {
    let img: GrayImage = ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)]));
    let path = dir.join(name);
    DynamicImage::ImageLuma8(img).save(&path).expect("write test image");
    path
}

fn source(path: &Path) -> ImageSource {
    ImageSource::FilePath(path.to_path_buf())
}

#[test]
fn two_black_images_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gray(dir.path(), "a.png", 100, 100, |_, _| 0);
    let b = write_gray(dir.path(), "b.png", 100, 100, |_, _| 0);

    let outcome = TamperDetector::default().detect(&source(&a), &source(&b)).unwrap();

    assert!(outcome.identical);
    assert!(outcome.original.is_none());
    assert!(outcome.tampered.is_none());
    assert!(outcome.mask.is_none());
    assert!(outcome.histograms.is_none());
}

#[test]
fn one_bright_pixel_gives_one_mask_pixel() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gray(dir.path(), "a.png", 100, 100, |_, _| 0);
    let b = write_gray(dir.path(), "b.png", 100, 100, |x, y| if (x, y) == (12, 80) { 50 } else { 0 });

    let outcome = TamperDetector::default()
        .detect_with_threshold(&source(&a), &source(&b), 10)
        .unwrap();

    assert!(!outcome.identical);
    let mask = outcome.mask.as_ref().unwrap();
    for row in 0..100 {
        for col in 0..100 {
            let expected = if (row, col) == (80, 12) { 255 } else { 0 };
            assert_eq!(mask.get(row, col), Some(expected), "at ({row}, {col})");
        }
    }
}

#[test]
fn differently_sized_uniform_images_reconcile_to_zero_diff() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gray(dir.path(), "a.png", 50, 50, |_, _| 128);
    let b = write_gray(dir.path(), "b.png", 80, 80, |_, _| 128);

    let outcome = TamperDetector::default().detect(&source(&a), &source(&b)).unwrap();

    assert!(!outcome.identical);
    let original = outcome.original.as_ref().unwrap();
    let tampered = outcome.tampered.as_ref().unwrap();
    let mask = outcome.mask.as_ref().unwrap();
    assert_eq!(tampered.shape(), (50, 50));
    assert_eq!(mask.shape(), (50, 50));

    let recomputed = diff(original, tampered, DEFAULT_THRESHOLD).unwrap();
    assert!(recomputed.raw_diff.as_bytes().iter().all(|&v| v == 0));
    assert!(mask.as_bytes().iter().all(|&v| v == 0));
    assert_eq!(outcome.changed_pixels(), 0);
}

#[test]
fn original_is_never_resized() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gray(dir.path(), "a.png", 37, 23, |x, _| (x * 6) as u8);
    let b = write_gray(dir.path(), "b.png", 64, 64, |_, y| (y * 3) as u8);

    let outcome = TamperDetector::default().detect(&source(&a), &source(&b)).unwrap();
    let original = outcome.original.as_ref().unwrap();

    assert_eq!(original.shape(), (23, 37));
    assert_eq!(original.get(0, 36), Some(216));
    assert_eq!(outcome.tampered_shape, (64, 64, 1));
}

#[test]
fn same_pixels_in_color_file_compare_equal() {
    let dir = tempfile::tempdir().unwrap();
    let img: RgbImage = ImageBuffer::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 200]));
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.bmp");
    DynamicImage::ImageRgb8(img.clone()).save(&a).unwrap();
    DynamicImage::ImageRgb8(img).save(&b).unwrap();

    // 不同编码格式、相同像素：原生样本一致，应直接判定为一致
    let outcome = TamperDetector::default().detect(&source(&a), &source(&b)).unwrap();
    assert!(outcome.identical);
}

#[test]
fn corrupt_file_aborts_detection() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_gray(dir.path(), "good.png", 10, 10, |_, _| 0);
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"\x89PNG\r\n\x1a\nthis is not a real png").unwrap();

    let result = TamperDetector::default().detect(&source(&good), &source(&bad));
    assert!(matches!(result, Err(ref e) if e.is_load_failure()), "{result:?}");

    let missing = dir.path().join("missing.png");
    let result = TamperDetector::default().detect(&source(&missing), &source(&good));
    assert!(matches!(result, Err(DetectError::FileSystem(_))));
}

#[test]
fn detector_is_shareable_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gray(dir.path(), "a.png", 32, 32, |_, _| 10);
    let b = write_gray(dir.path(), "b.png", 32, 32, |x, _| if x < 8 { 90 } else { 10 });
    let detector = TamperDetector::default();

    let counts: Vec<u64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| detector.detect(&source(&a), &source(&b)).unwrap().changed_pixels()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(counts.iter().all(|&c| c == 8 * 32));
}

#[test]
fn gray_array_matches_decoded_luma() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_gray(dir.path(), "a.png", 3, 2, |x, y| (x + 10 * y) as u8);
    let b = write_gray(dir.path(), "b.png", 3, 2, |_, _| 0);

    let outcome = TamperDetector::default().detect(&source(&a), &source(&b)).unwrap();
    let expected = GrayArray::new(2, 3, vec![0, 1, 2, 10, 11, 12]).unwrap();
    assert_eq!(outcome.original.as_ref(), Some(&expected));
}

#[test]
fn dark_blue_patch_against_black_is_marked() {
    let dir = tempfile::tempdir().unwrap();
    let black = dir.path().join("black.png");
    let blue = dir.path().join("blue.png");
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([0u8, 0, 0]))).save(&black).unwrap();
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([0u8, 0, 120]))).save(&blue).unwrap();

    let outcome = TamperDetector::default().detect(&source(&black), &source(&blue)).unwrap();

    // 0.114 * 120 rounds to 14, above the default threshold of 10
    assert_eq!(outcome.tampered.as_ref().and_then(|t| t.get(0, 0)), Some(14));
    assert_eq!(outcome.changed_pixels(), 16);
}
