// Persisting detection masks into the SQLite store
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};
use std::io::Cursor;

use tamper_detect::db;
use tamper_detect::detector::{ImageSource, TamperDetector};

fn png_source(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> ImageSource {
    let img: GrayImage = ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    ImageSource::Bytes(cursor.into_inner())
}

#[test]
fn detected_mask_survives_storage() {
    let outcome = TamperDetector::default()
        .detect(
            &png_source(40, 30, |_, _| 20),
            &png_source(40, 30, |x, y| if x > 30 && y < 5 { 220 } else { 20 }),
        )
        .expect("detect should succeed");
    let mask = outcome.mask.as_ref().expect("mask present");

    let store = db::open_in_memory().expect("open store");
    let id = store.save_mask(9, mask).expect("save mask");

    let loaded = store.load_mask(id).expect("load").expect("row exists");
    assert_eq!(&loaded, mask);

    let records = store.list_masks(9, 10).expect("list");
    assert_eq!(records[0].changed_pixels as u64, outcome.changed_pixels());
    assert_eq!(records[0].changed_pixels, 9 * 5);
}

#[test]
fn file_backed_store_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("masks.db");

    let id = {
        let store = db::open_store(&path).expect("open store");
        let mask = tamper_detect::detector::GrayArray::filled(4, 4, 255);
        store.save_mask(1, &mask).expect("save")
    };

    let store = db::open_store(&path).expect("reopen store");
    assert_eq!(store.count_masks(1).unwrap(), 1);
    let records = store.list_masks(1, 5).unwrap();
    assert_eq!(records[0].id, id);
    assert!(records[0].created_at > 0);
}
