//! Integration tests for pipeline execution.
//!
//! These tests verify end-to-end behavior including:
//! - Read → Resize → RandomFlip → Save over a directory
//! - Deterministic layers keeping the image count
//! - Grayscale then rescale writing a float array
//! - Crops that do not fit dropping images
//! - Abort and skip failure policies on corrupt files

use assert_fs::prelude::*;
use image::{GenericImageView, Rgb, RgbImage};
use imagepipe::core::layers::{
    Augmentation, Crop, GaussianBlur, Grayscale, Interpolation, RandomFlip, Read, Rescale, Resize,
    Save, SaveFormat,
};
use imagepipe::core::pipeline::{Executor, ExecutorConfig, FailurePolicy, Pipeline};
use imagepipe::error::ExecutionError;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// 100x100 image, red in the top-left quadrant and black elsewhere
fn write_quadrant_png(path: &Path) {
    let image = RgbImage::from_fn(100, 100, |x, y| {
        if x < 50 && y < 50 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 0])
        }
    });
    image.save(path).unwrap();
}

fn source_dir(names: &[&str]) -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    for name in names {
        write_quadrant_png(dir.child(name).path());
    }
    dir
}

#[test]
fn resize_flip_save_writes_one_file_per_image() {
    let input = source_dir(&["a.png", "b.png", "c.png"]);
    let output = assert_fs::TempDir::new().unwrap();

    let mut pipeline = Pipeline::new();
    pipeline.add(Read::new(input.path()).unwrap()).unwrap();
    pipeline
        .add(Resize::new((50, 50), Interpolation::Linear).unwrap())
        .unwrap();
    pipeline
        .add(RandomFlip::new(Augmentation::new(1.0, 1).unwrap()))
        .unwrap();
    pipeline
        .add(Save::new(output.path(), SaveFormat::Img).unwrap().named("out"))
        .unwrap();
    pipeline.freeze();

    let report = pipeline.transform().unwrap();

    assert_eq!(report.total_items, 3);
    assert_eq!(report.images_out, 3);
    for name in ["a.png", "b.png", "c.png"] {
        let file = output.child(format!("out_0_{}", name));
        file.assert(predicate::path::is_file());

        let saved = image::open(file.path()).unwrap();
        assert_eq!(saved.dimensions(), (50, 50));
        // Either flip moves the red quadrant away from the top-left corner
        let corner = saved.to_rgb8().get_pixel(5, 5).0;
        assert!(corner[0] < 32, "{} was not flipped", name);
    }
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 3);
}

#[test]
fn deterministic_layers_keep_image_count() {
    let input = source_dir(&["1.png", "2.png", "3.png", "4.png"]);
    let output = assert_fs::TempDir::new().unwrap();

    let mut pipeline = Pipeline::new();
    pipeline.add(Read::new(input.path()).unwrap()).unwrap();
    pipeline
        .add(GaussianBlur::new((3, 3), 0.0, 0.0).unwrap())
        .unwrap();
    pipeline.add(Grayscale::new()).unwrap();
    pipeline
        .add(Save::new(output.path(), SaveFormat::Npy).unwrap().named("gray"))
        .unwrap();

    let report = pipeline.transform().unwrap();

    assert_eq!(report.processed_items, 4);
    assert_eq!(report.images_out, 4);
    output
        .child("gray_0_1.png.npy")
        .assert(predicate::path::is_file());
    let header = fs::read(output.child("gray_0_3.png.npy").path()).unwrap();
    let text = String::from_utf8_lossy(&header[10..128]);
    assert!(text.contains("'shape': (100, 100)"));
}

/// Header dictionary and little-endian `f32` payload of an `.npy` file
fn read_f32_npy(path: &Path) -> (String, Vec<f32>) {
    let bytes = fs::read(path).unwrap();
    let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let header = String::from_utf8(bytes[10..10 + len].to_vec()).unwrap();
    let data = bytes[10 + len..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    (header, data)
}

#[test]
fn grayscale_then_rescale_writes_equal_float_channels() {
    let input = assert_fs::TempDir::new().unwrap();
    RgbImage::from_pixel(6, 4, Rgb([255, 255, 255]))
        .save(input.child("white.png").path())
        .unwrap();
    let output = assert_fs::TempDir::new().unwrap();

    let mut pipeline = Pipeline::new();
    pipeline.add(Read::new(input.path()).unwrap()).unwrap();
    pipeline.add(Grayscale::new()).unwrap();
    pipeline.add(Rescale::default()).unwrap();
    pipeline
        .add(Save::new(output.path(), SaveFormat::Npy).unwrap().named("unit"))
        .unwrap();

    pipeline.transform().unwrap();

    let (header, data) = read_f32_npy(output.child("unit_0_white.png.npy").path());
    assert!(header.contains("'descr': '<f4'"));
    assert!(header.contains("'shape': (4, 6, 3)"));
    assert_eq!(data.len(), 4 * 6 * 3);
    assert!(data.iter().all(|v| (v - 1.0).abs() < 1e-4));
}

#[test]
fn crop_that_does_not_fit_writes_nothing() {
    let input = source_dir(&["a.png", "b.png"]);
    let output = assert_fs::TempDir::new().unwrap();

    let mut pipeline = Pipeline::new();
    pipeline.add(Read::new(input.path()).unwrap()).unwrap();
    pipeline.add(Crop::new(80, 80, 40, 40).unwrap()).unwrap();
    pipeline
        .add(Save::new(output.path(), SaveFormat::Img).unwrap())
        .unwrap();

    let report = pipeline.transform().unwrap();

    assert_eq!(report.processed_items, 2);
    assert_eq!(report.images_out, 0);
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

fn with_corrupt_file() -> assert_fs::TempDir {
    let input = source_dir(&["a.png", "c.png"]);
    input
        .child("b.png")
        .write_str("this is not a valid image file")
        .unwrap();
    input
}

fn resize_pipeline(input: &Path) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.add(Read::new(input).unwrap()).unwrap();
    pipeline
        .add(Resize::new((10, 10), Interpolation::Area).unwrap())
        .unwrap();
    pipeline
}

#[test]
fn corrupt_file_aborts_by_default() {
    let input = with_corrupt_file();

    let result = resize_pipeline(input.path()).transform();

    match result {
        Err(ExecutionError::Decode { path, .. }) => assert!(path.ends_with("b.png")),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[test]
fn corrupt_file_is_skipped_when_asked() {
    let input = with_corrupt_file();

    for parallel in [false, true] {
        let executor = Executor::new(
            ExecutorConfig::new()
                .parallel(parallel)
                .on_failure(FailurePolicy::Skip),
        );
        let report = executor.run(&resize_pipeline(input.path())).unwrap();

        assert_eq!(report.total_items, 3);
        assert_eq!(report.processed_items, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].identifier, "b.png");
    }
}

#[test]
fn missing_source_directory_fails_before_any_item() {
    let dir = assert_fs::TempDir::new().unwrap();
    let result = resize_pipeline(&dir.path().join("nope")).transform();
    assert!(matches!(result, Err(ExecutionError::ReadDirectory { .. })));
}
