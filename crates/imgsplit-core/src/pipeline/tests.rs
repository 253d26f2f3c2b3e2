//! Tests for the batch driver
//!
//! These run the full decode -> split -> write path on synthetic images.

use super::*;
use crate::models::OutputFormat;
use crate::resolver::Unresolved;
use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn save_gradient(path: &Path, width: u32, height: u32) {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 77]));
    DynamicImage::ImageRgb8(image).save(path).unwrap();
}

fn resolution(output_dir: &Path, sources: &[PathBuf]) -> Resolution {
    Resolution {
        output_dir: output_dir.to_path_buf(),
        work_items: sources
            .iter()
            .map(|source| WorkItem {
                source_file: source.clone(),
                output_dir: output_dir.to_path_buf(),
            })
            .collect(),
        unresolved: Vec::new(),
    }
}

fn options(rows: u32, cols: u32, threads: usize) -> BatchOptions {
    BatchOptions {
        plan: SplitPlan::new(rows, cols).unwrap(),
        threads: Some(threads),
    }
}

// ========================================================================
// process_item Tests
// ========================================================================

#[test]
fn test_process_item_writes_all_tiles() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("photo.png");
    save_gradient(&source, 10, 6);
    let item = WorkItem {
        source_file: source,
        output_dir: dir.path().join("out"),
    };

    let writer = OutputWriter::new(OutputFormat::Preserve);
    let status = process_item(&item, SplitPlan::new(2, 3).unwrap(), &writer);

    let FileStatus::Success { outputs } = status else {
        panic!("expected success, got {status:?}");
    };
    assert_eq!(outputs.len(), 6);
    assert_eq!(outputs[0], item.output_dir.join("photo_0_0.png"));
    assert_eq!(outputs[5], item.output_dir.join("photo_1_2.png"));

    let last = image::open(&outputs[5]).unwrap();
    assert_eq!((last.width(), last.height()), (4, 3));
}

#[test]
fn test_single_cell_plan_round_trips_pixels() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("whole.png");
    save_gradient(&source, 7, 5);
    let item = WorkItem {
        source_file: source.clone(),
        output_dir: dir.path().join("out"),
    };

    let writer = OutputWriter::new(OutputFormat::Preserve);
    let status = process_item(&item, SplitPlan::new(1, 1).unwrap(), &writer);

    let FileStatus::Success { outputs } = status else {
        panic!("expected success, got {status:?}");
    };
    assert_eq!(outputs, vec![item.output_dir.join("whole_0_0.png")]);
    assert_eq!(
        image::open(&outputs[0]).unwrap().to_rgb8(),
        image::open(&source).unwrap().to_rgb8()
    );
}

#[test]
fn test_converts_to_override_format() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("photo.png");
    save_gradient(&source, 4, 4);
    let item = WorkItem {
        source_file: source,
        output_dir: dir.path().join("out"),
    };

    let writer = OutputWriter::new(OutputFormat::Override("jpg".to_string()));
    let status = process_item(&item, SplitPlan::default(), &writer);

    let FileStatus::Success { outputs } = status else {
        panic!("expected success, got {status:?}");
    };
    assert!(outputs.iter().all(|p| p.extension().unwrap() == "jpg"));
    let format = image::ImageReader::open(&outputs[0])
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .format();
    assert_eq!(format, Some(image::ImageFormat::Jpeg));
}

#[test]
fn test_corrupt_source_fails() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("broken.png");
    fs::write(&source, b"not a png").unwrap();
    let item = WorkItem {
        source_file: source,
        output_dir: dir.path().join("out"),
    };

    let status = process_item(&item, SplitPlan::default(), &OutputWriter::new(OutputFormat::Preserve));
    assert!(matches!(status, FileStatus::Failed { .. }), "{status:?}");
    assert!(status.reason().unwrap().contains("broken.png"));
}

#[test]
fn test_image_smaller_than_grid_is_skipped() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("tiny.png");
    save_gradient(&source, 1, 1);
    let item = WorkItem {
        source_file: source,
        output_dir: dir.path().join("out"),
    };

    let status = process_item(&item, SplitPlan::default(), &OutputWriter::new(OutputFormat::Preserve));
    assert!(matches!(status, FileStatus::Skipped { .. }), "{status:?}");
}

// ========================================================================
// run_batch Tests
// ========================================================================

#[test]
fn test_batch_keeps_going_after_failures() {
    let dir = tempdir().unwrap();
    let good_a = dir.path().join("a.png");
    let broken = dir.path().join("b.png");
    let good_c = dir.path().join("c.png");
    save_gradient(&good_a, 8, 8);
    fs::write(&broken, b"garbage").unwrap();
    save_gradient(&good_c, 8, 8);

    let out = dir.path().join("out");
    let mut resolution = resolution(&out, &[good_a.clone(), broken.clone(), good_c.clone()]);
    resolution.unresolved.push(Unresolved {
        token: "missing.png".to_string(),
        reason: "no such file or directory".to_string(),
    });

    let writer = OutputWriter::new(OutputFormat::Preserve);
    let summary = run_batch(&resolution, &options(2, 2, 2), &writer, &AtomicBool::new(false)).unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.tiles_written(), 8);
    assert!(summary.has_problems());

    // Reports follow work-list order, unresolved inputs last
    let sources: Vec<&str> = summary.files.iter().map(|f| f.source.as_str()).collect();
    assert_eq!(
        sources,
        vec![
            good_a.display().to_string().as_str(),
            broken.display().to_string().as_str(),
            good_c.display().to_string().as_str(),
            "missing.png"
        ]
    );
}

#[test]
fn test_cancelled_batch_starts_nothing() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a.png");
    save_gradient(&source, 4, 4);
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    let writer = OutputWriter::new(OutputFormat::Preserve);
    let summary = run_batch(
        &resolution(&out, &[source]),
        &options(2, 2, 1),
        &writer,
        &AtomicBool::new(true),
    )
    .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.files[0].status.reason(), Some(CANCELLED));
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[test]
fn test_parallel_batch_with_same_stem_never_overwrites() {
    let dir = tempdir().unwrap();
    let mut sources = Vec::new();
    for sub in ["one", "two", "three", "four"] {
        let source = dir.path().join(sub).join("photo.png");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        save_gradient(&source, 6, 6);
        sources.push(source);
    }
    let out = dir.path().join("out");

    let writer = OutputWriter::new(OutputFormat::Preserve);
    let summary = run_batch(&resolution(&out, &sources), &options(2, 2, 4), &writer, &AtomicBool::new(false))
        .unwrap();

    assert_eq!(summary.succeeded, 4);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 16);
    assert!(out.join("photo_1_1_3.png").exists());
}

#[test]
fn test_empty_batch_is_clean() {
    let dir = tempdir().unwrap();
    let writer = OutputWriter::new(OutputFormat::Preserve);
    let summary = run_batch(
        &resolution(dir.path(), &[]),
        &BatchOptions::default(),
        &writer,
        &AtomicBool::new(false),
    )
    .unwrap();

    assert!(summary.files.is_empty());
    assert!(!summary.has_problems());
}
