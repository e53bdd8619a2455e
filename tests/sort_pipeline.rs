//! Sorting pipeline integration tests.
//!
//! These tests drive discovery, classification, and materialization against
//! real temporary directory trees, verifying that the sorted output mirrors
//! the input set exactly.

use std::{collections::BTreeSet, fs, path::Path};

use framesift::{FramesiftError, SortPlan, classify, discover_images, materialize};

fn touch(path: &Path) {
    fs::write(path, b"img").expect("Failed to write test image");
}

fn frame_set(root: &Path) -> BTreeSet<String> {
    discover_images(root, &[])
        .expect("Failed to discover images")
        .into_iter()
        .map(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .expect("Test image has a UTF-8 name")
                .to_string()
        })
        .collect()
}

#[test]
fn discovery_recurses_and_skips_non_images() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let nested = dir.path().join("nested");
    fs::create_dir_all(&nested).expect("Failed to create nested dir");

    touch(&dir.path().join("3_1_2023-07-17_10-00-00.jpg"));
    touch(&nested.join("4_2_2023-07-18_11-30-00.png"));
    touch(&dir.path().join("notes.txt"));

    let images = discover_images(dir.path(), &[]).expect("Discovery failed");
    assert_eq!(images.len(), 2);
}

#[test]
fn discovery_filters_on_metadata_fields() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    touch(&dir.path().join("3_1_2023-07-17_10-00-00.jpg"));
    touch(&dir.path().join("3_2_2023-07-17_11-00-00.jpg"));
    touch(&dir.path().join("4_1_2023-07-17_12-00-00.jpg"));

    let plan = SortPlan::parse(&["box", "3", "cam"]).expect("Plan should parse");
    let images = discover_images(dir.path(), &plan.filters).expect("Discovery failed");
    assert_eq!(images.len(), 2);
    for image in &images {
        let name = image.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("3_"), "Filtered out the wrong box: {name}");
    }
}

#[test]
fn discovery_with_filters_rejects_malformed_names() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    touch(&dir.path().join("3_1_2023-07-17_10-00-00.jpg"));
    touch(&dir.path().join("holiday-photo.jpg"));

    let plan = SortPlan::parse(&["box", "3"]).expect("Plan should parse");
    let result = discover_images(dir.path(), &plan.filters);
    assert!(matches!(result, Err(FramesiftError::MalformedName { .. })));

    // Without filters no name is parsed, so the same tree discovers fine.
    let images = discover_images(dir.path(), &[]).expect("Unfiltered discovery failed");
    assert_eq!(images.len(), 2);
}

#[test]
fn materialized_tree_mirrors_the_classification() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("frames");
    let dest = dir.path().join("sorted");
    fs::create_dir_all(&source).expect("Failed to create source dir");

    touch(&source.join("3_1_2023-07-17_10-00-00.jpg"));
    touch(&source.join("3_2_2023-07-17_10-05-00.jpg"));
    touch(&source.join("4_1_2023-07-18_22-00-00.jpg"));

    let plan = SortPlan::parse(&["box", "cam"]).expect("Plan should parse");
    let images = discover_images(&source, &plan.filters).expect("Discovery failed");
    let tree = classify(images, &plan.keys).expect("Classification failed");
    let copied = materialize(&tree, &dest).expect("Materialization failed");

    assert_eq!(copied, 3);
    assert!(dest.join("box_3/cam_1/3_1_2023-07-17_10-00-00.jpg").exists());
    assert!(dest.join("box_3/cam_2/3_2_2023-07-17_10-05-00.jpg").exists());
    assert!(dest.join("box_4/cam_1/4_1_2023-07-18_22-00-00.jpg").exists());
}

#[test]
fn materialization_copies_without_touching_the_source() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("frames");
    let dest = dir.path().join("sorted");
    fs::create_dir_all(&source).expect("Failed to create source dir");

    for name in [
        "3_1_2023-07-17_10-00-00.jpg",
        "3_1_2023-07-17_10-00-30.jpg",
        "5_2_2023-08-01_09-15-00.jpg",
    ] {
        touch(&source.join(name));
    }
    let before = frame_set(&source);

    let plan = SortPlan::parse(&["box", "hour"]).expect("Plan should parse");
    let images = discover_images(&source, &plan.filters).expect("Discovery failed");
    let tree = classify(images, &plan.keys).expect("Classification failed");
    materialize(&tree, &dest).expect("Materialization failed");

    // Every input frame appears in the output, and the source is untouched.
    assert_eq!(frame_set(&dest), before);
    assert_eq!(frame_set(&source), before);
}

#[test]
fn classification_is_deterministic() {
    let images: Vec<_> = [
        "7_1_2023-07-17_10-00-00.jpg",
        "3_2_2023-07-17_11-00-00.jpg",
        "3_1_2023-07-18_12-00-00.jpg",
    ]
    .iter()
    .map(std::path::PathBuf::from)
    .collect();
    let keys = [framesift::SortKey::Box, framesift::SortKey::Day];

    let first = classify(images.clone(), &keys).expect("Classification failed");
    let second = classify(images, &keys).expect("Classification failed");
    assert_eq!(first, second);
}

#[test]
fn time_buckets_are_zero_padded() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("frames");
    let dest = dir.path().join("sorted");
    fs::create_dir_all(&source).expect("Failed to create source dir");

    touch(&source.join("3_1_2023-07-17_09-05-00.jpg"));

    let plan = SortPlan::parse(&["month", "hour"]).expect("Plan should parse");
    let images = discover_images(&source, &plan.filters).expect("Discovery failed");
    let tree = classify(images, &plan.keys).expect("Classification failed");
    materialize(&tree, &dest).expect("Materialization failed");

    assert!(dest.join("month_07/hour_09/3_1_2023-07-17_09-05-00.jpg").exists());
}
