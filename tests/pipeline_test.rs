// End-to-end tests for the sorting pipeline, driven through a fake embedding
// backend so no model files are needed.

use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use facesort::face::FaceEncoder;
use facesort::sorter::{process_batch, spawn_batch};
use facesort::store::ReferenceEntry;
use facesort::types::Embedding;

const TOLERANCE: f32 = 0.5;

fn alice() -> Vec<f32> {
    vec![1.0, 0.0, 0.0, 0.0]
}

fn bob() -> Vec<f32> {
    vec![0.0, 1.0, 0.0, 0.0]
}

fn reference_store() -> Vec<ReferenceEntry> {
    vec![
        ReferenceEntry { encoding: alice(), name: "alice".into() },
        ReferenceEntry { encoding: bob(), name: "bob".into() },
    ]
}

/// Maps the top-left pixel color of each test image to scripted face
/// embeddings: red → alice, blue → bob, green → alice + bob,
/// yellow → a stranger, anything else → no faces.
struct FakeEncoder;

impl FaceEncoder for FakeEncoder {
    fn encode_faces(&mut self, image: &DynamicImage) -> Result<Vec<Embedding>> {
        let px = image.to_rgb8().get_pixel(0, 0).0;
        let (r, g, b) = (px[0] > 200, px[1] > 200, px[2] > 200);

        Ok(match (r, g, b) {
            (true, false, false) => vec![Embedding::raw(alice())],
            (false, false, true) => vec![Embedding::raw(bob())],
            (false, true, false) => vec![Embedding::raw(alice()), Embedding::raw(bob())],
            (true, true, false) => vec![Embedding::raw(vec![0.0, 0.0, 1.0, 0.0])],
            _ => vec![],
        })
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("facesort-pipeline-{}-{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_photo(path: &Path, color: [u8; 3]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(16, 16, Rgb(color)).save(path).unwrap();
}

#[test]
fn known_face_routed_to_its_label_only() {
    let root = temp_dir("known-face");
    let source = root.join("source");
    let target = root.join("target");
    write_photo(&source.join("red.png"), [255, 0, 0]);

    let summary = process_batch(
        &source,
        &target,
        &reference_store(),
        &mut FakeEncoder,
        TOLERANCE,
        |_, _| {},
        || {},
    )
    .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.copied, 1);
    assert_eq!(summary.errors, 0);

    assert!(target.join("alice/red.png").is_file());
    assert!(!target.join("bob").exists());
    assert!(!target.join("Unknown").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn faceless_and_stranger_files_go_to_unknown() {
    let root = temp_dir("unknown");
    let source = root.join("source");
    let target = root.join("target");
    write_photo(&source.join("white.png"), [255, 255, 255]);
    write_photo(&source.join("yellow.png"), [255, 255, 0]);

    process_batch(
        &source,
        &target,
        &reference_store(),
        &mut FakeEncoder,
        TOLERANCE,
        |_, _| {},
        || {},
    )
    .unwrap();

    assert!(target.join("Unknown/white.png").is_file());
    assert!(target.join("Unknown/yellow.png").is_file());
    assert!(!target.join("alice").exists());
    assert!(!target.join("bob").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn two_faces_copied_to_both_labels_once_each() {
    let root = temp_dir("two-faces");
    let source = root.join("source");
    let target = root.join("target");
    write_photo(&source.join("green.png"), [0, 255, 0]);

    let summary = process_batch(
        &source,
        &target,
        &reference_store(),
        &mut FakeEncoder,
        TOLERANCE,
        |_, _| {},
        || {},
    )
    .unwrap();

    assert_eq!(summary.copied, 2);
    assert!(target.join("alice/green.png").is_file());
    assert!(target.join("bob/green.png").is_file());
    assert!(!target.join("Unknown").exists());

    // one copy per label folder, no duplicates within one
    let alice_files: Vec<_> = fs::read_dir(target.join("alice")).unwrap().collect();
    assert_eq!(alice_files.len(), 1);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn progress_reaches_total_despite_per_file_errors() {
    let root = temp_dir("progress");
    let source = root.join("source");
    let target = root.join("target");
    write_photo(&source.join("red.png"), [255, 0, 0]);
    write_photo(&source.join("sub/blue.png"), [0, 0, 255]);
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("broken.jpg"), b"definitely not a jpeg").unwrap();

    let mut progress: Vec<(usize, usize)> = Vec::new();
    let completed = std::cell::Cell::new(false);

    let summary = process_batch(
        &source,
        &target,
        &reference_store(),
        &mut FakeEncoder,
        TOLERANCE,
        |processed, total| progress.push((processed, total)),
        || completed.set(true),
    )
    .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.errors, 1);
    assert!(completed.get());

    // one callback per file, strictly increasing, constant total, ends at (N, N)
    assert_eq!(progress.len(), 3);
    for (i, &(processed, total)) in progress.iter().enumerate() {
        assert_eq!(processed, i + 1);
        assert_eq!(total, 3);
    }
    assert_eq!(*progress.last().unwrap(), (3, 3));

    // the unreadable file was not copied anywhere
    assert!(target.join("alice/red.png").is_file());
    assert!(target.join("bob/blue.png").is_file());
    for label_dir in fs::read_dir(&target).unwrap() {
        let label_dir = label_dir.unwrap();
        assert!(!label_dir.path().join("broken.jpg").exists());
    }

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn empty_source_completes_immediately() {
    let root = temp_dir("empty-source");
    let source = root.join("source");
    let target = root.join("target");
    fs::create_dir_all(&source).unwrap();

    let mut calls = 0;
    let completed = std::cell::Cell::new(false);

    let summary = process_batch(
        &source,
        &target,
        &reference_store(),
        &mut FakeEncoder,
        TOLERANCE,
        |_, _| calls += 1,
        || completed.set(true),
    )
    .unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(calls, 0);
    assert!(completed.get());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn background_batch_reports_progress_and_completion() {
    let root = temp_dir("background");
    let source = root.join("source");
    let target = root.join("target");
    write_photo(&source.join("red.png"), [255, 0, 0]);
    write_photo(&source.join("blue.png"), [0, 0, 255]);

    let progress: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let completions = Arc::new(AtomicUsize::new(0));

    let progress_sink = Arc::clone(&progress);
    let completions_sink = Arc::clone(&completions);

    let handle = spawn_batch(
        source,
        target.clone(),
        reference_store(),
        FakeEncoder,
        TOLERANCE,
        move |processed, total| progress_sink.lock().unwrap().push((processed, total)),
        move || {
            completions_sink.fetch_add(1, Ordering::SeqCst);
        },
    );

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(*progress.lock().unwrap().last().unwrap(), (2, 2));

    assert!(target.join("alice/red.png").is_file());
    assert!(target.join("bob/blue.png").is_file());

    fs::remove_dir_all(&root).unwrap();
}
