// Matcher/Sorter - classifies face embeddings and routes files into
// per-label folders

use anyhow::{Context, Result};
use colored::Colorize;
use image::imageops::FilterType;
use image::DynamicImage;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crate::config::{SORT_BASE_WIDTH, UNKNOWN_LABEL};
use crate::face::FaceEncoder;
use crate::logger::{self, log, Level};
use crate::scanner;
use crate::store::ReferenceEntry;
use crate::types::Embedding;

/// Counters reported after a batch run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
	pub processed: usize,
	pub copied: usize,
	pub errors: usize,
}

/// Returns the label of the closest reference entry if its Euclidean distance
/// is within `tolerance`, else `Unknown`.
///
/// Ties break to the earliest entry in store order: the scan only replaces the
/// running minimum on a strictly smaller distance, so results are
/// deterministic for a given store.
pub fn classify(probe: &Embedding, entries: &[ReferenceEntry], tolerance: f32) -> String {
	let mut best: Option<(f32, &str)> = None;

	for entry in entries {
		let d = probe.distance(&entry.encoding);
		match best {
			Some((best_d, _)) if best_d <= d => {}
			_ => best = Some((d, &entry.name)),
		}
	}

	match best {
		Some((d, name)) if d <= tolerance => name.to_string(),
		_ => UNKNOWN_LABEL.to_string(),
	}
}

/// Walks `source` recursively and copies each file into `target/<label>/` for
/// every distinct identity recognized in it. Files with no detected face (or
/// only unrecognized faces) go to `target/Unknown/`. Per-file failures are
/// logged and skipped; the batch always runs to completion.
///
/// `on_progress(processed, total)` fires after every file, success or failure,
/// so progress always reaches `(total, total)`. `on_complete()` fires once
/// after the walk.
pub fn process_batch<E: FaceEncoder>(
	source: &Path,
	target: &Path,
	entries: &[ReferenceEntry],
	encoder: &mut E,
	tolerance: f32,
	mut on_progress: impl FnMut(usize, usize),
	on_complete: impl FnOnce(),
) -> Result<BatchSummary> {
	fs::create_dir_all(target)
		.with_context(|| format!("Failed to create target directory {}", target.display()))?;

	let files = scanner::collect_files(source);
	let total = files.len();
	let mut summary = BatchSummary::default();

	for (index, path) in files.iter().enumerate() {
		let queue = format!("[{}/{}]", index + 1, total).bright_blue().bold();
		let name = path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| path.display().to_string());

		match sort_file(path, target, entries, encoder, tolerance) {
			Ok(labels) => {
				summary.copied += labels.len();
				let link = logger::hyperlink(&name, path);
				log(Level::Success, &format!("{} {} → {}", queue, link, labels.join(", ")));
			}
			Err(e) => {
				summary.errors += 1;
				log(Level::Error, &format!("{} {}: {}", queue, name, e));
			}
		}

		summary.processed += 1;
		on_progress(summary.processed, total);
	}

	on_complete();
	Ok(summary)
}

/// Classifies one file and copies it into each matching label folder. Returns
/// the distinct labels it was filed under.
fn sort_file<E: FaceEncoder>(
	path: &Path,
	target: &Path,
	entries: &[ReferenceEntry],
	encoder: &mut E,
	tolerance: f32,
) -> Result<Vec<String>> {
	let image = image::open(path).context("Unreadable image")?;
	let resized = resize_to_width(&image, SORT_BASE_WIDTH);
	// Embedding extraction expects 3-channel input
	let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

	let embeddings = encoder.encode_faces(&rgb)?;

	// One copy per distinct identity, not per face; BTreeSet also keeps the
	// copy order deterministic
	let mut labels: BTreeSet<String> = embeddings
		.iter()
		.map(|e| classify(e, entries, tolerance))
		.collect();
	if labels.is_empty() {
		labels.insert(UNKNOWN_LABEL.to_string());
	}

	let file_name = path.file_name().context("File has no name")?;

	for label in &labels {
		let dir = target.join(label);
		fs::create_dir_all(&dir)
			.with_context(|| format!("Failed to create {}", dir.display()))?;
		fs::copy(path, dir.join(file_name))
			.with_context(|| format!("Failed to copy into {}", dir.display()))?;
	}

	Ok(labels.into_iter().collect())
}

/// Resizes to a fixed width, preserving aspect ratio.
fn resize_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
	let height = ((image.height() as f64 / image.width() as f64) * width as f64).round() as u32;
	image.resize_exact(width, height.max(1), FilterType::Lanczos3)
}

/// Runs `process_batch` on a background thread so an interactive caller stays
/// responsive. The batch runs to completion; there is no cancellation.
pub fn spawn_batch<E, P, C>(
	source: PathBuf,
	target: PathBuf,
	entries: Vec<ReferenceEntry>,
	mut encoder: E,
	tolerance: f32,
	on_progress: P,
	on_complete: C,
) -> JoinHandle<Result<BatchSummary>>
where
	E: FaceEncoder + Send + 'static,
	P: FnMut(usize, usize) + Send + 'static,
	C: FnOnce() + Send + 'static,
{
	std::thread::spawn(move || {
		process_batch(&source, &target, &entries, &mut encoder, tolerance, on_progress, on_complete)
	})
}
