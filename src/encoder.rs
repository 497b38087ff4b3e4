// Encoder - builds the reference store from labeled sample photos

use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::path::Path;

use crate::config::REFERENCE_SIZE;
use crate::face::FaceEncoder;
use crate::logger::{self, log, Level};
use crate::scanner;
use crate::store::ReferenceEntry;
use crate::types::Embedding;

/// Resizes every readable image under `dir` to a fixed square resolution and
/// converts it to grayscale, overwriting the file in place. Unreadable files
/// are logged and skipped. Returns (normalized, errors).
pub fn normalize_images(dir: &Path) -> (usize, usize) {
	let mut normalized = 0;
	let mut errors = 0;

	for path in scanner::collect_files(dir) {
		match normalize_one(&path) {
			Ok(()) => {
				logger::debug(&format!("Normalized {}", path.display()));
				normalized += 1;
			}
			Err(e) => {
				log(Level::Error, &format!("{}: {}", path.display(), e));
				errors += 1;
			}
		}
	}

	(normalized, errors)
}

fn normalize_one(path: &Path) -> Result<()> {
	let image = image::open(path).context("Unreadable image")?;
	let gray = image
		.resize_exact(REFERENCE_SIZE, REFERENCE_SIZE, FilterType::Triangle)
		.grayscale();
	gray.save(path).context("Failed to overwrite image")?;
	Ok(())
}

/// Extracts the first detected face's embedding from an image on disk, or
/// `None` when no face is found. Multiple faces in a reference photo are
/// reduced to the first (highest-confidence) detection — reference photos are
/// curated single-subject shots.
pub fn extract_embedding<E: FaceEncoder>(path: &Path, encoder: &mut E) -> Result<Option<Embedding>> {
	let image = image::open(path).context("Unreadable image")?;
	let mut embeddings = encoder.encode_faces(&image)?;
	if embeddings.is_empty() {
		Ok(None)
	} else {
		Ok(Some(embeddings.swap_remove(0)))
	}
}

/// Walks `dir` recursively, normalizes every image, and collects one
/// `(embedding, label)` entry per image with a detectable face. The label is
/// the immediate parent folder name. Entries appear in sorted path order.
pub fn build_store<E: FaceEncoder>(dir: &Path, encoder: &mut E) -> Result<Vec<ReferenceEntry>> {
	if !dir.is_dir() {
		anyhow::bail!("Reference directory not found: {}", dir.display());
	}

	let (normalized, errors) = normalize_images(dir);
	log(
		Level::Info,
		&format!("Normalized {} reference photos ({} errors)", normalized, errors),
	);

	let mut entries = Vec::new();

	for path in scanner::collect_files(dir) {
		let Some(name) = scanner::label_for(&path) else {
			continue;
		};

		match extract_embedding(&path, encoder) {
			Ok(Some(embedding)) => {
				logger::debug(&format!("Encoded {} as {}", path.display(), name));
				entries.push(ReferenceEntry { encoding: embedding.0, name });
			}
			Ok(None) => {
				// No face is a silent skip: blurry or mislabeled reference
				// photos simply contribute nothing
				logger::debug(&format!("No face in {}", path.display()));
			}
			Err(e) => {
				log(Level::Error, &format!("{}: {}", path.display(), e));
			}
		}
	}

	Ok(entries)
}
