// Scanner - Discovers files for the encoding and sorting walks

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects every regular file under `root`, recursively, in sorted path
/// order. Sorting makes the reference store order (and therefore tie-breaks
/// during matching) deterministic across platforms.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
	let mut files: Vec<PathBuf> = WalkDir::new(root)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.path().to_path_buf())
		.collect();
	files.sort();
	files
}

/// The identity label for a reference photo: its immediate parent folder name.
pub fn label_for(path: &Path) -> Option<String> {
	path.parent()
		.and_then(|p| p.file_name())
		.map(|n| n.to_string_lossy().into_owned())
}
