// Reference store - JSON persistence for (label, embedding) pairs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One reference face: the embedding and the identity it was labeled with.
///
/// Multiple entries per name are expected — matching is nearest-neighbor over
/// all entries, so extra reference photos of the same person improve recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
	pub encoding: Vec<f32>,
	pub name: String,
}

/// Serializes the full store, replacing any previous contents. Writes to a
/// sibling temp file first so a crash mid-write never leaves a truncated store.
pub fn save_store(entries: &[ReferenceEntry], path: &Path) -> Result<()> {
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent).context("Failed to create store directory")?;
		}
	}

	let json = serde_json::to_string(entries).context("Failed to serialize reference store")?;

	let mut tmp = path.as_os_str().to_owned();
	tmp.push(".tmp");
	let tmp = Path::new(&tmp);

	fs::write(tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
	fs::rename(tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
	Ok(())
}

/// Loads the store. A missing or malformed file is fatal: there is nothing
/// sensible to match against without it.
pub fn load_store(path: &Path) -> Result<Vec<ReferenceEntry>> {
	let data = fs::read_to_string(path)
		.with_context(|| format!("Failed to read reference store {}", path.display()))?;
	serde_json::from_str(&data)
		.with_context(|| format!("Malformed reference store {}", path.display()))
}
