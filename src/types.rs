//! Core domain types
//!
//! - `Embedding`: fixed-length face vector compared by Euclidean distance
//! - `FaceBox`: a detected face region in original-image coordinates

/// Face embedding vector produced by the recognition model.
///
/// Embeddings are L2-normalized during construction so that Euclidean
/// distance is a stable identity metric across lighting and exposure.
#[derive(Debug, Clone)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
	/// Creates a new embedding with automatic L2 normalization.
	pub fn new(data: Vec<f32>) -> Self {
		Self(normalize(&data))
	}

	/// Creates an embedding from already-normalized data (for deserialization
	/// and tests).
	pub fn raw(data: Vec<f32>) -> Self {
		Self(data)
	}

	pub fn dim(&self) -> usize {
		self.0.len()
	}

	/// Euclidean distance to a stored reference vector. Lower = more similar.
	pub fn distance(&self, other: &[f32]) -> f32 {
		self.0
			.iter()
			.zip(other.iter())
			.map(|(a, b)| (a - b) * (a - b))
			.sum::<f32>()
			.sqrt()
	}
}

/// Normalizes a vector to unit length.
fn normalize(v: &[f32]) -> Vec<f32> {
	let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm > 0.0 {
		v.iter().map(|x| x / norm).collect()
	} else {
		v.to_vec()
	}
}

/// Bounding box for a detected face, in original-image pixel coordinates.
#[derive(Debug, Clone)]
pub struct FaceBox {
	pub x1: f32,
	pub y1: f32,
	pub x2: f32,
	pub y2: f32,
	pub confidence: f32,
}

impl FaceBox {
	pub fn width(&self) -> f32 {
		self.x2 - self.x1
	}

	pub fn height(&self) -> f32 {
		self.y2 - self.y1
	}

	pub fn area(&self) -> f32 {
		self.width().max(0.0) * self.height().max(0.0)
	}
}
