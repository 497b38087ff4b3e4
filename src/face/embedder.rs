//! ArcFace face embedder
//!
//! Extracts 512-dimensional identity embeddings from face crops using the
//! w600k_r50 ArcFace model.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;

use crate::config::{EMBEDDER_INPUT_SIZE, EMBEDDING_DIM};
use crate::logger;
use crate::types::Embedding;

const MEAN: f32 = 127.5;
// ArcFace uses symmetric normalization, not the detector's 128.0
const STD: f32 = 127.5;

pub struct FaceEmbedder {
    session: Session,
    input_name: String,
}

impl FaceEmbedder {
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!(
                "Embedder model not found: {} — download w600k_r50.onnx from insightface",
                model_path.display()
            );
        }

        let session = super::create_session(model_path).context("Failed to load face embedder")?;
        let input_name = session.inputs()[0].name().to_string();
        logger::debug(&format!("ArcFace loaded, input tensor: {}", input_name));

        Ok(Self { session, input_name })
    }

    /// Embed a single face crop. The crop is resized to 112×112 internally.
    pub fn embed(&mut self, crop: &DynamicImage) -> Result<Embedding> {
        let (shape, data) = preprocess(crop);
        let input = Value::from_array((shape, data)).context("Failed to build embedder input")?;

        let input_name = self.input_name.clone();
        let outputs = self
            .session
            .run(ort::inputs![input_name => input])
            .context("ArcFace inference failed")?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Bad embedding tensor")?;

        if raw.len() != EMBEDDING_DIM {
            anyhow::bail!("Expected {}-dim embedding, got {}", EMBEDDING_DIM, raw.len());
        }

        Ok(Embedding::new(raw.to_vec()))
    }
}

/// Resize to 112×112 and convert to a normalized RGB NCHW tensor.
fn preprocess(crop: &DynamicImage) -> (Vec<usize>, Vec<f32>) {
    let size = EMBEDDER_INPUT_SIZE;
    let resized = crop.resize_exact(size, size, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let dim = size as usize;
    let shape = vec![1, 3, dim, dim];
    let mut data = Vec::with_capacity(3 * dim * dim);

    for c in 0..3usize {
        for y in 0..size {
            for x in 0..size {
                let px = rgb.get_pixel(x, y);
                data.push((px[c] as f32 - MEAN) / STD);
            }
        }
    }

    (shape, data)
}
