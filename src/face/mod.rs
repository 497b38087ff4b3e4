//! # Face Pipeline
//!
//! SCRFD face detection + ArcFace embedding extraction via ONNX Runtime.

pub mod detector;
pub mod embedder;

use anyhow::{Context, Result};
use image::DynamicImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

use crate::config::{self, CROP_MARGIN};
use crate::types::{Embedding, FaceBox};

pub use detector::FaceDetector;
pub use embedder::FaceEmbedder;

/// Seam between the batch pipelines and the ONNX models.
///
/// The encoder and sorter only ever talk to this trait, so both can be
/// exercised in tests with a scripted backend and no model files.
pub trait FaceEncoder {
    /// All face embeddings found in `image`, in detection-confidence order.
    /// An image with no detectable face yields an empty vec, not an error.
    fn encode_faces(&mut self, image: &DynamicImage) -> Result<Vec<Embedding>>;
}

pub(crate) fn create_session(model_path: &Path) -> Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load model {}", model_path.display()))
}

/// Detector + embedder composed into the production [`FaceEncoder`].
pub struct FacePipeline {
    detector: FaceDetector,
    embedder: FaceEmbedder,
}

impl FacePipeline {
    /// Loads both models from the models directory (FACESORT_MODELS_DIR or
    /// `models/` next to the executable). Missing models are fatal.
    pub fn new() -> Result<Self> {
        let detector_path = config::detector_model_path().with_context(|| {
            format!(
                "Models directory not found. Place {} and {} in a models/ directory next to the executable, \
                 or set FACESORT_MODELS_DIR",
                config::DETECTOR_MODEL,
                config::EMBEDDER_MODEL
            )
        })?;
        let embedder_path = config::embedder_model_path().context("Models directory not found")?;

        let detector = FaceDetector::load(&detector_path)?;
        let embedder = FaceEmbedder::load(&embedder_path)?;
        Ok(Self { detector, embedder })
    }
}

impl FaceEncoder for FacePipeline {
    fn encode_faces(&mut self, image: &DynamicImage) -> Result<Vec<Embedding>> {
        let faces = self.detector.detect(image)?;
        let mut embeddings = Vec::with_capacity(faces.len());

        for face in &faces {
            let crop = crop_face(image, face);
            match self.embedder.embed(&crop) {
                Ok(embedding) => embeddings.push(embedding),
                Err(e) => {
                    // One bad crop should not sink the other faces in the image
                    crate::logger::log(
                        crate::logger::Level::Warning,
                        &format!("Embedding extraction failed for one face: {}", e),
                    );
                }
            }
        }

        Ok(embeddings)
    }
}

/// Crops a detected face with margin, clamped to the image bounds.
fn crop_face(image: &DynamicImage, face: &FaceBox) -> DynamicImage {
    let margin_x = face.width() * CROP_MARGIN;
    let margin_y = face.height() * CROP_MARGIN;

    let x1 = (face.x1 - margin_x).max(0.0) as u32;
    let y1 = (face.y1 - margin_y).max(0.0) as u32;
    let x2 = ((face.x2 + margin_x) as u32).min(image.width());
    let y2 = ((face.y2 + margin_y) as u32).min(image.height());

    let w = x2.saturating_sub(x1).max(1);
    let h = y2.saturating_sub(y1).max(1);

    image.crop_imm(x1, y1, w, h)
}
