//! Application configuration and constants

use std::path::PathBuf;

// === Model Files ===
pub const DETECTOR_MODEL: &str = "scrfd_500m_bnkps.onnx";
pub const EMBEDDER_MODEL: &str = "w600k_r50.onnx";

// === Model Parameters ===
pub const DETECTOR_INPUT_SIZE: u32 = 640;
pub const EMBEDDER_INPUT_SIZE: u32 = 112;
pub const EMBEDDING_DIM: usize = 512;

// === Pipeline Parameters ===
/// Reference photos are normalized to this square resolution before encoding.
pub const REFERENCE_SIZE: u32 = 600;
/// Photos being sorted are resized to this width, preserving aspect ratio.
pub const SORT_BASE_WIDTH: u32 = 800;
/// Margin added around a detected face box before cropping for embedding.
pub const CROP_MARGIN: f32 = 0.2;

// === Matching ===
/// Maximum Euclidean distance between L2-normalized ArcFace embeddings for a
/// positive match. 1.1 corresponds to a cosine similarity of roughly 0.4.
pub const DEFAULT_TOLERANCE: f32 = 1.1;
pub const UNKNOWN_LABEL: &str = "Unknown";

// === Storage ===
pub const DEFAULT_STORE_FILE: &str = "encodings.json";

/// Get models directory (FACESORT_MODELS_DIR env var, or `models/` next to the
/// executable).
pub fn models_dir() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("FACESORT_MODELS_DIR") {
        let path = PathBuf::from(&env_path);
        if path.is_dir() {
            crate::logger::debug(&format!("Using FACESORT_MODELS_DIR: {}", env_path));
            return Some(path);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let models = dir.join("models");
            if models.is_dir() {
                crate::logger::debug(&format!("Found models at: {}", models.display()));
                return Some(models);
            }
        }
    }

    None
}

pub fn detector_model_path() -> Option<PathBuf> {
    models_dir().map(|d| d.join(DETECTOR_MODEL))
}

pub fn embedder_model_path() -> Option<PathBuf> {
    models_dir().map(|d| d.join(EMBEDDER_MODEL))
}
