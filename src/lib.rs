//! # Facesort Library
//!
//! Sorts photographs into per-person folders by matching detected faces
//! against a set of precomputed reference embeddings. Provides the encoding
//! pipeline (labeled photos → reference store) and the matching/sorting
//! pipeline (unlabeled photos → per-label folders).

pub mod cli;
pub mod config;
pub mod encoder;
pub mod face;
pub mod logger;
pub mod scanner;
pub mod sorter;
pub mod store;
pub mod types;
