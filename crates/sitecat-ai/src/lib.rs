//! AI layer: embedding provider boundary and semantic label reconciliation.

mod provider;
mod reconcile;

pub use provider::{EmbeddingProvider, cosine_sim};
pub use reconcile::categorize_semantic;

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::{LazyEmbedder, OnnxEmbedder};
