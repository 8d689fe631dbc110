//! The embedding capability boundary.
//!
//! Semantic reconciliation only needs two things from a model: a text →
//! vector function and cosine similarity. Any provider producing a
//! fixed-dimension real vector per string satisfies the contract, so tests
//! substitute a deterministic stub instead of loading model weights.

/// A text-embedding capability.
///
/// Implementations should return one L2-normalized vector per input text,
/// all of the same dimension. Takes `&mut self` because inference sessions
/// are stateful and lazy implementations load on first use.
pub trait EmbeddingProvider {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vecs = self.embed_batch(&[text])?;
        vecs.pop()
            .ok_or_else(|| anyhow::anyhow!("provider returned no embedding for {text:?}"))
    }
}

/// Cosine similarity for L2-normalized vectors (plain dot product).
pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
