//! ONNX Runtime embedding pipeline for sentence-transformers models.
//!
//! Category labels are short multilingual strings ("Producto", "Brand"), so
//! the default model is paraphrase-multilingual-MiniLM-L12-v2 (384
//! dimensions). The model directory must contain `model.onnx` and
//! `tokenizer.json`. Embeddings are mean-pooled over the attention mask and
//! L2-normalized, so cosine similarity is a plain dot product.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::provider::EmbeddingProvider;

/// Label strings are a handful of tokens; anything longer is truncated.
const MAX_TOKENS: usize = 128;

/// Sentence embedding generator backed by ONNX Runtime.
pub struct OnnxEmbedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl OnnxEmbedder {
    /// Load a model from a directory containing `model.onnx` and `tokenizer.json`.
    ///
    /// This is the expensive step (several seconds); callers that may not
    /// need embeddings at all should go through [`LazyEmbedder`] instead.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        // Infer the embedding dimension from the model output shape.
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        // Pad every input in a batch to the same length.
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality (384 for the MiniLM family).
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn run_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flat input tensors of shape [batch_size, seq_len].
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];

        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings come back as [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {seq_len}, {}]",
            self.dim
        );

        let actual_seq_len = dims[1] as usize;

        // Mean pooling over the attention mask, then L2 normalization.
        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut pooled = vec![0.0f32; self.dim];
            let mut token_count = 0.0f32;

            for j in 0..actual_seq_len {
                let mask_val = attention_mask[i * seq_len + j] as f32;
                if mask_val > 0.0 {
                    let offset = (i * actual_seq_len + j) * self.dim;
                    for (d, p) in pooled.iter_mut().enumerate() {
                        *p += output_data[offset + d] * mask_val;
                    }
                    token_count += mask_val;
                }
            }

            if token_count > 0.0 {
                for p in &mut pooled {
                    *p /= token_count;
                }
            }
            normalize(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

impl EmbeddingProvider for OnnxEmbedder {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.run_batch(texts)
    }
}

/// Deferred-loading wrapper around [`OnnxEmbedder`].
///
/// Holds only the model directory until the first `embed_batch` call, so a
/// semantic run whose detected labels all exact-match the master list never
/// pays the model-load cost. Once loaded, the session is reused for the
/// rest of the process.
pub struct LazyEmbedder {
    model_dir: PathBuf,
    inner: Option<OnnxEmbedder>,
}

impl LazyEmbedder {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            inner: None,
        }
    }

    /// Whether the underlying model has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.inner.is_some()
    }

    fn loaded(&mut self) -> anyhow::Result<&mut OnnxEmbedder> {
        if self.inner.is_none() {
            info!(dir = %self.model_dir.display(), "loading embedding model on first use");
            self.inner = Some(OnnxEmbedder::load(&self.model_dir)?);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("embedder failed to initialize"))
    }
}

impl EmbeddingProvider for LazyEmbedder {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.loaded()?.embed_batch(texts)
    }
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the embedding dim.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::cosine_sim;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("paraphrase-multilingual-MiniLM-L12-v2")
    }

    fn require_model() -> PathBuf {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Download from HuggingFace:\n  \
                 curl -L -o models/paraphrase-multilingual-MiniLM-L12-v2/model.onnx \
                 https://huggingface.co/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2/resolve/main/onnx/model.onnx"
            );
        }
        dir
    }

    #[test]
    fn lazy_embedder_defers_load() {
        // Construction must not touch the filesystem.
        let lazy = LazyEmbedder::new("/nonexistent/model/dir");
        assert!(!lazy.is_loaded());
    }

    #[test]
    fn lazy_embedder_surfaces_load_failure_on_first_use() {
        let mut lazy = LazyEmbedder::new("/nonexistent/model/dir");
        let err = lazy.embed_batch(&["Producto"]).unwrap_err();
        assert!(err.to_string().contains("model.onnx"));
    }

    #[test]
    fn load_model() {
        let dir = require_model();
        let embedder = OnnxEmbedder::load(&dir).unwrap();
        assert_eq!(embedder.dim(), 384);
    }

    #[test]
    fn embeds_unit_vectors() {
        let dir = require_model();
        let mut embedder = OnnxEmbedder::load(&dir).unwrap();
        let vecs = embedder
            .embed_batch(&["Producto", "Blog", "Contacto"])
            .unwrap();
        assert_eq!(vecs.len(), 3);
        for (i, v) in vecs.iter().enumerate() {
            assert_eq!(v.len(), 384, "label {i} has wrong dimension");
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!(
                (norm - 1.0).abs() < 1e-4,
                "label {i}: expected unit norm, got {norm}"
            );
        }
    }

    #[test]
    fn cross_language_labels_are_closer_than_unrelated_ones() {
        let dir = require_model();
        let mut embedder = OnnxEmbedder::load(&dir).unwrap();

        let mut embed_one = |text: &str| {
            embedder
                .embed_batch(&[text])
                .unwrap()
                .into_iter()
                .next()
                .unwrap()
        };

        let producto = embed_one("Producto");
        let product = embed_one("Product");
        let contact = embed_one("Contact");

        let sim_translation = cosine_sim(&producto, &product);
        let sim_unrelated = cosine_sim(&producto, &contact);

        assert!(
            sim_translation > sim_unrelated,
            "Producto↔Product ({sim_translation:.4}) should beat Producto↔Contact ({sim_unrelated:.4})"
        );
    }

    #[test]
    fn embed_empty_batch() {
        let dir = require_model();
        let mut embedder = OnnxEmbedder::load(&dir).unwrap();
        let vecs = embedder.embed_batch(&[]).unwrap();
        assert!(vecs.is_empty());
    }
}
