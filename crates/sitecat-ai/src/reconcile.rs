//! Semantic reconciliation of detected labels against a master taxonomy.
//!
//! When two sites word the same section differently ("Producto" vs "Shop"),
//! pattern detection alone produces incomparable distributions. This pass
//! re-assigns each detected label to the closest master-list entry by
//! embedding similarity, so independently-labeled datasets align to one
//! taxonomy.

use std::collections::HashMap;

use anyhow::Context;
use tracing::debug;

use sitecat_core::taxonomy::{FALLBACK_CONFIDENCE, SIMILARITY_THRESHOLD};
use sitecat_core::{Classification, Detection, detect};

use crate::provider::{EmbeddingProvider, cosine_sim};

/// Categorize a batch against a fixed master category list, reconciling
/// mismatched labels by embedding similarity.
///
/// Per URL: an undetermined detection becomes `("Other", 0.0)`; a detected
/// label already in `master` is adopted at confidence 1.0 without touching
/// the provider; otherwise the label's embedding is compared against every
/// master embedding and the best match is adopted when its cosine
/// similarity reaches [`SIMILARITY_THRESHOLD`], at that similarity.
/// Below the threshold the raw detected label is kept at confidence 0.5.
///
/// Master embeddings are computed at most once per call, and detected-label
/// embeddings once per distinct label, so provider cost scales with the
/// number of distinct labels needing reconciliation rather than with the
/// URL count. A provider failure aborts the whole call; there is no
/// pattern-only fallback.
pub fn categorize_semantic<S, P>(
    urls: &[S],
    master: &[String],
    provider: &mut P,
) -> anyhow::Result<Vec<Classification>>
where
    S: AsRef<str>,
    P: EmbeddingProvider + ?Sized,
{
    let mut master_cache: Option<Vec<Vec<f32>>> = None;
    let mut label_cache: HashMap<&'static str, Vec<f32>> = HashMap::new();
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        let url = url.as_ref();

        let label = match detect(url) {
            Detection::Undetermined => {
                results.push(Classification::other(url));
                continue;
            }
            Detection::Category(label) => label,
        };

        // Exact master-list hit: no embedding work needed.
        if master.iter().any(|m| m == label) {
            results.push(Classification::new(url, label, 1.0));
            continue;
        }

        // An empty master list has nothing to reconcile against.
        if master.is_empty() {
            results.push(Classification::new(url, label, FALLBACK_CONFIDENCE));
            continue;
        }

        if !label_cache.contains_key(label) {
            let vec = provider
                .embed(label)
                .with_context(|| format!("embedding detected label {label:?}"))?;
            label_cache.insert(label, vec);
        }
        let label_vec = &label_cache[label];

        let masters = master_embeddings(&mut master_cache, master, provider)?;
        let (best_idx, best_sim) = best_match(masters, label_vec);
        debug!(url, label, best = %master[best_idx], sim = best_sim, "reconciled");

        if best_sim >= SIMILARITY_THRESHOLD {
            // Dot products of normalized vectors can drift past 1.0 in f32.
            results.push(Classification::new(
                url,
                master[best_idx].clone(),
                best_sim.min(1.0),
            ));
        } else {
            results.push(Classification::new(url, label, FALLBACK_CONFIDENCE));
        }
    }

    Ok(results)
}

/// Embed the master list on first use, then reuse the cached vectors.
fn master_embeddings<'a, P>(
    cache: &'a mut Option<Vec<Vec<f32>>>,
    master: &[String],
    provider: &mut P,
) -> anyhow::Result<&'a [Vec<f32>]>
where
    P: EmbeddingProvider + ?Sized,
{
    if cache.is_none() {
        let texts: Vec<&str> = master.iter().map(String::as_str).collect();
        let embedded = provider
            .embed_batch(&texts)
            .context("embedding master categories")?;
        *cache = Some(embedded);
    }
    Ok(cache.as_deref().unwrap_or_default())
}

/// Index and similarity of the closest master embedding.
fn best_match(masters: &[Vec<f32>], embedding: &[f32]) -> (usize, f32) {
    let mut best_idx = 0;
    let mut best_sim = f32::NEG_INFINITY;

    for (idx, candidate) in masters.iter().enumerate() {
        let sim = cosine_sim(embedding, candidate);
        if sim > best_sim {
            best_sim = sim;
            best_idx = idx;
        }
    }

    (best_idx, best_sim)
}
