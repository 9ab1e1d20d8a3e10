// src/ranking.rs
//! Relevance ranker: embeds a reference text and each candidate phrase in
//! one batched call, scores by cosine similarity, and produces a
//! deterministic total order.
//!
//! Tie-break contract (the only reproducible ordering guarantee offered):
//! higher score first, then shorter phrase, then lexicographic.

use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use crate::clients::embedding::Embedder;

/// Stabilizer added to each vector norm so degenerate all-zero embeddings
/// divide cleanly instead of panicking the score to NaN.
const NORM_EPSILON: f32 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct RankOptions {
    /// Truncate the ranked output to the top N entries, when set.
    pub top_k: Option<usize>,
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt() + NORM_EPSILON;
    let nb: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt() + NORM_EPSILON;
    dot / (na * nb)
}

#[derive(Clone)]
pub struct RelevanceRanker {
    embedder: Arc<dyn Embedder>,
}

impl RelevanceRanker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Reorder `candidates` by descending semantic relevance to
    /// `reference`. Embeds `[reference] + candidates` in one round trip;
    /// falls back to per-text calls if the batch call fails or returns an
    /// unusable shape. The fallback is logged, never surfaced.
    pub async fn rank(
        &self,
        reference: &str,
        candidates: &[String],
        opts: RankOptions,
    ) -> Result<Vec<String>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts: Vec<String> = Vec::with_capacity(candidates.len() + 1);
        texts.push(reference.to_string());
        texts.extend(candidates.iter().cloned());

        let embeddings = self.embed_all(&texts).await?;
        let (reference_vec, phrase_vecs) = embeddings
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("embedding backend returned no vectors"))?;

        let mut scored: Vec<(&String, f32)> = candidates
            .iter()
            .zip(phrase_vecs.iter())
            .map(|(phrase, vec)| (phrase, cosine(vec, reference_vec)))
            .collect();

        scored.sort_by(|(pa, sa), (pb, sb)| {
            sb.total_cmp(sa)
                .then_with(|| pa.len().cmp(&pb.len()))
                .then_with(|| pa.cmp(pb))
        });

        let mut out: Vec<String> = scored.into_iter().map(|(p, _)| p.clone()).collect();
        if let Some(k) = opts.top_k {
            out.truncate(k);
        }
        Ok(out)
    }

    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.embedder.embed_batch(texts).await {
            Ok(vecs) if vecs.len() == texts.len() => return Ok(vecs),
            Ok(vecs) => {
                warn!(
                    expected = texts.len(),
                    got = vecs.len(),
                    "batch embedding count mismatch, falling back to per-text calls"
                );
            }
            Err(e) => {
                warn!(error = %e, "batch embedding failed, falling back to per-text calls");
            }
        }
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embedder.embed_one(t).await?);
        }
        Ok(out)
    }
}
