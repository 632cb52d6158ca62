//! Fallback text embedding: no model, no network call. Character n-grams are
//! hashed into fixed-size buckets and the resulting vector is L2-normalized.
//! Good enough to make near-duplicate and paraphrastic text cluster; not a
//! substitute for a real sentence embedding model.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Dimensionality of vectors produced by [`embed`].
pub const EMBEDDING_DIM: usize = 384;

/// Embed `text` into a fixed-size, L2-normalized vector using hashed
/// character 2-grams and 3-grams.
pub fn embed(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();

    let mut buckets = vec![0.0f32; EMBEDDING_DIM];
    for n in [2usize, 3usize] {
        if chars.len() < n {
            continue;
        }
        for window in chars.windows(n) {
            let ngram: String = window.iter().collect();
            let bucket = hash_bucket(&ngram);
            buckets[bucket] += 1.0;
        }
    }

    l2_normalize(&mut buckets);
    buckets
}

fn hash_bucket(ngram: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    ngram.hash(&mut hasher);
    (hasher.finish() % EMBEDDING_DIM as u64) as usize
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Pack a vector as little-endian `f32` bytes for storage in a BLOB column.
pub fn to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Inverse of [`to_bytes`]. Silently ignores a trailing partial element.
pub fn from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity between two equal-length vectors. Returns `0.0` for a
/// zero-length or mismatched-length pair rather than panicking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
