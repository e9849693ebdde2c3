//! Cosine similarity between embedding vectors

use testrag_core::{RagError, Result};

/// Compute cosine similarity between two vectors
///
/// Returns a value in [-1, 1] where 1 is identical direction, 0 is
/// orthogonal and -1 is opposite. If either vector has zero magnitude the
/// similarity is defined as 0.0.
///
/// Vectors whose squared norms underflow or overflow `f64` are rescaled by
/// their largest component before scoring.
///
/// # Errors
/// [`RagError::DimensionMismatch`] when the vectors differ in length,
/// [`RagError::ValidationError`] when either vector holds NaN or infinity.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot, norm_a_sq, norm_b_sq) = accumulate(a, b, 1.0, 1.0);
    let denominator = (norm_a_sq * norm_b_sq).sqrt();
    if dot.is_finite() && norm_a_sq.is_normal() && norm_b_sq.is_normal() && denominator.is_normal()
    {
        return Ok((dot / denominator).clamp(-1.0, 1.0));
    }

    scaled_cosine_similarity(a, b)
}

/// Slow path for zero, non-finite or out-of-range vectors
fn scaled_cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.iter().chain(b).any(|x| !x.is_finite()) {
        return Err(RagError::ValidationError(
            "Embedding contains NaN or infinite values".to_string(),
        ));
    }

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return Ok(0.0);
    }

    // Scaled squared norms lie in [1, len]
    let (dot, norm_a_sq, norm_b_sq) = accumulate(a, b, scale_a, scale_b);
    Ok((dot / (norm_a_sq * norm_b_sq).sqrt()).clamp(-1.0, 1.0))
}

/// Dot product and both squared norms in one pass, each side divided by its scale
fn accumulate(a: &[f64], b: &[f64], scale_a: f64, scale_b: f64) -> (f64, f64, f64) {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x / scale_a, y / scale_b))
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        })
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |max, x| max.max(x.abs()))
}
