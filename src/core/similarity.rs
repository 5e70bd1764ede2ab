use crate::core::error::SimilarityError;
use crate::models::{Confidence, MatchingConfig, Participant, SimilarityScore, StructuredScores};

/// Cosine similarity of two profile embeddings, clamped to [0, 1]
///
/// Negative similarities are treated as 0. A zero-magnitude embedding
/// yields 0 with a warning instead of an error.
pub fn embedding_similarity(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        tracing::warn!("Zero-magnitude embedding, similarity defaults to 0");
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}

/// Similarity of the structured preference answers (0-1)
///
/// Missing answers default to the midpoint of the question's range and
/// every answer is clamped into its range. The sum of squared differences
/// is normalized by the largest possible sum for the configured ranges.
pub fn structured_similarity(
    a: &StructuredScores,
    b: &StructuredScores,
    config: &MatchingConfig,
) -> f64 {
    let ranges = config.score_ranges.as_array();
    let mut ssd = 0.0;
    let mut max_ssd = 0.0;

    for ((left, right), range) in a.as_array().iter().zip(b.as_array()).zip(ranges) {
        let (lo, hi) = range.bounds();
        let left = left.unwrap_or_else(|| range.midpoint()).clamp(lo, hi);
        let right = right.unwrap_or_else(|| range.midpoint()).clamp(lo, hi);

        ssd += (left - right).powi(2);
        max_ssd += range.span().powi(2);
    }

    if max_ssd == 0.0 {
        return 1.0;
    }

    (1.0 - ssd / max_ssd).clamp(0.0, 1.0)
}

/// Weighted combination of the embedding and structured components
///
/// Weights are not re-validated here; a stale config still produces a
/// clamped score.
#[inline]
pub fn final_score(frq: f64, quant: f64, config: &MatchingConfig) -> f64 {
    (config.frq_weight * frq + config.quant_weight * quant).clamp(0.0, 1.0)
}

/// Confidence tier of a final score
///
/// A score equal to a threshold falls into the lower tier.
#[inline]
pub fn confidence_level(final_score: f64, config: &MatchingConfig) -> Confidence {
    let thresholds = &config.confidence_thresholds;
    if final_score > thresholds.high {
        Confidence::High
    } else if final_score > thresholds.medium {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Score one (left, right) pair
pub fn score_pair(
    left: &Participant,
    right: &Participant,
    config: &MatchingConfig,
) -> Result<SimilarityScore, SimilarityError> {
    let frq_score = embedding_similarity(&left.embedding, &right.embedding)?;
    let quant_score = structured_similarity(
        &left.structured_scores(),
        &right.structured_scores(),
        config,
    );

    Ok(SimilarityScore {
        left_id: left.id.clone(),
        right_id: right.id.clone(),
        frq_score,
        quant_score,
        final_score: final_score(frq_score, quant_score, config),
    })
}
