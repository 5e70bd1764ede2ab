use rayon::prelude::*;
use crate::core::similarity::score_pair;
use crate::models::{MatchingConfig, Participant, SimilarityScore};

/// Scores produced for a cross-product of two cohorts
#[derive(Debug, Clone, Default)]
pub struct PairwiseOutcome {
    /// Successfully scored pairs, row-major by left then right index
    pub scores: Vec<SimilarityScore>,
    /// Pairs that failed scoring and were left out
    pub skipped: usize,
}

/// Score every (left, right) combination
///
/// Pairs are scored in parallel. A pair that fails scoring is logged and
/// omitted; the output order does not depend on scheduling.
pub fn compute_pairwise_scores(
    left: &[Participant],
    right: &[Participant],
    config: &MatchingConfig,
) -> PairwiseOutcome {
    let total = left.len() * right.len();
    if total == 0 {
        return PairwiseOutcome::default();
    }

    let scores: Vec<SimilarityScore> = (0..total)
        .into_par_iter()
        .filter_map(|idx| {
            let seeker = &left[idx / right.len()];
            let provider = &right[idx % right.len()];

            match score_pair(seeker, provider, config) {
                Ok(score) => Some(score),
                Err(e) => {
                    tracing::warn!(
                        "Skipping pair {} -> {}: {}",
                        seeker.id,
                        provider.id,
                        e
                    );
                    None
                }
            }
        })
        .collect();

    let skipped = total - scores.len();
    tracing::debug!(
        "Computed {} pairwise scores ({} skipped) for {}x{} cohorts",
        scores.len(),
        skipped,
        left.len(),
        right.len()
    );

    PairwiseOutcome { scores, skipped }
}
