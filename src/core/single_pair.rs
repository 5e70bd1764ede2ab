use std::sync::Arc;
use crate::core::error::MatchingError;
use crate::core::pipeline::validate_config;
use crate::core::similarity::{confidence_level, score_pair};
use crate::models::{MatchingConfig, PairScore, Participant};
use crate::services::ParticipantSource;

/// Scores one specific pair without running an assignment
///
/// Intended for spot checks; it shares only the scoring primitives with
/// the batch pipeline.
pub struct SinglePairScorer<S> {
    source: Arc<S>,
}

impl<S: ParticipantSource> SinglePairScorer<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Fetch both participants and score them as (left, right)
    pub async fn score(
        &self,
        left_id: &str,
        right_id: &str,
        config: &MatchingConfig,
    ) -> Result<PairScore, MatchingError> {
        validate_config(config)?;

        let ids = [left_id.to_string(), right_id.to_string()];
        let found = self.source.fetch_participants_by_ids(&ids).await?;

        let left = find(&found, left_id)?;
        let right = find(&found, right_id)?;

        let score = score_pair(left, right, config)?;
        let confidence = confidence_level(score.final_score, config);

        tracing::debug!(
            "Scored pair {} -> {}: final={:.4} ({})",
            left_id,
            right_id,
            score.final_score,
            confidence
        );

        Ok(PairScore {
            left_id: score.left_id,
            right_id: score.right_id,
            frq_score: score.frq_score,
            quant_score: score.quant_score,
            final_score: score.final_score,
            confidence,
        })
    }
}

fn find<'a>(participants: &'a [Participant], id: &str) -> Result<&'a Participant, MatchingError> {
    participants
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| MatchingError::ParticipantNotFound(id.to_string()))
}
