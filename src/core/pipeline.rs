use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use crate::core::{
    assignment::AssignmentSolver,
    enrich::{enrich, statistics, unmatched_participants},
    error::{MatchingError, PipelinePhase},
    pairwise::compute_pairwise_scores,
    single_pair::SinglePairScorer,
};
use crate::models::{ExcludedParticipant, MatchingConfig, MatchingResult, PairScore, Participant};
use crate::services::{CohortFetch, ParticipantSource};

/// Check weights, ranges and thresholds of a matching config
pub fn validate_config(config: &MatchingConfig) -> Result<(), MatchingError> {
    config
        .validate()
        .map_err(|e| MatchingError::InvalidConfig(e.to_string()))
}

/// Main matching orchestrator
///
/// # Pipeline Phases
/// 1. Configured: the run's config is validated
/// 2. Retrieving: both cohorts are fetched from the participant source
/// 3. Scoring: every (seeker, provider) pair is scored
/// 4. Assigning: the optimal one-to-one assignment is solved
/// 5. Enriching: matches are ranked and statistics computed
///
/// Any failure aborts the run with no partial result. Runs are independent
/// of each other.
pub struct MatchingPipeline<S> {
    source: Arc<S>,
    config: MatchingConfig,
    solver: AssignmentSolver,
}

impl<S: ParticipantSource> MatchingPipeline<S> {
    /// Create a pipeline, rejecting an invalid default config
    pub fn new(source: Arc<S>, config: MatchingConfig) -> Result<Self, MatchingError> {
        validate_config(&config)?;
        Ok(Self {
            source,
            config,
            solver: AssignmentSolver::new(),
        })
    }

    pub fn with_default_config(source: Arc<S>) -> Self {
        Self {
            source,
            config: MatchingConfig::default(),
            solver: AssignmentSolver::new(),
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Replace the stored config; an invalid config leaves it unchanged
    pub fn update_config(&mut self, config: MatchingConfig) -> Result<(), MatchingError> {
        validate_config(&config)?;
        tracing::info!("Matching config updated: {:?}", config);
        self.config = config;
        Ok(())
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Run a full matching pass
    ///
    /// `config` overrides the stored config for this run only.
    pub async fn run_matching(
        &self,
        config: Option<MatchingConfig>,
    ) -> Result<MatchingResult, MatchingError> {
        let run_id = Uuid::new_v4();
        let config = config.unwrap_or(self.config);

        match self.execute(run_id, config).await {
            Ok(result) => {
                enter_phase(run_id, PipelinePhase::Complete);
                tracing::info!(
                    "Matching run {} produced {} matches (avg score {:.4}, {} unmatched seekers, {} unmatched providers)",
                    run_id,
                    result.matches.len(),
                    result.statistics.avg_final_score,
                    result.unmatched_left.len(),
                    result.unmatched_right.len()
                );
                Ok(result)
            }
            Err(e) => {
                enter_phase(run_id, PipelinePhase::Failed);
                tracing::error!("Matching run {} failed during {}: {}", run_id, e.phase(), e);
                Err(e)
            }
        }
    }

    /// Score a single pair with the stored config or an override
    pub async fn compute_match_score(
        &self,
        left_id: &str,
        right_id: &str,
        config: Option<MatchingConfig>,
    ) -> Result<PairScore, MatchingError> {
        let config = config.unwrap_or(self.config);
        SinglePairScorer::new(Arc::clone(&self.source))
            .score(left_id, right_id, &config)
            .await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        config: MatchingConfig,
    ) -> Result<MatchingResult, MatchingError> {
        validate_config(&config)?;
        enter_phase(run_id, PipelinePhase::Configured);

        enter_phase(run_id, PipelinePhase::Retrieving);
        let CohortFetch {
            left,
            right,
            mut excluded,
        } = self.source.fetch_all_participants().await?;
        let left = drop_duplicate_ids(left, &mut excluded);
        let right = drop_duplicate_ids(right, &mut excluded);

        if left.is_empty() || right.is_empty() {
            return Err(MatchingError::NoParticipants {
                left: left.len(),
                right: right.len(),
            });
        }
        check_dimensions(&left, &right)?;
        tracing::debug!(
            "Retrieved {} seekers and {} providers ({} excluded)",
            left.len(),
            right.len(),
            excluded.len()
        );

        enter_phase(run_id, PipelinePhase::Scoring);
        let outcome = compute_pairwise_scores(&left, &right, &config);
        if outcome.scores.is_empty() {
            return Err(MatchingError::NoScoresComputed {
                pairs: left.len() * right.len(),
            });
        }

        enter_phase(run_id, PipelinePhase::Assigning);
        let matches = self.solver.assign(&left, &right, &outcome.scores);

        enter_phase(run_id, PipelinePhase::Enriching);
        let matches = enrich(matches, &config);
        let statistics = statistics(&matches);
        let (unmatched_left, unmatched_right) = unmatched_participants(&left, &right, &matches);

        Ok(MatchingResult {
            run_id,
            matches,
            statistics,
            config,
            timestamp: chrono::Utc::now(),
            unmatched_left,
            unmatched_right,
            excluded_participants: excluded,
        })
    }
}

#[inline]
fn enter_phase(run_id: Uuid, phase: PipelinePhase) {
    tracing::info!("Matching run {}: {}", run_id, phase);
}

/// Keep the first participant for each id within one cohort
fn drop_duplicate_ids(
    cohort: Vec<Participant>,
    excluded: &mut Vec<ExcludedParticipant>,
) -> Vec<Participant> {
    let mut seen = HashSet::new();
    cohort
        .into_iter()
        .filter(|p| {
            if seen.insert(p.id.clone()) {
                return true;
            }
            tracing::warn!("Excluding duplicate participant id {}", p.id);
            excluded.push(ExcludedParticipant {
                id: p.id.clone(),
                reason: "duplicate id".to_string(),
            });
            false
        })
        .collect()
}

/// All embeddings in a run must share one length
fn check_dimensions(left: &[Participant], right: &[Participant]) -> Result<(), MatchingError> {
    let Some(first) = left.first().or_else(|| right.first()) else {
        return Ok(());
    };
    let expected = first.embedding.len();

    match left
        .iter()
        .chain(right)
        .find(|p| p.embedding.len() != expected)
    {
        Some(p) => Err(MatchingError::InconsistentDimensions {
            expected,
            found: p.embedding.len(),
            participant_id: p.id.clone(),
        }),
        None => Ok(()),
    }
}
