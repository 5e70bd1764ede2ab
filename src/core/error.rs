use std::fmt;
use thiserror::Error;
use crate::services::SourceError;

/// Faults raised while scoring a single pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimilarityError {
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("embedding vector is empty")]
    EmptyVector,
}

/// Phases of a matching run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Configured,
    Retrieving,
    Scoring,
    Assigning,
    Enriching,
    Complete,
    Failed,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelinePhase::Configured => "configured",
            PipelinePhase::Retrieving => "retrieving",
            PipelinePhase::Scoring => "scoring",
            PipelinePhase::Assigning => "assigning",
            PipelinePhase::Enriching => "enriching",
            PipelinePhase::Complete => "complete",
            PipelinePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that abort a matching run or a single-pair lookup
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No participants to match: {left} seekers, {right} providers")]
    NoParticipants { left: usize, right: usize },

    #[error("Participant {participant_id} has embedding dimension {found}, expected {expected}")]
    InconsistentDimensions {
        expected: usize,
        found: usize,
        participant_id: String,
    },

    #[error("No similarity scores computed for {pairs} candidate pairs")]
    NoScoresComputed { pairs: usize },

    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("Scoring failed: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Participant source error: {0}")]
    Source(#[from] SourceError),
}

impl MatchingError {
    /// Phase of the run in which this error is raised
    pub fn phase(&self) -> PipelinePhase {
        match self {
            MatchingError::InvalidConfig(_) => PipelinePhase::Configured,
            MatchingError::NoParticipants { .. }
            | MatchingError::InconsistentDimensions { .. }
            | MatchingError::ParticipantNotFound(_)
            | MatchingError::Source(_) => PipelinePhase::Retrieving,
            MatchingError::NoScoresComputed { .. } | MatchingError::Similarity(_) => {
                PipelinePhase::Scoring
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_phases() {
        assert_eq!(
            MatchingError::InvalidConfig("bad".into()).phase(),
            PipelinePhase::Configured
        );
        assert_eq!(
            MatchingError::NoParticipants { left: 0, right: 3 }.phase(),
            PipelinePhase::Retrieving
        );
        assert_eq!(
            MatchingError::NoScoresComputed { pairs: 4 }.phase(),
            PipelinePhase::Scoring
        );
    }

    #[test]
    fn test_similarity_error_converts() {
        let err: MatchingError = SimilarityError::EmptyVector.into();
        assert!(matches!(err, MatchingError::Similarity(SimilarityError::EmptyVector)));
    }
}
