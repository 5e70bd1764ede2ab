// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Cohort, Confidence, ConfidenceDistribution, ConfidenceThresholds, ExcludedParticipant, Match,
    MatchScores, MatchingConfig, MatchingResult, MatchingStatistics, PairScore, Participant,
    ScoreRange, ScoreRanges, SimilarityScore, StructuredScores, WEIGHT_SUM_TOLERANCE,
};
pub use requests::{RunMatchingRequest, ScorePairRequest};
pub use responses::{ErrorResponse, HealthResponse};
