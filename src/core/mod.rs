// Core algorithm exports
pub mod assignment;
pub mod enrich;
pub mod error;
pub mod pairwise;
pub mod pipeline;
pub mod similarity;
pub mod single_pair;

pub use assignment::{AssignmentSolver, AssignmentStrategy, CostMatrix, HungarianSolver};
pub use enrich::{enrich, sort_matches, statistics, unmatched_participants};
pub use error::{MatchingError, PipelinePhase, SimilarityError};
pub use pairwise::{compute_pairwise_scores, PairwiseOutcome};
pub use pipeline::{validate_config, MatchingPipeline};
pub use similarity::{confidence_level, embedding_similarity, final_score, score_pair, structured_similarity};
pub use single_pair::SinglePairScorer;
