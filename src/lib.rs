//! Cohort Match - optimal one-to-one matching between two participant cohorts
//!
//! This library scores every seeker/provider pair from profile embeddings and
//! structured preference answers, then solves the assignment that maximizes
//! total compatibility.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchingError, MatchingPipeline, SinglePairScorer};
pub use models::{Match, MatchingConfig, MatchingResult, PairScore, Participant};
pub use services::{InMemorySource, ParticipantSource, VectorStoreClient};
