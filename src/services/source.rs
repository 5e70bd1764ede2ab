use std::future::Future;
use thiserror::Error;
use crate::models::{ExcludedParticipant, Participant};

/// Errors that can occur while retrieving participants
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Participant source is not connected")]
    NotConnected,
}

/// Both cohorts as returned by a source, plus records it refused
#[derive(Debug, Clone, Default)]
pub struct CohortFetch {
    pub left: Vec<Participant>,
    pub right: Vec<Participant>,
    pub excluded: Vec<ExcludedParticipant>,
}

/// Retrieval collaborator used by the matching pipeline
///
/// Implementations normalize categories and parse records into typed
/// participants; anything they cannot parse is reported in
/// [`CohortFetch::excluded`] instead of failing the fetch.
pub trait ParticipantSource {
    /// Fetch every participant, split into seekers (left) and providers (right)
    fn fetch_all_participants(
        &self,
    ) -> impl Future<Output = Result<CohortFetch, SourceError>> + Send;

    /// Fetch the participants with the given ids; unknown ids are omitted
    fn fetch_participants_by_ids(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Participant>, SourceError>> + Send;
}
