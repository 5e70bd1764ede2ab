use crate::models::{Cohort, ExcludedParticipant, Participant};
use crate::services::source::{CohortFetch, ParticipantSource, SourceError};

/// Participant source backed by an in-process list
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    participants: Vec<Participant>,
    excluded: Vec<ExcludedParticipant>,
}

impl InMemorySource {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            excluded: Vec::new(),
        }
    }

    /// Report these records as excluded on every full fetch
    pub fn with_excluded(mut self, excluded: Vec<ExcludedParticipant>) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl ParticipantSource for InMemorySource {
    async fn fetch_all_participants(&self) -> Result<CohortFetch, SourceError> {
        let (left, right): (Vec<_>, Vec<_>) = self
            .participants
            .iter()
            .cloned()
            .partition(|p| p.category == Cohort::Seeker);

        Ok(CohortFetch {
            left,
            right,
            excluded: self.excluded.clone(),
        })
    }

    async fn fetch_participants_by_ids(&self, ids: &[String]) -> Result<Vec<Participant>, SourceError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.participants.iter().find(|p| &p.id == id).cloned())
            .collect())
    }
}
