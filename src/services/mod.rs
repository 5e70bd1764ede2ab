// Service exports
pub mod memory;
pub mod source;
pub mod vector_store;

pub use memory::InMemorySource;
pub use source::{CohortFetch, ParticipantSource, SourceError};
pub use vector_store::VectorStoreClient;
