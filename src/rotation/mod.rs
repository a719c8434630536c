//! Rotation-list engine: block generation, validation and rotation.

pub mod block_generator;
pub mod collaborators;
pub mod discovery;
pub mod engine;
pub mod entry_store;
pub mod models;
pub mod schema;
pub mod sqlite_store;
pub mod validate;

pub use block_generator::{BlockGenerator, BlockOutcome};
pub use collaborators::{
    CatalogLookup, LiveItem, LiveListMutator, ResolvedItem, ScoringCandidate, ScoringOracle,
    SourceCollectionReader, SourceItem, SuggestionOracle, SuggestionRequest,
};
pub use discovery::DiscoveryPipeline;
pub use engine::{count_stale, effective_block_size, RotationEngine};
pub use entry_store::{EntryStore, FileEntryStore};
pub use models::{
    Candidate, Entry, GenerationError, RankedCandidate, RejectReason, RejectedSuggestion,
    RotationList, RotationMode, RotationOutcome, RotationStatus, RunAudit, DISCOVERY_CATEGORY,
};
pub use sqlite_store::SqliteEntryStore;
