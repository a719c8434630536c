//! Contracts for the external collaborators the engine calls.
//!
//! All methods block; callers wanting timeouts wrap the underlying
//! transport. Failures are `anyhow` errors so each pipeline can apply
//! its own skip/fallback policy.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A catalog item resolved from a free-text (performer, title) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub item_id: String,
    /// YYYY, YYYY-MM or YYYY-MM-DD; may be empty when unknown.
    pub release_date: String,
}

/// Resolves free-text suggestions against the external catalog.
pub trait CatalogLookup: Send + Sync {
    /// Resolve a (performer, title) pair to a canonical item.
    ///
    /// Returns `Ok(None)` when the catalog has no match.
    fn resolve(&self, performer: &str, title: &str) -> Result<Option<ResolvedItem>>;
}

/// Everything the suggestion oracle needs for one round.
#[derive(Debug, Clone, Default)]
pub struct SuggestionRequest {
    /// Category labels to fill, in configured order.
    pub categories: Vec<String>,
    /// Performers to avoid (already in the live list or recent history).
    pub excluded_performers: Vec<String>,
    /// Performers at quota, the oracle must not use them at all.
    pub forbidden_performers: Vec<String>,
    /// Suggestion lines requested per category.
    pub per_category: usize,
    /// Feedback lines from earlier rounds, `performer - title (cause)`.
    pub rejections: Vec<String>,
}

/// Produces raw suggestion lines (`category | performer | title`).
pub trait SuggestionOracle: Send + Sync {
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>>;
}

/// Candidate descriptor handed to the scoring oracle.
#[derive(Debug, Clone)]
pub struct ScoringCandidate {
    pub performer: String,
    pub title: String,
    pub album: String,
    pub overlap_count: usize,
}

/// Scores candidates against a taste profile.
pub trait ScoringOracle: Send + Sync {
    /// Returns a map from candidate index to score 1..=10. Missing
    /// indices are tolerated; callers fall back to a neutral score.
    fn score(&self, candidates: &[ScoringCandidate], profile: &str)
        -> Result<HashMap<usize, u8>>;
}

/// An item as enumerated from a source collection.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub item_id: String,
    pub performer: String,
    pub title: String,
    pub album: String,
    pub release_date: String,
}

/// Enumerates the members of configured source collections.
pub trait SourceCollectionReader: Send + Sync {
    /// Display name of a collection, for overlap bookkeeping and logs.
    fn collection_name(&self, collection_id: &str) -> Result<String>;

    /// All member items of a collection. Implementations page through
    /// the backing API internally.
    fn collection_items(&self, collection_id: &str) -> Result<Vec<SourceItem>>;
}

/// A member of the live collection, with its addition timestamp when
/// the backing service reports one.
#[derive(Debug, Clone)]
pub struct LiveItem {
    pub item_id: String,
    pub performer: String,
    pub title: String,
    pub release_date: String,
    pub added_at: Option<DateTime<Utc>>,
}

/// Mutates the live collection a rotation list manages.
pub trait LiveListMutator: Send + Sync {
    fn add_items(&self, collection_id: &str, item_ids: &[String]) -> Result<()>;

    fn remove_items(&self, collection_id: &str, item_ids: &[String]) -> Result<()>;

    /// Current members in the collection's own ordering.
    fn list_items(&self, collection_id: &str) -> Result<Vec<LiveItem>>;
}
