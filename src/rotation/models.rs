//! Data models for rotation lists.
//!
//! Defines entries, list configuration, discovery candidates, rotation
//! outcomes and the error taxonomy shared by the pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category tag assigned to every entry produced by the discovery pipeline.
pub const DISCOVERY_CATEGORY: &str = "discovery";

/// Generation strategy of a rotation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Suggestion-oracle driven, one entry per configured category label.
    Category,
    /// Source-collection scan scored against a taste profile.
    Discovery,
}

impl RotationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Category => "category",
            RotationMode::Discovery => "discovery",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "category" => Some(RotationMode::Category),
            "discovery" => Some(RotationMode::Discovery),
            _ => None,
        }
    }
}

/// A single curated item, as stored in history and queue.
///
/// Identity is `item_id`; the item_id sets of history, queue and live
/// list must stay pairwise disjoint for a given rotation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub category: String,
    pub performer: String,
    pub title: String,
    pub item_id: String,
    /// When the item was added to the live list, if known.
    pub added_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(category: &str, performer: &str, title: &str, item_id: &str) -> Self {
        Self {
            category: category.to_string(),
            performer: performer.to_string(),
            title: title.to_string(),
            item_id: item_id.to_string(),
            added_at: None,
        }
    }
}

/// Configuration of one rotation list.
#[derive(Debug, Clone)]
pub struct RotationList {
    /// Stable identifier, used as the key into the entry store.
    pub id: String,
    /// Display name for logging.
    pub name: String,
    pub mode: RotationMode,
    /// Identifier of the live collection this list rotates.
    pub live_collection_id: String,
    /// Ordered category labels (category mode).
    pub categories: Vec<String>,
    /// Source collection ids to scan (discovery mode).
    pub source_collections: Vec<String>,
    /// Number of entries per generated block.
    pub block_size: usize,
    /// Maximum entries per performer, 0 = unlimited.
    pub max_per_performer: usize,
    /// Age in days after which a live member counts as stale (discovery).
    pub stale_age_days: i64,
    /// Free-text taste profile for the scoring oracle (discovery).
    pub taste_profile: Option<String>,
}

/// A discovery candidate harvested from the source collections.
///
/// Ephemeral: built per run, never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub performer: String,
    pub title: String,
    pub album: String,
    /// Release date as reported by the catalog: YYYY, YYYY-MM or YYYY-MM-DD.
    pub release_date: String,
    pub item_id: String,
    /// Number of distinct source collections containing this item.
    pub overlap_count: usize,
    /// Names of the source collections the item was seen in.
    pub source_names: Vec<String>,
}

/// A candidate after scoring and rank computation.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    /// Taste-fit score from the scoring oracle, 1..=10.
    pub taste_score: u8,
    pub combined_score: f64,
}

/// Outcome status of a rotation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStatus {
    /// The queue was empty; nothing was touched.
    Empty,
    Ok,
    Failed,
}

impl RotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStatus::Empty => "empty",
            RotationStatus::Ok => "ok",
            RotationStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "empty" => Some(RotationStatus::Empty),
            "ok" => Some(RotationStatus::Ok),
            "failed" => Some(RotationStatus::Failed),
            _ => None,
        }
    }
}

/// Result record of one rotation, consumed by the notification layer.
#[derive(Debug, Clone)]
pub struct RotationOutcome {
    pub status: RotationStatus,
    pub evicted_count: usize,
    pub added_count: usize,
    pub evicted_detail: Vec<Entry>,
    pub added_detail: Vec<Entry>,
    /// Whether a fresh queue block was generated after the rotation.
    pub regenerated: bool,
}

impl RotationOutcome {
    pub fn empty() -> Self {
        Self {
            status: RotationStatus::Empty,
            evicted_count: 0,
            added_count: 0,
            evicted_detail: vec![],
            added_detail: vec![],
            regenerated: false,
        }
    }
}

/// Audit record of one rotation run, persisted by the entry store backend.
#[derive(Debug, Clone)]
pub struct RunAudit {
    /// UUID of this run.
    pub id: String,
    pub list_id: String,
    pub status: RotationStatus,
    /// Unix timestamps (seconds).
    pub started_at: i64,
    pub completed_at: i64,
    pub error_message: Option<String>,
}

/// Pipeline-level generation failures.
///
/// Per-candidate failures are recovered locally (see [`RejectReason`])
/// and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Category generation filled fewer than 80% of the categories
    /// after all re-ask rounds. Eligible for an outer retry.
    #[error("incomplete block: {filled}/{total} categories filled")]
    IncompleteBlock { filled: usize, total: usize },
    /// Discovery found nothing after exclusion and recency filtering.
    /// Not retried automatically.
    #[error("no candidates found in source collections")]
    NoCandidates,
    #[error("no source collections configured")]
    NoSourceCollections,
    #[error("no taste profile available")]
    NoTasteProfile,
}

impl GenerationError {
    /// Whether the caller should retry the whole generation attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::IncompleteBlock { .. })
    }
}

/// Why a single suggestion was rejected by the validation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Performer already at the per-performer quota.
    QuotaReached,
    /// Catalog lookup resolved nothing.
    NotInCatalog,
    /// Catalog lookup failed at the transport level.
    LookupFailed(String),
    /// Resolved identifier already present in history, the live list
    /// or this attempt.
    AlreadyUsed,
    /// Release date decade does not match the category's decade token.
    DecadeMismatch { expected: String, actual: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::QuotaReached => write!(f, "performer quota reached"),
            RejectReason::NotInCatalog => write!(f, "not found in catalog"),
            RejectReason::LookupFailed(msg) => write!(f, "catalog lookup failed: {}", msg),
            RejectReason::AlreadyUsed => write!(f, "already in rotation"),
            RejectReason::DecadeMismatch { expected, .. } => {
                write!(f, "decade mismatch, expected {}", expected)
            }
        }
    }
}

/// A rejected suggestion with its cause, fed back to the suggestion
/// oracle on re-ask rounds.
#[derive(Debug, Clone)]
pub struct RejectedSuggestion {
    pub category: String,
    pub performer: String,
    pub title: String,
    pub reason: RejectReason,
}

impl RejectedSuggestion {
    /// One-line description for oracle feedback, e.g.
    /// `Prince - 1999 (decade mismatch, expected 80s)`.
    pub fn feedback_line(&self) -> String {
        format!("{} - {} ({})", self.performer, self.title, self.reason)
    }
}
