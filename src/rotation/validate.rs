//! Validation pipeline for category-mode suggestions.
//!
//! Each raw suggestion line runs through a fixed chain of checks:
//! category match, performer quota, catalog resolution, history dedup,
//! era consistency. The first failing check short-circuits with a
//! recorded reason. Mutable per-attempt state (performer usage, used
//! identifiers, filled categories) lives in [`GenerationContext`],
//! owned by a single block-generation invocation.

use super::collaborators::CatalogLookup;
use super::models::{Entry, RejectReason, RejectedSuggestion, RotationList};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::warn;

lazy_static! {
    /// Leading enumeration the oracle sometimes adds ("1. 80s").
    static ref NUMBERING_PREFIX: Regex = Regex::new(r"^\d+[.)]\s*").unwrap();
    /// Decade token at the start of a category label ("80s hits").
    static ref DECADE_TOKEN: Regex = Regex::new(r"^(\d{2}s)").unwrap();
}

/// A parsed `category | performer | title` suggestion line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSuggestion {
    pub category: String,
    pub performer: String,
    pub title: String,
}

/// Parse one oracle output line. Lines without at least three `|`
/// separated fields are garbage and yield `None`.
pub fn parse_suggestion_line(line: &str) -> Option<RawSuggestion> {
    if !line.contains('|') {
        return None;
    }
    let mut parts = line.splitn(3, '|');
    let category = parts.next()?.trim();
    let performer = parts.next()?.trim();
    let title = parts.next()?.trim();
    if category.is_empty() || performer.is_empty() || title.is_empty() {
        return None;
    }
    Some(RawSuggestion {
        category: category.to_string(),
        performer: performer.to_string(),
        title: title.to_string(),
    })
}

/// Fuzzy-match a raw category against the configured labels, skipping
/// ones already filled this attempt. Tries exact (case-insensitive)
/// first, then substring containment either direction.
pub fn match_category<'a>(
    raw_category: &str,
    categories: &'a [String],
    filled: &HashSet<String>,
) -> Option<&'a str> {
    let raw_lower = raw_category.to_lowercase().trim().to_string();
    let raw_clean = NUMBERING_PREFIX.replace(&raw_lower, "").to_string();

    for category in categories {
        if filled.contains(category) {
            continue;
        }
        let cat_lower = category.to_lowercase().trim().to_string();
        if cat_lower == raw_clean || cat_lower == raw_lower {
            return Some(category);
        }
        if cat_lower.contains(&raw_clean) || raw_clean.contains(&cat_lower) {
            return Some(category);
        }
    }
    None
}

/// The decade token a category label encodes, if any ("80s" from
/// "80s classics").
pub fn decade_token(category: &str) -> Option<&str> {
    DECADE_TOKEN
        .captures(category)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Derive the decade of a release date ("1994-06-01" -> "90s").
/// Returns `None` when the year cannot be parsed.
pub fn decade_of(release_date: &str) -> Option<String> {
    let year: i32 = release_date.split('-').next()?.trim().parse().ok()?;
    if year < 0 {
        return None;
    }
    Some(format!("{:02}s", (year / 10 * 10) % 100))
}

/// Mutable state shared across one whole generation attempt.
///
/// Owned exclusively by the block generator invocation; never shared
/// across concurrent generations.
#[derive(Debug, Default)]
pub struct GenerationContext {
    performer_usage: HashMap<String, usize>,
    used_ids: HashSet<String>,
    filled: HashSet<String>,
}

impl GenerationContext {
    /// Seed usage counters from history and the current live list, and
    /// the used-identifier set from history. Callers add live member
    /// identifiers via [`mark_used`](Self::mark_used) to keep the queue
    /// disjoint from the live list.
    pub fn seeded(history: &[Entry], live_performers: &[String]) -> Self {
        let mut ctx = Self::default();
        for entry in history {
            *ctx.performer_usage.entry(entry.performer.clone()).or_insert(0) += 1;
            ctx.used_ids.insert(entry.item_id.clone());
        }
        for performer in live_performers {
            *ctx.performer_usage.entry(performer.clone()).or_insert(0) += 1;
        }
        ctx
    }

    /// Mark identifiers as used without touching performer counters.
    pub fn mark_used<I: IntoIterator<Item = String>>(&mut self, ids: I) {
        self.used_ids.extend(ids);
    }

    pub fn usage(&self, performer: &str) -> usize {
        self.performer_usage.get(performer).copied().unwrap_or(0)
    }

    /// Whether a performer has reached the quota (0 = unlimited).
    pub fn at_quota(&self, performer: &str, max_per_performer: usize) -> bool {
        max_per_performer > 0 && self.usage(performer) >= max_per_performer
    }

    /// Performers currently at or over the quota.
    pub fn performers_at_quota(&self, max_per_performer: usize) -> Vec<String> {
        if max_per_performer == 0 {
            return vec![];
        }
        let mut performers: Vec<String> = self
            .performer_usage
            .iter()
            .filter(|(_, count)| **count >= max_per_performer)
            .map(|(performer, _)| performer.clone())
            .collect();
        performers.sort();
        performers
    }

    pub fn is_used(&self, item_id: &str) -> bool {
        self.used_ids.contains(item_id)
    }

    pub fn is_filled(&self, category: &str) -> bool {
        self.filled.contains(category)
    }

    fn accept(&mut self, category: &str, performer: &str, item_id: &str) {
        self.used_ids.insert(item_id.to_string());
        *self.performer_usage.entry(performer.to_string()).or_insert(0) += 1;
        self.filled.insert(category.to_string());
    }
}

/// Result of validating one suggestion line.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// The suggestion passed every check; the context was updated.
    Accepted(Entry),
    /// A check failed; the reason is recorded for re-ask feedback.
    Rejected(RejectedSuggestion),
    /// No configured category matched: garbage input, dropped without
    /// being reported as a validation failure.
    NoCategoryMatch,
}

/// Run the full validation chain for one suggestion.
pub fn validate_suggestion(
    raw: &RawSuggestion,
    list: &RotationList,
    catalog: &dyn CatalogLookup,
    ctx: &mut GenerationContext,
) -> ValidationOutcome {
    // 1. Category match
    let category = match match_category(&raw.category, &list.categories, &ctx.filled) {
        Some(category) => category.to_string(),
        None => return ValidationOutcome::NoCategoryMatch,
    };

    let reject = |reason: RejectReason| {
        ValidationOutcome::Rejected(RejectedSuggestion {
            category: category.clone(),
            performer: raw.performer.clone(),
            title: raw.title.clone(),
            reason,
        })
    };

    // 2. Performer quota
    if ctx.at_quota(&raw.performer, list.max_per_performer) {
        return reject(RejectReason::QuotaReached);
    }

    // 3. Catalog resolution
    let resolved = match catalog.resolve(&raw.performer, &raw.title) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return reject(RejectReason::NotInCatalog),
        Err(err) => {
            warn!(
                performer = %raw.performer,
                title = %raw.title,
                error = %err,
                "Catalog lookup failed"
            );
            return reject(RejectReason::LookupFailed(err.to_string()));
        }
    };

    // 4. History / dedup
    if ctx.is_used(&resolved.item_id) {
        return reject(RejectReason::AlreadyUsed);
    }

    // 5. Era consistency; underivable dates pass
    if let Some(expected) = decade_token(&category) {
        if let Some(actual) = decade_of(&resolved.release_date) {
            if actual != expected {
                return reject(RejectReason::DecadeMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
    }

    ctx.accept(&category, &raw.performer, &resolved.item_id);
    ValidationOutcome::Accepted(Entry::new(
        &category,
        &raw.performer,
        &raw.title,
        &resolved.item_id,
    ))
}
