//! Category-mode block generation.
//!
//! Drives the suggestion oracle through up to three rounds, validating
//! every returned line. Rounds after the first only ask for the
//! categories still unfilled and feed the accumulated rejection reasons
//! back to the oracle so it avoids repeating them.

use super::collaborators::{CatalogLookup, LiveItem, SuggestionOracle, SuggestionRequest};
use super::models::{Entry, GenerationError, RejectedSuggestion, RotationList};
use super::validate::{
    parse_suggestion_line, validate_suggestion, GenerationContext, ValidationOutcome,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Suggestion lines requested per category per round.
pub const SUGGESTIONS_PER_CATEGORY: usize = 5;
/// Total oracle calls per generation attempt (1 initial + 2 re-asks).
pub const MAX_ORACLE_ROUNDS: usize = 3;
/// Minimum fill ratio for accepting an incomplete block.
pub const PARTIAL_FILL_RATIO: f64 = 0.8;
/// How many distinct recent history performers feed the exclusion list.
const HISTORY_EXCLUDE_PERFORMERS: usize = 50;

/// Terminal state of a successful generation.
#[derive(Debug)]
pub enum BlockOutcome {
    /// Every configured category was filled.
    Complete(Vec<Entry>),
    /// At least 80% of the categories were filled; only those are
    /// returned, in configured category order.
    PartialAccepted(Vec<Entry>),
}

impl BlockOutcome {
    pub fn entries(&self) -> &[Entry] {
        match self {
            BlockOutcome::Complete(entries) => entries,
            BlockOutcome::PartialAccepted(entries) => entries,
        }
    }
}

/// Generates one category-mode block for a rotation list.
pub struct BlockGenerator<'a> {
    oracle: &'a dyn SuggestionOracle,
    catalog: &'a dyn CatalogLookup,
}

impl<'a> BlockGenerator<'a> {
    pub fn new(oracle: &'a dyn SuggestionOracle, catalog: &'a dyn CatalogLookup) -> Self {
        Self { oracle, catalog }
    }

    /// Run one generation attempt for the list.
    ///
    /// `history` is the list's full history in insertion order; `live`
    /// the current live list membership. Live identifiers count as used
    /// so the staged block stays disjoint from the live list.
    pub fn generate(
        &self,
        list: &RotationList,
        history: &[Entry],
        live: &[LiveItem],
    ) -> Result<BlockOutcome, GenerationError> {
        let total = list.categories.len();
        let live_performers: Vec<String> =
            live.iter().map(|item| item.performer.clone()).collect();
        let mut ctx = GenerationContext::seeded(history, &live_performers);
        ctx.mark_used(live.iter().map(|item| item.item_id.clone()));
        let mut filled: HashMap<String, Entry> = HashMap::new();
        let mut rejections: Vec<RejectedSuggestion> = Vec::new();
        let mut accepted_performers: Vec<String> = Vec::new();

        let base_excluded = base_exclusions(history, &live_performers);

        for round in 1..=MAX_ORACLE_ROUNDS {
            let unfilled: Vec<String> = list
                .categories
                .iter()
                .filter(|c| !ctx.is_filled(c))
                .cloned()
                .collect();
            if unfilled.is_empty() {
                break;
            }

            // Performers accepted in earlier rounds are excluded from
            // later ones, on top of the live/history base.
            let mut excluded = base_excluded.clone();
            for performer in &accepted_performers {
                if !excluded.contains(performer) {
                    excluded.push(performer.clone());
                }
            }

            let request = SuggestionRequest {
                categories: unfilled.clone(),
                excluded_performers: excluded,
                forbidden_performers: ctx.performers_at_quota(list.max_per_performer),
                per_category: SUGGESTIONS_PER_CATEGORY,
                rejections: rejections
                    .iter()
                    .filter(|r| unfilled.contains(&r.category))
                    .map(|r| r.feedback_line())
                    .collect(),
            };

            info!(
                list = %list.name,
                round,
                categories = unfilled.len(),
                "Requesting suggestions"
            );

            let lines = match self.oracle.suggest(&request) {
                Ok(lines) => lines,
                Err(err) => {
                    // An unreachable oracle burns the round but is not
                    // fatal until the round budget runs out.
                    warn!(list = %list.name, round, error = %err, "Suggestion oracle failed");
                    continue;
                }
            };

            for line in &lines {
                let raw = match parse_suggestion_line(line) {
                    Some(raw) => raw,
                    None => continue,
                };
                match validate_suggestion(&raw, list, self.catalog, &mut ctx) {
                    ValidationOutcome::Accepted(entry) => {
                        info!(
                            list = %list.name,
                            category = %entry.category,
                            performer = %entry.performer,
                            title = %entry.title,
                            "Suggestion accepted"
                        );
                        accepted_performers.push(entry.performer.clone());
                        filled.insert(entry.category.clone(), entry);
                        if filled.len() == total {
                            break;
                        }
                    }
                    ValidationOutcome::Rejected(rejected) => {
                        debug!(
                            list = %list.name,
                            performer = %rejected.performer,
                            title = %rejected.title,
                            reason = %rejected.reason,
                            "Suggestion rejected"
                        );
                        rejections.push(rejected);
                    }
                    ValidationOutcome::NoCategoryMatch => {
                        debug!(list = %list.name, line = %line, "Unmatched category, dropping line");
                    }
                }
            }
        }

        let ordered: Vec<Entry> = list
            .categories
            .iter()
            .filter_map(|category| filled.remove(category))
            .collect();

        if ordered.len() == total {
            return Ok(BlockOutcome::Complete(ordered));
        }

        let threshold = (PARTIAL_FILL_RATIO * total as f64).ceil() as usize;
        if ordered.len() >= threshold {
            info!(
                list = %list.name,
                filled = ordered.len(),
                total,
                "Accepting partial block"
            );
            return Ok(BlockOutcome::PartialAccepted(ordered));
        }

        warn!(
            list = %list.name,
            filled = ordered.len(),
            total,
            "Block generation fell below the partial-accept threshold"
        );
        Err(GenerationError::IncompleteBlock {
            filled: ordered.len(),
            total,
        })
    }
}

/// Live performers plus the last distinct performers from history, the
/// "prefer not to repeat" list handed to the oracle.
fn base_exclusions(history: &[Entry], live_performers: &[String]) -> Vec<String> {
    let mut excluded: Vec<String> = Vec::new();
    for performer in live_performers {
        if !excluded.contains(performer) {
            excluded.push(performer.clone());
        }
    }
    let mut recent: Vec<String> = Vec::new();
    for entry in history.iter().rev() {
        if !recent.contains(&entry.performer) {
            recent.push(entry.performer.clone());
            if recent.len() >= HISTORY_EXCLUDE_PERFORMERS {
                break;
            }
        }
    }
    for performer in recent {
        if !excluded.contains(&performer) {
            excluded.push(performer);
        }
    }
    excluded
}
