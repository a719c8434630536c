//! Discovery-mode block generation.
//!
//! Scans the configured source collections, counts overlap, filters
//! out used and stale items, scores the remainder against the list's
//! taste profile in batches and selects the top of the combined-score
//! ranking under the per-performer cap.

use super::collaborators::{ScoringCandidate, ScoringOracle, SourceCollectionReader};
use super::models::{
    Candidate, Entry, GenerationError, RankedCandidate, RotationList, DISCOVERY_CATEGORY,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};

/// Candidates per scoring oracle call.
pub const SCORE_BATCH_SIZE: usize = 100;
/// Score assigned when the oracle fails or skips a candidate.
pub const NEUTRAL_SCORE: u8 = 5;
/// Lookback window for the recency filter.
pub const RECENT_RELEASE_MONTHS: i64 = 3;

const TASTE_WEIGHT: f64 = 0.7;
const OVERLAP_WEIGHT: f64 = 0.3;
const OVERLAP_CAP: usize = 5;

/// Generates discovery blocks for a rotation list.
pub struct DiscoveryPipeline<'a> {
    reader: &'a dyn SourceCollectionReader,
    scorer: &'a dyn ScoringOracle,
}

impl<'a> DiscoveryPipeline<'a> {
    pub fn new(reader: &'a dyn SourceCollectionReader, scorer: &'a dyn ScoringOracle) -> Self {
        Self { reader, scorer }
    }

    /// Produce up to `count` entries for the list.
    ///
    /// `used_ids` is the union of history, live-list and queue
    /// identifiers; anything in it is excluded.
    pub fn generate(
        &self,
        list: &RotationList,
        used_ids: &HashSet<String>,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Entry>, GenerationError> {
        if list.source_collections.is_empty() {
            return Err(GenerationError::NoSourceCollections);
        }
        let profile = match list.taste_profile.as_deref() {
            Some(profile) if !profile.trim().is_empty() => profile,
            _ => return Err(GenerationError::NoTasteProfile),
        };

        // Step 1: scan sources, counting overlap
        let scanned = self.scan_sources(&list.source_collections);
        info!(
            list = %list.name,
            unique = scanned.len(),
            sources = list.source_collections.len(),
            "Source scan complete"
        );

        // Step 2: drop used items
        let after_exclusion: Vec<Candidate> = scanned
            .into_iter()
            .filter(|c| !used_ids.contains(&c.item_id))
            .collect();

        // Step 2b: drop anything not recently released
        let pre_recency = after_exclusion.len();
        let candidates: Vec<Candidate> = after_exclusion
            .into_iter()
            .filter(|c| is_recent_release(&c.release_date, now))
            .collect();
        info!(
            list = %list.name,
            candidates = candidates.len(),
            dropped_stale = pre_recency - candidates.len(),
            "Exclusion and recency filters applied"
        );

        if candidates.is_empty() {
            warn!(list = %list.name, "No new items found in source collections");
            return Err(GenerationError::NoCandidates);
        }

        // Step 3: score in batches
        let scores = self.score_all(&candidates, profile, list);

        // Step 4: rank and select
        let selected = rank_and_select(&candidates, &scores, count, list.max_per_performer);
        info!(
            list = %list.name,
            ranked = candidates.len(),
            selected = selected.len(),
            "Discovery ranking complete"
        );

        Ok(selected
            .into_iter()
            .map(|ranked| {
                Entry::new(
                    DISCOVERY_CATEGORY,
                    &ranked.candidate.performer,
                    &ranked.candidate.title,
                    &ranked.candidate.item_id,
                )
            })
            .collect())
    }

    /// Enumerate all source collections into candidates, incrementing
    /// overlap on repeat sightings. A failing collection is logged and
    /// skipped; scan order is preserved for ranking tie-breaks.
    fn scan_sources(&self, collection_ids: &[String]) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut index_by_id: HashMap<String, usize> = HashMap::new();

        for collection_id in collection_ids {
            let items = match self.reader.collection_items(collection_id) {
                Ok(items) => items,
                Err(err) => {
                    error!(collection = %collection_id, error = %err, "Failed to scan source collection");
                    continue;
                }
            };
            let name = self
                .reader
                .collection_name(collection_id)
                .unwrap_or_else(|_| collection_id.clone());
            info!(collection = %name, items = items.len(), "Scanned source collection");

            for item in items {
                if item.item_id.is_empty() {
                    continue;
                }
                match index_by_id.get(&item.item_id) {
                    Some(&index) => {
                        let candidate = &mut candidates[index];
                        candidate.overlap_count += 1;
                        candidate.source_names.push(name.clone());
                    }
                    None => {
                        index_by_id.insert(item.item_id.clone(), candidates.len());
                        candidates.push(Candidate {
                            performer: item.performer,
                            title: item.title,
                            album: item.album,
                            release_date: item.release_date,
                            item_id: item.item_id,
                            overlap_count: 1,
                            source_names: vec![name.clone()],
                        });
                    }
                }
            }
        }
        candidates
    }

    /// Score candidates in batches, falling back to the neutral score
    /// for any batch the oracle fails on.
    fn score_all(
        &self,
        candidates: &[Candidate],
        profile: &str,
        list: &RotationList,
    ) -> HashMap<usize, u8> {
        let mut scores: HashMap<usize, u8> = HashMap::new();
        let batches = candidates.len().div_ceil(SCORE_BATCH_SIZE);
        info!(list = %list.name, candidates = candidates.len(), batches, "Scoring candidates");

        for (batch_index, batch) in candidates.chunks(SCORE_BATCH_SIZE).enumerate() {
            let batch_start = batch_index * SCORE_BATCH_SIZE;
            let descriptors: Vec<ScoringCandidate> = batch
                .iter()
                .map(|c| ScoringCandidate {
                    performer: c.performer.clone(),
                    title: c.title.clone(),
                    album: c.album.clone(),
                    overlap_count: c.overlap_count,
                })
                .collect();

            match self.scorer.score(&descriptors, profile) {
                Ok(batch_scores) => {
                    for (local_index, score) in batch_scores {
                        if local_index < batch.len() {
                            scores.insert(batch_start + local_index, score.clamp(1, 10));
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        list = %list.name,
                        batch = batch_index + 1,
                        error = %err,
                        "Scoring oracle failed, assigning neutral scores"
                    );
                }
            }
        }
        scores
    }
}

/// Whether a release date falls within the lookback window.
/// Missing or unparsable dates count as not recent.
pub fn is_recent_release(release_date: &str, now: DateTime<Utc>) -> bool {
    let Some(released) = parse_release_date(release_date) else {
        return false;
    };
    released >= now - Duration::days(RECENT_RELEASE_MONTHS * 30)
}

/// Parse YYYY, YYYY-MM or YYYY-MM-DD; missing month/day default to 1.
fn parse_release_date(release_date: &str) -> Option<DateTime<Utc>> {
    if release_date.is_empty() {
        return None;
    }
    let mut parts = release_date.split('-');
    let year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.next() {
        Some(d) => d.trim().parse().ok()?,
        None => 1,
    };
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

/// Rank candidates by combined score and greedily select the top
/// `count` under the per-performer cap.
///
/// `combined = taste * 0.7 + min(overlap, 5) * 2 * 0.3`. The sort is
/// stable, so ties keep scan order; the output is a pure function of
/// its inputs.
pub fn rank_and_select(
    candidates: &[Candidate],
    scores: &HashMap<usize, u8>,
    count: usize,
    max_per_performer: usize,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let taste_score = scores.get(&index).copied().unwrap_or(NEUTRAL_SCORE);
            let overlap_bonus = (candidate.overlap_count.min(OVERLAP_CAP) * 2) as f64;
            RankedCandidate {
                candidate: candidate.clone(),
                taste_score,
                combined_score: taste_score as f64 * TASTE_WEIGHT + overlap_bonus * OVERLAP_WEIGHT,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut selected: Vec<RankedCandidate> = Vec::new();
    let mut performer_counts: HashMap<String, usize> = HashMap::new();
    for candidate in ranked {
        if max_per_performer > 0 {
            let used = performer_counts
                .get(&candidate.candidate.performer)
                .copied()
                .unwrap_or(0);
            if used >= max_per_performer {
                continue;
            }
        }
        *performer_counts
            .entry(candidate.candidate.performer.clone())
            .or_insert(0) += 1;
        selected.push(candidate);
        if selected.len() >= count {
            break;
        }
    }
    selected
}
