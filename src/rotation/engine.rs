//! Rotation engine and per-list orchestration.
//!
//! A rotation run for a category list is: audit the queued block's
//! eras, rotate the queue into the live list, then generate the next
//! block. Discovery lists generate first (so the staleness policy can
//! size the block) and then rotate oldest-first. Every run leaves an
//! audit record in the entry store.

use super::block_generator::BlockGenerator;
use super::collaborators::{
    CatalogLookup, LiveItem, LiveListMutator, ScoringOracle, SourceCollectionReader,
    SuggestionOracle,
};
use super::discovery::DiscoveryPipeline;
use super::entry_store::EntryStore;
use super::models::{
    Entry, RotationList, RotationMode, RotationOutcome, RotationStatus, RunAudit,
};
use super::validate::{decade_of, decade_token};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outer retry budget for category-mode generation.
pub const GENERATION_ATTEMPTS: usize = 3;

/// Category recorded for evicted members whose release decade is unknown.
const UNKNOWN_DECADE: &str = "unknown";

/// Runs rotation cycles for configured lists.
pub struct RotationEngine<'a> {
    store: &'a dyn EntryStore,
    live: &'a dyn LiveListMutator,
    suggestions: &'a dyn SuggestionOracle,
    catalog: &'a dyn CatalogLookup,
    sources: &'a dyn SourceCollectionReader,
    scorer: &'a dyn ScoringOracle,
}

impl<'a> RotationEngine<'a> {
    pub fn new(
        store: &'a dyn EntryStore,
        live: &'a dyn LiveListMutator,
        suggestions: &'a dyn SuggestionOracle,
        catalog: &'a dyn CatalogLookup,
        sources: &'a dyn SourceCollectionReader,
        scorer: &'a dyn ScoringOracle,
    ) -> Self {
        Self {
            store,
            live,
            suggestions,
            catalog,
            sources,
            scorer,
        }
    }

    /// Run one full rotate-and-regenerate cycle for a list, recording
    /// a run audit regardless of outcome.
    ///
    /// Not reentrant for the same list id; callers serialize runs per
    /// list.
    pub fn run_list(&self, list: &RotationList) -> Result<RotationOutcome> {
        let started_at = Utc::now().timestamp();
        let run_id = Uuid::new_v4().to_string();
        info!(list = %list.name, mode = list.mode.as_str(), run = %run_id, "Rotation run starting");

        let result = self.execute(list, Utc::now());

        let (status, error_message) = match &result {
            Ok((outcome, generation_error)) => (outcome.status, generation_error.clone()),
            Err(err) => (RotationStatus::Failed, Some(err.to_string())),
        };
        let audit = RunAudit {
            id: run_id,
            list_id: list.id.clone(),
            status,
            started_at,
            completed_at: Utc::now().timestamp(),
            error_message,
        };
        if let Err(err) = self.store.record_run(&audit) {
            error!(list = %list.name, error = %err, "Failed to record run audit");
        }

        result.map(|(outcome, _)| outcome)
    }

    /// The cycle body. Returns the outcome plus the generation error
    /// message, if any, for the audit record.
    fn execute(
        &self,
        list: &RotationList,
        now: DateTime<Utc>,
    ) -> Result<(RotationOutcome, Option<String>)> {
        match list.mode {
            RotationMode::Category => self.run_category(list),
            RotationMode::Discovery => self.run_discovery(list, now),
        }
    }

    fn run_category(&self, list: &RotationList) -> Result<(RotationOutcome, Option<String>)> {
        self.audit_queue_eras(list);

        let mut outcome = self.rotate(list)?;
        if outcome.status == RotationStatus::Empty {
            return Ok((outcome, None));
        }

        // Regenerate against post-rotation state so the evicted members
        // count as history.
        let history = self.store.history_entries(&list.id)?;
        let live_items = self.live.list_items(&list.live_collection_id)?;

        let generator = BlockGenerator::new(self.suggestions, self.catalog);
        let mut last_error = None;
        for attempt in 1..=GENERATION_ATTEMPTS {
            match generator.generate(list, &history, &live_items) {
                Ok(block) => {
                    self.store.replace_queue(&list.id, block.entries())?;
                    info!(
                        list = %list.name,
                        entries = block.entries().len(),
                        attempt,
                        "New block queued"
                    );
                    outcome.regenerated = true;
                    return Ok((outcome, None));
                }
                Err(err) => {
                    warn!(list = %list.name, attempt, error = %err, "Block generation failed");
                    let retryable = err.is_retryable();
                    last_error = Some(err.to_string());
                    if !retryable {
                        break;
                    }
                }
            }
        }

        // The rotation itself succeeded; only the refill failed.
        outcome.regenerated = false;
        Ok((outcome, last_error))
    }

    fn run_discovery(
        &self,
        list: &RotationList,
        now: DateTime<Utc>,
    ) -> Result<(RotationOutcome, Option<String>)> {
        let live_items = self.live.list_items(&list.live_collection_id)?;
        let effective_size = effective_block_size(list, &live_items, now);

        let mut used = self.store.history_identifiers(&list.id)?;
        used.extend(live_items.iter().map(|item| item.item_id.clone()));
        used.extend(
            self.store
                .read_queue(&list.id)?
                .into_iter()
                .map(|entry| entry.item_id),
        );

        let pipeline = DiscoveryPipeline::new(self.sources, self.scorer);
        let block = match pipeline.generate(list, &used, effective_size, now) {
            Ok(block) => block,
            Err(err) => {
                warn!(list = %list.name, error = %err, "Discovery generation failed");
                let mut outcome = RotationOutcome::empty();
                outcome.status = RotationStatus::Failed;
                return Ok((outcome, Some(err.to_string())));
            }
        };

        self.store.replace_queue(&list.id, &block)?;
        info!(list = %list.name, entries = block.len(), "New discovery block queued");

        let mut outcome = self.rotate(list)?;
        outcome.regenerated = true;
        Ok((outcome, None))
    }

    /// Rotate the queued block into the live list.
    ///
    /// Evicts `|queue|` members (position order for category lists,
    /// oldest first for discovery), appends them to history, then swaps
    /// the live membership and clears the queue.
    pub fn rotate(&self, list: &RotationList) -> Result<RotationOutcome> {
        let queue = self.store.read_queue(&list.id)?;
        if queue.is_empty() {
            info!(list = %list.name, "Queue is empty, nothing to rotate");
            return Ok(RotationOutcome::empty());
        }
        let block_size = queue.len();

        let mut live_items = self.live.list_items(&list.live_collection_id)?;
        if list.mode == RotationMode::Discovery {
            // Oldest first; members without a timestamp go last.
            live_items.sort_by_key(|item| {
                item.added_at.map_or(i64::MAX, |added| added.timestamp())
            });
        }

        let evicted: Vec<Entry> = live_items
            .iter()
            .take(block_size)
            .map(|item| {
                let category =
                    decade_of(&item.release_date).unwrap_or_else(|| UNKNOWN_DECADE.to_string());
                let mut entry =
                    Entry::new(&category, &item.performer, &item.title, &item.item_id);
                entry.added_at = item.added_at;
                entry
            })
            .collect();
        for entry in &evicted {
            debug!(
                list = %list.name,
                performer = %entry.performer,
                title = %entry.title,
                "Evicting"
            );
        }

        self.store.append_history(&list.id, &evicted)?;

        let evicted_ids: Vec<String> = evicted.iter().map(|e| e.item_id.clone()).collect();
        if !evicted_ids.is_empty() {
            self.live
                .remove_items(&list.live_collection_id, &evicted_ids)?;
        }
        let added_ids: Vec<String> = queue.iter().map(|e| e.item_id.clone()).collect();
        self.live.add_items(&list.live_collection_id, &added_ids)?;
        self.store.clear_queue(&list.id)?;

        info!(
            list = %list.name,
            evicted = evicted.len(),
            added = queue.len(),
            "Rotation complete"
        );
        Ok(RotationOutcome {
            status: RotationStatus::Ok,
            evicted_count: evicted.len(),
            added_count: queue.len(),
            evicted_detail: evicted,
            added_detail: queue,
            regenerated: false,
        })
    }

    /// Log-only check that queued entries still match their category's
    /// decade. Never fails the run.
    fn audit_queue_eras(&self, list: &RotationList) {
        let queue = match self.store.read_queue(&list.id) {
            Ok(queue) => queue,
            Err(err) => {
                warn!(list = %list.name, error = %err, "Could not read queue for era audit");
                return;
            }
        };

        for entry in &queue {
            let Some(expected) = decade_token(&entry.category) else {
                continue;
            };
            let resolved = match self.catalog.resolve(&entry.performer, &entry.title) {
                Ok(Some(resolved)) => resolved,
                Ok(None) => continue,
                Err(err) => {
                    warn!(list = %list.name, error = %err, "Era audit lookup failed");
                    continue;
                }
            };
            match decade_of(&resolved.release_date) {
                Some(actual) if actual != expected => {
                    warn!(
                        performer = %entry.performer,
                        title = %entry.title,
                        expected,
                        actual = %actual,
                        "Queued entry decade mismatch"
                    );
                }
                Some(actual) => {
                    debug!(
                        performer = %entry.performer,
                        title = %entry.title,
                        decade = %actual,
                        "Queued entry decade ok"
                    );
                }
                None => {}
            }
        }
    }
}

/// Count of live members at or past the staleness threshold.
pub fn count_stale(live_items: &[LiveItem], stale_age_days: i64, now: DateTime<Utc>) -> usize {
    live_items
        .iter()
        .filter(|item| match item.added_at {
            Some(added) => (now - added).num_days() >= stale_age_days,
            None => false,
        })
        .count()
}

/// Next-block size under the staleness policy: the stale count when it
/// exceeds the configured size, never smaller than configured.
pub fn effective_block_size(
    list: &RotationList,
    live_items: &[LiveItem],
    now: DateTime<Utc>,
) -> usize {
    let stale = count_stale(live_items, list.stale_age_days, now);
    let effective = list.block_size.max(stale);
    if stale > list.block_size {
        info!(
            list = %list.name,
            stale,
            configured = list.block_size,
            effective,
            "Stale members raise block size"
        );
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::collaborators::{ResolvedItem, ScoringCandidate, SourceItem};
    use crate::rotation::sqlite_store::SqliteEntryStore;
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockLive {
        items: Mutex<Vec<LiveItem>>,
        // item metadata for members added by id during the test
        known: HashMap<String, (String, String, String)>,
    }

    impl MockLive {
        fn new(items: Vec<LiveItem>) -> Self {
            Self {
                items: Mutex::new(items),
                known: HashMap::new(),
            }
        }

        fn with_known(mut self, id: &str, performer: &str, title: &str, release: &str) -> Self {
            self.known.insert(
                id.to_string(),
                (performer.to_string(), title.to_string(), release.to_string()),
            );
            self
        }

        fn ids(&self) -> Vec<String> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.item_id.clone())
                .collect()
        }
    }

    impl LiveListMutator for MockLive {
        fn add_items(&self, _collection_id: &str, item_ids: &[String]) -> Result<()> {
            let mut items = self.items.lock().unwrap();
            for id in item_ids {
                let (performer, title, release) = self
                    .known
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| ("?".to_string(), "?".to_string(), String::new()));
                items.push(LiveItem {
                    item_id: id.clone(),
                    performer,
                    title,
                    release_date: release,
                    added_at: None,
                });
            }
            Ok(())
        }

        fn remove_items(&self, _collection_id: &str, item_ids: &[String]) -> Result<()> {
            self.items
                .lock()
                .unwrap()
                .retain(|item| !item_ids.contains(&item.item_id));
            Ok(())
        }

        fn list_items(&self, _collection_id: &str) -> Result<Vec<LiveItem>> {
            Ok(self.items.lock().unwrap().clone())
        }
    }

    struct StubSuggestions {
        lines: Vec<String>,
    }

    impl SuggestionOracle for StubSuggestions {
        fn suggest(
            &self,
            _request: &crate::rotation::collaborators::SuggestionRequest,
        ) -> Result<Vec<String>> {
            Ok(self.lines.clone())
        }
    }

    struct MockCatalog {
        items: HashMap<(String, String), ResolvedItem>,
    }

    impl MockCatalog {
        fn new() -> Self {
            Self {
                items: HashMap::new(),
            }
        }

        fn with_item(mut self, performer: &str, title: &str, id: &str, release: &str) -> Self {
            self.items.insert(
                (performer.to_lowercase(), title.to_lowercase()),
                ResolvedItem {
                    item_id: id.to_string(),
                    release_date: release.to_string(),
                },
            );
            self
        }
    }

    impl CatalogLookup for MockCatalog {
        fn resolve(&self, performer: &str, title: &str) -> Result<Option<ResolvedItem>> {
            Ok(self
                .items
                .get(&(performer.to_lowercase(), title.to_lowercase()))
                .cloned())
        }
    }

    struct StubReader;

    impl SourceCollectionReader for StubReader {
        fn collection_name(&self, _collection_id: &str) -> Result<String> {
            Err(anyhow!("not used"))
        }

        fn collection_items(&self, _collection_id: &str) -> Result<Vec<SourceItem>> {
            Err(anyhow!("not used"))
        }
    }

    struct StubScorer;

    impl ScoringOracle for StubScorer {
        fn score(
            &self,
            _candidates: &[ScoringCandidate],
            _profile: &str,
        ) -> Result<HashMap<usize, u8>> {
            Ok(HashMap::new())
        }
    }

    fn live_item(id: &str, performer: &str, release: &str, added_days_ago: Option<i64>) -> LiveItem {
        LiveItem {
            item_id: id.to_string(),
            performer: performer.to_string(),
            title: format!("{} song", performer),
            release_date: release.to_string(),
            added_at: added_days_ago.map(|days| Utc::now() - Duration::days(days)),
        }
    }

    fn category_list() -> RotationList {
        RotationList {
            id: "wl1".to_string(),
            name: "Decades".to_string(),
            mode: RotationMode::Category,
            live_collection_id: "live".to_string(),
            categories: vec!["80s".to_string(), "90s".to_string()],
            source_collections: vec![],
            block_size: 2,
            max_per_performer: 0,
            stale_age_days: 30,
            taste_profile: None,
        }
    }

    fn discovery_list() -> RotationList {
        RotationList {
            id: "wl2".to_string(),
            name: "Discover".to_string(),
            mode: RotationMode::Discovery,
            live_collection_id: "live".to_string(),
            categories: vec![],
            source_collections: vec!["src1".to_string()],
            block_size: 10,
            max_per_performer: 0,
            stale_age_days: 30,
            taste_profile: Some("profile".to_string()),
        }
    }

    fn engine<'a>(
        store: &'a SqliteEntryStore,
        live: &'a MockLive,
        suggestions: &'a StubSuggestions,
        catalog: &'a MockCatalog,
    ) -> RotationEngine<'a> {
        RotationEngine::new(store, live, suggestions, catalog, &StubReader, &StubScorer)
    }

    static STUB_READER: StubReader = StubReader;
    static STUB_SCORER: StubScorer = StubScorer;

    #[test]
    fn test_rotate_empty_queue_is_noop() {
        let store = SqliteEntryStore::in_memory().unwrap();
        let live = MockLive::new(vec![live_item("a", "A", "1985-01-01", None)]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.rotate(&category_list()).unwrap();
        assert_eq!(outcome.status, RotationStatus::Empty);
        assert_eq!(outcome.evicted_count, 0);
        assert_eq!(live.ids(), vec!["a"]);
        assert!(store.history_entries("wl1").unwrap().is_empty());
    }

    #[test]
    fn test_rotate_evicts_all_when_queue_exceeds_live() {
        // Queue of 5 against a live list of 3: evict all 3, add all 5
        let store = SqliteEntryStore::in_memory().unwrap();
        store
            .replace_queue(
                "wl1",
                &(1..=5)
                    .map(|i| Entry::new("80s", "New", "Song", &format!("new:{}", i)))
                    .collect::<Vec<_>>(),
            )
            .unwrap();
        let live = MockLive::new(vec![
            live_item("a", "A", "1985-01-01", None),
            live_item("b", "B", "1992-01-01", None),
            live_item("c", "C", "2004-01-01", None),
        ]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.rotate(&category_list()).unwrap();
        assert_eq!(outcome.status, RotationStatus::Ok);
        assert_eq!(outcome.evicted_count, 3);
        assert_eq!(outcome.added_count, 5);
        assert_eq!(live.ids().len(), 5);
        assert!(store.read_queue("wl1").unwrap().is_empty());

        // Evicted members land in history categorized by decade
        let history = store.history_entries("wl1").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].category, "80s");
        assert_eq!(history[1].category, "90s");
        assert_eq!(history[2].category, "00s");
    }

    #[test]
    fn test_rotate_category_evicts_by_position() {
        let store = SqliteEntryStore::in_memory().unwrap();
        store
            .replace_queue("wl1", &[Entry::new("80s", "New", "Song", "new:1")])
            .unwrap();
        let live = MockLive::new(vec![
            live_item("first", "A", "1985-01-01", Some(1)),
            live_item("second", "B", "1992-01-01", Some(100)),
        ]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.rotate(&category_list()).unwrap();
        // Position order, not age order
        assert_eq!(outcome.evicted_detail[0].item_id, "first");
        assert_eq!(live.ids(), vec!["second", "new:1"]);
    }

    #[test]
    fn test_rotate_discovery_evicts_oldest_first() {
        let store = SqliteEntryStore::in_memory().unwrap();
        store
            .replace_queue("wl2", &[Entry::new("discovery", "New", "Song", "new:1")])
            .unwrap();
        let live = MockLive::new(vec![
            live_item("young", "A", "2024-01-01", Some(2)),
            live_item("undated", "B", "2024-01-01", None),
            live_item("old", "C", "2024-01-01", Some(60)),
        ]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.rotate(&discovery_list()).unwrap();
        assert_eq!(outcome.evicted_detail[0].item_id, "old");
        assert!(live.ids().contains(&"young".to_string()));
        assert!(live.ids().contains(&"undated".to_string()));
    }

    #[test]
    fn test_rotate_unknown_release_date_categorized_as_unknown() {
        let store = SqliteEntryStore::in_memory().unwrap();
        store
            .replace_queue("wl1", &[Entry::new("80s", "New", "Song", "new:1")])
            .unwrap();
        let live = MockLive::new(vec![live_item("a", "A", "", None)]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        engine.rotate(&category_list()).unwrap();
        let history = store.history_entries("wl1").unwrap();
        assert_eq!(history[0].category, "unknown");
    }

    #[test]
    fn test_count_stale_and_effective_block_size() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let mut items: Vec<LiveItem> = (0..40)
            .map(|i| LiveItem {
                item_id: format!("old:{}", i),
                performer: "A".to_string(),
                title: "T".to_string(),
                release_date: String::new(),
                added_at: Some(now - Duration::days(45)),
            })
            .collect();
        items.push(LiveItem {
            item_id: "fresh".to_string(),
            performer: "B".to_string(),
            title: "T".to_string(),
            release_date: String::new(),
            added_at: Some(now - Duration::days(3)),
        });
        items.push(LiveItem {
            item_id: "undated".to_string(),
            performer: "C".to_string(),
            title: "T".to_string(),
            release_date: String::new(),
            added_at: None,
        });

        assert_eq!(count_stale(&items, 30, now), 40);

        // 40 stale members against a configured size of 10
        let list = discovery_list();
        assert_eq!(effective_block_size(&list, &items, now), 40);

        // Never shrinks below the configured size
        let few = &items[..3];
        assert_eq!(effective_block_size(&list, few, now), 10);
    }

    #[test]
    fn test_run_list_category_rotates_and_refills() {
        let store = SqliteEntryStore::in_memory().unwrap();
        store
            .replace_queue(
                "wl1",
                &[
                    Entry::new("80s", "Prince", "1999", "queued:1"),
                    Entry::new("90s", "Nirvana", "Lithium", "queued:2"),
                ],
            )
            .unwrap();
        let live = MockLive::new(vec![
            live_item("a", "Toto", "1982-04-01", None),
            live_item("b", "Blur", "1994-04-25", None),
        ])
        .with_known("queued:1", "Prince", "1999", "1982-10-27")
        .with_known("queued:2", "Nirvana", "Lithium", "1991-09-24");
        let suggestions = StubSuggestions {
            lines: vec![
                "80s | A-ha | Take On Me".to_string(),
                "90s | Oasis | Wonderwall".to_string(),
            ],
        };
        let catalog = MockCatalog::new()
            .with_item("Prince", "1999", "queued:1", "1982-10-27")
            .with_item("Nirvana", "Lithium", "queued:2", "1991-09-24")
            .with_item("A-ha", "Take On Me", "aha:1", "1985-06-01")
            .with_item("Oasis", "Wonderwall", "oasis:1", "1995-10-02");
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.run_list(&category_list()).unwrap();
        assert_eq!(outcome.status, RotationStatus::Ok);
        assert_eq!(outcome.evicted_count, 2);
        assert_eq!(outcome.added_count, 2);
        assert!(outcome.regenerated);

        let queue = store.read_queue("wl1").unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].performer, "A-ha");
        assert_eq!(queue[1].performer, "Oasis");
    }

    #[test]
    fn test_run_list_category_empty_queue_skips_generation() {
        let store = SqliteEntryStore::in_memory().unwrap();
        let live = MockLive::new(vec![live_item("a", "A", "1985-01-01", None)]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.run_list(&category_list()).unwrap();
        assert_eq!(outcome.status, RotationStatus::Empty);
        assert!(!outcome.regenerated);
        assert!(store.read_queue("wl1").unwrap().is_empty());
    }

    #[test]
    fn test_run_list_category_failed_refill_keeps_rotation() {
        // Oracle never produces usable lines: rotation succeeds but the
        // queue stays empty and the outcome reports no regeneration.
        let store = SqliteEntryStore::in_memory().unwrap();
        store
            .replace_queue("wl1", &[Entry::new("80s", "Prince", "1999", "queued:1")])
            .unwrap();
        let live = MockLive::new(vec![live_item("a", "Toto", "1982-04-01", None)]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let engine = engine(&store, &live, &suggestions, &catalog);

        let outcome = engine.run_list(&category_list()).unwrap();
        assert_eq!(outcome.status, RotationStatus::Ok);
        assert!(!outcome.regenerated);
        assert!(store.read_queue("wl1").unwrap().is_empty());
        assert_eq!(live.ids(), vec!["queued:1"]);
    }

    #[test]
    fn test_run_list_discovery_generation_failure_is_failed_status() {
        let store = SqliteEntryStore::in_memory().unwrap();
        let live = MockLive::new(vec![]);
        let suggestions = StubSuggestions { lines: vec![] };
        let catalog = MockCatalog::new();
        let mut list = discovery_list();
        list.taste_profile = None;
        let engine = RotationEngine::new(
            &store,
            &live,
            &suggestions,
            &catalog,
            &STUB_READER,
            &STUB_SCORER,
        );

        let outcome = engine.run_list(&list).unwrap();
        assert_eq!(outcome.status, RotationStatus::Failed);
        assert!(!outcome.regenerated);
        assert_eq!(outcome.evicted_count, 0);
    }
}
