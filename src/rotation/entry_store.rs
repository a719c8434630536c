//! Entry storage for rotation lists.
//!
//! Each list owns an append-only history log and a fully-replaceable
//! queue holding the next block. Two interchangeable backends exist:
//! the flat-file store below and the SQLite store in `sqlite_store`.
//! The engine is constructed with one of them and never branches on
//! which backend is active.

use super::models::{Entry, RunAudit};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage operations the rotation engine needs per list id.
pub trait EntryStore: Send + Sync {
    /// Append entries to the history log, preserving order.
    fn append_history(&self, list_id: &str, entries: &[Entry]) -> Result<()>;

    /// Full history in insertion order.
    fn history_entries(&self, list_id: &str) -> Result<Vec<Entry>>;

    /// Item identifiers of everything ever placed in the list.
    fn history_identifiers(&self, list_id: &str) -> Result<HashSet<String>>;

    /// Replace the queued block wholesale.
    fn replace_queue(&self, list_id: &str, entries: &[Entry]) -> Result<()>;

    /// The queued block in order, empty when none is staged.
    fn read_queue(&self, list_id: &str) -> Result<Vec<Entry>>;

    /// Drop the queued block after the rotation consumed it.
    fn clear_queue(&self, list_id: &str) -> Result<()>;

    /// Record the audit trail of one rotation run.
    fn record_run(&self, audit: &RunAudit) -> Result<()>;
}

/// Flat-file entry store.
///
/// Keeps one `<list_id>_history.txt` and `<list_id>_queue.txt` per list
/// under a root directory, one entry per line:
/// `category - performer - title - item_id`. The item id is always the
/// last ` - ` separated field, so titles containing ` - ` survive.
pub struct FileEntryStore {
    root: PathBuf,
}

impl FileEntryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create entry store directory {:?}", root))?;
        Ok(Self { root })
    }

    fn history_path(&self, list_id: &str) -> PathBuf {
        self.root.join(format!("{}_history.txt", list_id))
    }

    fn queue_path(&self, list_id: &str) -> PathBuf {
        self.root.join(format!("{}_queue.txt", list_id))
    }

    fn read_entries(path: &Path) -> Result<Vec<Entry>> {
        if !path.exists() {
            return Ok(vec![]);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read entry file {:?}", path))?;
        Ok(content.lines().filter_map(parse_entry_line).collect())
    }

    fn write_entries(path: &Path, entries: &[Entry]) -> Result<()> {
        let mut content = String::new();
        for entry in entries {
            content.push_str(&format_entry_line(entry));
            content.push('\n');
        }
        fs::write(path, content).with_context(|| format!("Failed to write entry file {:?}", path))
    }
}

fn format_entry_line(entry: &Entry) -> String {
    format!(
        "{} - {} - {} - {}",
        entry.category, entry.performer, entry.title, entry.item_id
    )
}

/// Parse one stored line. The id is split off from the right so a
/// ` - ` inside the title does not shift fields.
fn parse_entry_line(line: &str) -> Option<Entry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (left, item_id) = line.rsplit_once(" - ")?;
    let mut parts = left.splitn(3, " - ");
    let category = parts.next()?.trim();
    let performer = parts.next()?.trim();
    let title = parts.next()?.trim();
    if item_id.trim().is_empty() {
        return None;
    }
    Some(Entry::new(category, performer, title, item_id.trim()))
}

impl EntryStore for FileEntryStore {
    fn append_history(&self, list_id: &str, entries: &[Entry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let path = self.history_path(list_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open history file {:?}", path))?;
        for entry in entries {
            writeln!(file, "{}", format_entry_line(entry))?;
        }
        debug!(list_id, count = entries.len(), "Appended history entries");
        Ok(())
    }

    fn history_entries(&self, list_id: &str) -> Result<Vec<Entry>> {
        Self::read_entries(&self.history_path(list_id))
    }

    fn history_identifiers(&self, list_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .history_entries(list_id)?
            .into_iter()
            .map(|e| e.item_id)
            .collect())
    }

    fn replace_queue(&self, list_id: &str, entries: &[Entry]) -> Result<()> {
        Self::write_entries(&self.queue_path(list_id), entries)
    }

    fn read_queue(&self, list_id: &str) -> Result<Vec<Entry>> {
        Self::read_entries(&self.queue_path(list_id))
    }

    fn clear_queue(&self, list_id: &str) -> Result<()> {
        Self::write_entries(&self.queue_path(list_id), &[])
    }

    fn record_run(&self, audit: &RunAudit) -> Result<()> {
        let path = self.root.join("runs.log");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open run log {:?}", path))?;
        writeln!(
            file,
            "{} {} {} started={} completed={}{}",
            audit.id,
            audit.list_id,
            audit.status.as_str(),
            audit.started_at,
            audit.completed_at,
            audit
                .error_message
                .as_deref()
                .map(|m| format!(" error={}", m))
                .unwrap_or_default()
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::models::RotationStatus;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, FileEntryStore) {
        let dir = TempDir::new().unwrap();
        let store = FileEntryStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_history_starts_empty() {
        let (_dir, store) = make_store();
        assert!(store.history_entries("wl1").unwrap().is_empty());
        assert!(store.history_identifiers("wl1").unwrap().is_empty());
    }

    #[test]
    fn test_append_history_preserves_order() {
        let (_dir, store) = make_store();
        let first = vec![
            Entry::new("80s", "Prince", "1999", "item:1"),
            Entry::new("90s", "Nirvana", "Lithium", "item:2"),
        ];
        let second = vec![Entry::new("00s", "Muse", "Hysteria", "item:3")];
        store.append_history("wl1", &first).unwrap();
        store.append_history("wl1", &second).unwrap();

        let history = store.history_entries("wl1").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].item_id, "item:1");
        assert_eq!(history[2].item_id, "item:3");
    }

    #[test]
    fn test_queue_replace_and_clear() {
        let (_dir, store) = make_store();
        let block = vec![Entry::new("80s", "Prince", "1999", "item:1")];
        store.replace_queue("wl1", &block).unwrap();
        assert_eq!(store.read_queue("wl1").unwrap().len(), 1);

        let replacement = vec![
            Entry::new("90s", "Nirvana", "Lithium", "item:2"),
            Entry::new("00s", "Muse", "Hysteria", "item:3"),
        ];
        store.replace_queue("wl1", &replacement).unwrap();
        let queue = store.read_queue("wl1").unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].item_id, "item:2");

        store.clear_queue("wl1").unwrap();
        assert!(store.read_queue("wl1").unwrap().is_empty());
    }

    #[test]
    fn test_lists_are_isolated() {
        let (_dir, store) = make_store();
        store
            .append_history("wl1", &[Entry::new("80s", "Prince", "1999", "item:1")])
            .unwrap();
        assert!(store.history_entries("wl2").unwrap().is_empty());
    }

    #[test]
    fn test_parse_line_with_dash_in_title() {
        let entry = parse_entry_line("90s - Nirvana - Smells - Like Teen Spirit - item:42").unwrap();
        assert_eq!(entry.category, "90s");
        assert_eq!(entry.performer, "Nirvana");
        assert_eq!(entry.title, "Smells - Like Teen Spirit");
        assert_eq!(entry.item_id, "item:42");
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_entry_line("").is_none());
        assert!(parse_entry_line("just some text").is_none());
        assert!(parse_entry_line("only - two").is_none());
    }

    #[test]
    fn test_record_run_appends() {
        let (dir, store) = make_store();
        let audit = RunAudit {
            id: "run-1".to_string(),
            list_id: "wl1".to_string(),
            status: RotationStatus::Ok,
            started_at: 100,
            completed_at: 105,
            error_message: None,
        };
        store.record_run(&audit).unwrap();
        let content = std::fs::read_to_string(dir.path().join("runs.log")).unwrap();
        assert!(content.contains("run-1 wl1 ok"));
    }
}
