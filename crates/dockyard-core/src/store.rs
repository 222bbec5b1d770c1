//! Persistent vehicle-entry store. Entries live in memory behind a mutex
//! and are mirrored to a single JSON document on every mutation; writers
//! go through an optimistic version check, and readers can subscribe to a
//! broadcast channel instead of polling.

use crate::entry::VehicleEntry;
use crate::error::{Result, YardError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted after a mutation has been applied and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Inserted { id: String },
    Updated { id: String },
}

impl StoreEvent {
    pub fn entry_id(&self) -> &str {
        match self {
            Self::Inserted { id } | Self::Updated { id } => id,
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(rename = "gateEntries")]
    gate_entries: BTreeMap<String, VehicleEntry>,
}

// ---------------------------------------------------------------------------
// EntryStore
// ---------------------------------------------------------------------------

pub struct EntryStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, VehicleEntry>>,
    tx: broadcast::Sender<StoreEvent>,
}

impl EntryStore {
    /// Open the store at `path`, loading the existing document if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let doc: StoreDocument = serde_json::from_str(&raw)?;
            doc.gate_entries
        } else {
            BTreeMap::new()
        };
        tracing::info!(path = %path.display(), entries = entries.len(), "opened entry store");
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            tx,
        })
    }

    /// Subscribe to mutation events. Slow receivers lag and catch back up by
    /// re-reading; the store never blocks on them.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    pub fn get(&self, id: &str) -> Result<VehicleEntry> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| YardError::EntryNotFound(id.to_string()))
    }

    /// All entries, keyed order (insertion id). Callers filter as needed.
    pub fn list(&self) -> Vec<VehicleEntry> {
        self.lock().values().cloned().collect()
    }

    pub fn find_by_vehicle_number(&self, vehicle_number: &str) -> Option<VehicleEntry> {
        self.lock()
            .values()
            .find(|e| e.vehicle_number == vehicle_number && !e.is_terminal())
            .cloned()
    }

    pub fn insert(&self, entry: VehicleEntry) -> Result<()> {
        let id = entry.id.clone();
        {
            let mut entries = self.lock();
            if entries.contains_key(&id) {
                return Err(YardError::EntryExists(id));
            }
            entries.insert(id.clone(), entry);
            self.persist(&entries)?;
        }
        self.notify(StoreEvent::Inserted { id });
        Ok(())
    }

    /// Apply `mutate` to the entry under an optimistic version check. The
    /// caller states the version it last read; a mismatch means someone
    /// else wrote in between, and the caller must re-read and retry.
    /// On success the version is bumped and the document persisted before
    /// the event goes out.
    pub fn update<F>(&self, id: &str, expected_version: u64, mutate: F) -> Result<VehicleEntry>
    where
        F: FnOnce(&mut VehicleEntry) -> Result<()>,
    {
        let updated = {
            let mut entries = self.lock();
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| YardError::EntryNotFound(id.to_string()))?;
            if entry.version != expected_version {
                return Err(YardError::StaleEntry {
                    id: id.to_string(),
                    expected: expected_version,
                    actual: entry.version,
                });
            }
            mutate(entry)?;
            entry.version += 1;
            entry.touch();
            let updated = entry.clone();
            self.persist(&entries)?;
            updated
        };
        self.notify(StoreEvent::Updated { id: id.to_string() });
        Ok(updated)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, VehicleEntry>> {
        // Recover from a poisoned lock; the map itself is always consistent
        // because mutations that fail leave it untouched or fully applied.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.tx.send(event);
    }

    /// Write-to-temp-then-rename so a crash mid-write never truncates the
    /// document.
    fn persist(&self, entries: &BTreeMap<String, VehicleEntry>) -> Result<()> {
        let doc = StoreDocument {
            gate_entries: entries.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| YardError::Io(e.error))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
