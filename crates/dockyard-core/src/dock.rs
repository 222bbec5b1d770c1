//! Dock pool and allocation.
//!
//! Occupancy is never stored: it is derived on every read from the entries
//! currently in a dock-holding status. Two callers that both allocate before
//! either writes its assignment back can therefore receive the same dock;
//! that window is inherent to the derive-from-entries design and accepted.

use crate::entry::VehicleEntry;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// DockId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DockId(String);

impl DockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// DockPool
// ---------------------------------------------------------------------------

/// Fixed pool of loading docks. Docks are not provisioned dynamically; the
/// pool is configured once and holds a small number of identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockPool {
    docks: Vec<DockId>,
}

impl DockPool {
    pub fn new(docks: Vec<DockId>) -> Self {
        Self { docks }
    }

    /// The yard's standard five-dock layout, `Dock 1` through `Dock 5`.
    pub fn standard() -> Self {
        Self::new((1..=5).map(|n| DockId::new(format!("Dock {n}"))).collect())
    }

    pub fn docks(&self) -> &[DockId] {
        &self.docks
    }

    pub fn len(&self) -> usize {
        self.docks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docks.is_empty()
    }

    /// Docks currently held by entries in `loading-in-dock` or `loading`.
    pub fn occupied(&self, entries: &[VehicleEntry]) -> HashSet<DockId> {
        entries
            .iter()
            .filter(|e| e.status.occupies_dock())
            .filter_map(|e| e.assigned_dock.clone())
            .collect()
    }

    /// First dock in pool order not currently occupied. When every dock is
    /// occupied, a dock is drawn uniformly at random from the full pool: the
    /// pool is a soft constraint, not a hard capacity cap, and an
    /// oversubscribed assignment is preferred over turning the vehicle away.
    /// Returns `None` only when the pool itself is empty.
    pub fn find_available(&self, entries: &[VehicleEntry]) -> Option<DockId> {
        let occupied = self.occupied(entries);
        if let Some(free) = self.docks.iter().find(|d| !occupied.contains(*d)) {
            tracing::debug!(dock = %free, occupied = occupied.len(), "allocated free dock");
            return Some(free.clone());
        }
        let fallback = self.docks.choose(&mut rand::thread_rng()).cloned();
        if let Some(dock) = &fallback {
            tracing::warn!(dock = %dock, pool = self.docks.len(), "all docks occupied, oversubscribing");
        }
        fallback
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::VehicleEntry;
    use crate::types::EntryStatus;

    fn entry_at_dock(dock: &DockId, status: EntryStatus) -> VehicleEntry {
        let mut entry = VehicleEntry::for_tests("KA01AB0000");
        entry.status = status;
        entry.assigned_dock = Some(dock.clone());
        entry
    }

    #[test]
    fn first_free_dock_in_pool_order() {
        let pool = DockPool::standard();
        let dock = pool.find_available(&[]).unwrap();
        assert_eq!(dock.as_str(), "Dock 1");
    }

    #[test]
    fn skips_occupied_docks() {
        let pool = DockPool::standard();
        let entries = vec![
            entry_at_dock(&pool.docks()[0], EntryStatus::LoadingInDock),
            entry_at_dock(&pool.docks()[1], EntryStatus::Loading),
        ];
        let dock = pool.find_available(&entries).unwrap();
        assert_eq!(dock.as_str(), "Dock 3");
    }

    #[test]
    fn non_occupying_statuses_do_not_hold_docks() {
        let pool = DockPool::standard();
        // A vehicle that has weighed out no longer blocks its dock.
        let entries = vec![entry_at_dock(
            &pool.docks()[0],
            EntryStatus::GrossWeightCaptured,
        )];
        let dock = pool.find_available(&entries).unwrap();
        assert_eq!(dock.as_str(), "Dock 1");
    }

    #[test]
    fn full_pool_falls_back_within_pool() {
        let pool = DockPool::standard();
        let entries: Vec<_> = pool
            .docks()
            .iter()
            .map(|d| entry_at_dock(d, EntryStatus::LoadingInDock))
            .collect();
        // Every allocation must still land on a real dock.
        for _ in 0..20 {
            let dock = pool.find_available(&entries).unwrap();
            assert!(pool.docks().contains(&dock));
        }
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let pool = DockPool::new(Vec::new());
        assert!(pool.find_available(&[]).is_none());
    }
}
