//! The gate-to-gate journey. A single transition table defines every legal
//! status move; [`GateProcess`] wires the table to the store, the dock pool
//! and the gate hardware, so each operation is one guarded, versioned,
//! persisted step.

use crate::checklist::LoadingChecklist;
use crate::dock::DockPool;
use crate::entry::{DriverInfo, Route, VehicleEntry};
use crate::error::{Result, YardError};
use crate::sensor::{PlateScanner, Weighbridge};
use crate::store::EntryStore;
use crate::types::{EntryStatus, GateEvent};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// (current status, event, next status). Anything not listed here, and not
/// covered by the reject/cancel rule below, is an invalid transition.
const TRANSITIONS: &[(EntryStatus, GateEvent, EntryStatus)] = &[
    (EntryStatus::NotStarted, GateEvent::GateIn, EntryStatus::GateIn),
    (EntryStatus::GateIn, GateEvent::GeneratePass, EntryStatus::GatePassGenerated),
    // Tare can be taken straight after gate-in or after the pass prints.
    (EntryStatus::GateIn, GateEvent::CaptureTare, EntryStatus::TareWeightCaptured),
    (EntryStatus::GatePassGenerated, GateEvent::CaptureTare, EntryStatus::TareWeightCaptured),
    (EntryStatus::TareWeightCaptured, GateEvent::StartLoading, EntryStatus::LoadingInDock),
    (EntryStatus::LoadingInDock, GateEvent::CompleteLoading, EntryStatus::Loading),
    (EntryStatus::Loading, GateEvent::CaptureGross, EntryStatus::GrossWeightCaptured),
    (EntryStatus::GrossWeightCaptured, GateEvent::GateOut, EntryStatus::GateOut),
    (EntryStatus::GateOut, GateEvent::Complete, EntryStatus::Completed),
];

/// Resolve the status an `event` moves `from` to, or explain why it cannot.
pub fn next_status(from: EntryStatus, event: GateEvent) -> Result<EntryStatus> {
    // Reject and cancel are legal from any live status.
    match event {
        GateEvent::Reject if !from.is_terminal() => return Ok(EntryStatus::Rejected),
        GateEvent::Cancel if !from.is_terminal() => return Ok(EntryStatus::Cancelled),
        _ => {}
    }

    if let Some((_, _, to)) = TRANSITIONS.iter().find(|(f, e, _)| *f == from && *e == event) {
        return Ok(*to);
    }

    // The one refusal operators actually hit, spelled out for them.
    if from == EntryStatus::LoadingInDock && event == GateEvent::CaptureGross {
        return Err(YardError::InvalidTransition {
            from: from.to_string(),
            to: EntryStatus::GrossWeightCaptured.to_string(),
            reason: "complete the loading checklist before capturing gross weight".to_string(),
        });
    }

    Err(YardError::InvalidTransition {
        from: from.to_string(),
        to: format!("({})", event),
        reason: if from.is_terminal() {
            format!("entry is already {from}")
        } else {
            "event is not valid for the current status".to_string()
        },
    })
}

fn apply_event(entry: &mut VehicleEntry, event: GateEvent) -> Result<EntryStatus> {
    let to = next_status(entry.status, event)?;
    tracing::info!(entry = %entry.id, from = %entry.status, %to, "status transition");
    entry.set_status(to);
    Ok(to)
}

fn new_gate_pass_number() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("GP-{}", uuid[..8].to_uppercase())
}

// ---------------------------------------------------------------------------
// GateProcess
// ---------------------------------------------------------------------------

/// Drives vehicle entries through the yard. Every mutation goes through the
/// store's optimistic version check, so two operators acting on a stale view
/// get a clean [`YardError::StaleEntry`] instead of a lost update.
pub struct GateProcess {
    store: Arc<EntryStore>,
    pool: DockPool,
    scanner: Arc<dyn PlateScanner>,
    weighbridge: Arc<dyn Weighbridge>,
}

impl GateProcess {
    pub fn new(
        store: Arc<EntryStore>,
        pool: DockPool,
        scanner: Arc<dyn PlateScanner>,
        weighbridge: Arc<dyn Weighbridge>,
    ) -> Self {
        Self {
            store,
            pool,
            scanner,
            weighbridge,
        }
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    /// Register a planned trip. The entry starts life as `not-started`; the
    /// vehicle number is only known once the plate is scanned at the gate.
    pub fn register(
        &self,
        load_number: impl Into<String>,
        trip_uid: impl Into<String>,
        driver: DriverInfo,
        transporter: impl Into<String>,
        route: Route,
    ) -> Result<VehicleEntry> {
        let entry = VehicleEntry::new(load_number, trip_uid, driver, transporter, route);
        self.store.insert(entry.clone())?;
        Ok(entry)
    }

    /// Admit the vehicle: scan the plate, stamp the arrival time.
    pub async fn gate_in(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        let plate = self.scanner.scan_plate().await?;
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::GateIn)?;
            entry.vehicle_number = plate;
            entry.driver.verified = true;
            entry.gate_in_time = Some(Utc::now());
            Ok(())
        })
    }

    /// Print a gate pass and pencil in a dock. The dock is not occupied
    /// until the vehicle actually starts loading.
    pub fn generate_pass(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        let entries = self.store.list();
        let dock = self.pool.find_available(&entries).ok_or(YardError::NoDocks)?;
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::GeneratePass)?;
            entry.gate_pass_number = Some(new_gate_pass_number());
            entry.assigned_dock = Some(dock);
            Ok(())
        })
    }

    /// Capture the empty (tare) weight from the weighbridge.
    pub async fn capture_tare(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        // Guard first: a refused transition must not consume a reading.
        next_status(self.store.get(id)?.status, GateEvent::CaptureTare)?;
        let weight = self.weighbridge.read_weight().await?;
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::CaptureTare)?;
            entry.tare_weight = Some(weight);
            Ok(())
        })
    }

    /// Move the vehicle into a dock and open a fresh loading checklist. A
    /// dock pencilled in at pass time is kept; otherwise one is allocated
    /// now.
    ///
    /// Dock occupancy is derived from the current entries, and the snapshot
    /// is taken before the guarded write: two concurrent calls can still be
    /// handed the same dock. Operators resolve the clash on the ground.
    pub fn start_loading(&self, id: &str, version: u64, incharge: &str) -> Result<VehicleEntry> {
        let incharge = incharge.trim();
        if incharge.is_empty() {
            return Err(YardError::InvalidTransition {
                from: self.store.get(id)?.status.to_string(),
                to: EntryStatus::LoadingInDock.to_string(),
                reason: "a loading incharge name is required".to_string(),
            });
        }
        let entries = self.store.list();
        let candidate = self.pool.find_available(&entries).ok_or(YardError::NoDocks)?;
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::StartLoading)?;
            if entry.assigned_dock.is_none() {
                entry.assigned_dock = Some(candidate);
            }
            entry.loading_start_time = Some(Utc::now());
            entry.loading_incharge = Some(incharge.to_string());
            entry.checklist = Some(LoadingChecklist::standard());
            Ok(())
        })
    }

    /// Tick or untick one checklist item while the vehicle sits in the dock.
    pub fn set_checklist_item(
        &self,
        id: &str,
        version: u64,
        item_id: &str,
        completed: bool,
    ) -> Result<VehicleEntry> {
        self.store.update(id, version, |entry| {
            if entry.status != EntryStatus::LoadingInDock {
                return Err(YardError::InvalidTransition {
                    from: entry.status.to_string(),
                    to: entry.status.to_string(),
                    reason: "checklist items can only change while loading in dock".to_string(),
                });
            }
            let checklist = entry
                .checklist
                .as_mut()
                .ok_or_else(|| YardError::UnknownChecklistItem(item_id.to_string()))?;
            if !checklist.set_completed(item_id, completed) {
                return Err(YardError::UnknownChecklistItem(item_id.to_string()));
            }
            Ok(())
        })
    }

    /// Declare loading done. Refused until every required checklist item is
    /// ticked; the vehicle keeps occupying its dock either way.
    pub fn complete_loading(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        self.store.update(id, version, |entry| {
            let ready = entry
                .checklist
                .as_ref()
                .map(LoadingChecklist::required_complete)
                .unwrap_or(false);
            if !ready {
                return Err(YardError::InvalidTransition {
                    from: entry.status.to_string(),
                    to: EntryStatus::Loading.to_string(),
                    reason: "required checklist items are incomplete".to_string(),
                });
            }
            apply_event(entry, GateEvent::CompleteLoading)?;
            entry.loading_end_time = Some(Utc::now());
            Ok(())
        })
    }

    /// Capture the loaded (gross) weight. Only reachable once loading is
    /// declared complete.
    pub async fn capture_gross(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        // Guard first: a refused transition must not consume a reading.
        next_status(self.store.get(id)?.status, GateEvent::CaptureGross)?;
        let weight = self.weighbridge.read_weight().await?;
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::CaptureGross)?;
            entry.gross_weight = Some(weight);
            Ok(())
        })
    }

    pub fn gate_out(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::GateOut)?;
            entry.gate_out_time = Some(Utc::now());
            Ok(())
        })
    }

    pub fn complete(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        self.store
            .update(id, version, |entry| apply_event(entry, GateEvent::Complete).map(|_| ()))
    }

    /// Turn the vehicle away. Legal from any live status.
    pub fn reject(&self, id: &str, version: u64, reason: &str) -> Result<VehicleEntry> {
        self.store.update(id, version, |entry| {
            apply_event(entry, GateEvent::Reject)?;
            entry.rejection_reason = Some(reason.to_string());
            Ok(())
        })
    }

    pub fn cancel(&self, id: &str, version: u64) -> Result<VehicleEntry> {
        self.store
            .update(id, version, |entry| apply_event(entry, GateEvent::Cancel).map(|_| ()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{SimulatedPlateScanner, SimulatedWeighbridge};
    use crate::store::StoreEvent;
    use tempfile::TempDir;

    fn process(dir: &TempDir, plates: &[&str], weights: &[u32]) -> GateProcess {
        let store = Arc::new(EntryStore::open(dir.path().join("yard.json")).unwrap());
        GateProcess::new(
            store,
            DockPool::standard(),
            Arc::new(SimulatedPlateScanner::new(plates.iter().copied())),
            Arc::new(SimulatedWeighbridge::new(weights.iter().copied())),
        )
    }

    fn register(p: &GateProcess) -> VehicleEntry {
        p.register(
            "LD-2024-0042",
            "TRIP-8841",
            DriverInfo {
                name: "Rajesh Kumar".to_string(),
                phone: "+91-98400-12345".to_string(),
                license_number: Some("TN-DL-2019-441".to_string()),
                verified: true,
            },
            "Southern Roadways",
            Route {
                origin: "Chennai".to_string(),
                destination: "Bengaluru".to_string(),
                origin_code: "MAA".to_string(),
                destination_code: "BLR".to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn full_journey_happy_path() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["KA01AB1234"], &[15_000, 27_000]);
        let entry = register(&p);
        let id = entry.id.clone();

        let e = p.gate_in(&id, 0).await.unwrap();
        assert_eq!(e.status, EntryStatus::GateIn);
        assert_eq!(e.vehicle_number, "KA01AB1234");
        assert!(e.driver.verified);
        assert!(e.gate_in_time.is_some());

        let e = p.generate_pass(&id, e.version).unwrap();
        assert_eq!(e.status, EntryStatus::GatePassGenerated);
        let pass = e.gate_pass_number.clone().unwrap();
        assert!(pass.starts_with("GP-"));
        assert_eq!(pass.len(), 11);
        // An empty yard hands out the first dock with the pass.
        assert_eq!(e.assigned_dock.as_ref().map(|d| d.as_str()), Some("Dock 1"));

        let e = p.capture_tare(&id, e.version).await.unwrap();
        assert_eq!(e.status, EntryStatus::TareWeightCaptured);
        assert_eq!(e.tare_weight, Some(15_000));

        let e = p.start_loading(&id, e.version, "S. Murugan").unwrap();
        assert_eq!(e.status, EntryStatus::LoadingInDock);
        assert_eq!(e.assigned_dock.as_ref().map(|d| d.as_str()), Some("Dock 1"));
        assert!(e.checklist.is_some());

        // Gross weight is refused while the checklist is open.
        let err = p.capture_gross(&id, e.version).await.unwrap_err();
        match err {
            YardError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("checklist"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The refusal happened before the weighbridge was touched; the
        // entry did not move and the reading stays queued for later.
        let e = p.store().get(&id).unwrap();
        assert_eq!(e.status, EntryStatus::LoadingInDock);
        assert!(e.gross_weight.is_none());

        // Complete every required item, then declare loading done.
        let mut version = e.version;
        let ids: Vec<String> = e
            .checklist
            .as_ref()
            .unwrap()
            .items
            .iter()
            .filter(|i| i.required)
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(ids.len(), 16);
        for item_id in ids {
            version = p.set_checklist_item(&id, version, &item_id, true).unwrap().version;
        }
        let e = p.complete_loading(&id, version).unwrap();
        assert_eq!(e.status, EntryStatus::Loading);
        assert!(e.loading_end_time.is_some());

        let e = p.capture_gross(&id, e.version).await.unwrap();
        assert_eq!(e.status, EntryStatus::GrossWeightCaptured);
        assert_eq!(e.gross_weight, Some(27_000));
        assert_eq!(e.net_weight(), Some(12_000));

        let e = p.gate_out(&id, e.version).unwrap();
        assert_eq!(e.status, EntryStatus::GateOut);
        let e = p.complete(&id, e.version).unwrap();
        assert_eq!(e.status, EntryStatus::Completed);
        assert!(e.is_terminal());

        // One history segment per status, only the last one open.
        assert_eq!(e.status_history.len(), 9);
        assert!(e.status_history[..8].iter().all(|s| s.exited.is_some()));
        assert!(e.status_history[8].exited.is_none());
    }

    #[tokio::test]
    async fn tare_can_skip_the_gate_pass() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234"], &[15_000]);
        let entry = register(&p);
        let e = p.gate_in(&entry.id, 0).await.unwrap();
        let e = p.capture_tare(&entry.id, e.version).await.unwrap();
        assert_eq!(e.status, EntryStatus::TareWeightCaptured);
        assert!(e.gate_pass_number.is_none());
    }

    #[tokio::test]
    async fn out_of_order_events_are_refused() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &[], &[15_000]);
        let entry = register(&p);

        // Cannot weigh a vehicle that never entered.
        assert!(matches!(
            p.capture_tare(&entry.id, 0).await,
            Err(YardError::InvalidTransition { .. })
        ));
        // Cannot start loading before the tare.
        assert!(matches!(
            p.start_loading(&entry.id, 0, "S. Murugan"),
            Err(YardError::InvalidTransition { .. })
        ));
        // The entry never moved.
        assert_eq!(p.store().get(&entry.id).unwrap().status, EntryStatus::NotStarted);
    }

    #[tokio::test]
    async fn refused_weighing_does_not_consume_the_reading() {
        let dir = TempDir::new().unwrap();
        // One scripted reading: it must survive the refused attempt.
        let p = process(&dir, &["TN-01-AB-1234"], &[15_000]);
        let entry = register(&p);

        assert!(matches!(
            p.capture_tare(&entry.id, 0).await,
            Err(YardError::InvalidTransition { .. })
        ));

        let e = p.gate_in(&entry.id, 0).await.unwrap();
        let e = p.capture_tare(&entry.id, e.version).await.unwrap();
        assert_eq!(e.tare_weight, Some(15_000));
    }

    #[tokio::test]
    async fn blank_incharge_name_is_refused() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234"], &[15_000]);
        let entry = register(&p);
        let e = p.gate_in(&entry.id, 0).await.unwrap();
        let e = p.capture_tare(&entry.id, e.version).await.unwrap();

        let err = p.start_loading(&entry.id, e.version, "   ").unwrap_err();
        match err {
            YardError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("incharge"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            p.store().get(&entry.id).unwrap().status,
            EntryStatus::TareWeightCaptured
        );
    }

    #[tokio::test]
    async fn reject_works_from_any_live_status_but_not_terminal() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234"], &[]);
        let entry = register(&p);
        let e = p.gate_in(&entry.id, 0).await.unwrap();

        let e = p.reject(&entry.id, e.version, "expired fitness certificate").unwrap();
        assert_eq!(e.status, EntryStatus::Rejected);
        assert_eq!(e.rejection_reason.as_deref(), Some("expired fitness certificate"));

        let err = p.cancel(&entry.id, e.version).unwrap_err();
        assert!(matches!(err, YardError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn stale_version_is_refused_without_applying() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234"], &[]);
        let entry = register(&p);
        let e = p.gate_in(&entry.id, 0).await.unwrap();
        assert_eq!(e.version, 1);

        // A second operator still holding version 0.
        let err = p.generate_pass(&entry.id, 0).unwrap_err();
        assert!(matches!(err, YardError::StaleEntry { actual: 1, .. }));
        assert!(p.store().get(&entry.id).unwrap().gate_pass_number.is_none());
    }

    #[tokio::test]
    async fn checklist_gates_complete_loading() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234"], &[15_000]);
        let entry = register(&p);
        let id = entry.id.clone();
        let e = p.gate_in(&id, 0).await.unwrap();
        let e = p.capture_tare(&id, e.version).await.unwrap();
        let e = p.start_loading(&id, e.version, "S. Murugan").unwrap();

        let err = p.complete_loading(&id, e.version).unwrap_err();
        match err {
            YardError::InvalidTransition { reason, .. } => {
                assert!(reason.contains("checklist"))
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            p.set_checklist_item(&id, e.version, "no-such-item", true),
            Err(YardError::UnknownChecklistItem(_))
        ));
    }

    #[tokio::test]
    async fn two_vehicles_get_distinct_docks() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234", "KA-05-XY-9876"], &[15_000, 14_500]);
        let a = register(&p);
        let b = register(&p);

        let ea = p.gate_in(&a.id, 0).await.unwrap();
        let ea = p.capture_tare(&a.id, ea.version).await.unwrap();
        let ea = p.start_loading(&a.id, ea.version, "S. Murugan").unwrap();

        let eb = p.gate_in(&b.id, 0).await.unwrap();
        let eb = p.capture_tare(&b.id, eb.version).await.unwrap();
        let eb = p.start_loading(&b.id, eb.version, "S. Murugan").unwrap();

        assert_ne!(ea.assigned_dock, eb.assigned_dock);
    }

    #[tokio::test]
    async fn mutations_fan_out_to_subscribers() {
        let dir = TempDir::new().unwrap();
        let p = process(&dir, &["TN-01-AB-1234"], &[]);
        let mut rx = p.store().subscribe();

        let entry = register(&p);
        p.gate_in(&entry.id, 0).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::Inserted { id: entry.id.clone() }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::Updated { id: entry.id.clone() }
        );
    }
}
