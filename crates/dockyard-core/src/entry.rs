use crate::checklist::LoadingChecklist;
use crate::dock::DockId;
use crate::types::EntryStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub origin: String,
    pub destination: String,
    pub origin_code: String,
    pub destination_code: String,
}

/// One status change, with entry/exit stamps. The full history is the audit
/// trail of the journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: EntryStatus,
    pub entered: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// VehicleEntry
// ---------------------------------------------------------------------------

/// A vehicle's record from first gate scan to exit. Weights, dock assignment
/// and timestamps are populated monotonically: once set they are never
/// cleared except by a terminal rejection/cancellation. Entries are never
/// physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleEntry {
    pub id: String,
    pub vehicle_number: String,
    pub load_number: String,
    pub trip_uid: String,
    pub status: EntryStatus,
    pub driver: DriverInfo,
    pub transporter: String,
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_in_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_out_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_end_time: Option<DateTime<Utc>>,
    /// Kilograms, captured at the weighbridge before loading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tare_weight: Option<u32>,
    /// Kilograms, captured at the weighbridge after loading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_dock: Option<DockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_pass_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_incharge: Option<String>,
    /// Checklist snapshot recorded when loading completed, for audit display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<LoadingChecklist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub status_history: Vec<StatusChange>,
    /// Per-entry sequence number for optimistic concurrency at the store.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl VehicleEntry {
    pub fn new(
        load_number: impl Into<String>,
        trip_uid: impl Into<String>,
        driver: DriverInfo,
        transporter: impl Into<String>,
        route: Route,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            vehicle_number: String::new(),
            load_number: load_number.into(),
            trip_uid: trip_uid.into(),
            status: EntryStatus::NotStarted,
            driver,
            transporter: transporter.into(),
            route,
            gate_in_time: None,
            gate_out_time: None,
            loading_start_time: None,
            loading_end_time: None,
            tare_weight: None,
            gross_weight: None,
            assigned_dock: None,
            gate_pass_number: None,
            loading_incharge: None,
            checklist: None,
            rejection_reason: None,
            status_history: vec![StatusChange {
                status: EntryStatus::NotStarted,
                entered: now,
                exited: None,
            }],
            version: 0,
            updated_at: now,
        }
    }

    /// Net cargo weight in kilograms, available only once both weighbridge
    /// readings are present. Derived on demand, never stored.
    pub fn net_weight(&self) -> Option<u32> {
        match (self.gross_weight, self.tare_weight) {
            (Some(gross), Some(tare)) => Some(gross.saturating_sub(tare)),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to a new status, closing the previous history segment. Callers
    /// (the journey module) are responsible for having validated the edge.
    pub(crate) fn set_status(&mut self, status: EntryStatus) {
        let now = Utc::now();
        if let Some(last) = self.status_history.last_mut() {
            last.exited = Some(now);
        }
        self.status = status;
        self.status_history.push(StatusChange {
            status,
            entered: now,
            exited: None,
        });
        self.updated_at = now;
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[cfg(test)]
    pub(crate) fn for_tests(vehicle_number: &str) -> Self {
        let mut entry = Self::new(
            "LN-1001",
            "TRIP-9001",
            DriverInfo {
                name: "Rajesh Kumar".to_string(),
                phone: "9876543210".to_string(),
                license_number: Some("KA-DL-2217".to_string()),
                verified: false,
            },
            "Southern Haulage",
            Route {
                origin: "Chennai Plant".to_string(),
                destination: "Bengaluru".to_string(),
                origin_code: "MAA".to_string(),
                destination_code: "BLR".to_string(),
            },
        );
        entry.vehicle_number = vehicle_number.to_string();
        entry
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_starts_unweighed() {
        let entry = VehicleEntry::for_tests("KA01AB1234");
        assert_eq!(entry.status, EntryStatus::NotStarted);
        assert!(entry.tare_weight.is_none());
        assert!(entry.net_weight().is_none());
        assert_eq!(entry.status_history.len(), 1);
        assert_eq!(entry.version, 0);
    }

    #[test]
    fn net_weight_requires_both_readings() {
        let mut entry = VehicleEntry::for_tests("KA01AB1234");
        entry.tare_weight = Some(15_000);
        assert!(entry.net_weight().is_none());
        entry.gross_weight = Some(27_000);
        assert_eq!(entry.net_weight(), Some(12_000));
    }

    #[test]
    fn status_history_closes_previous_segment() {
        let mut entry = VehicleEntry::for_tests("KA01AB1234");
        entry.set_status(EntryStatus::GateIn);
        assert_eq!(entry.status_history.len(), 2);
        assert!(entry.status_history[0].exited.is_some());
        assert!(entry.status_history[1].exited.is_none());
        assert_eq!(entry.status_history[1].status, EntryStatus::GateIn);
    }

    #[test]
    fn json_shape_uses_camel_case() {
        let mut entry = VehicleEntry::for_tests("KA01AB1234");
        entry.gate_in_time = Some(Utc::now());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"vehicleNumber\":\"KA01AB1234\""));
        assert!(json.contains("\"gateInTime\""));
        assert!(json.contains("\"not-started\""));
        // Unset optionals are omitted, not serialized as null.
        assert!(!json.contains("grossWeight"));

        let parsed: VehicleEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.vehicle_number, "KA01AB1234");
    }
}
