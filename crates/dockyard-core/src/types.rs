use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntryStatus
// ---------------------------------------------------------------------------

/// Where a vehicle sits in the gate-to-gate journey. The string forms are the
/// wire/store representation ("gate-pass-generated" etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    NotStarted,
    GateIn,
    GatePassGenerated,
    TareWeightCaptured,
    LoadingInDock,
    Loading,
    GrossWeightCaptured,
    GateOut,
    Completed,
    Rejected,
    Cancelled,
}

impl EntryStatus {
    pub fn all() -> &'static [EntryStatus] {
        &[
            EntryStatus::NotStarted,
            EntryStatus::GateIn,
            EntryStatus::GatePassGenerated,
            EntryStatus::TareWeightCaptured,
            EntryStatus::LoadingInDock,
            EntryStatus::Loading,
            EntryStatus::GrossWeightCaptured,
            EntryStatus::GateOut,
            EntryStatus::Completed,
            EntryStatus::Rejected,
            EntryStatus::Cancelled,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::NotStarted => "not-started",
            EntryStatus::GateIn => "gate-in",
            EntryStatus::GatePassGenerated => "gate-pass-generated",
            EntryStatus::TareWeightCaptured => "tare-weight-captured",
            EntryStatus::LoadingInDock => "loading-in-dock",
            EntryStatus::Loading => "loading",
            EntryStatus::GrossWeightCaptured => "gross-weight-captured",
            EntryStatus::GateOut => "gate-out",
            EntryStatus::Completed => "completed",
            EntryStatus::Rejected => "rejected",
            EntryStatus::Cancelled => "cancelled",
        }
    }

    /// `Completed`, `Rejected` and `Cancelled` are final; the entry is
    /// read-only once it reaches one of them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EntryStatus::Completed | EntryStatus::Rejected | EntryStatus::Cancelled
        )
    }

    /// Statuses during which a vehicle physically holds its assigned dock.
    /// Dock occupancy is derived from entries in these statuses.
    pub fn occupies_dock(self) -> bool {
        matches!(self, EntryStatus::LoadingInDock | EntryStatus::Loading)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = crate::error::YardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryStatus::all()
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| crate::error::YardError::InvalidStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// GateEvent
// ---------------------------------------------------------------------------

/// Events fed to the journey transition table. Every mutation of a
/// `VehicleEntry`'s status goes through exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateEvent {
    GateIn,
    GeneratePass,
    CaptureTare,
    StartLoading,
    CompleteLoading,
    CaptureGross,
    GateOut,
    Complete,
    Reject,
    Cancel,
}

impl GateEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            GateEvent::GateIn => "gate-in",
            GateEvent::GeneratePass => "generate-pass",
            GateEvent::CaptureTare => "capture-tare",
            GateEvent::StartLoading => "start-loading",
            GateEvent::CompleteLoading => "complete-loading",
            GateEvent::CaptureGross => "capture-gross",
            GateEvent::GateOut => "gate-out",
            GateEvent::Complete => "complete",
            GateEvent::Reject => "reject",
            GateEvent::Cancel => "cancel",
        }
    }
}

impl fmt::Display for GateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Draft,
    Ready,
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Ready => "ready",
            OrderStatus::Assigned => "assigned",
            OrderStatus::InTransit => "in-transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// LineItemStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineItemStatus {
    Pending,
    Ready,
    Assigned,
    Shipped,
}

impl fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineItemStatus::Pending => "pending",
            LineItemStatus::Ready => "ready",
            LineItemStatus::Assigned => "assigned",
            LineItemStatus::Shipped => "shipped",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
