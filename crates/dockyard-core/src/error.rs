use thiserror::Error;

#[derive(Debug, Error)]
pub enum YardError {
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("entry already exists: {0}")]
    EntryExists(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("stale write for entry {id}: read version {expected}, store has {actual}")]
    StaleEntry {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("dock pool is empty")]
    NoDocks,

    #[error("item exceeds vehicle capacity: max weight {max_weight} kg, max quantity {max_quantity} units")]
    CapacityExceeded { max_weight: u32, max_quantity: u32 },

    #[error("{0} line items remain unassigned: assign every item before confirming")]
    UnassignedItems(usize),

    #[error("bin '{bin}' is not ready to confirm: {reason}")]
    IncompleteBin { bin: String, reason: String },

    #[error("split produced no child orders")]
    EmptySplit,

    #[error("unknown checklist item: {0}")]
    UnknownChecklistItem(String),

    #[error("clubbing requires at least two orders")]
    NotEnoughOrders,

    #[error("unknown vehicle type: {0}")]
    UnknownVehicleType(String),

    #[error("sensor read failed: {0}")]
    Sensor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, YardError>;
