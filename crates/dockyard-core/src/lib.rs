pub mod checklist;
pub mod consolidation;
pub mod dock;
pub mod entry;
pub mod error;
pub mod journey;
pub mod order;
pub mod planner;
pub mod sensor;
pub mod store;
pub mod types;

pub use error::{Result, YardError};
