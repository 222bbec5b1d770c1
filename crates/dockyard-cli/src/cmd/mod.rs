pub mod docks;
pub mod entry;
pub mod orders;
