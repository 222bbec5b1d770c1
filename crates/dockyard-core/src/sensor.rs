//! Gate hardware seams. The journey operations never talk to a camera or a
//! weighbridge directly; they take these traits so tests and the simulator
//! can stand in for the real devices.

use crate::error::{Result, YardError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Reads a vehicle registration plate at the gate.
#[async_trait]
pub trait PlateScanner: Send + Sync {
    async fn scan_plate(&self) -> Result<String>;
}

/// Reads the current weighbridge figure in kilograms.
#[async_trait]
pub trait Weighbridge: Send + Sync {
    async fn read_weight(&self) -> Result<u32>;
}

// ---------------------------------------------------------------------------
// Simulated devices
// ---------------------------------------------------------------------------

/// Scripted scanner for tests and demos. Each call pops the next queued
/// plate after an optional settle delay; an exhausted script is a sensor
/// fault, not a silent repeat.
pub struct SimulatedPlateScanner {
    plates: Mutex<VecDeque<String>>,
    delay: Duration,
}

impl SimulatedPlateScanner {
    pub fn new(plates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            plates: Mutex::new(plates.into_iter().map(Into::into).collect()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn pop(&self) -> Result<String> {
        let mut plates = self
            .plates
            .lock()
            .map_err(|_| YardError::Sensor("plate scanner poisoned".to_string()))?;
        plates
            .pop_front()
            .ok_or_else(|| YardError::Sensor("plate scanner script exhausted".to_string()))
    }
}

#[async_trait]
impl PlateScanner for SimulatedPlateScanner {
    async fn scan_plate(&self) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let plate = self.pop()?;
        tracing::debug!(%plate, "simulated plate scan");
        Ok(plate)
    }
}

/// Scripted weighbridge, same contract as [`SimulatedPlateScanner`].
pub struct SimulatedWeighbridge {
    readings: Mutex<VecDeque<u32>>,
    delay: Duration,
}

impl SimulatedWeighbridge {
    pub fn new(readings: impl IntoIterator<Item = u32>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn pop(&self) -> Result<u32> {
        let mut readings = self
            .readings
            .lock()
            .map_err(|_| YardError::Sensor("weighbridge poisoned".to_string()))?;
        readings
            .pop_front()
            .ok_or_else(|| YardError::Sensor("weighbridge script exhausted".to_string()))
    }
}

#[async_trait]
impl Weighbridge for SimulatedWeighbridge {
    async fn read_weight(&self) -> Result<u32> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let weight = self.pop()?;
        tracing::debug!(weight, "simulated weighbridge reading");
        Ok(weight)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scanner_pops_in_order_then_faults() {
        let scanner = SimulatedPlateScanner::new(["TN-01-AB-1234", "KA-05-XY-9876"]);
        assert_eq!(scanner.scan_plate().await.unwrap(), "TN-01-AB-1234");
        assert_eq!(scanner.scan_plate().await.unwrap(), "KA-05-XY-9876");
        assert!(matches!(scanner.scan_plate().await, Err(YardError::Sensor(_))));
    }

    #[tokio::test]
    async fn weighbridge_pops_in_order_then_faults() {
        let bridge = SimulatedWeighbridge::new([15_000, 27_000]);
        assert_eq!(bridge.read_weight().await.unwrap(), 15_000);
        assert_eq!(bridge.read_weight().await.unwrap(), 27_000);
        assert!(matches!(bridge.read_weight().await, Err(YardError::Sensor(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_elapses_before_reading() {
        let bridge = SimulatedWeighbridge::new([15_000]).with_delay(Duration::from_millis(250));
        let before = tokio::time::Instant::now();
        bridge.read_weight().await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(250));
    }
}
