//! Device control interface used during playback.
//!
//! The editor never interprets a [`DeviceServiceSnapshot`]; it hands the
//! snapshot to a [`DeviceController`] which knows the serial protocol of the
//! connected hardware. [`SimulatedDevice`] stands in for hardware in dry runs
//! and tests.

use crate::error::Result;
use crate::types::{Condition, DeviceServiceSnapshot};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Connection to the device a sequence drives
///
/// Implementations must be shareable across the threads of a fork.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceController: Send + Sync {
    /// Apply every operation of an expression's snapshot
    fn apply_expression(&self, snapshot: &DeviceServiceSnapshot) -> Result<()>;

    /// Read the sensor named by `condition` and test it
    fn evaluate_condition(&self, condition: &Condition) -> Result<bool>;
}

/// In-memory device recording what it was asked to do
///
/// Each sensor plays back a scripted list of readings; the last reading
/// repeats once the script is exhausted. Unscripted sensors read `0`.
#[derive(Debug, Default)]
pub struct SimulatedDevice {
    applied: Mutex<Vec<DeviceServiceSnapshot>>,
    readings: Mutex<HashMap<(String, u32), VecDeque<i32>>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the readings of one sensor
    pub fn with_readings(
        self,
        service: impl Into<String>,
        port: u32,
        readings: impl IntoIterator<Item = i32>,
    ) -> Self {
        self.readings
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((service.into(), port), readings.into_iter().collect());
        self
    }

    /// Next reading of a sensor
    pub fn read_sensor(&self, service: &str, port: u32) -> i32 {
        let mut readings = self.readings.lock().unwrap_or_else(|p| p.into_inner());
        match readings.get_mut(&(service.to_string(), port)) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or_default(),
            Some(script) => script.front().copied().unwrap_or_default(),
            None => 0,
        }
    }

    /// Snapshots applied so far, in order
    pub fn applied(&self) -> Vec<DeviceServiceSnapshot> {
        self.applied
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl DeviceController for SimulatedDevice {
    fn apply_expression(&self, snapshot: &DeviceServiceSnapshot) -> Result<()> {
        tracing::trace!(
            "Simulated device applying {} operations",
            snapshot.operation_count()
        );
        self.applied
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(snapshot.clone());
        Ok(())
    }

    fn evaluate_condition(&self, condition: &Condition) -> Result<bool> {
        let reading = self.read_sensor(&condition.service, condition.port);
        Ok(condition.holds(reading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Comparison;

    #[test]
    fn test_scripted_readings_repeat_last() {
        let device = SimulatedDevice::new().with_readings("distance", 1, [5, 10]);
        assert_eq!(device.read_sensor("distance", 1), 5);
        assert_eq!(device.read_sensor("distance", 1), 10);
        assert_eq!(device.read_sensor("distance", 1), 10);
        assert_eq!(device.read_sensor("distance", 2), 0);
    }

    #[test]
    fn test_condition_uses_readings() {
        let device = SimulatedDevice::new().with_readings("light", 0, [3, 50]);
        let dark = Condition::new("light", 0, Comparison::LessThan, 10);
        assert!(device.evaluate_condition(&dark).unwrap());
        assert!(!device.evaluate_condition(&dark).unwrap());
    }

    #[test]
    fn test_records_applied_snapshots() {
        let device = SimulatedDevice::new();
        let snap = DeviceServiceSnapshot::new().with_operation("led", "on", [("port", "1")]);
        device.apply_expression(&snap).unwrap();
        assert_eq!(device.applied(), vec![snap]);
        assert_eq!(device.applied_count(), 1);
    }
}
