use std::time::Duration;

use crate::utils::consts::{
    HIGH_VOLTAGE, LOW_VOLTAGE, MAX_PAYLOAD_SIZE, PULSE_WIDTH_MS, QUEUE_CAPACITY,
};

/// Per-interface configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Drive level for a logical high (volts).
    pub high_voltage: f64,
    /// Drive level for a logical low (volts).
    pub low_voltage: f64,
    /// Width of one signal pulse.
    pub pulse_width: Duration,
    /// Largest payload accepted for transmission (bytes).
    pub max_payload: usize,
    /// Capacity of the inbound and outbound frame queues.
    pub queue_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            high_voltage: HIGH_VOLTAGE,
            low_voltage: LOW_VOLTAGE,
            pulse_width: Duration::from_millis(PULSE_WIDTH_MS),
            max_payload: MAX_PAYLOAD_SIZE,
            queue_capacity: QUEUE_CAPACITY,
        }
    }
}

impl LinkConfig {
    /// Decision threshold for sampling, biased two thirds of the way from
    /// low to high so an idle medium reads as low.
    pub fn threshold_voltage(&self) -> f64 {
        (self.low_voltage + 2.0 * self.high_voltage) / 3.0
    }
}
