use std::collections::HashMap;
use std::sync::Mutex;

/// A shared physical medium holding a voltage level per attached device.
///
/// The link layer never owns the medium; an `Arc<dyn Medium>` is injected
/// at interface construction and every call is treated as atomic.
pub trait Medium: Send + Sync {
    /// Set the voltage this device is driving onto the medium.
    fn set_voltage(&self, device_name: &str, level: f64);

    /// Sample the voltage observed at this device's attachment point.
    fn get_voltage(&self, device_name: &str) -> f64;
}

/// Process-local medium simulation.
///
/// The observed voltage at any attachment point is the sum of the levels
/// driven by all devices, so an idle medium reads 0.0 and two devices
/// driving at once corrupt each other, as they would on real copper.
#[derive(Debug, Default)]
pub struct SharedMedium {
    drives: Mutex<HashMap<String, f64>>,
}

impl SharedMedium {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Medium for SharedMedium {
    fn set_voltage(&self, device_name: &str, level: f64) {
        let mut drives = self.drives.lock().unwrap();
        drives.insert(device_name.to_string(), level);
    }

    fn get_voltage(&self, _device_name: &str) -> f64 {
        let drives = self.drives.lock().unwrap();
        drives.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_medium_reads_zero() {
        let medium = SharedMedium::new();
        assert_eq!(medium.get_voltage("a"), 0.0);
    }

    #[test]
    fn drives_superimpose() {
        let medium = SharedMedium::new();
        medium.set_voltage("a", 2.5);
        assert_eq!(medium.get_voltage("b"), 2.5);

        medium.set_voltage("b", -2.5);
        assert_eq!(medium.get_voltage("a"), 0.0);

        medium.set_voltage("b", 2.5);
        assert_eq!(medium.get_voltage("a"), 5.0);
    }

    #[test]
    fn latest_drive_per_device_wins() {
        let medium = SharedMedium::new();
        medium.set_voltage("a", 2.5);
        medium.set_voltage("a", -2.5);
        assert_eq!(medium.get_voltage("a"), -2.5);
    }
}
