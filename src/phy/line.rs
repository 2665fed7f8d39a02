use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::medium::Medium;
use crate::utils::consts::GUARD_PULSES;

/// Serializes single bytes to and from voltage pulses on the medium.
///
/// This is the only layer that touches raw timing. A byte on the wire is
/// a guard interval (low, 4 pulse-widths), a start pulse (high, 1
/// pulse-width), then 8 data pulses MSB first. Pulse boundaries are paced
/// against the instant the byte started so sleep overshoot in one slot
/// does not accumulate into the next.
pub struct LineDriver {
    medium: Arc<dyn Medium>,
    device_name: String,
    config: LinkConfig,
    running: Arc<AtomicBool>,
}

impl LineDriver {
    pub fn new(
        medium: Arc<dyn Medium>,
        device_name: String,
        config: LinkConfig,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            medium,
            device_name,
            config,
            running,
        }
    }

    /// Hold the idle level for one guard interval ahead of a frame.
    pub fn idle_guard(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(LinkError::Shutdown);
        }
        self.medium
            .set_voltage(&self.device_name, self.config.low_voltage);
        thread::sleep(self.config.pulse_width * GUARD_PULSES);
        Ok(())
    }

    /// Drive one byte onto the medium. Synchronous for the full 13 pulse
    /// slots; checks for shutdown only on entry, so a byte in progress is
    /// always completed.
    pub fn transmit_byte(&self, value: u8) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(LinkError::Shutdown);
        }

        let pulse = self.config.pulse_width;
        let start = Instant::now();

        // Guard interval, so the receiver's threshold wait re-arms.
        self.medium
            .set_voltage(&self.device_name, self.config.low_voltage);
        Self::pace(start, pulse * GUARD_PULSES);

        // Start pulse.
        self.medium
            .set_voltage(&self.device_name, self.config.high_voltage);
        Self::pace(start, pulse * (GUARD_PULSES + 1));

        let mut bits = value;
        for slot in 0..8u32 {
            let level = if bits & 0x80 != 0 {
                self.config.high_voltage
            } else {
                self.config.low_voltage
            };
            self.medium.set_voltage(&self.device_name, level);
            bits <<= 1;
            Self::pace(start, pulse * (GUARD_PULSES + 2 + slot));
        }

        trace!("{}: transmitted byte {:#04x}", self.device_name, value);
        Ok(())
    }

    /// Block until a start pulse arrives, then sample the eight data
    /// pulses at their centers, MSB first.
    ///
    /// The threshold wait has no timeout; it returns early only when the
    /// interface shuts down. A missed edge is not an error; drift across
    /// a long frame is an accepted limitation of the asynchronous scheme.
    pub fn receive_byte(&self) -> Result<u8> {
        let pulse = self.config.pulse_width;
        let threshold = self.config.threshold_voltage();

        while self.medium.get_voltage(&self.device_name) < threshold {
            if !self.running.load(Ordering::SeqCst) {
                return Err(LinkError::Shutdown);
            }
            thread::sleep(pulse / 10);
        }

        let edge = Instant::now();
        let mut value: u8 = 0;

        // Center of data slot k sits 1.5 + k pulse-widths past the edge.
        for slot in 0..8u32 {
            Self::pace(edge, pulse * 3 / 2 + pulse * slot);
            value <<= 1;
            if self.medium.get_voltage(&self.device_name) > threshold {
                value |= 1;
            }
        }

        // Sit out the tail of the final slot so the next threshold wait
        // starts inside the sender's guard interval, not on a trailing
        // high bit of this byte.
        Self::pace(edge, pulse * 19 / 2);

        trace!("{}: received byte {:#04x}", self.device_name, value);
        Ok(value)
    }

    /// Sleep until `offset` past `start`.
    fn pace(start: Instant, offset: Duration) {
        let deadline = start + offset;
        if let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::SharedMedium;

    fn test_driver(medium: Arc<dyn Medium>, name: &str) -> LineDriver {
        let config = LinkConfig {
            pulse_width: Duration::from_millis(10),
            ..LinkConfig::default()
        };
        LineDriver::new(
            medium,
            name.to_string(),
            config,
            Arc::new(AtomicBool::new(true)),
        )
    }

    #[test]
    fn bytes_survive_the_pulse_round_trip() {
        let medium: Arc<dyn Medium> = Arc::new(SharedMedium::new());
        let tx = test_driver(medium.clone(), "tx");
        let rx = test_driver(medium.clone(), "rx");

        let sent = [0xA5u8, 0x00, 0xFF];
        let receiver = thread::spawn(move || {
            (0..3)
                .map(|_| rx.receive_byte().unwrap())
                .collect::<Vec<u8>>()
        });

        // Give the receiver time to arm its threshold wait.
        thread::sleep(Duration::from_millis(30));
        for &byte in &sent {
            tx.transmit_byte(byte).unwrap();
        }

        assert_eq!(receiver.join().unwrap(), sent);
    }

    #[test]
    fn shutdown_interrupts_the_threshold_wait() {
        let medium: Arc<dyn Medium> = Arc::new(SharedMedium::new());
        let running = Arc::new(AtomicBool::new(true));
        let rx = LineDriver::new(
            medium,
            "rx".to_string(),
            LinkConfig {
                pulse_width: Duration::from_millis(10),
                ..LinkConfig::default()
            },
            running.clone(),
        );

        let waiter = thread::spawn(move || rx.receive_byte());
        thread::sleep(Duration::from_millis(30));
        running.store(false, Ordering::SeqCst);

        assert_eq!(waiter.join().unwrap(), Err(LinkError::Shutdown));
    }
}
