use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::phy::checksum::WireChecksum;
use crate::phy::frame::Frame;
use crate::phy::line::LineDriver;
use crate::utils::consts::{ESCAPE, SENTINEL};

/// Append `byte` to the wire stream, escaping it if it collides with a
/// reserved value.
fn stuff_into(wire: &mut Vec<u8>, byte: u8) {
    if byte == SENTINEL || byte == ESCAPE {
        wire.push(ESCAPE);
    }
    wire.push(byte);
}

fn stuff_u32(wire: &mut Vec<u8>, value: u32) {
    let mut field = [0u8; 4];
    BigEndian::write_u32(&mut field, value);
    for &byte in &field {
        stuff_into(wire, byte);
    }
}

/// Build the complete stuffed wire byte stream for one frame.
///
/// Layout: `length(4) source(4) destination(4) payload checksum(4)
/// terminator`, every field except the terminator byte-stuffed. The
/// length field carries the stuffed byte count of source + destination +
/// payload, which is exactly the window the checksum ranges over on both
/// sides: escape bytes included, the checksum field itself excluded.
pub fn encode(payload: &[u8], source: u32, destination: u32) -> Vec<u8> {
    let mut window = Vec::with_capacity(8 + payload.len() * 2);
    stuff_u32(&mut window, source);
    stuff_u32(&mut window, destination);
    for &byte in payload {
        stuff_into(&mut window, byte);
    }

    let mut checksum = WireChecksum::new();
    for &byte in &window {
        checksum.push(byte);
    }

    let mut wire = Vec::with_capacity(window.len() + 10);
    stuff_u32(&mut wire, window.len() as u32);
    wire.extend_from_slice(&window);
    stuff_u32(&mut wire, u32::from(checksum.complement()));
    wire.push(SENTINEL);
    wire
}

/// Serializes frames and drives them onto the medium.
pub struct FrameEncoder {
    line: LineDriver,
    device_number: u32,
    max_payload: usize,
}

impl FrameEncoder {
    pub fn new(line: LineDriver, device_number: u32, max_payload: usize) -> Self {
        Self {
            line,
            device_number,
            max_payload,
        }
    }

    /// Transmit one frame. Synchronous: returns only once the terminator
    /// has been placed on the medium, which makes this call the unit of
    /// mutual exclusion for the medium from this device's perspective.
    pub fn transmit(&self, frame: &Frame) -> Result<()> {
        if frame.payload().len() > self.max_payload {
            return Err(LinkError::PayloadTooLarge {
                got: frame.payload().len(),
                max: self.max_payload,
            });
        }

        let wire = encode(frame.payload(), self.device_number, frame.destination());
        debug!(
            "device {}: transmitting {} wire bytes to device {}",
            self.device_number,
            wire.len(),
            frame.destination()
        );

        self.line.idle_guard()?;
        for &byte in &wire {
            self.line.transmit_byte(byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_payload_length_field_covers_the_eight_header_bytes() {
        let wire = encode(&[], 1, 2);
        assert_eq!(&wire[0..4], &[0, 0, 0, 8]);
        assert_eq!(wire.len(), 4 + 8 + 4 + 1);
        assert_eq!(*wire.last().unwrap(), SENTINEL);
    }

    #[test]
    fn reserved_payload_bytes_are_stuffed() {
        // The concrete scenario: id 1 -> id 2, payload [7E 01 7D].
        let wire = encode(&[0x7E, 0x01, 0x7D], 1, 2);

        // Stuffed window: 8 header bytes then 7D 7E 01 7D 7D.
        assert_eq!(&wire[0..4], &[0, 0, 0, 13]);
        assert_eq!(&wire[4..12], &[0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(&wire[12..17], &[0x7D, 0x7E, 0x01, 0x7D, 0x7D]);

        // Checksum ranges over the stuffed window.
        let mut checksum = WireChecksum::new();
        for &byte in &wire[4..17] {
            checksum.push(byte);
        }
        let mut trailer = Vec::new();
        stuff_u32(&mut trailer, u32::from(checksum.complement()));
        assert_eq!(&wire[17..wire.len() - 1], &trailer[..]);
    }

    fn assert_sentinel_only_terminates(wire: &[u8]) {
        let mut escaped = false;
        for (i, &byte) in wire.iter().enumerate() {
            if escaped {
                escaped = false;
                continue;
            }
            if byte == ESCAPE {
                escaped = true;
            } else if byte == SENTINEL {
                assert_eq!(i, wire.len() - 1, "unescaped sentinel mid-frame");
            }
        }
    }

    #[test]
    fn terminator_is_the_only_unescaped_sentinel() {
        // Device ids made of reserved bytes stuff the header fields.
        assert_sentinel_only_terminates(&encode(b"plain", 0x7E7E_7E7E, 0x7D7D_7D7D));

        // A stuffed window of 126 = 0x7E bytes stuffs the length field
        // itself, which would otherwise terminate the frame mid-header.
        let wire = encode(&vec![0xAB; 126 - 8], 1, 2);
        assert_eq!(&wire[0..5], &[0, 0, 0, 0x7D, 0x7E]);
        assert_sentinel_only_terminates(&wire);
    }

    #[test]
    fn length_counts_stuffed_bytes() {
        let wire = encode(&[0x7E], 1, 2);
        // 8 header bytes plus the escaped payload byte.
        assert_eq!(&wire[0..4], &[0, 0, 0, 10]);
    }
}
