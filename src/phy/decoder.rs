use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace, warn};

use crate::phy::checksum::WireChecksum;
use crate::phy::frame::Frame;
use crate::utils::consts::{CHECKSUM_TRAILER_BYTES, ESCAPE, SENTINEL};

/// Receiver state, advanced one destuffed byte at a time.
enum DecoderState {
    Length,
    Source,
    Destination,
    Body,
}

/// Byte-at-a-time wire frame parser.
///
/// Feed raw wire bytes with [`FrameDecoder::push`]; a frame pops out when
/// an unescaped terminator closes a valid, locally-addressed wire frame.
/// The machine never looks ahead: destuffing, header parsing and checksum
/// accounting all happen as each byte arrives, and an unescaped sentinel
/// ends the current frame from any state, even mid-header.
///
/// Frames addressed elsewhere are consumed to the terminator but not
/// delivered, keeping the receiver byte-aligned with the sender.
pub struct FrameDecoder {
    local_id: u32,
    max_payload: usize,

    state: DecoderState,
    escaped: bool,

    field: [u8; 4],
    field_fill: usize,

    checksum: WireChecksum,
    budget: u32,
    budget_armed: bool,

    source: u32,
    for_local: bool,
    oversized: bool,
    body: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(local_id: u32, max_payload: usize) -> Self {
        Self {
            local_id,
            max_payload,
            state: DecoderState::Length,
            escaped: false,
            field: [0; 4],
            field_fill: 0,
            checksum: WireChecksum::new(),
            budget: 0,
            budget_armed: false,
            source: 0,
            for_local: false,
            oversized: false,
            body: Vec::new(),
        }
    }

    /// Consume one raw wire byte. Returns a frame exactly when this byte
    /// is the terminator of an intact frame addressed to the local device.
    pub fn push(&mut self, raw: u8) -> Option<Frame> {
        // Destuffing precedes state interpretation: after an escape the
        // byte is literal whatever its value, so an escaped sentinel is
        // data, not a terminator.
        if self.escaped {
            self.escaped = false;
            self.account(raw);
            self.step(raw);
            return None;
        }
        if raw == ESCAPE {
            self.account(raw);
            self.escaped = true;
            return None;
        }
        if raw == SENTINEL {
            let result = self.finish();
            self.reset();
            return result;
        }
        self.account(raw);
        self.step(raw);
        None
    }

    /// Checksum accounting over the stuffed stream: once the length field
    /// has armed the budget, every wire byte is accumulated and decrements
    /// it, escape bytes included, until the budget runs out. The checksum
    /// trailer lands past the budget and is never accumulated.
    fn account(&mut self, raw: u8) {
        if self.budget_armed && self.budget > 0 {
            self.checksum.push(raw);
            self.budget -= 1;
        }
    }

    /// Advance the field state machine with one destuffed byte.
    fn step(&mut self, byte: u8) {
        match self.state {
            DecoderState::Length => {
                if self.collect(byte) {
                    self.budget = BigEndian::read_u32(&self.field);
                    self.budget_armed = true;
                    self.state = DecoderState::Source;
                }
            }
            DecoderState::Source => {
                if self.collect(byte) {
                    self.source = BigEndian::read_u32(&self.field);
                    self.state = DecoderState::Destination;
                }
            }
            DecoderState::Destination => {
                if self.collect(byte) {
                    let destination = BigEndian::read_u32(&self.field);
                    self.for_local = destination == self.local_id;
                    if !self.for_local {
                        trace!(
                            "device {}: consuming frame addressed to device {}",
                            self.local_id, destination
                        );
                    }
                    self.state = DecoderState::Body;
                }
            }
            DecoderState::Body => {
                if self.for_local && !self.oversized {
                    if self.body.len() < self.max_payload + CHECKSUM_TRAILER_BYTES {
                        self.body.push(byte);
                    } else {
                        warn!(
                            "device {}: frame body exceeds {} bytes, dropping",
                            self.local_id,
                            self.max_payload + CHECKSUM_TRAILER_BYTES
                        );
                        self.oversized = true;
                    }
                }
            }
        }
    }

    /// Fill one 4-byte header field. True once the field is complete.
    fn collect(&mut self, byte: u8) -> bool {
        self.field[self.field_fill] = byte;
        self.field_fill += 1;
        if self.field_fill == 4 {
            self.field_fill = 0;
            true
        } else {
            false
        }
    }

    /// Terminator handling: validate and deliver, or drop silently.
    fn finish(&mut self) -> Option<Frame> {
        if !matches!(self.state, DecoderState::Body) {
            // Terminator mid-header. Also covers a stray sentinel on an
            // otherwise idle line.
            trace!("device {}: frame terminated mid-header", self.local_id);
            return None;
        }
        if !self.for_local || self.oversized {
            return None;
        }
        if self.body.len() < CHECKSUM_TRAILER_BYTES {
            warn!(
                "device {}: frame body too short for checksum trailer, dropping",
                self.local_id
            );
            return None;
        }

        let split = self.body.len() - CHECKSUM_TRAILER_BYTES;
        let received = BigEndian::read_u32(&self.body[split..]);
        if !self.checksum.matches(received) {
            warn!(
                "device {}: checksum mismatch (trailer {:#06x}, sum {:#06x}), dropping frame",
                self.local_id,
                received,
                self.checksum.value()
            );
            return None;
        }

        let payload = self.body[..split].to_vec();
        debug!(
            "device {}: accepted {} byte frame from device {}",
            self.local_id,
            payload.len(),
            self.source
        );
        Some(Frame::received(self.source, self.local_id, payload))
    }

    fn reset(&mut self) {
        self.state = DecoderState::Length;
        self.escaped = false;
        self.field_fill = 0;
        self.checksum = WireChecksum::new();
        self.budget = 0;
        self.budget_armed = false;
        self.source = 0;
        self.for_local = false;
        self.oversized = false;
        self.body.clear();
    }
}
