/// Log level (overridable with RUST_LOG)
pub const LOG_LEVEL: &str = "info";

// ============================================================================
// Physical Layer Parameters
// ============================================================================

/// Drive level for a logical high on the medium (volts)
pub const HIGH_VOLTAGE: f64 = 2.5;

/// Drive level for a logical low on the medium (volts)
pub const LOW_VOLTAGE: f64 = -2.5;

/// Width of one signal pulse (milliseconds)
pub const PULSE_WIDTH_MS: u64 = 200;

/// Pulses of idle level held before each byte and before each frame
pub const GUARD_PULSES: u32 = 4;

// ============================================================================
// Framing Parameters
// ============================================================================

/// Maximum data payload per frame (bytes)
pub const MAX_PAYLOAD_SIZE: usize = 1500;

/// Capacity of the inbound and outbound frame queues
pub const QUEUE_CAPACITY: usize = 5;

/// Terminates a wire frame when it appears unescaped
pub const SENTINEL: u8 = 0x7E;

/// Marks the next wire byte as literal data
pub const ESCAPE: u8 = 0x7D;

/// Size of the checksum trailer at the end of the frame body (bytes)
pub const CHECKSUM_TRAILER_BYTES: usize = 4;
