//! Link-layer framing over a shared, voltage-modulated serial medium.
//!
//! One [`NetworkInterface`] per device: frames enter through
//! [`NetworkInterface::send`], leave the device as timed voltage pulses on
//! an injected [`Medium`], and come back out of a peer's
//! [`NetworkInterface::receive`] once reassembled, checksum-verified and
//! address-filtered.

pub mod config;
pub mod error;
pub mod link;
pub mod medium;
pub mod phy;
pub mod utils;

pub use config::LinkConfig;
pub use error::{LinkError, Result};
pub use link::NetworkInterface;
pub use medium::{Medium, SharedMedium};
pub use phy::Frame;
