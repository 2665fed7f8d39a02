// Physical layer: pulse-timed byte serialization and link-layer framing
// with byte stuffing and an additive checksum.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod line;

pub use checksum::WireChecksum;
pub use decoder::FrameDecoder;
pub use encoder::FrameEncoder;
pub use frame::Frame;
pub use line::LineDriver;
