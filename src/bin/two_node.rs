// Two interfaces on one simulated medium: node A sends a message to
// node B and B prints what it received, byte-for-byte off the wire.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use voltlink::{Frame, LinkConfig, Medium, NetworkInterface, SharedMedium};

#[derive(Parser)]
#[command(about = "Drive two voltlink interfaces over a simulated medium")]
struct Args {
    /// Device number of the sending node
    #[arg(long, default_value_t = 1)]
    from: u32,

    /// Device number of the receiving node
    #[arg(long, default_value_t = 2)]
    to: u32,

    /// Pulse width in milliseconds (200 matches real-wire timing; small
    /// values make the demo finish quickly)
    #[arg(long, default_value_t = 5)]
    pulse_ms: u64,

    /// Message to put on the wire
    #[arg(long, default_value = "hello over the wire")]
    message: String,
}

fn main() {
    voltlink::utils::logging::init_logging();
    let args = Args::parse();

    let medium: Arc<dyn Medium> = Arc::new(SharedMedium::new());
    let config = LinkConfig {
        pulse_width: Duration::from_millis(args.pulse_ms),
        ..LinkConfig::default()
    };

    let sender = Arc::new(NetworkInterface::with_config(
        args.from,
        medium.clone(),
        config.clone(),
    ));
    let receiver = Arc::new(NetworkInterface::with_config(args.to, medium, config));

    let (s, r) = (sender.clone(), receiver.clone());
    ctrlc::set_handler(move || {
        s.shutdown();
        r.shutdown();
    })
    .ok();

    // Let the receive workers arm their threshold waits before any
    // voltage moves.
    thread::sleep(Duration::from_millis(50));

    info!(
        "sending {} bytes from device {} to device {}",
        args.message.len(),
        args.from,
        args.to
    );
    sender
        .send(Frame::new(args.to, args.message.into_bytes()))
        .expect("interface shut down before the frame was queued");

    match receiver.receive() {
        Ok(frame) => {
            println!(
                "device {} received from device {:?}: {}",
                args.to,
                frame.source(),
                String::from_utf8_lossy(frame.payload())
            );
        }
        Err(e) => {
            eprintln!("receive interrupted: {e}");
        }
    }

    sender.shutdown();
    receiver.shutdown();
}
