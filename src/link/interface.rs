use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::medium::Medium;
use crate::phy::decoder::FrameDecoder;
use crate::phy::encoder::FrameEncoder;
use crate::phy::frame::Frame;
use crate::phy::line::LineDriver;

/// One network interface attached to a shared medium.
///
/// Owns two bounded frame queues and the pair of worker threads that
/// bridge them to the pulse-timed encode and decode loops, so `send` and
/// `receive` block only on queue capacity, never on wire timing. Frames
/// go out in the order they were enqueued; inbound frames are delivered
/// in the order their terminators were seen on the medium.
pub struct NetworkInterface {
    device_number: u32,
    device_name: String,
    outbound: Sender<Frame>,
    inbound: Receiver<Frame>,
    running: Arc<AtomicBool>,
    // Dropped on shutdown; the workers watch for the disconnect at every
    // blocking queue wait.
    stop: Mutex<Option<Sender<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkInterface {
    /// Attach a new interface to `medium` with the default configuration.
    pub fn new(device_number: u32, medium: Arc<dyn Medium>) -> Self {
        Self::with_config(device_number, medium, LinkConfig::default())
    }

    pub fn with_config(device_number: u32, medium: Arc<dyn Medium>, config: LinkConfig) -> Self {
        let device_name = format!("netif{device_number}");
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (outbound_tx, outbound_rx) = bounded::<Frame>(config.queue_capacity);
        let (inbound_tx, inbound_rx) = bounded::<Frame>(config.queue_capacity);

        info!(
            "{device_name}: attaching to medium (pulse width {:?}, queue capacity {})",
            config.pulse_width, config.queue_capacity
        );

        let encoder = FrameEncoder::new(
            LineDriver::new(
                medium.clone(),
                device_name.clone(),
                config.clone(),
                running.clone(),
            ),
            device_number,
            config.max_payload,
        );
        let tx_name = device_name.clone();
        let tx_stop = stop_rx.clone();
        let tx_handle = thread::spawn(move || transmit_loop(tx_name, encoder, outbound_rx, tx_stop));

        let line = LineDriver::new(medium, device_name.clone(), config.clone(), running.clone());
        let decoder = FrameDecoder::new(device_number, config.max_payload);
        let rx_name = device_name.clone();
        let rx_handle =
            thread::spawn(move || receive_loop(rx_name, line, decoder, inbound_tx, stop_rx));

        Self {
            device_number,
            device_name,
            outbound: outbound_tx,
            inbound: inbound_rx,
            running,
            stop: Mutex::new(Some(stop_tx)),
            workers: Mutex::new(vec![tx_handle, rx_handle]),
        }
    }

    pub fn device_number(&self) -> u32 {
        self.device_number
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Queue a frame for transmission. Blocks while the outbound queue is
    /// full; fails only once the interface has shut down.
    pub fn send(&self, frame: Frame) -> Result<()> {
        self.outbound.send(frame).map_err(|_| LinkError::Shutdown)
    }

    /// Take the next received frame. Blocks while the inbound queue is
    /// empty; fails once the interface has shut down and the queue has
    /// drained.
    pub fn receive(&self) -> Result<Frame> {
        self.inbound.recv().map_err(|_| LinkError::Shutdown)
    }

    /// Stop both workers and wait for them to exit. A transmission or
    /// reception in progress is abandoned, not completed. Idempotent.
    pub fn shutdown(&self) {
        let stop = self.stop.lock().unwrap().take();
        if stop.is_none() {
            return;
        }
        self.running.store(false, Ordering::SeqCst);
        drop(stop);

        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        info!("{}: shut down", self.device_name);
    }
}

impl Drop for NetworkInterface {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Transmit worker: drain the outbound queue one frame at a time, each
/// frame one synchronous pulse-timed pass over the medium.
fn transmit_loop(
    device_name: String,
    encoder: FrameEncoder,
    outbound: Receiver<Frame>,
    stop: Receiver<()>,
) {
    loop {
        let frame = select! {
            recv(outbound) -> frame => match frame {
                Ok(frame) => frame,
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        };
        match encoder.transmit(&frame) {
            Ok(()) => {}
            Err(LinkError::Shutdown) => break,
            Err(e) => warn!("{device_name}: dropping outbound frame: {e}"),
        }
    }
    debug!("{device_name}: transmit worker stopping");
}

/// Receive worker: sample bytes off the medium and feed the decoder. A
/// full inbound queue blocks here, which is backpressure all the way to
/// the physical sampling loop.
fn receive_loop(
    device_name: String,
    line: LineDriver,
    mut decoder: FrameDecoder,
    inbound: Sender<Frame>,
    stop: Receiver<()>,
) {
    loop {
        let byte = match line.receive_byte() {
            Ok(byte) => byte,
            Err(_) => break,
        };
        if let Some(frame) = decoder.push(byte) {
            select! {
                send(inbound, frame) -> result => {
                    if result.is_err() {
                        break;
                    }
                }
                recv(stop) -> _ => break,
            }
        }
    }
    debug!("{device_name}: receive worker stopping");
}
