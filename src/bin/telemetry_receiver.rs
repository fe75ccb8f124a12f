//! Collector that prints event frames arriving over UDP.
//!
//! Usage: `telemetry-receiver [port]` (default 9000). Log verbosity follows
//! `RUST_LOG`, defaulting to `info`.

use std::net::{Ipv4Addr, UdpSocket};

use anyhow::{Context, Result};
use sensorlink::protocol::decode_event_frame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 9000;
const RECV_BUFFER_BYTES: usize = 2048;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<u16>().with_context(|| format!("Invalid port '{}'", arg))?,
        None => DEFAULT_PORT,
    };

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
        .with_context(|| format!("Binding UDP port {}", port))?;
    info!(port, "Listening for telemetry frames");

    let mut buf = [0u8; RECV_BUFFER_BYTES];
    loop {
        let (len, from) = socket.recv_from(&mut buf).context("Receiving datagram")?;

        let frame = match decode_event_frame(&buf[..len]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%from, bytes = len, error = %e, "Skipping undecodable datagram");
                continue;
            }
        };

        for event in &frame.events {
            info!(
                %from,
                sequence = frame.header.sequence_counter,
                event_id = event.event_id(),
                level = %event.level(),
                timestamp_ns = event.timestamp(),
                payload = %String::from_utf8_lossy(event.payload()),
                "Event"
            );
        }
    }
}
