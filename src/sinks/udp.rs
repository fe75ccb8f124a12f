//! UDP datagram sink
//!
//! Each event travels as its own `EventBatch` frame in a single datagram. The
//! frame sequence counter starts at 0 per sink and wraps at `u32::MAX`.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{debug, info, trace};

use crate::config::SinkConfig;
use crate::protocol::encode_event_frame;
use crate::sink::Sink;
use crate::{EventRecord, Result, TelemetryError, clock};

/// Sink that ships events to a collector over UDP.
#[derive(Debug, Default)]
pub struct UdpSink {
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
    max_datagram_bytes: usize,
    sequence: u32,
}

impl UdpSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the connected collector, once initialized.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Local address of the sending socket, once initialized.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Sequence number the next frame will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Effective datagram limit, `0` before `init`.
    pub fn max_datagram_bytes(&self) -> usize {
        self.max_datagram_bytes
    }
}

fn resolve(endpoint: &str) -> Result<SocketAddr> {
    let sink_init = |source| TelemetryError::SinkInit { endpoint: endpoint.to_string(), source };

    endpoint
        .to_socket_addrs()
        .map_err(|e| sink_init(Some(e)))?
        .next()
        .ok_or_else(|| sink_init(None))
}

impl Sink for UdpSink {
    fn init(&mut self, config: &SinkConfig) -> Result<()> {
        let peer = resolve(&config.endpoint)?;
        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let sink_init =
            |e| TelemetryError::SinkInit { endpoint: config.endpoint.clone(), source: Some(e) };
        let socket = UdpSocket::bind(local).map_err(sink_init)?;
        socket.connect(peer).map_err(sink_init)?;

        self.max_datagram_bytes = config.effective_max_datagram_bytes();
        self.sequence = 0;
        self.peer = Some(peer);
        self.socket = Some(socket);

        info!(%peer, max_datagram_bytes = self.max_datagram_bytes, "UDP sink connected");
        Ok(())
    }

    fn send(&mut self, event: &EventRecord) -> Result<()> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(TelemetryError::send_failed("UDP sink is not initialized"));
        };

        let frame = encode_event_frame(self.sequence, clock::monotonic_ns(), &[*event])?;
        if frame.len() > self.max_datagram_bytes {
            return Err(TelemetryError::send_failed(format!(
                "frame of {} bytes exceeds the {} byte datagram limit",
                frame.len(),
                self.max_datagram_bytes
            )));
        }

        let written = socket
            .send(&frame)
            .map_err(|e| TelemetryError::send_failed_with_source("UDP send failed", e))?;
        if written != frame.len() {
            return Err(TelemetryError::send_failed(format!(
                "short datagram write: {} of {} bytes",
                written,
                frame.len()
            )));
        }

        trace!(sequence = self.sequence, event_id = event.event_id(), bytes = written, "Sent datagram");
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.socket.take().is_some() {
            debug!(peer = ?self.peer, frames = self.sequence, "UDP sink closed");
        }
    }
}
