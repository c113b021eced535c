use crate::consts::{DATA_FRAME_LEN, Q_CAPACITY};
use crate::endpoint::{Endpoint, UdpEndpoint};
use crate::error::{SessionError, validate_window};
use crate::protocol::{AckFrame, DataFrame};
use crate::reliability::ReceiveWindow;
use bytes::Bytes;
use log::{debug, error, trace, warn};
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The receiving half of a session: a background task ingests data frames,
/// reorders them through the window, and feeds the bounded delivery queue
/// that `recv` drains.
pub struct ReceiveSession<E: Endpoint = UdpEndpoint> {
    delivery: mpsc::Receiver<Bytes>,
    endpoint: Arc<E>,
}

impl ReceiveSession<UdpEndpoint> {
    /// Binds `port` and opens a session. Pass port 0 to let the OS pick;
    /// `local_addr` reports the result.
    pub async fn bind(port: u16, window: usize) -> Result<Self, SessionError> {
        validate_window(window)?;
        let endpoint = UdpEndpoint::bind(port)
            .await
            .map_err(|source| SessionError::Bind { port, source })?;
        Self::with_endpoint(endpoint, window)
    }
}

impl<E: Endpoint> ReceiveSession<E> {
    /// Opens a session over a caller-supplied endpoint, which is how demos
    /// and tests interpose loss injection. Must be called inside a tokio
    /// runtime.
    pub fn with_endpoint(endpoint: E, window: usize) -> Result<Self, SessionError> {
        validate_window(window)?;
        let endpoint = Arc::new(endpoint);
        let (tx, rx) = mpsc::channel(Q_CAPACITY);
        tokio::spawn(ingest_loop(
            Arc::clone(&endpoint),
            ReceiveWindow::new(window),
            tx,
        ));
        debug!("receive session open, window {window}");
        Ok(Self {
            delivery: rx,
            endpoint,
        })
    }

    /// Local address of the bound endpoint.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Waits for the next in-order payload and copies it into `buf`,
    /// returning its length. `buf` must hold [`crate::consts::PAYLOAD_MAX`]
    /// bytes.
    pub async fn recv(&mut self, buf: &mut [u8]) -> usize {
        let payload = self
            .delivery
            .recv()
            .await
            .expect("ingest task holds the channel open for the session lifetime");
        buf[..payload.len()].copy_from_slice(&payload);
        payload.len()
    }
}

/// Drains data datagrams for the life of the session. Every intact datagram
/// is answered with exactly one cumulative ACK back to its origin, whether
/// or not it landed inside the window.
async fn ingest_loop<E: Endpoint>(
    endpoint: Arc<E>,
    mut window: ReceiveWindow,
    delivery: mpsc::Sender<Bytes>,
) {
    let mut buf = [0u8; DATA_FRAME_LEN];
    loop {
        let (len, from) = match endpoint.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(err) => {
                warn!("data receive failed: {err}");
                continue;
            }
        };
        let frame = match DataFrame::decode(&buf[..len]) {
            Ok(frame) => frame,
            Err(err) => {
                // malformed frames earn no ACK; the sender's timer repeats them
                debug!("discarding datagram from {from}: {err}");
                continue;
            }
        };
        let seq = frame.seq();
        let accept = window.accept(seq, frame.into_payload());
        if accept.delivered.is_empty() {
            trace!("frame {seq} buffered or out of window, re-ack {}", accept.ack);
        } else {
            trace!(
                "frame {seq} promoted {} payload(s), ack {}",
                accept.delivered.len(),
                accept.ack
            );
        }
        for payload in accept.delivered {
            match delivery.try_send(payload) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // unreachable while the window bound stays below the
                    // queue capacity; a full queue here is a configuration bug
                    error!("delivery queue overflow");
                    process::exit(1);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("session dropped, stopping ingestion");
                    return;
                }
            }
        }
        let ack = AckFrame { ack: accept.ack }.encode();
        if let Err(err) = endpoint.send_to(&ack, from).await {
            warn!("ack {} to {from} failed: {err}", accept.ack);
        }
    }
}
