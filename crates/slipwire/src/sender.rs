use crate::consts::{DATA_FRAME_LEN, PAYLOAD_MAX, TICK};
use crate::endpoint::{Endpoint, UdpEndpoint};
use crate::error::{SessionError, validate_window};
use crate::protocol::AckFrame;
use crate::reliability::{SendWindow, Sweep};
use bytes::Bytes;
use log::{debug, error, trace, warn};
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tokio::net::lookup_host;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::time::{Instant, interval};

/// The sending half of a session: owns the outbound window plus the two
/// background tasks that ingest acknowledgements and sweep retransmission
/// timers.
///
/// `submit` and `flush` never return errors. Transient trouble is absorbed
/// by retransmission; a peer that stays silent through every retry is fatal
/// and terminates the process.
pub struct SendSession<E: Endpoint = UdpEndpoint> {
    shared: Arc<Shared<E>>,
}

struct Shared<E> {
    endpoint: E,
    peer: SocketAddr,
    window: Mutex<SendWindow>,
    /// One permit per free send slot; `submit` parks here while the window
    /// is full.
    slots: Semaphore,
    /// Signalled each time the window drains completely.
    drained: Notify,
}

impl SendSession<UdpEndpoint> {
    /// Resolves `host:port` and opens a session over a fresh UDP endpoint.
    pub async fn connect(host: &str, port: u16, window: usize) -> Result<Self, SessionError> {
        validate_window(window)?;
        let peer = lookup_host((host, port))
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| SessionError::PeerUnresolved(host.to_string()))?;
        let endpoint = UdpEndpoint::ephemeral().await?;
        Self::with_endpoint(endpoint, peer, window)
    }
}

impl<E: Endpoint> SendSession<E> {
    /// Opens a session over a caller-supplied endpoint, which is how demos
    /// and tests interpose loss injection. Must be called inside a tokio
    /// runtime.
    pub fn with_endpoint(
        endpoint: E,
        peer: SocketAddr,
        window: usize,
    ) -> Result<Self, SessionError> {
        validate_window(window)?;
        let shared = Arc::new(Shared {
            endpoint,
            peer,
            window: Mutex::new(SendWindow::new(window)),
            slots: Semaphore::new(window),
            drained: Notify::new(),
        });
        tokio::spawn(ack_loop(Arc::clone(&shared)));
        tokio::spawn(tick_loop(Arc::clone(&shared)));
        debug!("send session open towards {peer}, window {window}");
        Ok(Self { shared })
    }

    /// Local address of the session's endpoint.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.shared.endpoint.local_addr()
    }

    /// Queues one payload for reliable delivery, truncating it to
    /// [`PAYLOAD_MAX`] bytes. Suspends while the window is full. By the time
    /// this returns, the frame has been handed to the endpoint and its
    /// retransmission timer is armed.
    pub async fn submit(&self, payload: &[u8]) {
        let payload = Bytes::copy_from_slice(&payload[..payload.len().min(PAYLOAD_MAX)]);

        let permit = self
            .shared
            .slots
            .acquire()
            .await
            .expect("slot semaphore is never closed");
        // consumed for good; the ACK path mints a fresh permit per released slot
        permit.forget();

        let mut window = self.shared.window.lock().await;
        let (seq, frame) = window.stage(payload, Instant::now());
        trace!("frame {seq} staged, {} slot(s) left", window.slots_available());
        if let Err(err) = self.shared.endpoint.send_to(&frame, self.shared.peer).await {
            // lost like any datagram; the armed timer covers it
            warn!("frame {seq} initial send failed: {err}");
        }
    }

    /// Suspends until every submitted payload has been acknowledged.
    pub async fn flush(&self) {
        loop {
            let drained = self.shared.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();
            if self.shared.window.lock().await.is_empty() {
                return;
            }
            drained.await;
        }
    }
}

/// Drains acknowledgement datagrams for the life of the session.
async fn ack_loop<E: Endpoint>(shared: Arc<Shared<E>>) {
    let mut buf = [0u8; DATA_FRAME_LEN];
    loop {
        let (len, from) = match shared.endpoint.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(err) => {
                warn!("ack receive failed: {err}");
                continue;
            }
        };
        let ack = match AckFrame::decode(&buf[..len]) {
            Ok(frame) => frame.ack,
            Err(err) => {
                debug!("discarding datagram from {from}: {err}");
                continue;
            }
        };
        let mut window = shared.window.lock().await;
        let released = window.acknowledge(ack);
        if released == 0 {
            trace!("ack {ack} outside the open window, ignored");
            continue;
        }
        trace!("ack {ack} released {released} slot(s)");
        shared.slots.add_permits(usize::from(released));
        if window.is_empty() {
            shared.drained.notify_waiters();
        }
    }
}

/// Fires the retransmission sweep on every tick.
async fn tick_loop<E: Endpoint>(shared: Arc<Shared<E>>) {
    let mut ticker = interval(TICK);
    loop {
        ticker.tick().await;
        let mut window = shared.window.lock().await;
        match window.sweep(Instant::now()) {
            Sweep::Idle => {}
            Sweep::Retransmit(seqs) => {
                for seq in seqs {
                    debug!("retransmitting frame {seq}");
                    if let Err(err) = shared
                        .endpoint
                        .send_to(window.frame(seq), shared.peer)
                        .await
                    {
                        warn!("frame {seq} retransmission failed: {err}");
                    }
                }
            }
            Sweep::GiveUp { seq, retries } => {
                error!(
                    "frame {seq} unacknowledged after {retries} transmissions, giving up"
                );
                process::exit(1);
            }
        }
    }
}
