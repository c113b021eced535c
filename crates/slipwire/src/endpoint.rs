//! The datagram seam between the engines and the network.
//!
//! An [`Endpoint`] is an unreliable, connectionless datagram service:
//! datagrams arrive whole with their original bytes, arrive corrupted (the
//! frame checksum catches that upstream), or never arrive at all. The real
//! channel is [`UdpEndpoint`]; [`LossyEndpoint`] layers configurable loss on
//! top of any endpoint for demos and tests.

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

pub trait Endpoint: Send + Sync + 'static {
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Sends one datagram towards `target`. Delivery is not promised.
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    /// Waits for the next datagram, yielding its length and origin. A
    /// datagram longer than `buf` is truncated, which the frame size checks
    /// then reject.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;
}

/// A plain tokio UDP socket.
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Binds an ephemeral local port, for the sending side.
    pub async fn ephemeral() -> io::Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(("0.0.0.0", 0)).await?,
        })
    }

    /// Binds `port` on all interfaces, for the receiving side.
    pub async fn bind(port: u16) -> io::Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(("0.0.0.0", port)).await?,
        })
    }
}

impl Endpoint for UdpEndpoint {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }
}

/// Decorator that silently drops a fraction of outgoing datagrams, standing
/// in for a lossy path. Receiving is passed through untouched; wrapping both
/// peers loses traffic in both directions.
pub struct LossyEndpoint<E> {
    inner: E,
    drop_probability: f64,
    rng: Mutex<StdRng>,
}

impl<E: Endpoint> LossyEndpoint<E> {
    pub fn new(inner: E, drop_probability: f64) -> Self {
        Self::seeded(inner, drop_probability, rand::random())
    }

    /// Deterministic loss pattern for reproducible runs.
    pub fn seeded(inner: E, drop_probability: f64, seed: u64) -> Self {
        Self {
            inner,
            drop_probability: drop_probability.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl<E: Endpoint> Endpoint for LossyEndpoint<E> {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        let dropped = self.rng.lock().await.random_bool(self.drop_probability);
        if dropped {
            trace!("dropping {} byte datagram to {}", buf.len(), target);
            // the caller sees a normal send, as with real network loss
            return Ok(buf.len());
        }
        self.inner.send_to(buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_loss_swallows_every_send() {
        let a = LossyEndpoint::seeded(UdpEndpoint::ephemeral().await.unwrap(), 1.0, 7);
        let b = UdpEndpoint::ephemeral().await.unwrap();
        let b_addr = loopback(&b);

        assert_eq!(a.send_to(b"gone", b_addr).await.unwrap(), 4);

        // a zero-loss wrapper still gets through
        let a = LossyEndpoint::seeded(a.inner, 0.0, 7);
        a.send_to(b"kept", b_addr).await.unwrap();
        let mut buf = [0u8; 16];
        let (len, _) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"kept");
    }

    fn loopback(endpoint: &UdpEndpoint) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], endpoint.local_addr().unwrap().port()))
    }
}
