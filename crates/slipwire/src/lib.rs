//! Reliable, ordered unicast delivery over an unreliable datagram service.
//!
//! A session covers one direction of flow. A [`SendSession`] feeds payloads
//! into a sliding window with per-frame retransmission timers; the peer's
//! [`ReceiveSession`] reorders arrivals, acknowledges cumulatively, and hands
//! each payload to the application exactly once, in submission order.

pub mod consts;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod reliability;

mod receiver;
mod sender;

pub use error::SessionError;
pub use receiver::ReceiveSession;
pub use sender::SendSession;
