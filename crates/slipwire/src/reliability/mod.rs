//! Sliding-window reliability state, kept free of I/O: the session layer
//! feeds in submissions, acknowledgements, and clock ticks, and acts on what
//! comes back out.

mod receive_window;
mod send_window;
pub mod window;

pub use receive_window::{Accept, ReceiveWindow};
pub use send_window::{SendWindow, Sweep};
