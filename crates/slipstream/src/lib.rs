//! Demonstration programs for the slipwire transport: a pattern-generating
//! sender, a verifying receiver, and a line-printing echo sink.

pub mod config;

/// Content byte for position-independent verification: every byte of demo
/// payload `i` is `'A' + i % 26`.
pub fn pattern_byte(index: usize) -> u8 {
    b'A' + (index % 26) as u8
}
